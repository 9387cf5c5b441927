
use super::EmbeddingRecord;
use crate::embeddings::Chunk;
use crate::loader::Metadata;
use crate::{RagError, Result};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const TABLE_EXTENSION: &str = "lance";

/// A LanceDB table of embedded chunks, one table per collection
pub struct VectorStore {
    // Keeps the database handle alive alongside the table
    _connection: Connection,
    table: Table,
    persist_directory: PathBuf,
    collection_name: String,
    vector_dimension: usize,
}

impl std::fmt::Debug for VectorStore {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("persist_directory", &self.persist_directory)
            .field("collection_name", &self.collection_name)
            .field("vector_dimension", &self.vector_dimension)
            .finish_non_exhaustive()
    }
}

/// A stored chunk with its distance to the query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Cosine distance, lower is closer
    pub distance: f32,
    pub similarity_score: f32,
}

/// Result of trying to open an existing collection
#[derive(Debug)]
pub enum OpenOutcome {
    Opened(VectorStore),
    /// No directory or no table for this collection
    NotFound,
    /// Something exists on disk but cannot be used
    Corrupt(RagError),
}

impl VectorStore {
    /// Open `collection_name` under `persist_directory` without writing anything
    #[inline]
    pub async fn open(persist_directory: &Path, collection_name: &str) -> OpenOutcome {
        if !persist_directory.is_dir() {
            debug!(
                "Vector store directory {} does not exist",
                persist_directory.display()
            );
            return OpenOutcome::NotFound;
        }

        let connection = match connect(persist_directory).await {
            Ok(connection) => connection,
            Err(e) => return OpenOutcome::Corrupt(e),
        };

        let table_names = match connection.table_names().execute().await {
            Ok(names) => names,
            Err(e) => {
                return OpenOutcome::Corrupt(RagError::Store(format!(
                    "Failed to list tables in {}: {}",
                    persist_directory.display(),
                    e
                )));
            }
        };

        if !table_names.iter().any(|name| name == collection_name) {
            debug!(
                "Collection {} not found in {}",
                collection_name,
                persist_directory.display()
            );
            return OpenOutcome::NotFound;
        }

        let table = match connection.open_table(collection_name).execute().await {
            Ok(table) => table,
            Err(e) => {
                return OpenOutcome::Corrupt(RagError::Store(format!(
                    "Failed to open collection {}: {}",
                    collection_name, e
                )));
            }
        };

        let vector_dimension = match detect_vector_dimension(&table).await {
            Ok(dimension) => dimension,
            Err(e) => return OpenOutcome::Corrupt(e),
        };

        info!(
            "Opened collection {} ({} dimensions) from {}",
            collection_name,
            vector_dimension,
            persist_directory.display()
        );

        OpenOutcome::Opened(Self {
            _connection: connection,
            table,
            persist_directory: persist_directory.to_path_buf(),
            collection_name: collection_name.to_string(),
            vector_dimension,
        })
    }

    /// Write `records` as the new contents of `collection_name`.
    ///
    /// The table is built in a staging database and swapped into place, so a
    /// failure at any point before the swap leaves the previous table intact.
    #[inline]
    pub async fn build(
        persist_directory: &Path,
        collection_name: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<Self> {
        let vector_dimension = check_records(&records)?;

        fs::create_dir_all(persist_directory).map_err(|e| {
            RagError::Store(format!(
                "Failed to create vector store directory {}: {}",
                persist_directory.display(),
                e
            ))
        })?;

        let staging = persist_directory.join(format!(".staging-{}", Uuid::new_v4()));
        let record_count = records.len();

        let staged = write_staged_table(&staging, collection_name, records, vector_dimension).await;
        let swapped = match staged {
            Ok(()) => swap_into_place(persist_directory, &staging, collection_name),
            Err(e) => Err(e),
        };
        remove_quietly(&staging);
        swapped?;

        info!(
            "Built collection {} with {} records in {}",
            collection_name,
            record_count,
            persist_directory.display()
        );

        match Self::open(persist_directory, collection_name).await {
            OpenOutcome::Opened(store) => Ok(store),
            OpenOutcome::NotFound => Err(RagError::Store(format!(
                "Collection {} missing right after build",
                collection_name
            ))),
            OpenOutcome::Corrupt(e) => Err(e),
        }
    }

    #[inline]
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    #[inline]
    pub fn persist_directory(&self) -> &Path {
        &self.persist_directory
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    /// The `k` nearest chunks to `query_vector`, closest first
    #[inline]
    pub async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        if query_vector.len() != self.vector_dimension {
            return Err(RagError::Store(format!(
                "Query vector has {} dimensions but collection {} stores {}",
                query_vector.len(),
                self.collection_name,
                self.vector_dimension
            )));
        }

        debug!("Searching {} for {} nearest chunks", self.collection_name, k);

        let results = self
            .table
            .vector_search(query_vector)
            .map_err(|e| RagError::Store(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to execute search: {}", e)))?;

        let mut search_results = parse_search_results_stream(results).await?;
        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(search_results)
    }

    /// Number of stored records
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Store(format!("Failed to count rows: {}", e)))
    }
}

async fn connect(directory: &Path) -> Result<Connection> {
    // lancedb wants an absolute location
    let absolute = std::path::absolute(directory).map_err(|e| {
        RagError::Store(format!(
            "Failed to resolve vector store path {}: {}",
            directory.display(),
            e
        ))
    })?;

    lancedb::connect(&absolute.to_string_lossy())
        .execute()
        .await
        .map_err(|e| {
            RagError::Store(format!(
                "Failed to connect to LanceDB at {}: {}",
                absolute.display(),
                e
            ))
        })
}

async fn detect_vector_dimension(table: &Table) -> Result<usize> {
    let schema = table
        .schema()
        .await
        .map_err(|e| RagError::Store(format!("Failed to get table schema: {}", e)))?;

    for required in ["content", "metadata"] {
        if schema.field_with_name(required).is_err() {
            return Err(RagError::Store(format!(
                "Collection is missing the {} column",
                required
            )));
        }
    }

    match schema.field_with_name("vector").map(|f| f.data_type()) {
        Ok(DataType::FixedSizeList(_, size)) if *size > 0 => usize::try_from(*size)
            .map_err(|_| RagError::Store(format!("Invalid vector dimension {}", size))),
        _ => Err(RagError::Store(
            "Could not find vector column or determine dimension".to_string(),
        )),
    }
}

/// All records must share one non-zero dimension
fn check_records(records: &[EmbeddingRecord]) -> Result<usize> {
    let Some(first) = records.first() else {
        return Err(RagError::Store(
            "Cannot build a collection without records".to_string(),
        ));
    };

    let dimension = first.vector.len();
    if dimension == 0 {
        return Err(RagError::Store("Embedding vectors are empty".to_string()));
    }

    if let Some(bad) = records.iter().find(|r| r.vector.len() != dimension) {
        return Err(RagError::Store(format!(
            "Record {} has {} dimensions, expected {}",
            bad.id,
            bad.vector.len(),
            dimension
        )));
    }

    Ok(dimension)
}

async fn write_staged_table(
    staging: &Path,
    collection_name: &str,
    records: Vec<EmbeddingRecord>,
    vector_dimension: usize,
) -> Result<()> {
    fs::create_dir_all(staging).map_err(|e| {
        RagError::Store(format!(
            "Failed to create staging directory {}: {}",
            staging.display(),
            e
        ))
    })?;

    let connection = connect(staging).await?;
    let batch = create_record_batch(&records, vector_dimension)?;
    let schema = batch.schema();
    let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);

    connection
        .create_table(collection_name, reader)
        .execute()
        .await
        .map_err(|e| {
            RagError::Store(format!(
                "Failed to write collection {}: {}",
                collection_name, e
            ))
        })?;

    debug!(
        "Staged {} records for {} in {}",
        records.len(),
        collection_name,
        staging.display()
    );
    Ok(())
}

fn table_dir(directory: &Path, collection_name: &str) -> PathBuf {
    directory.join(format!("{}.{}", collection_name, TABLE_EXTENSION))
}

/// Replace the live table directory with the staged one
fn swap_into_place(persist_directory: &Path, staging: &Path, collection_name: &str) -> Result<()> {
    let staged = table_dir(staging, collection_name);
    let live = table_dir(persist_directory, collection_name);

    let retired = if live.exists() {
        let retired =
            persist_directory.join(format!(".retired-{}-{}", collection_name, Uuid::new_v4()));
        fs::rename(&live, &retired).map_err(|e| {
            RagError::Store(format!(
                "Failed to move previous collection {} aside: {}",
                live.display(),
                e
            ))
        })?;
        Some(retired)
    } else {
        None
    };

    if let Err(e) = fs::rename(&staged, &live) {
        if let Some(retired) = &retired {
            if let Err(restore) = fs::rename(retired, &live) {
                error!(
                    "Failed to restore previous collection from {}: {}",
                    retired.display(),
                    restore
                );
            }
        }
        return Err(RagError::Store(format!(
            "Failed to move staged collection into {}: {}",
            live.display(),
            e
        )));
    }

    if let Some(retired) = retired {
        remove_quietly(&retired);
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_dir_all(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

fn create_schema(vector_dimension: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dimension,
            ),
            false,
        ),
        Field::new("content", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("token_count", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(records: &[EmbeddingRecord], vector_dimension: usize) -> Result<RecordBatch> {
    let len = records.len();
    let dimension = i32::try_from(vector_dimension).map_err(|_| {
        RagError::Store(format!("Vector dimension {} is too large", vector_dimension))
    })?;

    let mut ids = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dimension);
    let mut contents = Vec::with_capacity(len);
    let mut metadata = Vec::with_capacity(len);
    let mut chunk_indices = Vec::with_capacity(len);
    let mut token_counts = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);

    for record in records {
        ids.push(record.id.as_str());
        flat_values.extend_from_slice(&record.vector);
        contents.push(record.chunk.content.as_str());
        metadata.push(serde_json::to_string(&record.chunk.metadata).map_err(|e| {
            RagError::Store(format!("Failed to serialize metadata for {}: {}", record.id, e))
        })?);
        chunk_indices.push(u32::try_from(record.chunk.chunk_index).unwrap_or(u32::MAX));
        token_counts.push(u32::try_from(record.chunk.token_count).unwrap_or(u32::MAX));
        created_ats.push(record.created_at.as_str());
    }

    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array = FixedSizeListArray::try_new(
        field,
        dimension,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(|e| RagError::Store(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(contents)),
        Arc::new(StringArray::from(metadata)),
        Arc::new(UInt32Array::from(chunk_indices)),
        Arc::new(UInt32Array::from(token_counts)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(create_schema(dimension), arrays)
        .map_err(|e| RagError::Store(format!("Failed to create record batch: {}", e)))
}

async fn parse_search_results_stream(
    mut results: lancedb::arrow::SendableRecordBatchStream,
) -> Result<Vec<SearchResult>> {
    let mut search_results = Vec::new();

    while let Some(batch) = results
        .try_next()
        .await
        .map_err(|e| RagError::Store(format!("Failed to read result stream: {}", e)))?
    {
        search_results.extend(parse_search_batch(&batch)?);
    }

    debug!("Parsed {} search results from stream", search_results.len());
    Ok(search_results)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Store(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Store(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Store(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| RagError::Store(format!("Invalid {} column type", name)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let contents = string_column(batch, "content")?;
    let metadata = string_column(batch, "metadata")?;
    let chunk_indices = u32_column(batch, "chunk_index")?;
    let token_counts = u32_column(batch, "token_count")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut search_results = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let metadata: Metadata = serde_json::from_str(metadata.value(row))
            .map_err(|e| RagError::Store(format!("Failed to parse stored metadata: {}", e)))?;

        let distance = distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        search_results.push(SearchResult {
            chunk: Chunk {
                content: contents.value(row).to_string(),
                metadata,
                chunk_index: chunk_indices.value(row) as usize,
                token_count: token_counts.value(row) as usize,
            },
            distance,
            similarity_score: 1.0 - distance,
        });
    }

    Ok(search_results)
}
