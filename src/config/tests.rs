use super::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn explicit_config_dir_wins() {
    let dir = PathBuf::from("/tmp/rag-chat-test-config");
    let resolved = resolve_config_dir(Some(dir.clone())).expect("override should resolve");
    assert_eq!(resolved, dir);
}

#[test]
fn default_config_dir_is_dot_rag_chat() {
    if let Ok(dir) = resolve_config_dir(None) {
        assert!(dir.ends_with(".rag-chat") || dir.ends_with("rag-chat"));
    }
}

#[test]
fn config_file_persistence() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config_path = temp_dir.path().join("config.toml");

    let original_config = Config {
        ollama: OllamaConfig {
            protocol: "https".to_string(),
            host: "test-host".to_string(),
            port: 8080,
            model: "test-model".to_string(),
            batch_size: 32,
        },
        llm: LlmConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.1".to_string(),
            ..LlmConfig::default()
        },
        ..Config::default()
    };

    let toml_content = toml::to_string_pretty(&original_config)
        .expect("config should convert to toml string successfully");
    fs::write(&config_path, toml_content).expect("should write to config_path successfully");

    let content =
        fs::read_to_string(&config_path).expect("should read from config_path successfully");
    let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

    assert_eq!(original_config, loaded_config);
}

#[test]
fn invalid_toml_handling() {
    let invalid_toml = r#"
        [ollama
        host = "localhost"
        port = "invalid_port"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn wrong_types_are_rejected() {
    let invalid_toml = r#"
        [vector_store]
        top_k = "four"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn unknown_provider_is_rejected() {
    let invalid_toml = r#"
        [llm]
        provider = "carrier-pigeon"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn complete_valid_config() {
    let valid_toml = r#"
        [documents]
        path = "pdfs"

        [chunking]
        chunk_size = 500
        chunk_overlap = 50
        separators = ["\n\n", "\n", " ", ""]

        [ollama]
        protocol = "http"
        host = "localhost"
        port = 11434
        model = "nomic-embed-text:latest"
        batch_size = 64

        [llm]
        provider = "groq"
        model = "llama3-8b-8192"
        api_key_env = "GROQ_API_KEY"
        temperature = 0.2
        timeout_seconds = 30

        [vector_store]
        persist_directory = "store"
        collection_name = "pdfs"
        force_rebuild = true
        top_k = 6

        [prompt]
        system_template = "Answer from this context only:\n{context}"

        [http]
        retry_attempts = 3
    "#;

    let config: Config = toml::from_str(valid_toml).expect("valid config should parse");
    assert!(config.validate().is_ok());
    assert_eq!(config.documents.path, PathBuf::from("pdfs"));
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.chunking.separators.len(), 4);
    assert_eq!(config.llm.model, "llama3-8b-8192");
    assert!(config.vector_store.force_rebuild);
    assert_eq!(config.vector_store.top_k, 6);
    assert_eq!(config.http.retry_attempts, 3);
}
