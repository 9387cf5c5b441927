use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::app::{IndexSummary, RagApp};
use crate::config::Config;
use crate::rag::Answer;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Exit,
    Reset,
    Reload,
    Question(String),
    Unknown(String),
}

impl ReplInput {
    #[inline]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Self::Empty,
            "/exit" | "/quit" => Self::Exit,
            "/reset" => Self::Reset,
            "/reload" => Self::Reload,
            command if command.starts_with('/') => Self::Unknown(command.to_string()),
            question => Self::Question(question.to_string()),
        }
    }
}

fn load_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_dir.display()
        )
    })
}

/// Initialize the pipeline, showing a spinner when a terminal is attached
async fn initialize(app: &mut RagApp) -> Result<IndexSummary> {
    let spinner = if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Loading documents and vector store...");
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    } else {
        ProgressBar::hidden()
    };

    let result = app.initialize().await;
    spinner.finish_and_clear();

    Ok(result?)
}

fn print_summary(summary: &IndexSummary, app: &RagApp) {
    let vector_store = &app.config().vector_store;
    eprintln!(
        "{} {} pages, {} chunks, {} records in collection {} ({})",
        style("✓ Ready:").green().bold(),
        summary.documents,
        summary.chunks,
        summary.stored,
        style(&vector_store.collection_name).cyan(),
        vector_store.persist_directory.display()
    );
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);

    if answer.context.is_empty() {
        return;
    }

    eprintln!();
    eprintln!("{}", style("Sources:").bold().yellow());
    for retrieved in &answer.context {
        let source = retrieved
            .chunk
            .metadata
            .get("source")
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        let page = retrieved
            .chunk
            .metadata
            .get("page")
            .map_or_else(|| "?".to_string(), ToString::to_string);
        eprintln!(
            "  {} (page {}, score {:.3})",
            style(source).cyan(),
            page,
            retrieved.similarity_score
        );
    }
}

/// Build or reuse the vector store for the configured documents
#[inline]
pub async fn index(config_dir: &Path, force_rebuild: bool) -> Result<()> {
    let mut config = load_config(config_dir)?;
    config.vector_store.force_rebuild |= force_rebuild;

    let mut app = RagApp::from_config(config)?;
    let summary = initialize(&mut app).await?;
    print_summary(&summary, &app);
    Ok(())
}

/// Answer a single question and exit
#[inline]
pub async fn ask(config_dir: &Path, question: &str) -> Result<()> {
    let mut app = RagApp::from_config(load_config(config_dir)?)?;
    initialize(&mut app).await?;

    let answer = app.ask(question).await?;
    print_answer(&answer);
    Ok(())
}

/// Interactive multi-turn chat
#[inline]
pub async fn chat(config_dir: &Path) -> Result<()> {
    let mut app = RagApp::from_config(load_config(config_dir)?)?;
    let summary = initialize(&mut app).await?;
    print_summary(&summary, &app);

    eprintln!(
        "{}",
        style("Ask a question. Commands: /reset clears history, /reload rebuilds the pipeline, /exit quits.")
            .dim()
    );

    loop {
        let line: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;

        match ReplInput::parse(&line) {
            ReplInput::Empty => {}
            ReplInput::Exit => break,
            ReplInput::Reset => {
                app.reset_history();
                eprintln!("{}", style("History cleared.").green());
            }
            ReplInput::Reload => {
                app.reset_pipeline();
                match initialize(&mut app).await {
                    Ok(summary) => print_summary(&summary, &app),
                    Err(e) => eprintln!("{} {:#}", style("Reload failed:").red().bold(), e),
                }
            }
            ReplInput::Unknown(command) => {
                eprintln!("{} {}", style("Unknown command:").yellow(), command);
            }
            ReplInput::Question(question) => match app.ask(&question).await {
                Ok(answer) => print_answer(&answer),
                Err(e) => {
                    warn!("Turn failed: {}", e);
                    eprintln!("{} {}", style("Error:").red().bold(), e);
                }
            },
        }
    }

    info!("Chat session ended after {} turns", app.session().len() / 2);
    Ok(())
}
