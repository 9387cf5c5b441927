
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use super::{Config, ConfigError, LlmConfig, LlmProvider, OllamaConfig, VectorStoreConfig};

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 RAG Chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Documents").bold().yellow());
    configure_documents(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Embedding Model (Ollama)").bold().yellow());
    eprintln!("Configure the Ollama instance used to embed document chunks.");
    eprintln!();
    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Chat Model").bold().yellow());
    configure_llm(&mut config.llm)?;

    eprintln!();
    eprintln!("{}", style("Vector Store").bold().yellow());
    configure_vector_store(&mut config.vector_store)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before indexing.");
    }

    if config.llm.provider == LlmProvider::Groq && std::env::var(&config.llm.api_key_env).is_err()
    {
        eprintln!(
            "{}",
            style(format!(
                "⚠ Warning: {} is not set in the environment",
                config.llm.api_key_env
            ))
            .yellow()
        );
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Documents:").bold().yellow());
    eprintln!(
        "  Directory: {}",
        style(config.documents.path.display()).cyan()
    );
    eprintln!(
        "  Chunk size / overlap: {} / {}",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.chunk_overlap).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embeddings (Ollama):").bold().yellow());
    match config.ollama_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Chat Model:").bold().yellow());
    eprintln!("  Provider: {}", style(config.llm.provider).cyan());
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    match config.llm_base_url() {
        Ok(url) => eprintln!("  Endpoint: {}", style(url).cyan()),
        Err(e) => eprintln!("  Endpoint: {} ({})", style("Invalid").red(), e),
    }
    if config.llm.provider == LlmProvider::Groq {
        let key_state = if std::env::var(&config.llm.api_key_env).is_ok() {
            style("set").green()
        } else {
            style("missing").red()
        };
        eprintln!("  API key ({}): {}", config.llm.api_key_env, key_state);
    }
    eprintln!("  Temperature: {}", style(config.llm.temperature).cyan());

    eprintln!();
    eprintln!("{}", style("Vector Store:").bold().yellow());
    eprintln!(
        "  Directory: {}",
        style(config.vector_store.persist_directory.display()).cyan()
    );
    eprintln!(
        "  Collection: {}",
        style(&config.vector_store.collection_name).cyan()
    );
    eprintln!("  Top-k: {}", style(config.vector_store.top_k).cyan());
    eprintln!(
        "  Force rebuild: {}",
        style(config.vector_store.force_rebuild).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Config::with_base_dir(config_dir)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_documents(config: &mut Config) -> Result<()> {
    let path: String = Input::new()
        .with_prompt("PDF directory")
        .default(config.documents.path.display().to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Directory cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.documents.path = PathBuf::from(path.trim());
    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(ollama.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_llm(llm: &mut LlmConfig) -> Result<()> {
    let providers: Vec<&str> = LlmProvider::ALL.iter().map(|p| p.as_str()).collect();
    let default_index = LlmProvider::ALL
        .iter()
        .position(|&p| p == llm.provider)
        .unwrap_or(0);

    let provider_index = Select::new()
        .with_prompt("Chat model provider")
        .default(default_index)
        .items(&providers)
        .interact()?;
    let provider = LlmProvider::ALL[provider_index];

    let model: String = Input::new()
        .with_prompt("Chat model")
        .default(llm.model.clone())
        .interact_text()?;

    if provider == LlmProvider::Groq {
        let api_key_env: String = Input::new()
            .with_prompt("Environment variable holding the API key")
            .default(llm.api_key_env.clone())
            .interact_text()?;
        llm.set_api_key_env(api_key_env)?;
    }

    let temperature: f32 = Input::new()
        .with_prompt("Temperature")
        .default(llm.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    llm.provider = provider;
    llm.set_model(model)?;
    llm.set_temperature(temperature)?;

    Ok(())
}

fn configure_vector_store(store: &mut VectorStoreConfig) -> Result<()> {
    let persist_directory: String = Input::new()
        .with_prompt("Persist directory")
        .default(store.persist_directory.display().to_string())
        .interact_text()?;

    let collection_name: String = Input::new()
        .with_prompt("Collection name")
        .default(store.collection_name.clone())
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Passages retrieved per question")
        .default(store.top_k)
        .interact_text()?;

    store.persist_directory = PathBuf::from(persist_directory.trim());
    store.set_collection_name(collection_name)?;
    store.set_top_k(top_k)?;

    Ok(())
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let url = format!(
        "{}://{}:{}/api/version",
        ollama.protocol, ollama.host, ollama.port
    );

    let agent = crate::http::build_agent(std::time::Duration::from_secs(5));

    match agent.get(&url).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
