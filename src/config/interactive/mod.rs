
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, EmbeddingConfig, IndexBackend, LlmConfig};
use crate::embeddings::OllamaEmbedder;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 askdocs Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Language Model").bold().yellow());
    eprintln!("Any OpenAI-compatible chat completion endpoint works.");
    eprintln!("The API key is read from OPENAI_API_KEY or ASKDOCS_LLM_API_KEY, never stored.");
    eprintln!();
    configure_llm(&mut config.llm)?;

    eprintln!();
    eprintln!("{}", style("Embeddings").bold().yellow());
    eprintln!("Configure the Ollama-compatible server used for embedding generation.");
    eprintln!();
    configure_embedding(&mut config.embedding)?;

    eprintln!();
    config.index.backend = select_backend(config.index.backend)?;

    eprintln!();
    eprintln!("{}", style("Testing embedding server...").yellow());

    if test_embedding_connection(&config.embedding) {
        eprintln!("{}", style("✓ Embedding server reachable and model available!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not verify the embedding server").yellow()
        );
        eprintln!("You can continue, but make sure it is running before uploading a document.");
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
pub fn show_config() -> Result<()> {
    let config = Config::load_from_env().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Language Model:").bold().yellow());
    match config.llm_url() {
        Ok(url) => eprintln!("  Endpoint: {}", style(url).cyan()),
        Err(e) => eprintln!("  Endpoint: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    eprintln!("  Temperature: {}", style(config.llm.temperature).cyan());
    eprintln!("  API Key: {}", describe_secret(config.llm.api_key.as_deref()));

    eprintln!();
    eprintln!("{}", style("Embeddings:").bold().yellow());
    match config.embedding_url() {
        Ok(url) => eprintln!("  Endpoint: {}", style(url).cyan()),
        Err(e) => eprintln!("  Endpoint: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());
    eprintln!(
        "  API Key: {}",
        describe_secret(config.embedding.api_key.as_deref())
    );

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!(
        "  Chunks: {} chars, {} overlap",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.chunk_overlap).cyan()
    );
    eprintln!("  Top-k: {}", style(config.retrieval.top_k).cyan());
    eprintln!("  Index Backend: {}", style(config.index.backend).cyan());
    if config.index.backend == IndexBackend::Lance {
        eprintln!(
            "  Vector Directory: {}",
            style(config.vector_database_path().display()).cyan()
        );
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn describe_secret(secret: Option<&str>) -> String {
    match secret {
        Some(_) => style("set").green().to_string(),
        None => style("not set").red().to_string(),
    }
}

fn load_existing_config() -> Result<Config> {
    let dir = Config::config_dir().context("Failed to resolve configuration directory")?;
    Config::load(&dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No valid existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::with_base_dir(&dir))
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_llm(llm: &mut LlmConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("Chat completion base URL")
        .default(llm.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = LlmConfig {
                base_url: input.clone(),
                ..LlmConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Chat model")
        .default(llm.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    llm.set_base_url(base_url)?;
    llm.set_model(model)?;

    Ok(())
}

fn configure_embedding(embedding: &mut EmbeddingConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == embedding.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Embedding server protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Embedding server host")
        .default(embedding.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = EmbeddingConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..EmbeddingConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Embedding server port")
        .default(embedding.port)
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
        .default(embedding.model.clone())
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
        .default(embedding.batch_size)
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

    embedding.set_protocol(protocol)?;
    embedding.set_host(host)?;
    embedding.set_port(port)?;
    embedding.set_model(model)?;
    embedding.set_batch_size(batch_size)?;

    Ok(())
}

fn select_backend(current: IndexBackend) -> Result<IndexBackend> {
    let backends = [IndexBackend::Memory, IndexBackend::Lance];
    let labels = &[
        "memory  (per session, nothing written to disk)",
        "lance   (persisted under the data directory, single user)",
    ];
    let default_index = backends.iter().position(|&b| b == current).unwrap_or(0);

    let selection = Select::new()
        .with_prompt("Vector index backend")
        .default(default_index)
        .items(labels)
        .interact()?;

    Ok(backends[selection])
}

fn test_embedding_connection(embedding: &EmbeddingConfig) -> bool {
    OllamaEmbedder::new(embedding)
        .map(|client| client.with_timeout(std::time::Duration::from_secs(5)))
        .is_ok_and(|client| client.health_check().is_ok())
}
