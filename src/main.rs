use anyhow::Result;
use clap::Parser;
use log::{debug, warn, LevelFilter};

use quiver::cli;
use quiver::config::Config;
use quiver::db::Store;
use quiver::manager::Manager;
use quiver::professor::openai::{OpenAiClient, OpenAiOptions};
use quiver::professor::Professor;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            std::process::exit(2);
        }
    };

    init_logger(config.debug);

    if let Err(err) = run(&config) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let cli = cli::Cli::parse();

    let db_path = config.db_path()?;
    debug!("opening store at {}", db_path.display());
    let store = Store::open(&db_path)?;

    let mut manager = match new_professor(config)? {
        Some(professor) => Manager::with_professor(store, professor),
        None => Manager::new(store),
    };

    cli::handle_command(cli.command, &mut manager)?;

    if let Err(err) = manager.close() {
        warn!("error closing store: {err}");
    }

    Ok(())
}

fn new_professor(config: &Config) -> Result<Option<Professor>> {
    if !config.professor.enabled {
        return Ok(None);
    }

    let openai = &config.professor.openai;
    let client = OpenAiClient::new(
        &openai.key,
        OpenAiOptions {
            base_url: openai.url.clone(),
            model: openai.model.clone(),
            preamble: openai.custom_prompt.clone(),
        },
    )?;

    debug!("professor source configured");
    Ok(Some(Professor::new(Box::new(client))))
}

fn init_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
