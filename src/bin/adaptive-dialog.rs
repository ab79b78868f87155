use std::path::PathBuf;
use std::sync::Arc;

use adaptive_dialog::render::DictionaryTemplateRenderer;
use adaptive_dialog::storage::InMemoryScopeStorage;
use adaptive_dialog::{
    Activity, ChannelAccount, DialogError, DialogGraph, DialogManager, EngineConfig,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to engine config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Dialog graph definition
    #[arg(short, long, default_value = "data/joke_bot.json")]
    dialog: PathBuf,

    #[arg(short, long, default_value = "user")]
    user: String,

    #[arg(long, default_value = "conversation")]
    conversation: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_replies(replies: &[Activity]) {
    for reply in replies {
        match &reply.text {
            Some(text) => println!("bot> {}", text),
            None => println!("bot> [{}]", reply.activity_type),
        }
    }
}

async fn run(cli: &Cli) -> Result<(), DialogError> {
    let config = if cli.config.exists() {
        EngineConfig::from_file(&cli.config)?
    } else {
        EngineConfig::default()
    };
    config.validate()?;
    info!("config loaded.");
    debug!("config: {:?}", config);

    let source = std::fs::read_to_string(&cli.dialog)
        .map_err(|e| DialogError::Config(format!("Failed to read dialog file: {}", e)))?;
    let graph = DialogGraph::from_json(&source)?;
    graph.validate()?;
    debug!("dialogs: {:?}", graph.dialog_ids().collect::<Vec<_>>());

    let storage = Arc::new(InMemoryScopeStorage::with_config(config.storage.clone()));
    let manager = DialogManager::new(graph, storage).with_config(config.clone());
    let renderer = DictionaryTemplateRenderer::from_config(&config, manager.evaluator().clone());
    info!("rendering templates for {}", config.locale);
    let manager = manager.with_renderer(Arc::new(renderer));

    let greeting = Activity::conversation_update(vec![ChannelAccount::new(cli.user.clone())])
        .with_conversation(cli.conversation.clone())
        .with_user(cli.user.clone());
    print_replies(&manager.process_turn(greeting).await?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| DialogError::internal(format!("Failed to read stdin: {}", e)))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let activity = Activity::message(line)
            .with_conversation(cli.conversation.clone())
            .with_user(cli.user.clone());
        match manager.process_turn(activity).await {
            Ok(replies) => print_replies(&replies),
            Err(e) => eprintln!("turn failed: {}", e),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
