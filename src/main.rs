//! chatkeep CLI binary entry point.

use std::sync::Arc;

use chatkeep::cli::{AskArgs, ChatArgs, Cli, Commands};
use chatkeep::config::ChatConfig;
use chatkeep::error::ChatError;
use chatkeep::models::LanguageModel;
use chatkeep::provider::{create_provider, ModelProvider};
use chatkeep::session::ConversationSession;
use chatkeep::store::{ConversationStore, InMemoryStore, PostgrestStore};
use chatkeep::util::http::configure_shared_client;
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    chatkeep::cli::init_tracing();
    let cli = Cli::parse_args();

    let result = match cli.command {
        Commands::Ask(args) => handle_ask(args).await,
        Commands::Chat(args) => handle_chat(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(apply: impl FnOnce(&mut ChatConfig)) -> Result<(ChatConfig, LanguageModel), ChatError> {
    let mut config = ChatConfig::from_env()?;
    apply(&mut config);
    let model: LanguageModel = config.model.parse()?;
    chatkeep::cli::ensure_api_key(&mut config, &model)?;
    configure_shared_client(config.http_timeout);
    Ok((config, model))
}

async fn handle_ask(args: AskArgs) -> Result<(), ChatError> {
    let (config, model) = load_config(|c| args.apply(c))?;
    let reply =
        chatkeep::generation::ask(&model, &config, args.system.as_deref(), args.prompt).await?;
    println!("{reply}");
    Ok(())
}

async fn handle_chat(args: ChatArgs) -> Result<(), ChatError> {
    let (config, model) = load_config(|c| args.apply(c))?;

    let provider: Arc<dyn ModelProvider> = Arc::from(create_provider(&model, &config)?);
    let store: Arc<dyn ConversationStore> = if args.persist {
        Arc::new(PostgrestStore::new(config.require_store()?.postgrest()))
    } else {
        Arc::new(InMemoryStore::new())
    };

    let mut session =
        ConversationSession::open(provider, store, config.session_options(), &config.title)
            .await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    session.run_loop(stdin, &mut stdout).await?;
    Ok(())
}
