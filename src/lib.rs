//! chatkeep: console chat over hosted LLM APIs with durable history.
//!
//! A [`session::ConversationSession`] keeps an ordered transcript for one
//! named conversation in step with a [`store::ConversationStore`] and asks a
//! [`provider::ModelProvider`] for each reply.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatkeep::prelude::*;
//!
//! # async fn example() -> chatkeep::error::Result<()> {
//! let config = ChatConfig::from_env()?;
//! let model: LanguageModel = config.model.parse()?;
//! let provider: Arc<dyn ModelProvider> =
//!     Arc::from(chatkeep::provider::create_provider(&model, &config)?);
//! let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
//!
//! let mut session =
//!     ConversationSession::open(provider, store, config.session_options(), "Demo").await?;
//! let reply = session.take_turn("Do you know what anime is?").await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod store;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
