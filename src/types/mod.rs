//! Core types for chatkeep.

pub mod conversation;
pub mod generation;
pub mod message;

pub use conversation::*;
pub use generation::*;
pub use message::*;
