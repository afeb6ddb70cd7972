//! chatlift — recover AI chat transcripts from saved chat web pages.
//!
//! The page structure is unowned, versioned, and unstable, so the
//! engine layers ranked heuristics instead of trusting one parser:
//! platform detection from the URL, a per-platform chain of extraction
//! steps, a candidate locator with four fallback passes, weak-signal
//! role classification, and UI-chrome sanitization. The result is a
//! normalized transcript or an explicit, typed failure.

pub mod extract;
pub mod locate;
pub mod memory_client;
pub mod models;
pub mod platform;
pub mod role;
pub mod sanitize;
pub mod settings;
pub mod strategy;

pub use extract::{
    extract_conversation, Diagnostics, ExtractionError, ExtractionOutcome, ExtractionResponse,
};
pub use memory_client::MemoryClient;
pub use models::{ConversationRecord, Message, Role};
pub use platform::{detect_platform, PlatformId};
