//! Telegram conversation: state machine, rendering, and the polling server.

pub mod fields;
pub mod format;
pub mod keyboards;
pub mod server;
pub mod service;
pub mod state;

pub use fields::{FieldKind, FieldValue};
pub use server::BotServer;
pub use service::{BotService, ServiceOptions};
pub use state::{transition, BotCommand, CallbackAction, ConversationState, Effect, Event};
