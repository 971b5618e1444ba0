//! Telegram Bot API: wire types and a blocking client.

pub mod api;
pub mod types;

pub use api::{split_message, BotApi, Messenger, MAX_MESSAGE_CHARS};
pub use types::{
    BotCommandInfo, CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    Update, User,
};
