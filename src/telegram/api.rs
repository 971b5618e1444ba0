//! Telegram Bot API client (blocking, long polling).

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::types::{ApiResponse, BotCommandInfo, InlineKeyboardMarkup, Update};
use crate::error::{BotError, Result};

/// Telegram's hard limit on message text length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Outgoing side of the bot, abstracted for tests.
pub trait Messenger {
    fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboardMarkup>) -> Result<()>;

    fn send_document(&self, chat_id: i64, file_name: &str, bytes: Vec<u8>, caption: Option<&str>) -> Result<()>;

    fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboardMarkup>) -> Result<()> {
        (**self).send_text(chat_id, text, keyboard)
    }

    fn send_document(&self, chat_id: i64, file_name: &str, bytes: Vec<u8>, caption: Option<&str>) -> Result<()> {
        (**self).send_document(chat_id, file_name, bytes, caption)
    }

    fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        (**self).answer_callback(callback_id, text)
    }
}

pub struct BotApi {
    client: Client,
    base_url: String,
}

impl BotApi {
    /// `poll_timeout` is the long-poll duration; the HTTP timeout is set above it.
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{}", token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let resp: ApiResponse<T> = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()?
            .json()?;
        unwrap_response(method, resp)
    }

    /// Long-poll for updates newer than `offset`.
    pub fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"],
            }),
        )
    }

    pub fn set_my_commands(&self, commands: &[BotCommandInfo]) -> Result<()> {
        let _: bool = self.call("setMyCommands", &json!({ "commands": commands }))?;
        Ok(())
    }

    fn send_one(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboardMarkup>) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(kb)?;
        }
        let _: serde_json::Value = self.call("sendMessage", &body)?;
        Ok(())
    }
}

impl Messenger for BotApi {
    /// Long texts go out in several messages; the keyboard rides on the last one.
    fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboardMarkup>) -> Result<()> {
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.iter().enumerate() {
            let kb = if i == last { keyboard } else { None };
            self.send_one(chat_id, chunk, kb)?;
        }
        Ok(())
    }

    fn send_document(&self, chat_id: i64, file_name: &str, bytes: Vec<u8>, caption: Option<&str>) -> Result<()> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(c) = caption {
            form = form.text("caption", c.to_string());
        }
        let resp: ApiResponse<serde_json::Value> = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()?
            .json()?;
        unwrap_response("sendDocument", resp).map(|_| ())
    }

    fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(t) = text {
            body["text"] = json!(t);
        }
        let _: bool = self.call("answerCallbackQuery", &body)?;
        Ok(())
    }
}

fn unwrap_response<T>(method: &str, resp: ApiResponse<T>) -> Result<T> {
    match (resp.ok, resp.result) {
        (true, Some(result)) => Ok(result),
        (true, None) => Err(BotError::Telegram(format!("{}: empty result", method))),
        (false, _) => Err(BotError::Telegram(format!(
            "{} failed ({}): {}",
            method,
            resp.error_code.unwrap_or(0),
            resp.description.unwrap_or_else(|| "no description".to_string())
        ))),
    }
}

/// Split `text` into chunks of at most `max_chars`, preferring line breaks.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            // A single oversized line is hard-wrapped
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                let piece: String = piece.iter().collect();
                if piece.chars().count() == max_chars {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_single_chunk() {
        assert_eq!(split_message("привет", 10), vec!["привет".to_string()]);
    }

    #[test]
    fn test_split_on_lines() {
        let text = "aaaa\nbbbb\ncccc\n";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]);
    }

    #[test]
    fn test_split_counts_chars_not_bytes() {
        let text = "ааааа\nббббб\n";
        assert_eq!(split_message(text, 12).len(), 1);
        assert_eq!(split_message(text, 6).len(), 2);
    }

    #[test]
    fn test_oversized_line_wrapped() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_unwrap_response_error() {
        let resp: ApiResponse<bool> = ApiResponse {
            ok: false,
            result: None,
            description: Some("Forbidden: bot was blocked by the user".to_string()),
            error_code: Some(403),
        };
        let err = unwrap_response("sendMessage", resp).unwrap_err();
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn test_method_url() {
        let api = BotApi::new("123:abc", Duration::from_secs(30)).unwrap();
        assert_eq!(api.method_url("getMe"), "https://api.telegram.org/bot123:abc/getMe");
    }
}
