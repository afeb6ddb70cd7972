//! Client for the downstream memory API.
//!
//! Thin transport wrapper: it posts an extracted conversation and
//! reports success or the server's error string. Retry and auth policy
//! belong to the caller, not here.

use crate::models::{ConversationRecord, Message};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SAVE_ENDPOINT: &str = "/api/update_memory_from_chat";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Payload shape the memory API expects.
#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    user_id: &'a str,
    messages: &'a [Message],
    platform: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    status: Option<String>,
    error: Option<String>,
}

pub struct MemoryClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl MemoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// POST an extracted conversation under the given user id.
    pub fn save_conversation(
        &self,
        user_id: &str,
        record: &ConversationRecord,
    ) -> Result<(), String> {
        let url = format!("{}{}", self.base_url, SAVE_ENDPOINT);
        let request = SaveRequest {
            user_id,
            messages: &record.messages,
            platform: &record.platform,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| format!("Memory API request failed: {}", e))?;

        let http_status = response.status();
        let body: SaveResponse = response
            .json()
            .map_err(|e| format!("Memory API returned malformed response: {}", e))?;

        if body.status.as_deref() == Some("success") {
            Ok(())
        } else {
            Err(body
                .error
                .unwrap_or_else(|| format!("Memory API returned {}", http_status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = MemoryClient::new("http://localhost:5000/");
        assert_eq!(client.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_save_request_wire_shape() {
        let messages = vec![
            Message {
                role: Role::User,
                content: "Hello".to_string(),
            },
            Message {
                role: Role::Assistant,
                content: "Hi there".to_string(),
            },
        ];
        let request = SaveRequest {
            user_id: "user_abc",
            messages: &messages,
            platform: "ChatGPT",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["user_id"], "user_abc");
        assert_eq!(json["platform"], "ChatGPT");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hi there");
    }

    #[test]
    fn test_save_response_parses_both_shapes() {
        let ok: SaveResponse = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert_eq!(ok.status.as_deref(), Some("success"));

        let err: SaveResponse =
            serde_json::from_str(r#"{"status": "error", "error": "bad payload"}"#).unwrap();
        assert_eq!(err.error.as_deref(), Some("bad payload"));
    }
}
