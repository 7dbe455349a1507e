//! Telegram Bot API client.
//!
//! Only the handful of methods the bot needs: `getMe`, `getUpdates`,
//! `sendMessage` and `getChatMember`. Every call is a JSON POST answered with
//! the `{ok, result, description}` envelope.

use std::time::Duration;

use async_trait::async_trait;
use promo_config::BotConfig;
use promo_engine::{MembershipStatus, OracleError, SubscriptionOracle};
use promo_store::UserId;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::trace;

use crate::error::BotError;

/// Update kinds requested from `getUpdates`.
pub const ALLOWED_UPDATES: [&str; 2] = ["message", "chat_member"];

// ── Wire types ────────────────────────────────────────────────────

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Api {
                code: self.error_code,
                description: self
                    .description
                    .unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    #[inline]
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Label stored with the record: the username, else the first name.
    pub fn display_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(Some(self.first_name.as_str()))
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    /// Unix time of the change.
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: MembershipStatus,
    pub user: User,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

// ── Client ────────────────────────────────────────────────────────

/// Bot API client. Cheap to clone.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base: String,
}

impl TelegramClient {
    /// Create a client for the configured token and API URL.
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.api_url, &config.token))
    }

    /// Create with a custom reqwest [`Client`].
    pub fn with_client(client: Client, api_url: &str, token: &str) -> Self {
        let api_url = api_url.trim_end_matches('/');
        Self {
            client,
            base: format!("{api_url}/bot{token}"),
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        trace!(method, "bot api call");
        let resp = self
            .client
            .post(format!("{}/{method}", self.base))
            .json(body)
            .send()
            .await?;
        // Failed calls still carry the envelope, so decode regardless of status.
        let envelope: ApiResponse<T> = resp.json().await?;
        envelope.into_result()
    }

    /// The bot's own user.
    pub async fn get_me(&self) -> Result<User, BotError> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, BotError> {
        let body = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: &ALLOWED_UPDATES,
        };
        self.call("getUpdates", &body).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let _: Message = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    /// Membership of `user_id` in `chat` (`@name` or numeric id).
    pub async fn get_chat_member(
        &self,
        chat: &str,
        user_id: UserId,
    ) -> Result<ChatMember, BotError> {
        self.call(
            "getChatMember",
            &json!({ "chat_id": chat, "user_id": user_id.0 }),
        )
        .await
    }
}

// Debug implementation (don't leak the token)
impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api = self.base.rsplit_once("/bot").map_or("", |(api, _)| api);
        f.debug_struct("TelegramClient")
            .field("api_url", &api)
            .finish_non_exhaustive()
    }
}

// ── Oracle ────────────────────────────────────────────────────────

/// Subscription oracle backed by `getChatMember`.
#[derive(Debug, Clone)]
pub struct TelegramOracle {
    client: TelegramClient,
}

impl TelegramOracle {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubscriptionOracle for TelegramOracle {
    async fn membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> Result<MembershipStatus, OracleError> {
        self.client
            .get_chat_member(channel, user_id)
            .await
            .map(|member| member.status)
            .map_err(OracleError::unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_ok() {
        let resp: ApiResponse<ChatMember> = serde_json::from_str(
            r#"{"ok":true,"result":{"status":"administrator","user":{"id":5,"is_bot":false,"first_name":"Ann"}}}"#,
        )
        .unwrap();
        let member = resp.into_result().unwrap();
        assert_eq!(member.status, MembershipStatus::Administrator);
        assert_eq!(member.user.user_id(), UserId(5));
    }

    #[test]
    fn test_envelope_error() {
        let resp: ApiResponse<ChatMember> = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: user not found"}"#,
        )
        .unwrap();
        match resp.into_result() {
            Err(BotError::Api { code, description }) => {
                assert_eq!(code, Some(400));
                assert!(description.contains("user not found"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_update_with_unknown_fields() {
        let update: Update = serde_json::from_str(
            r#"{"update_id":10,"edited_message":{"message_id":1},"poll":{}}"#,
        )
        .unwrap();
        assert_eq!(update.update_id, 10);
        assert!(update.message.is_none());
        assert!(update.chat_member.is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut user = User {
            id: 1,
            is_bot: false,
            first_name: "Ann".into(),
            username: Some("ann_s".into()),
        };
        assert_eq!(user.display_name(), Some("ann_s"));
        user.username = None;
        assert_eq!(user.display_name(), Some("Ann"));
        user.first_name.clear();
        assert_eq!(user.display_name(), None);
    }

    #[test]
    fn test_get_updates_body() {
        let body = GetUpdates {
            offset: None,
            timeout: 30,
            allowed_updates: &ALLOWED_UPDATES,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "timeout": 30, "allowed_updates": ["message", "chat_member"] })
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client =
            TelegramClient::with_client(Client::new(), "https://api.telegram.org/", "123:secret");
        let debug = format!("{client:?}");
        assert!(debug.contains("https://api.telegram.org"));
        assert!(!debug.contains("secret"));
    }
}
