//! Routing of raw updates to engine calls.

use std::fmt;

use chrono::{DateTime, Utc};
use promo_engine::MembershipEvent;

use crate::telegram::{Chat, Update, User};

/// Bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Check,
}

/// Parse a command from message text.
///
/// Accepts `/start`, `/check` and their `@botname` forms, followed by any
/// arguments. A suffix naming a different bot is rejected when `bot_username`
/// is known.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let head = text.split_whitespace().next()?.strip_prefix('/')?;
    let (name, target) = match head.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (head, None),
    };
    if let (Some(target), Some(me)) = (target, bot_username)
        && !target.eq_ignore_ascii_case(me)
    {
        return None;
    }
    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "check" => Some(Command::Check),
        _ => None,
    }
}

/// The channel whose membership events are tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Public username, without the `@`.
    Username(String),
    Id(i64),
}

impl ChannelRef {
    /// Parse `@name` or a numeric chat id. A bare name is taken as a username.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Username(raw.trim_start_matches('@').to_string()),
        }
    }

    pub fn matches(&self, chat: &Chat) -> bool {
        match self {
            Self::Id(id) => chat.id == *id,
            Self::Username(name) => chat
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(name)),
        }
    }

    /// Public link for username channels.
    pub fn link(&self) -> Option<String> {
        match self {
            Self::Username(name) => Some(format!("https://t.me/{name}")),
            Self::Id(_) => None,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(name) => write!(f, "@{name}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// What to do with one update.
#[derive(Debug)]
pub enum Route {
    Command {
        chat_id: i64,
        user: User,
        command: Command,
    },
    Membership(MembershipEvent),
    Ignore,
}

/// Route an update. Messages from bots and membership changes in other chats
/// are ignored.
pub fn route(update: Update, channel: &ChannelRef, bot_username: Option<&str>) -> Route {
    if let Some(message) = update.message {
        let Some(user) = message.from.filter(|u| !u.is_bot) else {
            return Route::Ignore;
        };
        let Some(command) = message
            .text
            .as_deref()
            .and_then(|text| parse_command(text, bot_username))
        else {
            return Route::Ignore;
        };
        return Route::Command {
            chat_id: message.chat.id,
            user,
            command,
        };
    }

    if let Some(change) = update.chat_member {
        if !channel.matches(&change.chat) {
            return Route::Ignore;
        }
        let user = change.new_chat_member.user;
        return Route::Membership(MembershipEvent {
            user_id: user.user_id(),
            display_name: user.display_name().map(str::to_string),
            old_status: change.old_chat_member.status,
            new_status: change.new_chat_member.status,
            at: DateTime::from_timestamp(change.date, 0).unwrap_or_else(Utc::now),
        });
    }

    Route::Ignore
}

#[cfg(test)]
mod tests {
    use promo_engine::MembershipStatus;
    use promo_store::UserId;

    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start", None), Some(Command::Start));
        assert_eq!(parse_command("/start ref_42", None), Some(Command::Start));
        assert_eq!(parse_command("  /check  ", None), Some(Command::Check));
        assert_eq!(parse_command("/CHECK", None), Some(Command::Check));
        assert_eq!(
            parse_command("/check@PromoBot", Some("promobot")),
            Some(Command::Check)
        );
        assert_eq!(parse_command("/check@OtherBot", Some("promobot")), None);
        assert_eq!(parse_command("/check@anything", None), Some(Command::Check));
        assert_eq!(parse_command("/help", None), None);
        assert_eq!(parse_command("check", None), None);
        assert_eq!(parse_command("", None), None);
    }

    #[test]
    fn test_channel_ref() {
        assert_eq!(
            ChannelRef::parse("@Shop"),
            ChannelRef::Username("Shop".into())
        );
        assert_eq!(
            ChannelRef::parse("-1001234567890"),
            ChannelRef::Id(-1001234567890)
        );
        assert_eq!(
            ChannelRef::parse("@shop").link().as_deref(),
            Some("https://t.me/shop")
        );
        assert_eq!(ChannelRef::parse("-100").link(), None);
    }

    #[test]
    fn test_route_command() {
        let u = update(
            r#"{"update_id":1,"message":{"message_id":7,"chat":{"id":42,"type":"private"},
                "from":{"id":42,"is_bot":false,"first_name":"Ann","username":"ann"},"text":"/check"}}"#,
        );
        match route(u, &ChannelRef::parse("@shop"), None) {
            Route::Command {
                chat_id,
                user,
                command,
            } => {
                assert_eq!(chat_id, 42);
                assert_eq!(user.user_id(), UserId(42));
                assert_eq!(command, Command::Check);
            }
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn test_route_ignores_plain_text_and_bots() {
        let plain = update(
            r#"{"update_id":1,"message":{"message_id":7,"chat":{"id":42,"type":"private"},
                "from":{"id":42,"first_name":"Ann"},"text":"hello"}}"#,
        );
        assert!(matches!(
            route(plain, &ChannelRef::parse("@shop"), None),
            Route::Ignore
        ));

        let bot = update(
            r#"{"update_id":2,"message":{"message_id":8,"chat":{"id":42,"type":"group"},
                "from":{"id":9,"is_bot":true,"first_name":"B"},"text":"/check"}}"#,
        );
        assert!(matches!(
            route(bot, &ChannelRef::parse("@shop"), None),
            Route::Ignore
        ));
    }

    const JOIN: &str = r#"{"update_id":3,"chat_member":{
        "chat":{"id":-100500,"type":"channel","username":"shop"},
        "from":{"id":42,"first_name":"Ann"},
        "date":1740830400,
        "old_chat_member":{"status":"left","user":{"id":42,"first_name":"Ann","username":"ann"}},
        "new_chat_member":{"status":"member","user":{"id":42,"first_name":"Ann","username":"ann"}}}}"#;

    #[test]
    fn test_route_membership() {
        match route(update(JOIN), &ChannelRef::parse("@Shop"), None) {
            Route::Membership(event) => {
                assert_eq!(event.user_id, UserId(42));
                assert_eq!(event.display_name.as_deref(), Some("ann"));
                assert_eq!(event.old_status, MembershipStatus::Left);
                assert_eq!(event.new_status, MembershipStatus::Member);
                assert_eq!(event.at.timestamp(), 1_740_830_400);
                assert!(event.is_join());
            }
            other => panic!("unexpected route: {other:?}"),
        }
        assert!(matches!(
            route(update(JOIN), &ChannelRef::Id(-100500), None),
            Route::Membership(_)
        ));
    }

    #[test]
    fn test_route_membership_other_chat() {
        assert!(matches!(
            route(update(JOIN), &ChannelRef::parse("@elsewhere"), None),
            Route::Ignore
        ));
    }
}
