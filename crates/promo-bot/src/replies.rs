//! Reply text for engine results.

use std::time::Duration;

use promo_engine::{Greeting, Outcome};

/// Builds the one message sent back for each result.
#[derive(Debug, Clone)]
pub struct Replies {
    link: Option<String>,
    window_hours: u64,
}

impl Replies {
    pub fn new(channel_link: Option<String>, window: Duration) -> Self {
        Self {
            link: channel_link,
            window_hours: window.as_secs().div_ceil(3600),
        }
    }

    fn link_line(&self) -> String {
        self.link
            .as_deref()
            .map(|link| format!("\nChannel: {link}"))
            .unwrap_or_default()
    }

    pub fn outcome(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::CodeIssued(code) => format!(
                "You are subscribed, thank you!\n\nYour personal promo code:\n\n{code}\n\n\
                 Show it to a manager when you place an order."
            ),
            Outcome::AlreadyRewarded => "You have already received your personal promo code. \
                 Watch the channel for new offers!"
                .to_string(),
            Outcome::SubscribedNoWindow => {
                "You are already subscribed to the channel. Watch it for offers and discounts!"
                    .to_string()
            }
            Outcome::WindowExpired => format!(
                "Thanks for staying with us! The welcome code is only available within \
                 {} hours of subscribing.",
                self.window_hours
            ),
            Outcome::NotSubscribed => format!(
                "Subscribe to the channel first, then send /check.{}",
                self.link_line()
            ),
        }
    }

    pub fn greeting(&self, greeting: Greeting) -> String {
        match greeting {
            Greeting::Subscribed => {
                "You are already subscribed to the channel. Watch it for offers and discounts!"
                    .to_string()
            }
            Greeting::SubscribedEligible => {
                "You are subscribed. Send /check to get your personal promo code.".to_string()
            }
            Greeting::NotSubscribed => format!(
                "You are not subscribed to the channel yet.{}\n\
                 After subscribing, send /check to get a promo code.",
                self.link_line()
            ),
            Greeting::Lapsed => format!(
                "You were subscribed before, but not any more. \
                 Subscribe again so you don't miss offers.{}",
                self.link_line()
            ),
        }
    }

    /// Sent when the store could not serve the request.
    pub fn unavailable(&self) -> String {
        "Something went wrong on our side. Please try again in a minute.".to_string()
    }
}
