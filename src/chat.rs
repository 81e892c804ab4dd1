//! Canned-response chat. This is decorative simulation, implemented
//! literally: the reply is a uniform pick from a fixed list after a fixed
//! delay, with no content analysis. The random source is seedable through
//! the model so tests can pin the selection.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SUPPORT_REPLY_DELAY_MS: u64 = 1_000;
pub const COMMUNITY_REPLY_DELAY_MS: u64 = 1_500;

pub const SUPPORT_SENDER: &str = "Support";
pub const SUPPORT_GREETING: &str = "Hello! How can I help you today?";

pub const SUPPORT_REPLIES: &[&str] = &[
    "I understand. Can you tell me a bit more about your situation?",
    "Your safety is our priority. We're here for you.",
    "Thank you for reaching out. You're not alone in this.",
    "Have you tried sharing your live location with a trusted contact?",
    "If you're in immediate danger, please use the SOS button or call the police.",
    "We can connect you with a local support organisation if you'd like.",
    "Take your time. This chat is confidential.",
    "Is there anything else I can help you with today?",
];

pub const COMMUNITY_REPLIES: &[&str] = &[
    "I completely understand how you feel.",
    "Thank you for sharing that with us.",
    "That's a great perspective!",
    "I've had a similar experience before.",
    "I appreciate you bringing this up.",
    "Let's discuss this more, it's important.",
    "I'm here to support you through this.",
    "That's really insightful, thank you.",
];

/// Display names for synthetic community replies; picked independently of
/// the reply text.
pub const COMMUNITY_ROSTER: &[&str] = &[
    "Sarah",
    "Jessica",
    "Emily",
    "Charlotte",
    "Zoe",
    "Olivia",
    "Sophia",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatChannel {
    Support,
    Community,
}

impl ChatChannel {
    #[must_use]
    pub const fn reply_delay_ms(self) -> u64 {
        match self {
            Self::Support => SUPPORT_REPLY_DELAY_MS,
            Self::Community => COMMUNITY_REPLY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub body: String,
    pub timestamp_ms: u64,
    pub from_me: bool,
}

impl ChatMessage {
    #[must_use]
    pub fn new(sender: &str, body: &str, timestamp_ms: u64, from_me: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: sender.to_string(),
            body: body.to_string(),
            timestamp_ms,
            from_me,
        }
    }
}

/// Uniform pick, advancing the caller's seed state so consecutive picks
/// differ but a fixed starting seed yields a fixed sequence.
#[must_use]
pub fn pick<'a>(state: &mut u64, items: &[&'a str]) -> &'a str {
    debug_assert!(!items.is_empty());
    let mut rng = SmallRng::seed_from_u64(*state);
    let index = rng.gen_range(0..items.len());
    *state = rng.gen();
    items[index]
}

/// The community channel opens with a few seeded messages, oldest first.
#[must_use]
pub fn community_seed(now_ms: u64) -> Vec<ChatMessage> {
    const MINUTE_MS: u64 = 60_000;
    vec![
        ChatMessage::new(
            "EmpowerHer",
            "Welcome to the community chat! This is a safe space to connect \
             with others. Please be respectful and supportive.",
            now_ms.saturating_sub(30 * MINUTE_MS),
            false,
        ),
        ChatMessage::new(
            "Sarah",
            "Hello everyone! I just joined this platform and I'm looking \
             forward to connecting with you all.",
            now_ms.saturating_sub(20 * MINUTE_MS),
            false,
        ),
        ChatMessage::new(
            "Jessica",
            "Welcome Sarah! This community has been incredibly supportive for me.",
            now_ms.saturating_sub(15 * MINUTE_MS),
            false,
        ),
        ChatMessage::new(
            "Emily",
            "Has anyone tried the new safety tracking feature? It's been so \
             helpful when I'm walking home late.",
            now_ms.saturating_sub(10 * MINUTE_MS),
            false,
        ),
    ]
}
