pub mod types;
pub mod client;

pub use types::{latest_activity, Channel, LatestMessage};
pub use client::{BotIdentity, SlackClient};
