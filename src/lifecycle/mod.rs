pub mod digest;
pub mod executor;
pub mod reconcile;
pub mod state;

pub use digest::{compose_digest, DigestOptions};
pub use executor::{archive_channels, persisted_warnings, ChannelActions, SlackChannelActions};
pub use reconcile::reconcile;
pub use state::WarningState;
