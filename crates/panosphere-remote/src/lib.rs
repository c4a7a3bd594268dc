//! panosphere-remote — network collaborators for the stitching core.
//!
//! Two clients wrap third-party generation services behind the same
//! submit/poll/download job protocol:
//!
//! - [`StagingClient`] re-styles a panorama from a text prompt (image host
//!   upload → image-to-image task → poll → download).
//! - [`WorldGenClient`] turns a panorama into a navigable 3D world (media
//!   asset upload → world generation job → poll → asset manifest).
//!
//! Neither client does algorithmic work; they are orchestration around
//! remote APIs. Both share one polling policy abstraction ([`PollPolicy`])
//! and surface deadline expiry ([`RemoteError::Timeout`]) distinctly from
//! remote job failure ([`RemoteError::JobFailed`]).

mod error;
mod poll;
mod staging;
mod worldgen;

pub use error::RemoteError;
pub use poll::{JobState, PollPolicy};
pub use staging::StagingClient;
pub use worldgen::{WorldGenClient, WorldGenRequest, WorldManifest};
