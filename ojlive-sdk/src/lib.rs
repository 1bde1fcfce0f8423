//! Shared types and clients for the ojlive judge frontend.
//!
//! - [`objects`]: wire types for submissions, result updates and rankings.
//! - [`auth`]: bearer token carried by every request.
//! - [`transport`]: the streaming-transport capability used for result
//!   delivery.
//! - `client` (feature `client`): typed HTTP client plus the SSE and
//!   WebSocket transports.

pub mod auth;
#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod transport;
