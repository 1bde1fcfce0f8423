//! TOML file configuration structures.
//!
//! These structs directly map to the `ojlive.toml` file format.  Every
//! section and key is optional.

use ojlive_core::processors::RankingOrder;
use ojlive_core::session::TransportKind;
use serde::{Deserialize, Serialize};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub channel: ChannelConfig,
    pub leaderboard: LeaderboardConfig,
}

/// Judge backend section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Root URL of the judge backend (e.g. "https://oj.example.com").
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
        }
    }
}

/// Submission event channel section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelConfig {
    /// Seconds to wait for a verdict before giving up.
    pub timeout_secs: u64,
    pub transport: TransportKind,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            transport: TransportKind::Sse,
        }
    }
}

/// Leaderboard poller section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaderboardConfig {
    /// Seconds between refreshes.
    pub interval_secs: u64,
    pub order: RankingOrder,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            interval_secs: 900,
            order: RankingOrder::Server,
        }
    }
}
