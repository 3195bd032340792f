//! `[serve]` section configuration.
//!
//! Contains development server and change watcher settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// Change detection backend for serve mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WatcherKind {
    /// Walk the watched trees every tick and compare modification times (default).
    #[default]
    Poll,
    /// Use OS file events, still rebuilding on the tick schedule.
    Notify,
}

/// `[serve]` section in kiln.toml - development server settings.
///
/// # Example
/// ```toml
/// [serve]
/// host = "127.0.0.1"
/// port = 3000
/// interval_ms = 500
/// watcher = "notify"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Address to bind.
    /// - `0.0.0.0` (default): all interfaces
    /// - `127.0.0.1`: localhost only
    #[serde(default = "defaults::serve::host")]
    #[educe(Default = defaults::serve::host())]
    pub host: String,

    /// HTTP port number (default: 8000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Watcher tick, also the minimum spacing between two rebuilds.
    #[serde(default = "defaults::serve::interval_ms")]
    #[educe(Default = defaults::serve::interval_ms())]
    pub interval_ms: u64,

    #[serde(default)]
    pub watcher: WatcherKind,
}
