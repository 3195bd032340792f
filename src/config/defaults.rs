//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

/// Config file looked up in the working directory when `-C` is not given.
pub const CONFIG_FILE: &str = "kiln.toml";

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn input() -> PathBuf {
        "input".into()
    }

    pub fn output() -> PathBuf {
        "output".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn default_template() -> String {
        "default.html".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn host() -> String {
        "0.0.0.0".into()
    }

    pub const fn port() -> u16 {
        8000
    }

    pub const fn interval_ms() -> u64 {
        1000
    }
}
