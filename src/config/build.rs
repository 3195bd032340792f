//! `[build]` section configuration.
//!
//! Contains the three site directories and the fallback template name.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in kiln.toml - site directories.
///
/// # Example
/// ```toml
/// [build]
/// input = "content"
/// output = "public"
/// templates = "layouts"
/// default_template = "page.html"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Content directory (markdown and static files).
    #[serde(default = "defaults::build::input")]
    #[educe(Default = defaults::build::input())]
    pub input: PathBuf,

    /// Output directory. Deleted and recreated on every build.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Templates directory.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Template used by pages whose front matter names none.
    #[serde(default = "defaults::build::default_template")]
    #[educe(Default = defaults::build::default_template())]
    pub default_template: String,
}
