//! Front matter extraction.
//!
//! A markdown file may start with a YAML block between two `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! template: post.html
//! tags: [rust, web]
//! cover: /img/hello.png
//! ---
//! # Body starts here
//! ```
//!
//! Known keys bind to [`FrontMatter`] fields; every other key is kept in
//! [`FrontMatter::custom`] and handed to the template as-is.

use crate::log;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Delimiter line opening and closing the block
const DELIMITER: &str = "---";

/// Page metadata decoded from the front matter block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: String,
    /// Template file name, relative to the templates directory
    pub template: String,
    pub description: String,
    pub date: String,
    pub tags: Vec<String>,
    /// Every key not listed above
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_yaml::Value>,
}

/// Split raw file text into front matter and markdown body.
///
/// - No opening `---` line: default metadata, the whole text is the body.
/// - Opening line but no closing `---` line: treated as having no front
///   matter at all, the whole text (delimiter included) is the body.
/// - Block that fails to decode: logged, default metadata, and the body is
///   still everything after the closing delimiter.
pub fn split_front_matter(content: &str) -> (FrontMatter, &str) {
    let Some(rest) = strip_opening_delimiter(content) else {
        return (FrontMatter::default(), content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == DELIMITER {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let front_matter = decode(block).unwrap_or_else(|e| {
                log!("warn"; "invalid front matter: {e}");
                FrontMatter::default()
            });
            return (front_matter, body);
        }
        offset += line.len();
    }

    (FrontMatter::default(), content)
}

fn strip_opening_delimiter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(DELIMITER)?;
    rest.strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
}

fn decode(block: &str) -> Result<FrontMatter, serde_yaml::Error> {
    // An empty block is valid and means "no metadata"
    if block.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(block)
}
