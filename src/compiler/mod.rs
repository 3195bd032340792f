//! Page compilation and asset copying.
//!
//! - **frontmatter**: Split the YAML header off a markdown file
//! - **markdown**: Convert the body to an HTML fragment
//! - **template**: Wrap the fragment in a page template
//! - **pages**: Render one markdown file into the output tree
//! - **assets**: Copy everything else byte for byte
//!
//! # Build Flow
//!
//! ```text
//! scan_content() ──┬──► Markdown ──► render_page() ──► name/index.html
//!                  ├──► Asset    ──► copy_asset()  ──► same relative path
//!                  ├──► Directory──► mirrored in the output tree
//!                  └──► Hidden   ──► skipped
//! ```

pub mod assets;
pub mod frontmatter;
pub mod markdown;
pub mod pages;
pub mod template;

use crate::{
    log,
    utils::path::{is_hidden, is_markdown},
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ============================================================================
// Public API
// ============================================================================

pub use assets::copy_asset;
pub use pages::render_page;
pub use template::TemplateRenderer;

// ============================================================================
// Content scanning
// ============================================================================

/// How an input entry ends up in the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Directory,
    Markdown,
    Asset,
    /// Dotfile or dot-directory: never copied or rendered
    Hidden,
}

/// One entry of the input tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: PathBuf,
    /// Path relative to the input root
    pub relative: PathBuf,
    pub kind: ItemKind,
}

/// Classify every entry under `input`, parents before children.
///
/// Hidden entries are reported as [`ItemKind::Hidden`] and hidden directories
/// are not descended into. Unreadable entries are logged and left out.
pub fn scan_content(input: &Path) -> Vec<WorkItem> {
    let mut items = Vec::new();
    let mut walker = WalkDir::new(input).min_depth(1).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log!("error"; "scan failed: {e}");
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(input) else {
            continue;
        };
        let relative = relative.to_path_buf();

        let is_dir = entry.file_type().is_dir();
        let kind = if is_hidden(entry.file_name()) {
            if is_dir {
                walker.skip_current_dir();
            }
            ItemKind::Hidden
        } else if is_dir {
            ItemKind::Directory
        } else if is_markdown(entry.path()) {
            ItemKind::Markdown
        } else {
            ItemKind::Asset
        };

        items.push(WorkItem {
            source: entry.into_path(),
            relative,
            kind,
        });
    }

    items
}
