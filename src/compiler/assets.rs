use super::WorkItem;
use crate::log;
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Copy a non-markdown file to the same relative path under `output`.
///
/// Returns the written path.
pub fn copy_asset(item: &WorkItem, output: &Path) -> Result<PathBuf> {
    let dest = output.join(&item.relative);
    log!("assets"; "{}", item.relative.display());

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(&item.source, &dest).with_context(|| {
        format!("Failed to copy {} to {}", item.source.display(), dest.display())
    })?;

    Ok(dest)
}
