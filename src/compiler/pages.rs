use super::{
    WorkItem,
    frontmatter::split_front_matter,
    markdown::markdown_to_html,
    template::{RenderOutcome, TemplateRenderer},
};
use crate::{log, utils::path::output_path};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Render one markdown file into the output tree.
///
/// A template failure is not an error: the page is still written, wrapped in
/// the fallback page, and the reason is logged. Only unreadable sources and
/// unwritable destinations fail.
///
/// Returns the written path.
pub fn render_page(item: &WorkItem, renderer: &TemplateRenderer<'_>, output: &Path) -> Result<PathBuf> {
    log!("render"; "{}", item.relative.display());

    let raw = fs::read(&item.source)
        .with_context(|| format!("Failed to read {}", item.source.display()))?;
    let text = String::from_utf8_lossy(&raw);

    let (front_matter, body) = split_front_matter(&text);
    let content = markdown_to_html(body);

    log!("template"; "{} ({} bytes of markdown)", renderer.template_name(&front_matter), body.len());
    log!("template"; "available: {}", renderer.available().join(", "));

    let html = match renderer.render(&front_matter, &content) {
        RenderOutcome::Rendered(html) => html,
        RenderOutcome::Fallback(html, reason) => {
            let reason = anyhow::Error::new(reason);
            log!("warn"; "{}: {reason:#}, using bare page", item.relative.display());
            html
        }
    };

    let dest = output.join(output_path(&item.relative));
    write_page(&dest, &html)?;
    log!("render"; "wrote {}", dest.display());

    Ok(dest)
}

fn write_page(dest: &Path, html: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(dest, html).with_context(|| format!("Failed to write {}", dest.display()))
}
