//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! SiteBuilder::build()          (one build at a time)
//!     │
//!     └── build_site()
//!             │
//!             ├── check input/templates exist
//!             ├── reset output root
//!             ├── scan_content() ──► render_page() / copy_asset()
//!             └── write_robots_txt()
//! ```
//!
//! Every build is a full rebuild from an empty output root, so two builds of
//! the same input produce the same tree.

use crate::{
    compiler::{ItemKind, TemplateRenderer, WorkItem, copy_asset, render_page, scan_content},
    config::SiteConfig,
    log,
};
use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use thiserror::Error;

/// Written when the input tree has no `robots.txt` of its own
pub const DEFAULT_ROBOTS_TXT: &str = "User-agent: *\nAllow: /\nSitemap: sitemap.xml";

const ROBOTS_TXT: &str = "robots.txt";

/// Build preconditions that abort before the output is touched.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("input directory `{}` does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("templates directory `{}` does not exist", .0.display())]
    MissingTemplates(PathBuf),
}

/// Summary of a finished build.
#[derive(Debug, Clone, Copy)]
pub struct BuildResult {
    /// Files rendered or copied, directories excluded
    pub processed: usize,
    pub elapsed: Duration,
}

/// Runs builds for one site, never two at once.
///
/// Shared between the initial build and the watcher thread.
pub struct SiteBuilder {
    config: &'static SiteConfig,
    lock: Mutex<()>,
}

impl SiteBuilder {
    pub const fn new(config: &'static SiteConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub const fn config(&self) -> &'static SiteConfig {
        self.config
    }

    /// Build the site, waiting for any build already in progress.
    pub fn build(&self) -> Result<BuildResult> {
        let _guard = self.lock.lock();
        build_site(self.config)
    }
}

/// Build the whole site from scratch.
///
/// Only missing input or templates directories and an output root that
/// cannot be reset are errors. A file that fails to render or copy is logged
/// and skipped, and the rest of the tree is still processed.
pub fn build_site(config: &SiteConfig) -> Result<BuildResult> {
    let start = Instant::now();
    let build = &config.build;

    if let Some(path) = &config.config_path {
        log!("build"; "config: {}", path.display());
    }
    log!("build"; "input: {}", build.input.display());
    log!("build"; "output: {}", build.output.display());
    log!("build"; "templates: {}", build.templates.display());

    if !build.input.is_dir() {
        bail!(BuildError::MissingInput(build.input.clone()));
    }
    if !build.templates.is_dir() {
        bail!(BuildError::MissingTemplates(build.templates.clone()));
    }

    reset_output(&build.output)?;

    let items = scan_content(&build.input);
    for item in &items {
        match item.kind {
            ItemKind::Markdown | ItemKind::Asset => log!("scan"; "found {}", item.relative.display()),
            ItemKind::Hidden => log!("scan"; "skipping hidden {}", item.relative.display()),
            ItemKind::Directory => {}
        }
    }

    let renderer = TemplateRenderer::new(&build.templates, &build.default_template);
    let processed = items
        .iter()
        .filter(|item| process_item(item, &renderer, &build.output))
        .count();

    write_robots_txt(&build.input, &build.output);

    let result = BuildResult {
        processed,
        elapsed: start.elapsed(),
    };
    log!("build"; "processed {} files in {:.2} seconds", result.processed, result.elapsed.as_secs_f64());
    Ok(result)
}

/// Delete the output root and recreate it empty.
fn reset_output(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Place one item in the output tree. Returns true for a processed file.
fn process_item(item: &WorkItem, renderer: &TemplateRenderer<'_>, output: &Path) -> bool {
    let result = match item.kind {
        ItemKind::Directory => {
            let dir = output.join(&item.relative);
            if let Err(e) = fs::create_dir_all(&dir) {
                log!("error"; "{}: {e}", dir.display());
            }
            return false;
        }
        ItemKind::Hidden => return false,
        ItemKind::Markdown => render_page(item, renderer, output),
        ItemKind::Asset => copy_asset(item, output),
    };

    match result {
        Ok(_) => true,
        Err(e) => {
            log!("error"; "{}: {e:#}", item.relative.display());
            false
        }
    }
}

/// Copy `robots.txt` from the input root, or write the default one.
fn write_robots_txt(input: &Path, output: &Path) {
    let source = input.join(ROBOTS_TXT);
    let dest = output.join(ROBOTS_TXT);

    if source.is_file() {
        match fs::copy(&source, &dest) {
            Ok(_) => log!("robots"; "copied existing robots.txt"),
            Err(e) => log!("error"; "failed to copy robots.txt: {e}"),
        }
    } else {
        match fs::write(&dest, DEFAULT_ROBOTS_TXT) {
            Ok(()) => log!("robots"; "generated default robots.txt"),
            Err(e) => log!("error"; "failed to write robots.txt: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    struct Site {
        _dir: TempDir,
        config: SiteConfig,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = SiteConfig::default();
            config.build.input = dir.path().join("input");
            config.build.output = dir.path().join("output");
            config.build.templates = dir.path().join("templates");
            fs::create_dir_all(&config.build.input).unwrap();
            fs::create_dir_all(&config.build.templates).unwrap();
            fs::write(
                config.build.templates.join("default.html"),
                "<title>{{.Title}}</title>{{.Content}}",
            )
            .unwrap();
            Self { _dir: dir, config }
        }

        fn input(&self, relative: &str, content: &str) {
            let path = self.config.build.input.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn output(&self, relative: &str) -> PathBuf {
            self.config.build.output.join(relative)
        }

        fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.output(relative)).unwrap()
        }

        /// Every file under the output root with its contents.
        fn tree(&self) -> BTreeMap<PathBuf, Vec<u8>> {
            WalkDir::new(&self.config.build.output)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| {
                    let rel = e.path().strip_prefix(&self.config.build.output).unwrap().to_path_buf();
                    (rel, fs::read(e.path()).unwrap())
                })
                .collect()
        }
    }

    #[test]
    fn test_clean_urls() {
        let site = Site::new();
        site.input("index.md", "# Home");
        site.input("about.md", "# About");
        site.input("blog/index.md", "# Blog");
        site.input("blog/post.md", "---\ntitle: Post\n---\n# Post");
        site.input("css/site.css", "body {}");

        let result = build_site(&site.config).unwrap();

        assert_eq!(result.processed, 5);
        assert!(site.output("index.html").is_file());
        assert!(site.output("about/index.html").is_file());
        assert!(site.output("blog/index.html").is_file());
        assert_eq!(
            site.read("blog/post/index.html"),
            "<title>Post</title><h1 id=\"post\">Post</h1>\n"
        );
        assert_eq!(site.read("css/site.css"), "body {}");
    }

    #[test]
    fn test_builds_are_deterministic() {
        let site = Site::new();
        site.input("index.md", "---\ntitle: Home\ntags: [a]\n---\n# Home\n\n## Home\n");
        site.input("docs/guide.markdown", "| a |\n|---|\n| 1 |\n");
        site.input("img/logo.svg", "<svg/>");

        build_site(&site.config).unwrap();
        let first = site.tree();
        build_site(&site.config).unwrap();

        assert_eq!(first, site.tree());
    }

    #[test]
    fn test_output_is_reset() {
        let site = Site::new();
        site.input("index.md", "# Home");
        fs::create_dir_all(site.output("stale")).unwrap();
        fs::write(site.output("stale/page.html"), "old").unwrap();

        build_site(&site.config).unwrap();

        assert!(!site.output("stale").exists());
        assert!(site.output("index.html").is_file());
    }

    #[test]
    fn test_no_hidden_names_in_output() {
        let site = Site::new();
        site.input("index.md", "# Home");
        site.input(".env", "SECRET=1");
        site.input(".git/HEAD", "ref: main");
        site.input("blog/.draft.md", "# Draft");
        site.input(".hidden/page.md", "# Hidden");

        build_site(&site.config).unwrap();

        for path in site.tree().keys() {
            assert!(
                !path.components().any(|c| c.as_os_str().to_string_lossy().starts_with('.')),
                "hidden entry in output: {}",
                path.display()
            );
        }
        assert!(site.output("blog").is_dir());
    }

    #[test]
    fn test_robots_txt_copied_verbatim() {
        let site = Site::new();
        let robots = "User-agent: *\nDisallow: /private\n";
        site.input("robots.txt", robots);

        build_site(&site.config).unwrap();

        assert_eq!(site.read("robots.txt"), robots);
    }

    #[test]
    fn test_robots_txt_default() {
        let site = Site::new();
        site.input("index.md", "# Home");

        build_site(&site.config).unwrap();

        assert_eq!(
            site.read("robots.txt"),
            "User-agent: *\nAllow: /\nSitemap: sitemap.xml"
        );
    }

    #[test]
    fn test_missing_template_falls_back_and_continues() {
        let site = Site::new();
        site.input("a.md", "---\ntemplate: nope.html\ntitle: A\n---\nalpha\n");
        site.input("b.md", "beta\n");

        let result = build_site(&site.config).unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(site.read("a/index.html"), "<html><body><p>alpha</p>\n</body></html>");
        assert_eq!(site.read("b/index.html"), "<title></title><p>beta</p>\n");
    }

    #[test]
    fn test_missing_input_leaves_output_untouched() {
        let site = Site::new();
        fs::remove_dir_all(&site.config.build.input).unwrap();
        fs::create_dir_all(&site.config.build.output).unwrap();
        fs::write(site.output("keep.html"), "keep").unwrap();

        let err = build_site(&site.config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingInput(_))
        ));
        assert_eq!(site.read("keep.html"), "keep");
    }

    #[test]
    fn test_missing_templates() {
        let site = Site::new();
        fs::remove_dir_all(&site.config.build.templates).unwrap();

        let err = build_site(&site.config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingTemplates(_))
        ));
        assert!(!site.config.build.output.exists());
    }

    #[test]
    fn test_site_builder() {
        let site = Site::new();
        site.input("index.md", "# Home");
        let config: &'static SiteConfig = Box::leak(Box::new(site.config.clone()));
        let builder = SiteBuilder::new(config);

        assert_eq!(builder.build().unwrap().processed, 1);
        assert_eq!(builder.config().build.output, site.config.build.output);
    }
}
