//! Path classification and output path mapping.
//!
//! # Path Mapping Examples
//!
//! | Source (relative)   | Output (relative)        |
//! |---------------------|--------------------------|
//! | `index.md`          | `index.html`             |
//! | `blog/index.md`     | `blog/index.html`        |
//! | `blog/post.md`      | `blog/post/index.html`   |
//! | `about.markdown`    | `about/index.html`       |
//! | `css/site.css`      | `css/site.css`           |

use std::{
    env,
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

/// Extensions routed to the markdown renderer (compared case-insensitively)
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mkd", "mdown"];

/// Editor scratch files the watcher never reacts to
pub const TEMP_SUFFIX: &str = ".tmp";

/// Check whether a path has one of the markdown extensions.
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
}

/// Dotfiles and dot-directories are never built nor watched.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.ends_with(TEMP_SUFFIX))
}

/// Check whether any component of `path` below `root` is hidden.
///
/// Paths outside `root` are checked component by component as-is.
pub fn has_hidden_component(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| matches!(c, Component::Normal(name) if is_hidden(name)))
}

/// Map a path relative to the input root to its location under the output root.
///
/// Markdown files become clean URLs: `name.md` → `name/index.html`, except
/// `index.md` which becomes `index.html` in place. Everything else keeps its
/// relative path unchanged.
pub fn output_path(relative: &Path) -> PathBuf {
    if !is_markdown(relative) {
        return relative.to_path_buf();
    }

    let parent = relative.parent().unwrap_or(Path::new(""));
    match relative.file_stem() {
        Some(stem) if stem == "index" => parent.join("index.html"),
        Some(stem) => parent.join(stem).join("index.html"),
        None => parent.join("index.html"),
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markdown_extensions() {
        assert!(is_markdown(Path::new("post.md")));
        assert!(is_markdown(Path::new("post.markdown")));
        assert!(is_markdown(Path::new("post.mkd")));
        assert!(is_markdown(Path::new("post.mdown")));
        assert!(is_markdown(Path::new("POST.MD")));
        assert!(is_markdown(Path::new("dir/Notes.Markdown")));
    }

    #[test]
    fn test_is_markdown_rejects_others() {
        assert!(!is_markdown(Path::new("style.css")));
        assert!(!is_markdown(Path::new("README")));
        assert!(!is_markdown(Path::new("archive.md.gz")));
        assert!(!is_markdown(Path::new(".md")));
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(OsStr::new(".git")));
        assert!(is_hidden(OsStr::new(".DS_Store")));
        assert!(!is_hidden(OsStr::new("index.md")));
        assert!(!is_hidden(OsStr::new("a.b")));
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("/site/input/post.md.tmp")));
        assert!(!is_temp_file(Path::new("/site/input/tmp/post.md")));
    }

    #[test]
    fn test_has_hidden_component() {
        let root = Path::new("/site/input");
        assert!(has_hidden_component(Path::new("/site/input/.git/HEAD"), root));
        assert!(has_hidden_component(Path::new("/site/input/blog/.draft.md"), root));
        assert!(!has_hidden_component(Path::new("/site/input/blog/post.md"), root));
        // hidden parents of the root itself do not count
        assert!(!has_hidden_component(
            Path::new("/home/.sites/input/post.md"),
            Path::new("/home/.sites/input")
        ));
    }

    #[test]
    fn test_output_path_clean_url() {
        assert_eq!(
            output_path(Path::new("blog/post.md")),
            PathBuf::from("blog/post/index.html")
        );
        assert_eq!(
            output_path(Path::new("about.markdown")),
            PathBuf::from("about/index.html")
        );
    }

    #[test]
    fn test_output_path_index() {
        assert_eq!(output_path(Path::new("index.md")), PathBuf::from("index.html"));
        assert_eq!(
            output_path(Path::new("blog/index.md")),
            PathBuf::from("blog/index.html")
        );
        assert_eq!(
            output_path(Path::new("docs/index.mkd")),
            PathBuf::from("docs/index.html")
        );
    }

    #[test]
    fn test_output_path_assets_unchanged() {
        assert_eq!(
            output_path(Path::new("css/site.css")),
            PathBuf::from("css/site.css")
        );
        assert_eq!(output_path(Path::new("robots.txt")), PathBuf::from("robots.txt"));
        assert_eq!(output_path(Path::new("LICENSE")), PathBuf::from("LICENSE"));
    }

    #[test]
    fn test_output_path_keeps_inner_dots() {
        assert_eq!(
            output_path(Path::new("notes/v1.2.md")),
            PathBuf::from("notes/v1.2/index.html")
        );
    }

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/definitely/not/here");
        assert_eq!(normalize_path(path), PathBuf::from("/definitely/not/here"));
        assert!(normalize_path(Path::new("relative/dir")).is_absolute());
    }
}
