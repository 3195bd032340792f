//! Heading anchor slugification.
//!
//! Converts heading text to URL-fragment-safe ids and keeps them unique
//! within a page.

use deunicode::deunicode;
use rustc_hash::FxHashMap;

/// Id used when a heading has no sluggable text (e.g. only punctuation)
const EMPTY_SLUG: &str = "heading";

/// Convert text to a fragment id.
///
/// Non-ASCII text is transliterated, ASCII letters are lowercased, and every
/// run of other characters collapses into a single `-`. Underscores survive.
///
/// `"Hello, World!"` → `"hello-world"`, `"你好"` → `"ni-hao"`
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Hands out unique heading ids for one page.
///
/// Repeated headings get numeric suffixes: `intro`, `intro-1`, `intro-2`.
#[derive(Debug, Default)]
pub struct HeadingIds {
    seen: FxHashMap<String, usize>,
}

impl HeadingIds {
    /// Mark an explicitly written id (`# Title {#id}`) as taken.
    pub fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_owned()).or_insert(0);
    }

    /// Derive a unique id from heading text.
    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        let base = if base.is_empty() {
            EMPTY_SLUG.to_owned()
        } else {
            base
        };

        let Some(&count) = self.seen.get(&base) else {
            self.seen.insert(base.clone(), 0);
            return base;
        };

        let mut n = count;
        let id = loop {
            n += 1;
            let candidate = format!("{base}-{n}");
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
        };
        self.seen.insert(base, n);
        self.seen.insert(id.clone(), 0);
        id
    }
}
