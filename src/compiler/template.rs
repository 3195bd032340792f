//! Page templates.
//!
//! Templates are [Tera](https://keats.github.io/tera/) files in the templates
//! directory. Go-style field references are accepted as well, so a template
//! written as `<h1>{{.Title}}</h1>{{.Content}}` works unchanged.
//!
//! # Template Data
//!
//! | Variable      | Source                                  |
//! |---------------|-----------------------------------------|
//! | `Title`       | front matter `title`                    |
//! | `Description` | front matter `description`              |
//! | `Date`        | front matter `date`                     |
//! | `Tags`        | front matter `tags`                     |
//! | `Content`     | rendered markdown, never escaped        |
//! | anything else | custom front matter keys, as written    |
//!
//! A Go-style reference to a name the page does not define renders empty.
//! Values are HTML-escaped in every template whatever its extension, except
//! `Content`, which is always marked `safe` (also after other filters).
//!
//! Templates are read from disk on every render, so edits show up on the
//! next rebuild without restarting.

use super::frontmatter::FrontMatter;
use regex::Regex;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tera::{Context, Tera};
use thiserror::Error;

/// Extensions listed as available templates
const TEMPLATE_EXTENSIONS: &[&str] = &["html", "tmpl"];

/// Variable holding the page body
const CONTENT_VAR: &str = "Content";

/// `{{.Title}}`, `{{ .Title }}`, `{{- Title -}}`
static FIELD_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(-?)[ \t]*\.?([A-Za-z_][A-Za-z0-9_]*)[ \t]*(-?)\}\}").unwrap()
});

/// `{{ Content | upper }}`
static FILTERED_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(-?)[ \t]*\.?Content[ \t]*\|([^}]*?)[ \t]*(-?)\}\}").unwrap()
});

/// Autoescape suffix matching every template name
const ESCAPE_ALL: &str = "";

/// Why a page fell back to the bare wrapper.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read template `{}`", .0.display())]
    Load(PathBuf, #[source] io::Error),

    #[error("cannot parse template `{name}`")]
    Parse {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("cannot render template `{name}`")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },
}

/// Result of rendering one page.
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(Vec<u8>),
    /// Template unusable: `<html><body>{fragment}</body></html>` instead
    Fallback(Vec<u8>, TemplateError),
}

/// Renders page fragments through the templates directory.
#[derive(Debug, Clone, Copy)]
pub struct TemplateRenderer<'a> {
    dir: &'a Path,
    default_name: &'a str,
}

impl<'a> TemplateRenderer<'a> {
    pub const fn new(dir: &'a Path, default_name: &'a str) -> Self {
        Self { dir, default_name }
    }

    /// Template the page asks for, or the default one.
    pub fn template_name<'b>(&self, front_matter: &'b FrontMatter) -> &'b str
    where
        'a: 'b,
    {
        if front_matter.template.is_empty() {
            self.default_name
        } else {
            &front_matter.template
        }
    }

    /// Names of the template files currently in the templates directory.
    pub fn available(&self) -> Vec<String> {
        list_templates(self.dir)
    }

    /// Render a page, falling back to the bare wrapper on any template failure.
    pub fn render(&self, front_matter: &FrontMatter, content: &str) -> RenderOutcome {
        match self.try_render(front_matter, content) {
            Ok(page) => RenderOutcome::Rendered(page.into_bytes()),
            Err(e) => RenderOutcome::Fallback(fallback_page(content).into_bytes(), e),
        }
    }

    fn try_render(&self, front_matter: &FrontMatter, content: &str) -> Result<String, TemplateError> {
        let name = self.template_name(front_matter);
        let path = self.dir.join(name);
        let source = fs::read_to_string(&path).map_err(|e| TemplateError::Load(path, e))?;

        let mut tera = Tera::default();
        tera.autoescape_on(vec![ESCAPE_ALL]);
        tera.add_raw_template(name, &rewrite_field_refs(&source))
            .map_err(|source| TemplateError::Parse { name: name.to_owned(), source })?;

        tera.render(name, &page_context(front_matter, content))
            .map_err(|source| TemplateError::Render { name: name.to_owned(), source })
    }
}

fn page_context(front_matter: &FrontMatter, content: &str) -> Context {
    let mut context = Context::new();
    context.insert("Title", &front_matter.title);
    context.insert("Description", &front_matter.description);
    context.insert("Date", &front_matter.date);
    context.insert("Tags", &front_matter.tags);
    context.insert(CONTENT_VAR, content);

    // Custom keys win over the names above
    for (key, value) in &front_matter.custom {
        context.insert(key.as_str(), value);
    }
    context
}

/// Turn Go-style field references into Tera variables.
///
/// `{{.Title}}` → `{{ Title | default(value="") }}`,
/// `{{ .Content }}` → `{{ Content | safe }}`,
/// `{{ Content | upper }}` → `{{ Content | upper | safe }}`
fn rewrite_field_refs(source: &str) -> String {
    let fields = FIELD_REF.replace_all(source, |caps: &regex::Captures<'_>| {
        let field = &caps[2];
        let filter = if field == CONTENT_VAR {
            " | safe"
        } else {
            r#" | default(value="")"#
        };
        format!("{{{{{} {field}{filter} {}}}}}", &caps[1], &caps[3])
    });

    FILTERED_CONTENT
        .replace_all(&fields, |caps: &regex::Captures<'_>| {
            let filters = &caps[2];
            if filters.rsplit('|').next().is_some_and(|last| last.trim() == "safe") {
                caps[0].to_owned()
            } else {
                format!("{{{{{} {CONTENT_VAR} |{filters} | safe {}}}}}", &caps[1], &caps[3])
            }
        })
        .into_owned()
}

/// Page used when the template cannot be loaded or rendered.
pub fn fallback_page(content: &str) -> String {
    format!("<html><body>{content}</body></html>")
}

/// Template files directly inside `dir`, sorted by name.
pub fn list_templates(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        })
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
