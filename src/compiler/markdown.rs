//! Markdown to HTML conversion.
//!
//! Uses pulldown-cmark with the GitHub-flavored extensions (tables,
//! strikethrough, task lists), footnotes and smart punctuation. Headings get
//! an `id` derived from their text unless one is given explicitly with
//! `# Title {#custom-id}`.

use crate::utils::slug::HeadingIds;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Convert a markdown body to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, options()).collect();
    assign_heading_ids(&mut events);

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

/// Give every heading without an explicit id one derived from its text.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut ids = HeadingIds::default();

    // Explicit ids first, so generated ones never collide with them
    for event in events.iter() {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            ids.reserve(id);
        }
    }

    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let slug = ids.unique(&heading_text(&events[i + 1..]));
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }
}

/// Plain text of a heading, given the events following its start tag.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}
