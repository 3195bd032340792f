//! Console logging.
//!
//! Every line is `[module] message`, with the prefix colored by module:
//!
//! ```ignore
//! log!("build"; "processed {} files in {:.2} seconds", n, secs);
//! log!("error"; "{}: {:#}", path.display(), err);
//! ```
//!
//! Single-line messages are cut to the terminal width; multiline ones (error
//! chains, listings) are printed in full.

use colored::{ColoredString, Colorize};
use crossterm::terminal;
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Used when the width cannot be queried, e.g. output piped to a file
const FALLBACK_WIDTH: usize = 120;

/// Marks a message cut short to fit the terminal
const ELLIPSIS: char = '…';

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

fn terminal_width() -> usize {
    static WIDTH: OnceLock<usize> = OnceLock::new();
    *WIDTH.get_or_init(|| terminal::size().map_or(FALLBACK_WIDTH, |(w, _)| usize::from(w)))
}

/// Print one log line.
///
/// The whole line goes through a single stdout lock, so output from request
/// workers and the watcher thread never interleaves mid-line.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);

    let message = if message.contains('\n') {
        message.into()
    } else {
        // "[module] " takes module.len() + 3 columns
        let room = terminal_width().saturating_sub(module.len() + 3);
        fit_width(message, room)
    };

    let mut out = stdout().lock();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "render" | "template" => prefix.bright_magenta().bold(),
        "scan" | "assets" | "robots" => prefix.cyan(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.red(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `message` to at most `columns` characters, ending in `…` when cut.
fn fit_width(message: &str, columns: usize) -> std::borrow::Cow<'_, str> {
    if message.chars().count() <= columns {
        return message.into();
    }
    let keep = columns.saturating_sub(1);
    let mut cut: String = message.chars().take(keep).collect();
    if columns > 0 {
        cut.push(ELLIPSIS);
    }
    cut.into()
}
