//! Command-line interface definitions.
//!
//! Defines all CLI arguments using clap. Every flag is optional so that
//! values from `kiln.toml` survive unless explicitly overridden.

use crate::config::WatcherKind;
use clap::Parser;
use std::path::PathBuf;

/// Kiln static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input directory containing source files [default: input]
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output directory for the generated site [default: output]
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Directory containing templates [default: templates]
    #[arg(short = 't', long = "templates")]
    pub templates: Option<PathBuf>,

    /// Start development server after build
    #[arg(short = 's', long = "serve")]
    pub serve: bool,

    /// Host address to bind development server [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Port for development server [default: 8000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Change detection backend used in serve mode [default: poll]
    #[arg(long, value_enum)]
    pub watcher: Option<WatcherKind>,

    /// Config file (default: kiln.toml, used only if present)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["kiln", "-i", "src", "-o", "dist", "-t", "tpl", "-s"]);
        assert_eq!(cli.input, Some(PathBuf::from("src")));
        assert_eq!(cli.output, Some(PathBuf::from("dist")));
        assert_eq!(cli.templates, Some(PathBuf::from("tpl")));
        assert!(cli.serve);
    }

    #[test]
    fn test_server_flags() {
        let cli = Cli::parse_from(["kiln", "--host", "127.0.0.1", "--port", "3000", "--watcher", "notify"]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(3000));
        assert_eq!(cli.watcher, Some(WatcherKind::Notify));
        assert!(!cli.serve);
    }

    #[test]
    fn test_no_flags() {
        let cli = Cli::parse_from(["kiln"]);
        assert!(cli.input.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.serve);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["kiln", "--port", "99999"]).is_err());
    }
}
