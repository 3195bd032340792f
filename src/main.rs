//! Kiln - A static site generator for markdown sites.

mod build;
mod cli;
mod compiler;
mod config;
mod logger;
mod serve;
mod utils;
mod watch;

use anyhow::Result;
use build::SiteBuilder;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use serve::serve_site;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: &'static SiteConfig = Box::leak(Box::new(SiteConfig::load(&cli)?));
    let builder = Arc::new(SiteBuilder::new(config));

    if !cli.serve {
        if let Err(e) = builder.build() {
            log!("error"; "{e:#}");
            std::process::exit(1);
        }
        return Ok(());
    }

    // A failed initial build still starts the server: the watcher
    // rebuilds once the missing directories show up.
    if let Err(e) = builder.build() {
        log!("error"; "{e:#}");
    }
    serve_site(builder)
}
