//! Show what the configured patterns extract from one origin file.
//!
//! Usage: origin-probe --config <config.yaml> <origin file>

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use originquery::matcher::OriginDocument;
use originquery::normalize::sanitize_value;
use originquery::{FieldKey, HostConfig, OriginQuery};

#[derive(Parser)]
#[command(name = "origin-probe")]
#[command(about = "Print the values the configured tag patterns extract from an origin file")]
struct Args {
    origin: PathBuf,

    /// Host configuration file (YAML)
    #[arg(long, short)]
    config: PathBuf,
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let host = HostConfig::load(&args.config).context("Failed to load configuration")?;
    let Some(query) = OriginQuery::load(&host) else {
        bail!("originquery is disabled, see the errors above");
    };
    let config = query.config();

    let document = OriginDocument::load(&args.origin, config.origin_kind)
        .with_context(|| format!("Failed to load {}", args.origin.display()))?;

    println!("Origin file: {} ({:?})", args.origin.display(), document.kind());
    println!("{:-<80}", "");

    let mut seen: Vec<FieldKey> = Vec::new();
    for (key, raw) in document.matches(&config.tag_patterns) {
        let value = sanitize_value(key, &raw);
        let writable = if config.is_writable(key) { "writable" } else { "read-only" };
        if raw == value {
            println!("{:<14} {:<40} [{}]", key.as_str(), value, writable);
        } else {
            println!("{:<14} {:<40} [{}] (raw: {:?})", key.as_str(), value, writable, raw);
        }
        seen.push(key);
    }

    for (key, _) in &config.tag_patterns {
        if !seen.contains(key) {
            println!("{:<14} (no match)", key.as_str());
        }
    }

    Ok(())
}
