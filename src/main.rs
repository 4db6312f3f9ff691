use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::error;

use originquery::host::{ImportTask, Manifest};
use originquery::matcher::OriginKind;
use originquery::progress::{format_duration, AlbumProgress};
use originquery::report::{Highlighter, PlainText, Terminal};
use originquery::safety::validate_output_path;
use originquery::{HostConfig, OriginQuery};

#[derive(Parser)]
#[command(name = "originquery")]
#[command(about = "Compare album tags against origin files and apply origin metadata")]
struct Args {
    /// Manifest listing album tasks and their current tags (JSON, or YAML by extension)
    manifest: PathBuf,

    /// Host configuration file (YAML)
    #[arg(long, short)]
    config: PathBuf,

    /// Write the updated manifest to this file (JSON)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Hide progress bars and log plain progress lines instead
    #[arg(long)]
    log_only: bool,

    /// Disable emphasis colors in the comparison table
    #[arg(long)]
    no_color: bool,
}

/// Log progress every N albums in log-only mode
const PROGRESS_INTERVAL: u64 = 25;

#[derive(Default)]
struct Summary {
    compared: usize,
    missing: usize,
    conflicts: usize,
    applied: usize,
    failed: usize,
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest = match OriginKind::infer(path) {
        OriginKind::Yaml => serde_yaml::from_str(&contents).context("Failed to parse YAML manifest")?,
        _ => serde_json::from_str(&contents).context("Failed to parse JSON manifest")?,
    };
    Ok(manifest)
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let start = Instant::now();

    let host = HostConfig::load(&args.config).context("Failed to load configuration")?;
    let Some(query) = OriginQuery::load(&host) else {
        bail!("originquery is disabled, see the errors above");
    };

    let mut manifest = read_manifest(&args.manifest)?;

    if let Some(output) = &args.output {
        let item_paths: Vec<&Path> = manifest
            .tasks
            .iter()
            .flat_map(|t| t.items.iter().map(|i| i.path.as_path()))
            .collect();
        validate_output_path(output, &args.manifest, &item_paths)?;
    }

    let highlighter: &dyn Highlighter = if args.no_color { &PlainText } else { &Terminal };

    let total = manifest.tasks.len() as u64;
    let mut progress = AlbumProgress::new(total, "Comparing origin files", args.log_only, PROGRESS_INTERVAL);
    let mut summary = Summary::default();

    for (idx, task) in manifest.tasks.iter_mut().enumerate() {
        match query.import_task_start(task) {
            Ok(ctx) => {
                progress.suspend(|| query.before_choose_candidate(&ctx, highlighter));
                if ctx.missing_origin() {
                    summary.missing += 1;
                } else {
                    summary.compared += 1;
                }
                if ctx.conflict() {
                    summary.conflicts += 1;
                }
                if ctx.applied() {
                    summary.applied += 1;
                }
            }
            Err(e) => {
                let paths: Vec<String> = task.paths().iter().map(|p| p.display().to_string()).collect();
                progress.suspend(|| error!("Task {} ({}): {}", idx + 1, paths.join(", "), e));
                summary.failed += 1;
            }
        }
        progress.advance();
    }
    progress.finish();

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(output, json)
            .with_context(|| format!("Failed to write updated manifest {}", output.display()))?;
        println!("Wrote updated manifest: {:?}", output);
    }

    println!("\n{:=<60}", "");
    println!("Origin comparison complete!");
    println!("  Albums: {}", total);
    println!("  With origin file: {}", summary.compared);
    println!("  Without origin file: {}", summary.missing);
    println!("  Conflicts: {}", summary.conflicts);
    println!("  Updated from origin: {}", summary.applied);
    println!("  Failed: {}", summary.failed);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    if summary.failed > 0 {
        bail!("{} album(s) failed", summary.failed);
    }

    Ok(())
}
