use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use go_rewrite::config::{self, RewriteConfig};
use go_rewrite::plan::{self, Workspace};
use go_rewrite::{rewrite_package, scan_markers, write_package, Overlay, PackageRewrite};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "go-rewrite")]
#[command(about = "Rewrite Go packages for the service runtime", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every package in a plan and write the results
    Apply {
        /// Rewrite plan produced by the classifier
        #[arg(short, long)]
        plan: PathBuf,

        /// Directory receiving one subdirectory per package
        #[arg(short, long)]
        out: PathBuf,

        /// Rewrite configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Print the overlay list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute rewrites without writing anything
    Check {
        /// Rewrite plan produced by the classifier
        #[arg(short, long)]
        plan: PathBuf,

        /// Rewrite configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List position markers in a rewritten file
    Markers {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            plan,
            out,
            config,
            diff,
            json,
        } => cmd_apply(&plan, &out, config.as_deref(), diff, json),

        Commands::Check { plan, config, diff } => cmd_check(&plan, config.as_deref(), diff),

        Commands::Markers { file } => cmd_markers(&file),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RewriteConfig> {
    match path {
        Some(path) => Ok(config::load_from_path(path)?),
        None => Ok(RewriteConfig::default()),
    }
}

/// Load the plan and rewrite every package. Nothing is written here, so a
/// failing package leaves the output directory untouched.
fn rewrite_all(
    plan_path: &Path,
    config: &RewriteConfig,
) -> Result<(Workspace, Vec<PackageRewrite>)> {
    let workspace = plan::load_from_path(plan_path)
        .with_context(|| format!("failed to load plan {}", plan_path.display()))?;

    let mut rewrites = Vec::with_capacity(workspace.packages.len());
    for pkg in &workspace.packages {
        let rewrite = rewrite_package(pkg, &workspace.ids, config)
            .with_context(|| format!("failed to rewrite package {}", pkg.import_path))?;
        rewrites.push(rewrite);
    }
    Ok((workspace, rewrites))
}

fn cmd_apply(
    plan_path: &Path,
    out: &Path,
    config_path: Option<&Path>,
    show_diff: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let (workspace, rewrites) = rewrite_all(plan_path, &config)?;
    let root = plan_path.parent().unwrap_or_else(|| Path::new("."));
    let originals = original_contents(&workspace);

    let mut overlays: Vec<Overlay> = Vec::new();
    for rewrite in &rewrites {
        if rewrite.files.is_empty() && rewrite.wrappers.is_none() {
            continue;
        }
        let target = package_out_dir(out, root, rewrite);
        let written = write_package(rewrite, &target)
            .with_context(|| format!("failed to write package {}", rewrite.import_path))?;

        if !json {
            println!("{} {}", "✓".green(), rewrite.import_path.bold());
            for overlay in &written {
                println!(
                    "  {} {} {}",
                    overlay.original.display(),
                    "→".dimmed(),
                    overlay.rewritten.display()
                );
            }
            if show_diff {
                show_package_diff(rewrite, &originals);
            }
        }
        overlays.extend(written);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&overlays)?);
        return Ok(());
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} packages", format!("{}", workspace.packages.len()).cyan());
    println!("  {} files written", format!("{}", overlays.len()).green());
    Ok(())
}

fn cmd_check(plan_path: &Path, config_path: Option<&Path>, show_diff: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let (workspace, rewrites) = rewrite_all(plan_path, &config)?;
    let originals = original_contents(&workspace);

    let mut total_files = 0;
    let mut total_wrappers = 0;
    for rewrite in &rewrites {
        if rewrite.files.is_empty() && rewrite.wrappers.is_none() {
            println!("{} {}: no changes", "⊙".yellow(), rewrite.import_path);
            continue;
        }

        println!("{} {}", "✓".green(), rewrite.import_path.bold());
        for file in &rewrite.files {
            println!("  {}: {} edits", file.original.display(), file.edits);
            for path in &file.removed_imports {
                println!("    {} {}", "removed import".dimmed(), path);
            }
        }
        if let Some(generated) = &rewrite.wrappers {
            println!(
                "  {}: {} wrappers",
                generated.file_name,
                format!("{}", generated.wrappers).cyan()
            );
            total_wrappers += generated.wrappers;
        }
        if show_diff {
            show_package_diff(rewrite, &originals);
        }
        total_files += rewrite.files.len();
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files would change", format!("{}", total_files).green());
    println!("  {} wrappers", format!("{}", total_wrappers).cyan());
    Ok(())
}

fn cmd_markers(file: &Path) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let markers = scan_markers(&text);
    if markers.is_empty() {
        println!("{}", "No position markers found".yellow());
        return Ok(());
    }
    for (offset, marker) in markers {
        println!("{offset:>8}  {}:{}", marker.line, marker.column);
    }
    Ok(())
}

/// `<out>/<package dir relative to the plan>`; packages outside the plan's
/// directory fall back to their import path.
fn package_out_dir(out: &Path, root: &Path, rewrite: &PackageRewrite) -> PathBuf {
    match rewrite.dir.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => out.join(rel),
        _ => out.join(&rewrite.import_path),
    }
}

fn original_contents(workspace: &Workspace) -> HashMap<&Path, &str> {
    workspace
        .packages
        .iter()
        .flat_map(|pkg| &pkg.files)
        .map(|file| (file.path.as_path(), file.contents()))
        .collect()
}

fn show_package_diff(rewrite: &PackageRewrite, originals: &HashMap<&Path, &str>) {
    for file in &rewrite.files {
        let before = originals.get(file.original.as_path()).copied().unwrap_or("");
        if before != file.contents {
            display_diff(&file.original, before, &file.contents);
        }
    }
    if let Some(generated) = &rewrite.wrappers {
        display_diff(&rewrite.dir.join(&generated.file_name), "", &generated.contents);
    }
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
