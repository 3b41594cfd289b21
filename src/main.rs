//! Stowage CLI - Command-line tool for append-only ZIP64 containers.
//!
//! This is the main entry point for the stowage command-line application.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use stowage_zip::ZipArchive;

/// Stowage - append-only ZIP64 container tool
#[derive(Parser)]
#[command(name = "stowage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of an archive
    List {
        /// Path to the archive
        #[arg(short, long, env = "STOWAGE_ARCHIVE")]
        archive: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Write one entry's payload to stdout
    Cat {
        /// Path to the archive
        #[arg(short, long, env = "STOWAGE_ARCHIVE")]
        archive: PathBuf,

        /// Entry name
        name: String,
    },

    /// Extract entries into a directory
    Extract {
        /// Path to the archive
        #[arg(short, long, env = "STOWAGE_ARCHIVE")]
        archive: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Append files to an archive, creating it if needed
    Add {
        /// Path to the archive
        #[arg(short, long, env = "STOWAGE_ARCHIVE")]
        archive: PathBuf,

        /// Files or directories to add
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List { archive, filter, detailed } => {
            cmd_list(&archive, filter.as_deref(), detailed)?;
        }
        Commands::Cat { archive, name } => {
            cmd_cat(&archive, &name)?;
        }
        Commands::Extract { archive, output, filter } => {
            cmd_extract(&archive, &output, filter.as_deref())?;
        }
        Commands::Add { archive, paths } => {
            cmd_add(&archive, &paths)?;
        }
    }

    Ok(())
}

fn cmd_list(archive_path: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;

    let mut count = 0;
    for entry in archive.entries() {
        if let Some(pattern) = filter {
            if !glob_match(pattern, entry.name()) {
                continue;
            }
        }

        if detailed {
            println!(
                "{:>12} {:>#10x} {}",
                entry.uncompressed_size(),
                entry.crc32(),
                entry.name()
            );
        } else {
            println!("{}", entry.name());
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_cat(archive_path: &Path, name: &str) -> Result<()> {
    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;
    let data = archive
        .get_data(name)
        .with_context(|| format!("Failed to read entry {}", name))?;

    std::io::stdout().write_all(&data)?;

    Ok(())
}

fn cmd_extract(archive_path: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening archive: {}", archive_path.display());

    let start = Instant::now();
    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;

    let names: Vec<String> = archive
        .filenames()
        .into_iter()
        .filter(|name| filter.map_or(true, |pattern| glob_match(pattern, name)))
        .collect();

    println!("Extracting {} of {} entries...", names.len(), archive.len());

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    for name in &names {
        let output_path = output.join(name);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = archive
            .get_data(name)
            .with_context(|| format!("Failed to read entry {}", name))?;
        fs::write(&output_path, data)?;

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!("Extraction completed in {:?}", start.elapsed());

    Ok(())
}

fn cmd_add(archive_path: &Path, paths: &[PathBuf]) -> Result<()> {
    // resolve the work list before touching the archive
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for path in paths {
        if path.is_dir() {
            let base = path.parent().unwrap_or(path);
            for entry in WalkDir::new(path) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                files.push((entry_name(base, entry.path())?, entry.path().to_path_buf()));
            }
        } else {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Invalid file name: {}", path.display()))?;
            files.push((name.to_string(), path.clone()));
        }
    }

    let archive = ZipArchive::open(archive_path).context("Failed to open archive")?;

    println!("Adding {} files to {}...", files.len(), archive_path.display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut total_bytes = 0u64;

    for (name, path) in &files {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        total_bytes += data.len() as u64;
        archive
            .add_file(name, &data)
            .with_context(|| format!("Failed to add {}", name))?;
        pb.inc(1);
    }

    archive.close().context("Failed to flush archive")?;

    pb.finish_with_message("Done");
    println!(
        "Added {} files ({} bytes) in {:?}",
        files.len(),
        total_bytes,
        start.elapsed()
    );

    Ok(())
}

/// Archive entry name for a file discovered under `base`: the relative path
/// with forward slashes.
fn entry_name(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let name = relative
        .to_str()
        .with_context(|| format!("Non-UTF-8 path: {}", relative.display()))?;
    Ok(name.replace(std::path::MAIN_SEPARATOR, "/"))
}

/// Simple glob matching for filtering.
fn glob_match(pattern: &str, name: &str) -> bool {
    // Substring and * wildcards only; a proper implementation would use the
    // `glob` crate
    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();

    if !pattern.contains('*') {
        return name.contains(&pattern);
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }

        if i == 0 {
            if !name.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if let Some(found) = name[pos..].find(part) {
            pos += found + part.len();
        } else {
            return false;
        }
    }

    match parts.last() {
        Some(last) if !last.is_empty() => name.ends_with(last),
        _ => true,
    }
}
