use anyhow::{Context, Result};
use clap::Parser;
use shared::{io, Config};
use std::io::{self as stdio, Write as _};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "export-posts")]
#[command(about = "Write a saved batch of posts as an indexed, tab-separated text file")]
struct Args {
    /// Path to the saved JSON batch (if not provided, will list available files)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Where to write the text export (defaults to the batch path with .txt)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(stdio::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let json_file = if let Some(path) = args.file {
        path
    } else {
        select_batch_file(&Config::output_dir_from_env()?)?
    };
    let text_file = args
        .output
        .unwrap_or_else(|| json_file.with_extension("txt"));

    println!("📖 Reading batch: {}", json_file.display());
    let count = io::export_text(&json_file, &text_file)
        .with_context(|| format!("Failed to export {}", json_file.display()))?;

    println!("✓ Wrote {} posts to: {}", count, text_file.display());

    Ok(())
}

fn select_batch_file(dir: &Path) -> Result<PathBuf> {
    let files = io::list_batch_files(dir)?;

    if files.is_empty() {
        anyhow::bail!("No saved batches found in {}", dir.display());
    }

    println!("Available batches:\n");
    for (i, file) in files.iter().enumerate() {
        let filename = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = file
            .modified
            .map(|t| {
                let datetime: chrono::DateTime<chrono::Local> = t.into();
                datetime.format("%Y-%m-%d %H:%M").to_string()
            })
            .unwrap_or_else(|| "unknown".to_string());

        println!(
            "  {}) {} ({} posts, modified: {})",
            i + 1,
            filename,
            file.records,
            modified
        );
    }

    print!("\nSelect file (1-{}): ", files.len());
    stdio::stdout().flush()?;

    let mut input = String::new();
    stdio::stdin().read_line(&mut input)?;

    let selection: usize = input
        .trim()
        .parse()
        .context("Invalid selection. Please enter a number.")?;

    if selection < 1 || selection > files.len() {
        anyhow::bail!("Selection out of range. Please choose 1-{}", files.len());
    }

    Ok(files[selection - 1].path.clone())
}
