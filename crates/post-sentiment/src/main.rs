use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use shared::{
    io, parse_keywords, BoundedStreamCollector, CollectionOutcome, Config, HttpTimelineSource,
    JsonFileSink, PartialBatchPolicy, ReportRenderer, ScoredPost, SentimentClassifier,
    StreamClient, StreamEnd, TimelineError, TimelineFetcher, TRANSPORT_FAILURE_CODE,
};
use std::io::{self as stdio, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Debug, Clone, Copy)]
enum Mode {
    Stream,
    Timeline,
}

impl Mode {
    fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "stream" => Some(Mode::Stream),
            "timeline" => Some(Mode::Timeline),
            _ => None,
        }
    }
}

fn prompt_mode_selection() -> Result<Mode> {
    println!("What would you like to analyze?");
    println!("  1) Live posts matching hashtags/keywords");
    println!("  2) A user's timeline");
    print!("\nEnter your choice (1-2): ");
    stdio::stdout().flush()?;

    let mut input = String::new();
    stdio::stdin().read_line(&mut input)?;

    match input.trim() {
        "1" => Ok(Mode::Stream),
        "2" => Ok(Mode::Timeline),
        _ => anyhow::bail!("Invalid selection. Please choose 1 or 2."),
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    stdio::stdout().flush()?;

    let mut input = String::new();
    stdio::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_count(message: &str) -> Result<usize> {
    prompt(message)?
        .parse()
        .context("Invalid number. Please enter a whole number.")
}

#[derive(Parser)]
#[command(name = "post-sentiment")]
#[command(about = "Collect posts by keyword or timeline and summarize their sentiment")]
struct Args {
    /// Mode to run (stream, timeline)
    #[arg(short, long)]
    mode: Option<String>,

    /// Comma-separated hashtags/keywords to stream
    #[arg(short, long)]
    keywords: Option<String>,

    /// Account handle for timeline mode (blank for your own)
    #[arg(short, long)]
    account: Option<String>,

    /// Maximum number of posts to collect
    #[arg(short = 'n', long)]
    max: Option<usize>,

    /// Number of rows to show in the report table
    #[arg(short, long, default_value = "20")]
    rows: usize,

    /// Where to write the collected batch (stream mode)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the posts collected so far if the stream fails
    #[arg(long)]
    keep_partial: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(stdio::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = Config::from_env()?;

    let mode = if let Some(slug) = args.mode.as_deref() {
        Mode::from_slug(slug)
            .ok_or_else(|| anyhow::anyhow!("Invalid mode: {}. Use 'stream' or 'timeline'", slug))?
    } else {
        prompt_mode_selection()?
    };

    let posts = match mode {
        Mode::Stream => run_stream(&args, &config).await?,
        Mode::Timeline => run_timeline(&args, &config).await?,
    };

    let Some(posts) = posts else {
        return Ok(());
    };

    println!("\n🧮 Scoring sentiment...");
    let classifier = SentimentClassifier::default();
    let scored: Vec<ScoredPost> = posts
        .into_iter()
        .map(|text| {
            let label = classifier.analyze(&text);
            ScoredPost::new(text, label)
        })
        .collect();

    let renderer = ReportRenderer::new(args.rows, 60);
    println!("\n{}", renderer.render(&scored));

    Ok(())
}

async fn run_stream(args: &Args, config: &Config) -> Result<Option<Vec<String>>> {
    let keywords = match args.keywords.as_deref() {
        Some(list) => parse_keywords(list),
        None => parse_keywords(&prompt("Enter hashtags/keywords (comma-separated): ")?),
    };
    if keywords.is_empty() {
        anyhow::bail!("Please enter at least one hashtag or keyword.");
    }

    let max = match args.max {
        Some(max) => max,
        None => prompt_count("How many posts should be collected? ")?,
    };

    let json_path = match &args.output {
        Some(path) => path.clone(),
        None => {
            io::ensure_dir(&config.output_dir)?;
            config.output_dir.join(io::batch_filename(Local::now()))
        }
    };

    let policy = if args.keep_partial {
        PartialBatchPolicy::Persist
    } else {
        PartialBatchPolicy::Discard
    };

    println!("\n📡 Streaming posts matching {}...", keywords.join(", "));
    let client = StreamClient::new(config.authenticator(), config.stream_base_url.clone())?;
    let mut collector =
        BoundedStreamCollector::new(max, JsonFileSink::new(&json_path)).with_partial_policy(policy);

    let streamed = client.filter(&keywords, &mut collector).await;
    let outcome = collector.finish();

    match streamed.context("Failed to stream posts")? {
        StreamEnd::Rejected { status } => {
            println!("✗ Stream refused the connection (HTTP {})", status);
        }
        StreamEnd::TransportFailed => println!("✗ Lost the connection to the stream"),
        StreamEnd::Stopped | StreamEnd::Closed => {}
    }
    let outcome = outcome.context("Failed to save collected posts")?;

    let persisted = match outcome {
        CollectionOutcome::Completed { count, dropped } => {
            println!("✓ Collected {} posts", count);
            if dropped > 0 {
                println!("  ({} malformed records skipped)", dropped);
            }
            true
        }
        CollectionOutcome::SourceStopped {
            code,
            collected,
            persisted,
            ..
        } => {
            if code == TRANSPORT_FAILURE_CODE {
                println!("⚠ Stream connection lost after {} posts", collected);
            } else {
                println!(
                    "⚠ Stream stopped by the source (code {}) after {} posts",
                    code, collected
                );
            }
            persisted
        }
        CollectionOutcome::Incomplete { collected, .. } => {
            println!(
                "⚠ Stream closed after {} of {} posts; nothing saved",
                collected, max
            );
            false
        }
    };

    if !persisted {
        return Ok(None);
    }

    println!("✓ Saved posts to: {}", json_path.display());
    write_text_export(&json_path)?;

    let records = io::load_batch(&json_path)?;
    Ok(Some(
        records
            .iter()
            .map(|r| r.resolved_text().to_string())
            .collect(),
    ))
}

fn write_text_export(json_path: &Path) -> Result<()> {
    let text_path = json_path.with_extension("txt");
    let count = io::export_text(json_path, &text_path).context("Failed to export post text")?;
    println!("✓ Wrote {} lines to: {}", count, text_path.display());
    Ok(())
}

async fn run_timeline(args: &Args, config: &Config) -> Result<Option<Vec<String>>> {
    let account = match args.account.clone() {
        Some(account) => account,
        None => prompt("Account handle (leave blank for your own timeline): ")?,
    };
    let account = account.trim().trim_start_matches('@').to_string();

    let count = match args.max {
        Some(count) => count,
        None => prompt_count("How many posts should be fetched? ")?,
    };

    let who = if account.is_empty() {
        "your timeline".to_string()
    } else {
        format!("@{}", account)
    };
    println!("\n📚 Fetching {} posts from {}...", count, who);

    let source = HttpTimelineSource::new(config.authenticator(), config.api_base_url.clone())?;
    let fetcher = TimelineFetcher::new(source);

    let posts = match fetcher.fetch(Some(account.as_str()), count).await {
        Ok(posts) => posts,
        Err(TimelineError::AccountNotFound { account }) => {
            println!("✗ Account not found: {}", account);
            return Ok(None);
        }
        Err(e) => return Err(e).context("Failed to fetch timeline"),
    };

    if posts.is_empty() {
        println!("No posts found for {}.", who);
        return Ok(None);
    }

    println!("✓ Found {} posts", posts.len());
    Ok(Some(posts.into_iter().map(|p| p.text).collect()))
}
