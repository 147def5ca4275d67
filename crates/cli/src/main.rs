// ABOUTME: CLI for listing a profile's videos filtered by hashtag using vidscout-core.
// ABOUTME: Fetches over HTTP (optionally via a render service) or reads local files, and prints JSON.

mod source;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vidscout_core::{Pipeline, ProfileQuery, ScrapeReport, DEFAULT_DOMAIN};

use crate::source::{FileSource, HttpSource, SourceOptions};

/// List a profile's videos and keep the ones carrying a hashtag.
#[derive(Parser, Debug)]
#[command(name = "vidscout")]
#[command(about = "List a profile's videos filtered by hashtag and print JSON", long_about = None)]
struct Args {
    /// Profile identifier, with or without a leading "@".
    profile: String,

    /// Hashtag to keep, with or without a leading "#".
    #[arg(long, default_value = "quantumfocus")]
    hashtag: String,

    /// Host used in canonical video URLs.
    #[arg(long, default_value = DEFAULT_DOMAIN)]
    domain: String,

    /// Where profile pages are fetched from (defaults to https://<domain>).
    #[arg(long, env = "VIDSCOUT_BASE_URL")]
    base_url: Option<String>,

    /// Browserless-style render service; POST <url>/content returns rendered HTML.
    #[arg(long, env = "VIDSCOUT_RENDER_URL")]
    render_url: Option<String>,

    /// Token appended to render service requests.
    #[arg(long, env = "VIDSCOUT_RENDER_TOKEN", hide_env_values = true)]
    render_token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Read a structured data feed (JSON) from a file instead of fetching. "-" for stdin.
    #[arg(long)]
    feed: Option<PathBuf>,

    /// Read served HTML from a file instead of fetching. "-" for stdin.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Read a rendered HTML snapshot from a file instead of fetching. "-" for stdin.
    #[arg(long)]
    rendered: Option<PathBuf>,

    /// Override the video tile selector.
    #[arg(long)]
    item_selector: Option<String>,

    /// Print only the filtered video array instead of the full report.
    #[arg(long, default_value_t = false)]
    filtered_only: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Log more to stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let query = ProfileQuery::new(&args.profile, &args.hashtag)?;

    let mut builder = Pipeline::builder().domain(args.domain.clone());
    if let Some(css) = &args.item_selector {
        builder = builder.item_selector(css.clone());
    }
    let pipeline = builder.build();

    let files = FileSource {
        feed: args.feed.clone(),
        rendered: args.rendered.clone(),
        markup: args.html.clone(),
    };

    let report = if files.is_configured() {
        pipeline.scrape(&files, &query).await?
    } else {
        let opts = SourceOptions {
            base_url: args
                .base_url
                .clone()
                .unwrap_or_else(|| format!("https://{}", args.domain)),
            timeout: Duration::from_secs(args.timeout),
            render_url: args.render_url.clone(),
            render_token: args.render_token.clone(),
            ..Default::default()
        };
        let http = HttpSource::new(opts)?;
        pipeline.scrape(&http, &query).await?
    };

    print_report(&report, args.filtered_only, args.compact)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &ScrapeReport, filtered_only: bool, compact: bool) -> Result<()> {
    let output = if filtered_only {
        serde_json::to_value(&report.filtered_videos)
    } else {
        serde_json::to_value(report)
    }
    .context("failed to serialize report")?;

    if compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
