// ABOUTME: CLI for loading feeds through the panelfeed transport chain, normalizer and sanitizer.
// ABOUTME: Reads feeds or feed lists from URL, file or stdin and prints JSON for verification.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use panelfeed_feed::{
    load_document, load_feed, parse_feed_list, sort_by_display_name, FeedSource, NormalizedFeed,
};
use panelfeed_transport::TransportResolver;
use serde_json::json;
use tracing::debug;

/// Load one or more RSS/Atom feeds and output JSON.
#[derive(Parser, Debug)]
#[command(name = "panelfeed-cli")]
#[command(about = "Load feeds with panelfeed and print JSON", long_about = None)]
struct Args {
    /// Feed URL(s) (http/https) or local file paths. Use "-" to read from stdin.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Treat targets as newline-delimited feed lists and print the derived sources.
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Relay URL template containing {url}; repeat to build the chain. Replaces the defaults.
    #[arg(long = "relay", value_name = "TEMPLATE")]
    relays: Vec<String>,

    /// Only try the direct URL.
    #[arg(long, default_value_t = false, conflicts_with = "relays")]
    no_relays: bool,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Source URL used to resolve relative references (only valid with a single target).
    #[arg(long)]
    feed_url: Option<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.targets.len() > 1 && args.feed_url.is_some() {
        bail!("--feed-url is only valid when loading a single target");
    }

    let resolver = build_resolver(&args)?;

    let output = if args.list {
        list_sources(&resolver, &args.targets).await?
    } else {
        load_targets(&resolver, &args).await
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn build_resolver(args: &Args) -> Result<TransportResolver> {
    let mut builder = TransportResolver::builder();
    if args.no_relays {
        builder = builder.without_relays();
    } else if !args.relays.is_empty() {
        builder = builder.relays(args.relays.clone());
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

async fn list_sources(resolver: &TransportResolver, targets: &[String]) -> Result<serde_json::Value> {
    let mut sources = Vec::new();
    for target in targets {
        if is_remote(target) {
            let lines = resolver.fetch_lines(target).await?;
            sources.extend(lines.iter().map(|line| FeedSource::from_url(line)));
        } else {
            let text = load_text(resolver, target).await?;
            sources.extend(parse_feed_list(&text));
        }
    }
    sort_by_display_name(&mut sources);
    debug!(count = sources.len(), "parsed feed list");

    Ok(json!({ "sources": sources, "total": sources.len() }))
}

async fn load_targets(resolver: &TransportResolver, args: &Args) -> serde_json::Value {
    let mut results = Vec::new();

    for target in &args.targets {
        let feed_url = args.feed_url.clone().unwrap_or_else(|| target.clone());

        match load_one(resolver, target, &feed_url).await {
            Ok(feed) => results.push(json!({
                "feed_url": feed_url,
                "ok": true,
                "feed": feed,
                "error": null
            })),
            Err(err) => results.push(json!({
                "feed_url": feed_url,
                "ok": false,
                "feed": null,
                "error": err.to_string()
            })),
        }
    }

    // Output format:
    // - Single target and ok => emit the feed object
    // - Otherwise emit an envelope with feeds array and counts
    let parsed = results
        .iter()
        .filter(|r| r.get("ok").and_then(|v| v.as_bool()) == Some(true))
        .count();

    if results.len() == 1 && parsed == 1 {
        if let Some(feed) = results.first().and_then(|r| r.get("feed")) {
            return feed.clone();
        }
    }

    json!({
        "feeds": results,
        "total_feeds": results.len(),
        "parsed": parsed,
        "failed": results.len() - parsed
    })
}

async fn load_one(resolver: &TransportResolver, target: &str, feed_url: &str) -> Result<NormalizedFeed> {
    if is_remote(target) && target == feed_url {
        return Ok(load_feed(resolver, target).await?);
    }

    let text = load_text(resolver, target).await?;
    Ok(load_document(&text, feed_url)?)
}

async fn load_text(resolver: &TransportResolver, target: &str) -> Result<String> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(String::from_utf8_lossy(&buf).into_owned());
    }

    if is_remote(target) {
        return Ok(resolver.fetch(target).await?);
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}
