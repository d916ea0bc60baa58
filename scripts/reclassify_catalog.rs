//! Drive the worker's paged reclassification endpoint over the whole catalog.
//!
//! Pages until the worker reports an empty page, with an offset cap as a
//! guard against a server that never stops returning rows.

use std::env;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

const DEFAULT_WORKER_URL: &str = "http://localhost:9010";
const DEFAULT_PAGE_LIMIT: i64 = 50;
const MAX_OFFSET: i64 = 10_000;

struct CallerConfig {
    worker_url: String,
    api_key: String,
    limit: i64,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    data: PageData,
}

#[derive(Debug, Deserialize)]
struct PageData {
    processed: usize,
    updated: usize,
    next_offset: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = parse_args()?;

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build HTTP client")?;
    let endpoint = format!(
        "{}/v1/admin/reclassify",
        config.worker_url.trim_end_matches('/')
    );

    let mut offset = 0i64;
    let mut total_processed = 0usize;
    let mut total_updated = 0usize;

    loop {
        let response = client
            .post(&endpoint)
            .header("x-api-key", &config.api_key)
            .json(&serde_json::json!({ "limit": config.limit, "offset": offset }))
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("worker returned {status}: {body}");
        }

        let page: PageResponse = response
            .json()
            .await
            .context("failed to decode reclassification page")?;
        if page.data.processed == 0 {
            break;
        }

        total_processed += page.data.processed;
        total_updated += page.data.updated;
        println!(
            "offset {offset}: processed {}, updated {}",
            page.data.processed, page.data.updated
        );

        offset = page.data.next_offset;
        if offset >= MAX_OFFSET {
            eprintln!("stopping at offset cap {MAX_OFFSET}");
            break;
        }
    }

    println!("done: processed {total_processed}, updated {total_updated}");
    Ok(())
}

fn parse_args() -> Result<CallerConfig> {
    let mut worker_url = None;
    let mut api_key = None;
    let mut limit = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => {
                let value = args.next().context("--url requires a base URL")?;
                worker_url = Some(value);
            }
            "--api-key" => {
                let value = args.next().context("--api-key requires a value")?;
                api_key = Some(value);
            }
            "--limit" => {
                let value = args.next().context("--limit requires a page size")?;
                let parsed = value.parse::<i64>().context("--limit must be an integer")?;
                if parsed <= 0 {
                    bail!("--limit must be positive");
                }
                limit = Some(parsed);
            }
            "--help" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                bail!("unknown argument: {}", arg);
            }
        }
    }

    let worker_url = worker_url
        .or_else(|| env::var("CATALOG_WORKER_URL").ok())
        .unwrap_or_else(|| DEFAULT_WORKER_URL.to_string());
    let api_key = api_key
        .or_else(|| env::var("ADMIN_API_KEY").ok())
        .ok_or_else(|| anyhow!("ADMIN_API_KEY is required via --api-key or environment"))?;
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    Ok(CallerConfig {
        worker_url,
        api_key,
        limit,
    })
}

fn print_usage() {
    eprintln!(
        "Usage: reclassify_catalog [--url http://localhost:9010] [--api-key <key>] [--limit 50]"
    );
}
