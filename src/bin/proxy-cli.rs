use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use range_proxy::resilience::TimeoutPolicy;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

const CORS_HEADERS: [&str; 4] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-max-age",
];

#[derive(Parser)]
#[command(name = "range-proxy-cli")]
#[command(about = "Operator CLI for the time-range proxy", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        default_value = "http://localhost:5000/api/huacore.forms/documentapi/getvalue"
    )]
    url: String,

    /// Extra header sent with every request, as `name: value`.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one range query
    Query {
        #[arg(long)]
        start: i64,
        #[arg(long)]
        end: i64,
        /// Send as GET query parameters instead of a JSON body
        #[arg(long)]
        get: bool,
    },
    /// Query the last N hours and report latency and the expected tier
    Probe {
        #[arg(long, default_value_t = 24)]
        hours: u64,
    },
    /// Send a CORS pre-flight and print the CORS headers
    Preflight,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let headers = parse_headers(&cli.headers)?;

    match cli.command {
        Commands::Query { start, end, get } => {
            let request = if get {
                client
                    .get(&cli.url)
                    .query(&[("start_datetime", start), ("end_datetime", end)])
            } else {
                client
                    .post(&cli.url)
                    .json(&json!({ "start_datetime": start, "end_datetime": end }))
            };
            let res = request.headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Probe { hours } => {
            let end = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
            let span = hours.saturating_mul(3600);
            let start = end.saturating_sub(span as i64);
            let tier = TimeoutPolicy::default().select(span);

            println!("window: {} .. {} ({}h)", start, end, hours);
            println!("expected backend timeout: {}s (default tiers)", tier.as_secs());

            let started = Instant::now();
            let res = client
                .post(&cli.url)
                .headers(headers)
                .json(&json!({ "start_datetime": start, "end_datetime": end }))
                .send()
                .await?;
            println!("latency: {} ms", started.elapsed().as_millis());
            print_response(res).await?;
        }
        Commands::Preflight => {
            let res = client
                .request(reqwest::Method::OPTIONS, &cli.url)
                .headers(headers)
                .send()
                .await?;
            println!("status: {}", res.status());
            for name in CORS_HEADERS {
                let value = res
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("<missing>");
                println!("{}: {}", name, value);
            }
        }
    }

    Ok(())
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("invalid header '{}', expected 'name: value'", entry))?;
        headers.insert(
            reqwest::header::HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("status: {}", status);

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
