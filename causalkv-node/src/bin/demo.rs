//! Walks a running three-node group through a causal chain:
//! write `x` on the first node, read it on the second and write `y = x + 1`
//! there, then read `y` on the third.

use std::time::Duration;
use anyhow::{bail, Context, Result};
use causalkv_node::config::parse_endpoints;
use causalkv_replication::{ReadResponse, WriteRequest, WriteResponse};
use clap::Parser;
use reqwest::{Client, StatusCode};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "causalkv-demo")]
#[command(about = "Exercise causal consistency against a running causalkv group")]
struct Args {
    /// Node endpoints (comma separated or a JSON array); at least three
    #[arg(
        long,
        env = "NODES",
        default_value = "http://localhost:5000,http://localhost:5001,http://localhost:5002"
    )]
    nodes: String,

    /// Pause between steps so replicas can propagate (ms)
    #[arg(long, default_value_t = 200)]
    settle_ms: u64,
}

async fn write(client: &Client, node: &str, key: &str, value: serde_json::Value) -> Result<WriteResponse> {
    let response = client
        .post(format!("{node}/write"))
        .json(&WriteRequest::new(key, value))
        .send()
        .await
        .with_context(|| format!("write to {node} failed"))?;
    if !response.status().is_success() {
        bail!("write to {node} returned {}", response.status());
    }
    Ok(response.json().await?)
}

async fn read(client: &Client, node: &str, key: &str) -> Result<Option<ReadResponse>> {
    let response = client
        .get(format!("{node}/read/{key}"))
        .send()
        .await
        .with_context(|| format!("read from {node} failed"))?;
    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        s if s.is_success() => Ok(Some(response.json().await?)),
        s => bail!("read from {node} returned {s}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let nodes: Vec<String> = parse_endpoints(&args.nodes)?
        .into_iter()
        .map(|n| n.trim_end_matches('/').to_string())
        .collect();
    if nodes.len() < 3 {
        bail!("need at least three nodes, got {}", nodes.len());
    }
    let settle = Duration::from_millis(args.settle_ms);
    let client = Client::new();

    println!("Step 1: write x=1 on {}", nodes[0]);
    let written = write(&client, &nodes[0], "x", json!(1)).await?;
    println!("  clock {}", serde_json::to_string(&written.clock)?);
    tokio::time::sleep(settle).await;

    println!("Step 2: read x on {} and write y = x + 1 there", nodes[1]);
    let Some(x) = read(&client, &nodes[1], "x").await? else {
        println!("  x not visible on {} yet", nodes[1]);
        return Ok(());
    };
    let Some(x_value) = x.value.as_i64() else {
        bail!("x is not an integer: {}", x.value);
    };
    println!("  read x={x_value}");
    let written = write(&client, &nodes[1], "y", json!(x_value + 1)).await?;
    println!("  clock {}", serde_json::to_string(&written.clock)?);
    tokio::time::sleep(settle).await;

    println!("Step 3: read y on {}", nodes[2]);
    match read(&client, &nodes[2], "y").await? {
        Some(y) => {
            println!("  y={} with clock {}", y.value, serde_json::to_string(&y.clock)?);
            match read(&client, &nodes[2], "x").await? {
                Some(x) => println!("  x={} is visible too, as causality requires", x.value),
                None => bail!("y is visible on {} but its cause x is not", nodes[2]),
            }
        }
        None => println!("  y not visible on {} yet (still buffered or in flight)", nodes[2]),
    }
    Ok(())
}
