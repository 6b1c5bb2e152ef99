//! Sails client walkthrough
//!
//! Wires a client to the in-memory transport, which plays a small "user"
//! service, then runs through the client's behaviors and prints each outcome:
//! a call before connecting, a subscription made before connecting, a trace id
//! stamped on every request, a rejected lookup and a call that times out.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use tracing::{Level, info};

use sails_client::pipeline::{map_request, map_response};
use sails_client::{ClientBuilder, ClientConfig, ClientError, ErrorKind, ResponseEnvelope};
use sails_transport_memory::{MemoryTransport, Reply};

/// sails-demo - walk through the Sails client against an in-memory server
#[derive(Parser, Debug)]
#[command(name = "sails-demo", version, about, author)]
struct Cli {
    /// Address to connect to
    #[arg(short, long, default_value = "localhost:1337")]
    address: String,

    /// Load client configuration from a TOML, YAML or JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-call reply timeout in milliseconds
    #[arg(short, long, default_value_t = 200)]
    timeout_ms: u64,

    /// Enable verbose logging (-v, -vv, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn init_tracing(&self) {
        let level = if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                2 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .init();
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::new(self.address.clone()),
        };
        if config.request_timeout_ms.is_none() {
            config.request_timeout_ms = Some(self.timeout_ms);
        }
        Ok(config)
    }
}

/// Answers like a tiny user service. `/slow` never answers.
fn user_service(transport: &MemoryTransport) {
    transport.set_responder(|request| {
        let path: Vec<&str> = request.url.trim_matches('/').split('/').collect();
        match (request.verb.as_str(), path.as_slice()) {
            ("get", ["user", "1"]) => Reply::ok(Some(json!({"id": 1, "name": "Ada"}))),
            ("get", ["user", _]) => Reply::status(404, Some(json!({"error": "no such user"}))),
            ("post", ["user"]) => Reply::status(201, request.data.clone()),
            (_, ["slow"]) => Reply::Silent,
            _ => Reply::status(400, None),
        }
    });
}

fn describe(outcome: &Result<ResponseEnvelope, ClientError>) -> String {
    match outcome {
        Ok(reply) => format!(
            "ok status={:?} data={}",
            reply.status_code(),
            reply.data.clone().unwrap_or(Value::Null)
        ),
        Err(e) => match e.kind() {
            ErrorKind::ClassifiedFailure => format!(
                "rejected status={:?} data={}",
                e.envelope().and_then(ResponseEnvelope::status_code),
                e.envelope()
                    .and_then(|envelope| envelope.data.clone())
                    .unwrap_or(Value::Null)
            ),
            kind => format!("{kind:?}: {e}"),
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let transport = MemoryTransport::new();
    user_service(&transport);

    let next_trace = Arc::new(AtomicU64::new(1));
    let client = ClientBuilder::from_config(cli.client_config()?)
        .with_request_transform(map_request("trace", move |mut config| {
            let trace_id = next_trace.fetch_add(1, Ordering::Relaxed);
            config.insert_data("traceId", json!(format!("demo-{trace_id}")));
            config
        }))
        .with_response_transform(map_response("audit", |response| {
            info!(status = ?response.status_code(), "Reply accepted");
            response
        }))
        .build(transport.clone())
        .await
        .context("building client")?;

    println!("before connect: {}", describe(&client.get("/user/1", None, None).await));

    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    client.on("user", move |payload| {
        println!("event user: {payload}");
        let _ = done_tx.send(());
    });
    client.once("goodbye", |payload| println!("event goodbye (once): {payload}"));

    client.connect().await.context("connecting")?;
    println!("connected: {:?}", client.state());

    println!("get /user/1: {}", describe(&client.get("/user/1", None, None).await));
    println!("get /user/2: {}", describe(&client.get("/user/2", None, None).await));
    println!(
        "post /user: {}",
        describe(&client.post("/user", Some(json!({"name": "Grace"})), None).await)
    );
    println!("get /slow: {}", describe(&client.get("/slow", None, None).await));

    transport.emit("user", json!({"verb": "created", "id": 2}));
    transport.emit("goodbye", json!("first"));
    transport.emit("goodbye", json!("second"));
    tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
        .await
        .context("waiting for the user event")?;
    tokio::task::yield_now().await;

    for invocation in transport.invocations() {
        println!(
            "sent {} {} {}",
            invocation.request.verb,
            invocation.request.url,
            invocation.request.data.unwrap_or(Value::Null)
        );
    }

    client.disconnect().await?;
    println!("disconnected: {:?}", client.state());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();
    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["sails-demo", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["sails-demo", "-v", "--quiet"]).is_err());
    }

    #[test]
    fn test_timeout_fills_missing_config_value() {
        let cli = Cli::try_parse_from(["sails-demo", "-t", "50", "-a", "example:1"]).unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.address, "example:1");
        assert_eq!(config.request_timeout_ms, Some(50));
    }

    #[tokio::test]
    async fn test_walkthrough_runs() {
        let cli = Cli::try_parse_from(["sails-demo", "-t", "20"]).unwrap();
        run(cli).await.unwrap();
    }
}
