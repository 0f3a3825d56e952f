//! Run the proxy under an event-driven host.
//!
//! Reads one JSON invocation event per line from stdin and writes one JSON
//! result per line to stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use http_enc_proxy::event::{EventAdapter, EventError, ProxyEvent};
use http_enc_proxy::lifecycle::{build_server, prepare_config, Overrides};
use http_enc_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "proxy-event")]
#[command(about = "Drive the proxy with JSON invocation events on stdin", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in targets are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(long)]
    debug: bool,

    /// Route prefix stripped from event paths before target resolution.
    #[arg(long)]
    prefix: Option<String>,

    /// Return response bodies base64-encoded.
    #[arg(long)]
    base64_body: bool,
}

/// Result line for an event that could not be handled.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvocationError {
    error_message: String,
    error_type: &'static str,
}

impl InvocationError {
    fn new(error_type: &'static str, message: impl ToString) -> Self {
        Self {
            error_message: message.to_string(),
            error_type,
        }
    }
}

fn error_type(err: &EventError) -> &'static str {
    match err {
        EventError::Body(_) => "InvalidBody",
        EventError::Method(_) => "InvalidMethod",
        EventError::Header { .. } => "InvalidHeader",
        EventError::Uri(_) | EventError::Request(_) => "InvalidRequest",
        EventError::Handler(_) => "HandlerError",
        EventError::ResponseBody(_) => "ResponseError",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing(cli.debug);

    let overrides = Overrides {
        port: None,
        debug: cli.debug,
        route_prefix: cli.prefix,
    };
    let config = prepare_config(cli.config.as_deref(), &overrides)?;
    let server = build_server(config)?;
    let adapter = EventAdapter::new(server.router()).base64_body(cli.base64_body);

    tracing::info!("proxy-event ready, reading events from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<ProxyEvent>(&line) {
            Ok(event) => match adapter.invoke(event).await {
                Ok(response) => serde_json::to_string(&response)?,
                Err(e) => {
                    tracing::error!(error = %e, "Event invocation failed");
                    serde_json::to_string(&InvocationError::new(error_type(&e), &e))?
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Malformed event");
                serde_json::to_string(&InvocationError::new("InvalidEvent", &e))?
            }
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
