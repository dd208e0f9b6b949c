// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use hf_mock_messenger::{FibiScript, Responder, RunningMock, Silent};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hf-mock-messenger", version, about = "Messenger mock with a scripted assistant")]
struct Args {
    /// Bind address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Route prefix.
    #[arg(long, default_value = hf_mock_messenger::DEFAULT_PREFIX)]
    prefix: String,

    /// Accept traffic but never answer.
    #[arg(long)]
    silent: bool,

    /// Delay before each scripted reply, in milliseconds.
    #[arg(long, default_value_t = 50)]
    reply_delay_ms: u64,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("hf=debug")
    } else {
        EnvFilter::new("hf=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let responder: Arc<dyn Responder> = if args.silent {
        Arc::new(Silent)
    } else {
        Arc::new(FibiScript::new().with_reply_delay(Duration::from_millis(args.reply_delay_ms)))
    };

    let mock = RunningMock::bind(&args.bind, &args.prefix, responder)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    info!(base_url = %mock.base_url(), "hf-mock-messenger ready");

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    mock.shutdown().await;
    Ok(())
}
