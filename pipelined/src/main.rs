//! main - starts the pipelined flow-management service

use anyhow::Result;
use async_std::channel::Sender;
use async_std::prelude::*;
use clap::Parser;
use pipelined::{Config, Pipelined};
use signal_hook::consts::signal::*;
use signal_hook_async_std::Signals;
use slog::{Drain, Logger, o};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pipeline TOML config.  When absent, the built-in
    /// default pipeline (access_control -> check_quota ->
    /// ipv6_solicitation -> ipfix -> enforcement -> egress) is used.
    #[arg(long)]
    config: Option<String>,
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let config = match args.config {
        Some(path) => pipelined::load_config_file(&path, &logger)?,
        None => Config::default(),
    };

    // The datapath connection layer plugs into the event surface
    // (on_switch_connected / on_barrier_ack / on_message_error).
    let service = Pipelined::new(config, logger)?;

    wait_for_signal().await?;
    service.graceful_shutdown().await;

    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

async fn wait_for_signal() -> Result<i32> {
    let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (sig_sender, sig_receiver) = async_std::channel::unbounded();
    let signals_task = async_std::task::spawn(handle_signals(signals, sig_sender));
    let signal = sig_receiver.recv().await;
    handle.close();
    signals_task.await;
    Ok(signal?)
}

async fn handle_signals(signals: Signals, sig_sender: Sender<i32>) {
    let mut signals = signals.fuse();
    while let Some(signal) = signals.next().await {
        match signal {
            SIGHUP => {
                // Reload configuration
            }
            SIGTERM | SIGINT | SIGQUIT => {
                let _ = sig_sender.send(signal).await;
            }
            _ => unreachable!(),
        }
    }
}
