pub mod config;
pub mod context;
pub mod host;
pub mod metrics;
pub mod receiver_thread;
pub mod replay;
pub mod script;
pub mod transfer;
pub mod util;

pub mod error;


use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;

use crate::config::InnerSettings;
use crate::util::process::{setup_process_exit_on_panic, start_metrics_server, wait_for_signals};
use crate::util::thread::local_runtime;

fn run_client() {
    let config = match InnerSettings::from_env() {
        Err(e) => {
            log::info!("Failed to load config: {}", e);
            return;
        }
        Ok(c) => c,
    };
    if let Some(port) = config.host.prometheus_port {
        if !start_metrics_server(port) {
            return;
        }
    }

    let shutdown_token = CancellationToken::new();
    let (tx, rx) = unbounded_channel();
    let receiver = match receiver_thread::spawn(config.clone(), tx, shutdown_token.clone()) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Could not spawn receiver thread: {}", e);
            return;
        }
    };
    let host = match host::spawn(config.clone(), rx, shutdown_token.clone()) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Could not spawn host thread: {}", e);
            return;
        }
    };
    log::info!(
        "Receiving scripts from {}:{} into {}",
        config.receiver.host,
        config.receiver.port,
        config.storage.script_directory
    );

    if let Some(local_loop) = local_runtime("signal") {
        if let Err(e) = local_loop.block_on(wait_for_signals()) {
            log::error!("Could not wait for signals: {}", e);
        }
    }
    log::info!("Shutting down");
    shutdown_token.cancel();
    receiver.shutdown();
    host.shutdown();
}

pub fn run() {
    env_logger::init();
    setup_process_exit_on_panic();
    run_client();
}
