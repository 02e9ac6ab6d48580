// Process-level plumbing: panics, signals and the metrics endpoint. Impractical to test with
// cargo test, the `process_tests` feature builds small executables that exercise it instead.

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use std::os::unix::net::UnixStream;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream as AsyncUnixStream;

/* A panic on the receiver or host thread should take the whole client down. */
pub fn setup_process_exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

pub async fn wait_for_signals() -> std::io::Result<()> {
    let (r, w) = UnixStream::pair()?;
    r.set_nonblocking(true)?;
    let mut async_read = AsyncUnixStream::from_std(r)?;
    signal_hook::low_level::pipe::register(SIGINT, w.try_clone()?)?;
    signal_hook::low_level::pipe::register(SIGTERM, w)?;
    let mut buf: [u8; 1] = [0];
    async_read.read_exact(&mut buf).await?;
    Ok(())
}

pub fn start_metrics_server(port: u16) -> bool {
    let addr = format!("0.0.0.0:{}", port);
    let parsed_addr = match addr.parse() {
        Err(e) => {
            log::error!("Failed to parse prometheus address {}: {}", addr, e);
            return false;
        }
        Ok(a) => a,
    };
    match prometheus_exporter::start(parsed_addr) {
        Ok(..) => true,
        Err(e) => {
            log::warn!("Could not launch prometheus HTTP server: {}", e);
            false
        }
    }
}
