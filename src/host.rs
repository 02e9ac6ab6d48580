use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::context::{TasContext, TickOutcome};
use crate::script::ButtonSet;
use crate::transfer::ReceivedScript;
use crate::util::thread::{local_runtime, ServiceThread};
use crate::util::timeout::cancellable;

/* Stands in for the game when running on a desktop: ticks the context at the configured rate with
 * no real controller attached, and logs what would have been fed to the game. */
pub fn spawn(
    config: Settings,
    rx: UnboundedReceiver<ReceivedScript>,
    shutdown_token: CancellationToken,
) -> std::io::Result<ServiceThread> {
    ServiceThread::spawn("host", shutdown_token, move |token| {
        let Some(local_loop) = local_runtime("host") else {
            return;
        };
        let mut ctx = TasContext::new(&config, rx);
        local_loop.block_on(run_host(&mut ctx, &config, &token));
        log::debug!("Host thread finished");
    })
}

pub async fn run_host(ctx: &mut TasContext, config: &Settings, shutdown_token: &CancellationToken) {
    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    while cancellable(ticker.tick(), shutdown_token).await.is_some() {
        let outcome = ctx.tick(ButtonSet::NONE, |snapshot| {
            if let Some(s) = snapshot {
                log::trace!("Feeding frame {} to the game", s.frame);
            }
        });
        match outcome {
            TickOutcome::Finished => log::info!("Replay over, back to real input"),
            TickOutcome::Aborted => log::warn!("Replay aborted, back to real input"),
            _ => (),
        }
    }
}
