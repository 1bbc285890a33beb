use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Coalesces live search input into committed terms.
///
/// Rules:
/// - Every value received restarts a single timer of `delay`.
/// - When the timer fires, the latest value is forwarded; earlier ones are dropped.
/// - On cancellation or when the input side closes, a pending value is discarded.
pub async fn run(
    mut raw_rx: Receiver<String>,
    committed_tx: Sender<String>,
    cancel: CancellationToken,
    delay: Duration,
) -> Result<()> {
    let timer = sleep(delay);
    tokio::pin!(timer);
    let mut pending: Option<String> = None;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe_raw = raw_rx.recv() => match maybe_raw {
                Some(value) => {
                    if let Some(dropped) = pending.replace(value) {
                        debug!(%dropped, "debounce: coalesced keystroke");
                    }
                    timer.as_mut().reset(Instant::now() + delay);
                }
                None => break,
            },

            _ = &mut timer, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    debug!(term = %value, "debounce: committed");
                    if committed_tx.send(value).await.is_err() {
                        warn!("committed-search channel closed");
                        break;
                    }
                }
            }
        }
    }

    if let Some(dropped) = pending {
        debug!(%dropped, "debounce: discarded pending value on shutdown");
    }
    Ok(())
}
