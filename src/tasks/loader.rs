use crate::events::{LoadPage, PageLoaded};
use crate::query::ImageSource;
use anyhow::Result;
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Page fetcher:
/// - Runs each `LoadPage` against `source` concurrently, up to `max_in_flight`.
/// - Forwards every outcome, success or failure, as `PageLoaded`.
/// - Does not judge staleness; the gallery drops superseded generations.
pub async fn run<S: ImageSource>(
    mut load_rx: Receiver<LoadPage>,
    to_gallery: Sender<PageLoaded>,
    source: Arc<S>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let mut tasks: JoinSet<PageLoaded> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => {
                tasks.abort_all();
                break;
            },

            // Accept new requests while under limit
            Some(request) = load_rx.recv(), if tasks.len() < max_in_flight.max(1) => {
                debug!(
                    generation = request.generation,
                    page = request.page,
                    tag = request.query.tag.as_deref(),
                    "fetch: start"
                );
                let source = Arc::clone(&source);
                tasks.spawn(async move {
                    let LoadPage { generation, page, query } = request;
                    let result = source.fetch(query).await;
                    PageLoaded { generation, page, result }
                });
            }

            Some(join_res) = tasks.join_next() => match join_res {
                Ok(loaded) => {
                    match &loaded.result {
                        Ok(rows) => debug!(
                            generation = loaded.generation,
                            page = loaded.page,
                            rows = rows.len(),
                            "fetch: done"
                        ),
                        Err(err) => warn!(
                            generation = loaded.generation,
                            page = loaded.page,
                            "fetch failed: {err}"
                        ),
                    }
                    if to_gallery.send(loaded).await.is_err() {
                        warn!("gallery channel closed");
                        break;
                    }
                }
                Err(err) => warn!("fetch task aborted: {err}"),
            },

            else => break,
        }
    }
    Ok(())
}
