//! Wires the debounce, loader and gallery tasks together.

use crate::config::Configuration;
use crate::events::{LoadPage, PageLoaded, UiEvent};
use crate::query::ImageSource;
use crate::subscription::Listeners;
use crate::tasks::{debounce, gallery, loader};
use crate::view::GalleryView;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Handles to a running gallery.
pub struct Pipeline {
    pub ui_tx: mpsc::Sender<UiEvent>,
    pub views: watch::Receiver<GalleryView>,
    pub listeners: Listeners,
    cancel: CancellationToken,
    tasks: JoinSet<Result<()>>,
}

/// Spawns all gallery tasks on the current runtime.
pub fn spawn<S: ImageSource>(
    cfg: Configuration,
    source: Arc<S>,
    cancel: CancellationToken,
) -> Pipeline {
    // Channels (small/bounded)
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(64); // Renderer -> Gallery
    let (typed_tx, typed_rx) = mpsc::channel::<String>(64); // Gallery -> Debounce
    let (committed_tx, committed_rx) = mpsc::channel::<String>(8); // Debounce -> Gallery
    let (to_loader_tx, to_loader_rx) = mpsc::channel::<LoadPage>(32); // Gallery -> Loader
    let (loaded_tx, loaded_rx) = mpsc::channel::<PageLoaded>(32); // Loader -> Gallery
    let (view_tx, views) = watch::channel(GalleryView::default()); // Gallery -> Renderer

    let listeners = Listeners::new();
    let mut tasks = JoinSet::new();

    // Debounce
    tasks.spawn({
        let cancel = cancel.clone();
        let delay = cfg.search_debounce;
        async move {
            debounce::run(typed_rx, committed_tx, cancel, delay)
                .await
                .context("debounce task failed")
        }
    });

    // Loader
    tasks.spawn({
        let cancel = cancel.clone();
        let max_in_flight = cfg.max_concurrent_fetches;
        async move {
            loader::run(to_loader_rx, loaded_tx, source, cancel, max_in_flight)
                .await
                .context("loader task failed")
        }
    });

    // Gallery
    tasks.spawn({
        let ports = gallery::GalleryPorts {
            ui_rx,
            typed_tx,
            committed_rx,
            to_loader: to_loader_tx,
            loaded_rx,
            view_tx,
        };
        let cancel = cancel.clone();
        let listeners = listeners.clone();
        async move {
            gallery::run(ports, cancel, cfg, listeners)
                .await
                .context("gallery task failed")
        }
    });

    Pipeline {
        ui_tx,
        views,
        listeners,
        cancel,
        tasks,
    }
}

impl Pipeline {
    pub async fn send(&self, event: UiEvent) -> Result<()> {
        self.ui_tx
            .send(event)
            .await
            .context("gallery is no longer accepting input")
    }

    pub fn current(&self) -> GalleryView {
        self.views.borrow().clone()
    }

    /// Cancels every task and waits for them to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while let Some(res) = self.tasks.join_next().await {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("task error: {e:?}"),
                Err(e) => tracing::error!("join error: {e}"),
            }
        }
    }
}
