use crate::config::Configuration;
use crate::events::{LoadPage, PageLoaded, UiEvent};
use crate::feed::{Applied, FeedState};
use crate::layout::ScrollMetrics;
use crate::lightbox::Lightbox;
use crate::subscription::{LightboxSubscriptions, ListenerKind, Listeners, Subscription};
use crate::view::{Frame, GalleryView};
use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Channel ends owned by the gallery task.
pub struct GalleryPorts {
    /// Renderer -> Gallery
    pub ui_rx: Receiver<UiEvent>,
    /// Gallery -> Debounce (live search box value)
    pub typed_tx: Sender<String>,
    /// Debounce -> Gallery
    pub committed_rx: Receiver<String>,
    /// Gallery -> Loader
    pub to_loader: Sender<LoadPage>,
    /// Loader -> Gallery
    pub loaded_rx: Receiver<PageLoaded>,
    /// Gallery -> Renderer
    pub view_tx: watch::Sender<GalleryView>,
}

/// What an input asks the task to send elsewhere.
#[derive(Debug, PartialEq)]
pub enum Outbound {
    Typed(String),
    Load(LoadPage),
}

/// Owns the feed, layout and lightbox and turns inputs into outbound work.
///
/// Rules:
/// - The committed term starts empty; page 1 of the unfiltered feed is loaded on start.
/// - Keystrokes go to the debouncer; only committed terms reset the feed.
/// - Scroll near the bottom asks the feed for the next page; the feed guards in-flight fetches.
/// - Keyboard and touch are honoured only while the lightbox holds its subscriptions.
/// - Background scroll is ignored while the lightbox is open.
/// - A committed search closes the lightbox along with the list it was showing.
pub struct GalleryState {
    feed: FeedState,
    lightbox: Lightbox,
    listeners: Listeners,
    lightbox_subs: Option<LightboxSubscriptions>,
    search_input: String,
    column_count: usize,
    sizes: String,
    scroll_epoch: u64,
    cfg: Configuration,
}

impl GalleryState {
    pub fn new(cfg: Configuration, listeners: Listeners) -> Self {
        let column_count = cfg.columns.column_count(None);
        Self {
            feed: FeedState::new(cfg.page_limit, cfg.shuffle_seed),
            lightbox: Lightbox::new(cfg.swipe_threshold),
            listeners,
            lightbox_subs: None,
            search_input: String::new(),
            column_count,
            sizes: cfg.columns.sizes_hint(),
            scroll_epoch: 0,
            cfg,
        }
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    /// Loads page 1 for the current committed term.
    pub fn start(&mut self) -> LoadPage {
        self.feed.restart()
    }

    pub fn on_ui(&mut self, event: UiEvent) -> Option<Outbound> {
        match event {
            UiEvent::SearchInput(value) => {
                self.feed.search_typed(&value);
                self.search_input = value.clone();
                Some(Outbound::Typed(value))
            }
            UiEvent::Scrolled(metrics) => self.on_scroll(metrics),
            UiEvent::Resized(width) => {
                let columns = self.cfg.columns.column_count(width);
                if columns != self.column_count {
                    debug!(width, columns, "layout: column count changed");
                    self.column_count = columns;
                }
                None
            }
            UiEvent::Select(id) => {
                if self.feed.position_of(&id).is_none() {
                    debug!(%id, "select: not in current list");
                    return None;
                }
                self.lightbox.open(id);
                if self.lightbox_subs.is_none() {
                    self.lightbox_subs = Some(LightboxSubscriptions::acquire(&self.listeners));
                }
                None
            }
            UiEvent::Next => {
                self.lightbox.next(self.feed.images());
                None
            }
            UiEvent::Previous => {
                self.lightbox.previous(self.feed.images());
                None
            }
            UiEvent::Key(key) => {
                if self.listeners.is_active(ListenerKind::Keyboard) {
                    self.lightbox.handle_key(key, self.feed.images());
                    self.sync_subscriptions();
                }
                None
            }
            UiEvent::TouchStart(x) => {
                if self.listeners.is_active(ListenerKind::Touch) {
                    self.lightbox.touch_start(x);
                }
                None
            }
            UiEvent::TouchMove(x) => {
                if self.listeners.is_active(ListenerKind::Touch) {
                    self.lightbox.touch_move(x);
                }
                None
            }
            UiEvent::TouchEnd => {
                if self.listeners.is_active(ListenerKind::Touch) {
                    if let Some(swipe) = self.lightbox.touch_end(self.feed.images()) {
                        debug!(?swipe, "lightbox: swipe");
                    }
                }
                None
            }
            UiEvent::Rotate => {
                self.lightbox.rotate();
                None
            }
            UiEvent::Close => {
                self.lightbox.close();
                self.sync_subscriptions();
                None
            }
            UiEvent::TagClicked(tag) => {
                if !self.lightbox.is_open() {
                    return None;
                }
                let term = self.lightbox.tag_clicked(&tag);
                self.sync_subscriptions();
                self.scroll_epoch += 1;
                self.feed.search_typed(&term);
                self.search_input = term.clone();
                info!(tag = %term, "lightbox: searching by tag");
                Some(Outbound::Typed(term))
            }
        }
    }

    fn on_scroll(&mut self, metrics: ScrollMetrics) -> Option<Outbound> {
        if self.listeners.is_active(ListenerKind::ScrollLock) {
            return None;
        }
        if !metrics.near_bottom(self.cfg.scroll_threshold) {
            return None;
        }
        self.feed.request_next_page().map(Outbound::Load)
    }

    pub fn on_committed(&mut self, term: String) -> Option<LoadPage> {
        let request = self.feed.search_committed(term)?;
        if self.lightbox.is_open() {
            debug!("lightbox: closed by feed reset");
            self.lightbox.close();
        }
        self.sync_subscriptions();
        info!(
            term = self.feed.term(),
            generation = request.generation,
            "search: committed; feed reset"
        );
        Some(request)
    }

    pub fn on_loaded(&mut self, loaded: PageLoaded) -> Applied {
        let generation = loaded.generation;
        let page = loaded.page;
        let applied = self.feed.apply(loaded);
        self.sync_subscriptions();
        match applied {
            Applied::Stale => debug!(generation, page, "page: discarded stale response"),
            Applied::Failed => warn!(
                generation,
                page,
                error = self.feed.last_error(),
                "page: fetch failed; no more pages will be requested"
            ),
            Applied::Replaced { count } => info!(
                generation,
                page,
                count,
                has_more = self.feed.has_more(),
                "page: first page loaded (shuffled)"
            ),
            Applied::Appended { count, skipped } => info!(
                generation,
                page,
                count,
                skipped,
                has_more = self.feed.has_more(),
                "page: appended"
            ),
        }
        applied
    }

    /// Releases lightbox listeners once the selection is gone, including a
    /// selection that no longer exists in the loaded list.
    fn sync_subscriptions(&mut self) {
        if self.lightbox.is_open() && self.lightbox.position(self.feed.images()).is_none() {
            self.lightbox.close();
        }
        if !self.lightbox.is_open() {
            self.lightbox_subs = None;
        }
    }

    pub fn view(&self) -> GalleryView {
        GalleryView::compose(
            &self.feed,
            &self.lightbox,
            Frame {
                search_input: &self.search_input,
                column_count: self.column_count,
                sizes: &self.sizes,
                priority_tiles: self.cfg.priority_tiles,
                scroll_epoch: self.scroll_epoch,
            },
            self.listeners.active(),
        )
    }
}

pub async fn run(
    ports: GalleryPorts,
    cancel: CancellationToken,
    cfg: Configuration,
    listeners: Listeners,
) -> Result<()> {
    let GalleryPorts {
        mut ui_rx,
        typed_tx,
        mut committed_rx,
        to_loader,
        mut loaded_rx,
        view_tx,
    } = ports;

    // Mounted for the whole session; dropped on every exit path.
    let _scroll: Subscription = listeners.subscribe(ListenerKind::Scroll);
    let _resize: Subscription = listeners.subscribe(ListenerKind::Resize);

    let mut state = GalleryState::new(cfg, listeners);
    let first = state.start();
    if to_loader.send(first).await.is_err() {
        warn!("loader channel closed before start");
        return Ok(());
    }
    view_tx.send_replace(state.view());
    info!("gallery started");

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe_ui = ui_rx.recv() => {
                let Some(event) = maybe_ui else {
                    info!("ui channel closed; stopping gallery");
                    break;
                };
                match state.on_ui(event) {
                    Some(Outbound::Typed(value)) => {
                        if typed_tx.send(value).await.is_err() {
                            warn!("debounce channel closed");
                            break;
                        }
                    }
                    Some(Outbound::Load(request)) => {
                        if to_loader.send(request).await.is_err() {
                            warn!("loader channel closed");
                            break;
                        }
                    }
                    None => {}
                }
            }

            Some(term) = committed_rx.recv() => {
                if let Some(request) = state.on_committed(term) {
                    if to_loader.send(request).await.is_err() {
                        warn!("loader channel closed");
                        break;
                    }
                }
            }

            Some(loaded) = loaded_rx.recv() => {
                state.on_loaded(loaded);
            }
        }

        view_tx.send_replace(state.view());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::feed::FeedStatus;
    use crate::lightbox::Key;
    use crate::model::{ImageId, RawImageRow};
    use chrono::{Duration, TimeZone, Utc};

    fn cfg() -> Configuration {
        Configuration {
            shuffle_seed: Some(11),
            ..Configuration::default()
        }
    }

    fn rows(range: std::ops::Range<usize>) -> Vec<RawImageRow> {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        range
            .map(|i| RawImageRow {
                id: ImageId::new(format!("{i}")),
                tags: Some(vec![format!("tag{i}"), "shared".to_string()]),
                width: 400,
                height: 300,
                source: Some("Archive".to_string()),
                gcs_url: format!("https://cdn.example/{i}.jpg"),
                created_at: base - Duration::hours(i as i64),
            })
            .collect()
    }

    fn loaded(request: &LoadPage, rows: Vec<RawImageRow>) -> PageLoaded {
        PageLoaded {
            generation: request.generation,
            page: request.page,
            result: Ok(rows),
        }
    }

    fn bottom() -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: 1200.0,
            viewport_height: 800.0,
            document_height: 2100.0,
        }
    }

    fn started(listeners: &Listeners) -> GalleryState {
        let mut state = GalleryState::new(cfg(), listeners.clone());
        let first = state.start();
        state.on_loaded(loaded(&first, rows(0..14)));
        state
    }

    #[test]
    fn scroll_near_bottom_loads_next_page_once() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);

        let far = ScrollMetrics {
            scroll_top: 0.0,
            viewport_height: 800.0,
            document_height: 5000.0,
        };
        assert_eq!(state.on_ui(UiEvent::Scrolled(far)), None);

        let Some(Outbound::Load(request)) = state.on_ui(UiEvent::Scrolled(bottom())) else {
            panic!("expected a page request");
        };
        assert_eq!(request.page, 2);
        assert_eq!(state.on_ui(UiEvent::Scrolled(bottom())), None);
    }

    #[test]
    fn resize_changes_column_count() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);
        assert_eq!(state.view().column_count, 1);
        state.on_ui(UiEvent::Resized(Some(1300.0)));
        let view = state.view();
        assert_eq!(view.column_count, 5);
        assert_eq!(view.columns.len(), 5);
        assert_eq!(view.columns[0].len(), 3);
    }

    #[test]
    fn lightbox_listeners_follow_selection() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);
        let id = state.feed().images()[3].id.clone();

        state.on_ui(UiEvent::Key(Key::ArrowRight));
        assert!(!state.lightbox().is_open());

        state.on_ui(UiEvent::Select(id));
        assert!(listeners.is_active(ListenerKind::Keyboard));
        assert!(state.view().scroll_locked);
        assert_eq!(state.on_ui(UiEvent::Scrolled(bottom())), None);

        state.on_ui(UiEvent::Key(Key::ArrowRight));
        assert_eq!(state.view().lightbox.unwrap().index, 4);

        state.on_ui(UiEvent::Key(Key::Escape));
        assert!(!listeners.is_active(ListenerKind::Keyboard));
        assert!(!listeners.is_active(ListenerKind::ScrollLock));
        assert!(state.view().lightbox.is_none());
    }

    #[test]
    fn tag_click_types_search_and_scrolls_to_top() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);
        let id = state.feed().images()[0].id.clone();
        state.on_ui(UiEvent::Select(id));

        let out = state.on_ui(UiEvent::TagClicked("shared".to_string()));
        assert_eq!(out, Some(Outbound::Typed("shared".to_string())));
        let view = state.view();
        assert!(view.lightbox.is_none());
        assert!(!view.scroll_locked);
        assert_eq!(view.scroll_epoch, 1);
        assert_eq!(view.search_input, "shared");

        let request = state.on_committed("shared".to_string()).unwrap();
        assert_eq!(request.query.tag.as_deref(), Some("shared"));
        assert!(state.view().loading);
    }

    #[test]
    fn committed_search_closes_lightbox_and_releases_scroll() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);
        let id = state.feed().images()[0].id.clone();
        state.on_ui(UiEvent::Select(id));
        assert!(state.view().scroll_locked);

        state.on_ui(UiEvent::SearchInput("other".to_string()));
        let request = state.on_committed("other".to_string()).unwrap();
        assert!(!state.lightbox().is_open());
        assert!(!listeners.is_active(ListenerKind::Keyboard));
        assert!(!listeners.is_active(ListenerKind::Touch));
        assert!(!listeners.is_active(ListenerKind::ScrollLock));

        state.on_loaded(loaded(&request, rows(100..114)));
        let view = state.view();
        assert!(view.lightbox.is_none());
        assert!(!view.scroll_locked);
        assert!(matches!(
            state.on_ui(UiEvent::Scrolled(bottom())),
            Some(Outbound::Load(LoadPage { page: 2, .. }))
        ));
    }

    #[test]
    fn first_page_failure_shows_empty_state() {
        let listeners = Listeners::new();
        let mut state = GalleryState::new(cfg(), listeners.clone());
        state.start();
        state.on_ui(UiEvent::SearchInput("sunset".to_string()));
        let request = state.on_committed("sunset".to_string()).unwrap();
        let applied = state.on_loaded(PageLoaded {
            generation: request.generation,
            page: request.page,
            result: Err(FetchError::Query("offline".to_string())),
        });
        assert_eq!(applied, Applied::Failed);

        let feed = state.feed();
        assert_eq!(feed.status(), FeedStatus::Error);
        assert!(feed.images().is_empty());
        assert!(!feed.has_more());
        assert!(!feed.is_loading());

        let view = state.view();
        assert!(!view.loading);
        assert_eq!(
            view.empty_message.as_deref(),
            Some("No images found for \"sunset\"")
        );
        assert_eq!(view.error.as_deref(), Some("query failed: offline"));
        assert_eq!(state.on_ui(UiEvent::Scrolled(bottom())), None);
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);
        state.on_ui(UiEvent::Select(ImageId::new("missing")));
        assert!(!state.lightbox().is_open());
        assert!(!listeners.is_active(ListenerKind::Keyboard));
    }

    #[test]
    fn swipe_navigates_inside_lightbox() {
        let listeners = Listeners::new();
        let mut state = started(&listeners);
        let id = state.feed().images()[5].id.clone();
        state.on_ui(UiEvent::Select(id));

        state.on_ui(UiEvent::TouchStart(400.0));
        state.on_ui(UiEvent::TouchMove(250.0));
        state.on_ui(UiEvent::TouchEnd);
        assert_eq!(state.view().lightbox.unwrap().index, 6);

        state.on_ui(UiEvent::Rotate);
        state.on_ui(UiEvent::Rotate);
        assert_eq!(state.view().lightbox.unwrap().rotation.degrees(), 180);
        state.on_ui(UiEvent::Previous);
        let lb = state.view().lightbox.unwrap();
        assert_eq!(lb.index, 5);
        assert_eq!(lb.rotation.degrees(), 0);
    }
}
