//! Search and pagination state for the image feed.
//!
//! `FeedState` is a reducer: every input (keystroke, committed search, scroll
//! trigger, fetch response) is a method that updates state and, where a
//! fetch is needed, hands back the `LoadPage` to send. Each committed search
//! starts a new generation; responses tagged with an older generation are
//! dropped so a slow page from a superseded search can never land in the
//! current list.

use crate::events::{LoadPage, PageLoaded};
use crate::model::{Image, ImageId};
use crate::query::ImageQuery;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// More pages may exist and nothing is in flight.
    #[default]
    Idle,
    /// The search box differs from the committed term; a reset is coming.
    SearchPending,
    FetchingFirstPage,
    FetchingNextPage,
    /// The last fetch failed; no further pages are requested.
    Error,
    /// The last page came back short.
    Exhausted,
}

impl FeedStatus {
    pub fn is_fetching(self) -> bool {
        matches!(self, Self::FetchingFirstPage | Self::FetchingNextPage)
    }
}

/// What `FeedState::apply` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Page 1 of a new search replaced the list.
    Replaced { count: usize },
    /// A later page was appended; `skipped` rows were already present.
    Appended { count: usize, skipped: usize },
    Failed,
    /// Response belonged to a superseded request and was ignored.
    Stale,
}

pub struct FeedState {
    status: FeedStatus,
    generation: u64,
    term: String,
    typing: bool,
    next_page: u32,
    has_more: bool,
    failed: bool,
    in_flight: Option<u32>,
    images: Vec<Arc<Image>>,
    seen: HashSet<ImageId>,
    page_limit: usize,
    last_error: Option<String>,
    rng: StdRng,
}

impl FeedState {
    pub fn new(page_limit: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(page_limit, rng)
    }

    pub fn with_rng(page_limit: usize, rng: StdRng) -> Self {
        Self {
            status: FeedStatus::Idle,
            generation: 0,
            term: String::new(),
            typing: false,
            next_page: 1,
            has_more: true,
            failed: false,
            in_flight: None,
            images: Vec::new(),
            seen: HashSet::new(),
            page_limit: page_limit.max(1),
            last_error: None,
            rng,
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The committed (debounced) search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn images(&self) -> &[Arc<Image>] {
        &self.images
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_fetching()
    }

    /// 1-based number of the page the next scroll trigger would request.
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn position_of(&self, id: &ImageId) -> Option<usize> {
        self.images.iter().position(|image| &image.id == id)
    }

    /// Records a keystroke. `raw` is the live search box value.
    pub fn search_typed(&mut self, raw: &str) {
        self.typing = raw != self.term;
        if !self.status.is_fetching() {
            self.settle();
        }
    }

    /// Applies a debounced search value. A changed term resets the feed and
    /// returns the page-1 request; an unchanged one is a no-op.
    pub fn search_committed(&mut self, term: String) -> Option<LoadPage> {
        self.typing = false;
        if term == self.term {
            if !self.status.is_fetching() {
                self.settle();
            }
            return None;
        }
        self.term = term;
        Some(self.restart())
    }

    /// Starts a fresh search for the committed term: bumps the generation,
    /// clears the list and cursor, and requests page 1. Always wins over
    /// whatever is in flight.
    pub fn restart(&mut self) -> LoadPage {
        self.generation += 1;
        self.images.clear();
        self.seen.clear();
        self.next_page = 1;
        self.has_more = true;
        self.failed = false;
        self.last_error = None;
        self.status = FeedStatus::FetchingFirstPage;
        self.begin(1)
    }

    /// Scroll-triggered request for the next page. Refused while a fetch is
    /// in flight, once exhausted or failed, and while a new search is pending.
    pub fn request_next_page(&mut self) -> Option<LoadPage> {
        if self.status != FeedStatus::Idle {
            return None;
        }
        self.status = FeedStatus::FetchingNextPage;
        Some(self.begin(self.next_page))
    }

    fn begin(&mut self, page: u32) -> LoadPage {
        self.in_flight = Some(page);
        LoadPage {
            generation: self.generation,
            page,
            query: ImageQuery::page(page, self.page_limit, &self.term),
        }
    }

    /// Folds a fetch response into the feed.
    pub fn apply(&mut self, loaded: PageLoaded) -> Applied {
        if loaded.generation != self.generation || self.in_flight != Some(loaded.page) {
            return Applied::Stale;
        }
        self.in_flight = None;

        let rows = match loaded.result {
            Ok(rows) => rows,
            Err(err) => {
                self.failed = true;
                self.has_more = false;
                self.last_error = Some(err.to_string());
                self.settle();
                return Applied::Failed;
            }
        };

        let full = rows.len() == self.page_limit;
        let mut page: Vec<Arc<Image>> = rows
            .into_iter()
            .map(|row| Arc::new(Image::from(row)))
            .collect();

        let applied = if loaded.page == 1 {
            page.shuffle(&mut self.rng);
            self.seen = page.iter().map(|image| image.id.clone()).collect();
            let count = page.len();
            self.images = page;
            Applied::Replaced { count }
        } else {
            let before = self.images.len();
            let offered = page.len();
            for image in page {
                if self.seen.insert(image.id.clone()) {
                    self.images.push(image);
                }
            }
            let count = self.images.len() - before;
            Applied::Appended {
                count,
                skipped: offered - count,
            }
        };

        self.next_page = loaded.page + 1;
        self.has_more = full;
        self.settle();
        applied
    }

    fn settle(&mut self) {
        self.status = if self.typing {
            FeedStatus::SearchPending
        } else if self.failed {
            FeedStatus::Error
        } else if !self.has_more {
            FeedStatus::Exhausted
        } else {
            FeedStatus::Idle
        };
    }
}
