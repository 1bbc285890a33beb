use crate::error::FetchError;
use crate::layout::ScrollMetrics;
use crate::lightbox::Key;
use crate::model::{ImageId, RawImageRow};
use crate::query::ImageQuery;

/// Gallery -> Loader: fetch one page for the feed generation that asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPage {
    pub generation: u64,
    pub page: u32,
    pub query: ImageQuery,
}

/// Loader -> Gallery: outcome of a `LoadPage`.
#[derive(Debug)]
pub struct PageLoaded {
    pub generation: u64,
    pub page: u32,
    pub result: Result<Vec<RawImageRow>, FetchError>,
}

/// Input coming from whatever renders the gallery.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Live value of the search box.
    SearchInput(String),
    Scrolled(ScrollMetrics),
    /// Viewport width, `None` while unknown.
    Resized(Option<f32>),
    /// A grid tile was clicked.
    Select(ImageId),
    Next,
    Previous,
    Key(Key),
    TouchStart(f32),
    TouchMove(f32),
    TouchEnd,
    Rotate,
    Close,
    /// A tag chip inside the lightbox was clicked.
    TagClicked(String),
}
