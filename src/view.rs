use crate::feed::{FeedState, FeedStatus};
use crate::layout::partition;
use crate::lightbox::{Lightbox, Rotation};
use crate::model::Image;
use crate::subscription::ListenerKind;
use std::fmt;
use std::sync::Arc;

pub fn empty_message(term: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        "No images found".to_string()
    } else {
        format!("No images found for \"{term}\"")
    }
}

/// One grid cell.
#[derive(Debug, Clone)]
pub struct Tile {
    pub image: Arc<Image>,
    /// Position in the flat result list.
    pub index: usize,
    /// Above-the-fold tiles load eagerly.
    pub priority: bool,
    pub aspect_ratio: f32,
}

#[derive(Debug, Clone)]
pub struct LightboxView {
    pub image: Arc<Image>,
    pub index: usize,
    pub total: usize,
    pub rotation: Rotation,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Immutable snapshot published after every state change.
#[derive(Debug, Clone, Default)]
pub struct GalleryView {
    pub search_input: String,
    pub search_term: String,
    pub status: FeedStatus,
    pub loading: bool,
    pub has_more: bool,
    pub image_count: usize,
    pub column_count: usize,
    pub columns: Vec<Vec<Tile>>,
    pub sizes: String,
    pub empty_message: Option<String>,
    pub error: Option<String>,
    pub lightbox: Option<LightboxView>,
    pub scroll_locked: bool,
    /// Bumped whenever the renderer must scroll back to the top.
    pub scroll_epoch: u64,
    pub listeners: Vec<ListenerKind>,
}

/// Inputs that live outside the feed and lightbox.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub search_input: &'a str,
    pub column_count: usize,
    pub sizes: &'a str,
    pub priority_tiles: usize,
    pub scroll_epoch: u64,
}

impl GalleryView {
    pub fn compose(
        feed: &FeedState,
        lightbox: &Lightbox,
        frame: Frame<'_>,
        listeners: Vec<ListenerKind>,
    ) -> Self {
        let images = feed.images();
        let tiles: Vec<Tile> = images
            .iter()
            .enumerate()
            .map(|(index, image)| Tile {
                image: Arc::clone(image),
                index,
                priority: index < frame.priority_tiles,
                aspect_ratio: image.aspect_ratio(),
            })
            .collect();

        let lightbox_view = lightbox.position(images).map(|index| LightboxView {
            image: Arc::clone(&images[index]),
            index,
            total: images.len(),
            rotation: lightbox.rotation(),
            has_previous: index > 0,
            has_next: index + 1 < images.len(),
        });

        let loading = feed.is_loading();
        let empty_message = (images.is_empty() && !loading).then(|| empty_message(feed.term()));

        Self {
            search_input: frame.search_input.to_string(),
            search_term: feed.term().to_string(),
            status: feed.status(),
            loading,
            has_more: feed.has_more(),
            image_count: images.len(),
            column_count: frame.column_count,
            columns: partition(&tiles, frame.column_count),
            sizes: frame.sizes.to_string(),
            empty_message,
            error: feed.last_error().map(str::to_string),
            lightbox: lightbox_view,
            scroll_locked: listeners.contains(&ListenerKind::ScrollLock),
            scroll_epoch: frame.scroll_epoch,
            listeners,
        }
    }

    /// Tile at flat index `index`, wherever it landed in the columns.
    pub fn tile(&self, index: usize) -> Option<&Tile> {
        let columns = self.columns.len();
        if columns == 0 {
            return None;
        }
        self.columns
            .get(index % columns)?
            .get(index / columns)
            .filter(|tile| tile.index == index)
    }
}

impl fmt::Display for GalleryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "search: {:?} (committed {:?}) status: {:?} images: {} more: {}",
            self.search_input, self.search_term, self.status, self.image_count, self.has_more
        )?;
        if let Some(error) = &self.error {
            writeln!(f, "error: {error}")?;
        }
        if let Some(message) = &self.empty_message {
            writeln!(f, "{message}")?;
        }
        for (i, column) in self.columns.iter().enumerate() {
            let cells: Vec<String> = column
                .iter()
                .map(|tile| {
                    let star = if tile.priority { "*" } else { "" };
                    format!("{}:{}{}", tile.index, tile.image.title, star)
                })
                .collect();
            writeln!(f, "  col {i}: {}", cells.join("  "))?;
        }
        if let Some(lb) = &self.lightbox {
            writeln!(
                f,
                "lightbox [{}/{}] {} ({}) {} by {} {}x{} rotated {}° tags: {}{}{}",
                lb.index + 1,
                lb.total,
                lb.image.title,
                lb.image.id,
                lb.image.display_date,
                lb.image.source,
                lb.image.width,
                lb.image.height,
                lb.rotation.degrees(),
                lb.image.tags.join(", "),
                if lb.has_previous { " <prev" } else { "" },
                if lb.has_next { " next>" } else { "" },
            )?;
        }
        Ok(())
    }
}
