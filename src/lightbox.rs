use crate::model::{Image, ImageId};
use std::sync::Arc;

/// Display rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next quarter turn clockwise, wrapping at 360.
    pub fn advance(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Next,
    Previous,
}

/// Horizontal positions of one touch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureState {
    start_x: Option<f32>,
    end_x: Option<f32>,
}

impl GestureState {
    /// A fresh sequence; any displacement from the previous one is dropped.
    pub fn begin(x: f32) -> Self {
        Self {
            start_x: Some(x),
            end_x: None,
        }
    }

    pub fn moved(self, x: f32) -> Self {
        Self {
            end_x: Some(x),
            ..self
        }
    }

    /// Start minus end; positive when the finger travelled left.
    pub fn displacement(&self) -> f32 {
        match (self.start_x, self.end_x) {
            (Some(start), Some(end)) => start - end,
            _ => 0.0,
        }
    }

    /// Classifies the finished sequence. Travel must exceed `threshold`.
    pub fn finish(self, threshold: f32) -> Option<Swipe> {
        let dx = self.displacement();
        if dx > threshold {
            Some(Swipe::Next)
        } else if dx < -threshold {
            Some(Swipe::Previous)
        } else {
            None
        }
    }
}

/// Full-screen viewer over the currently loaded images.
///
/// Holds only the selected id; position is looked up in whatever list the
/// caller passes, so traversal always follows the grid's current order.
#[derive(Debug, Clone)]
pub struct Lightbox {
    selected: Option<ImageId>,
    rotation: Rotation,
    gesture: GestureState,
    swipe_threshold: f32,
}

impl Lightbox {
    pub fn new(swipe_threshold: f32) -> Self {
        Self {
            selected: None,
            rotation: Rotation::Deg0,
            gesture: GestureState::default(),
            swipe_threshold,
        }
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&ImageId> {
        self.selected.as_ref()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn open(&mut self, id: ImageId) {
        self.selected = Some(id);
        self.rotation = Rotation::Deg0;
        self.gesture = GestureState::default();
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.rotation = Rotation::Deg0;
        self.gesture = GestureState::default();
    }

    pub fn rotate(&mut self) {
        if self.is_open() {
            self.rotation = self.rotation.advance();
        }
    }

    /// Index of the selection within `images`, by identity.
    pub fn position(&self, images: &[Arc<Image>]) -> Option<usize> {
        let id = self.selected.as_ref()?;
        images.iter().position(|image| &image.id == id)
    }

    /// Moves to the following image; returns false at the end of the list.
    pub fn next(&mut self, images: &[Arc<Image>]) -> bool {
        match self.position(images) {
            Some(i) if i + 1 < images.len() => {
                self.show(&images[i + 1]);
                true
            }
            _ => false,
        }
    }

    /// Moves to the preceding image; returns false at the start of the list.
    pub fn previous(&mut self, images: &[Arc<Image>]) -> bool {
        match self.position(images) {
            Some(i) if i > 0 => {
                self.show(&images[i - 1]);
                true
            }
            _ => false,
        }
    }

    fn show(&mut self, image: &Image) {
        self.selected = Some(image.id.clone());
        self.rotation = Rotation::Deg0;
    }

    /// Returns true when the key changed the lightbox.
    pub fn handle_key(&mut self, key: Key, images: &[Arc<Image>]) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::ArrowRight => self.next(images),
            Key::ArrowLeft => self.previous(images),
            Key::Escape => {
                self.close();
                true
            }
        }
    }

    pub fn touch_start(&mut self, x: f32) {
        self.gesture = GestureState::begin(x);
    }

    pub fn touch_move(&mut self, x: f32) {
        self.gesture = self.gesture.moved(x);
    }

    /// Ends the touch sequence and navigates if it was a swipe.
    pub fn touch_end(&mut self, images: &[Arc<Image>]) -> Option<Swipe> {
        let gesture = std::mem::take(&mut self.gesture);
        let swipe = gesture.finish(self.swipe_threshold)?;
        let moved = match swipe {
            Swipe::Next => self.next(images),
            Swipe::Previous => self.previous(images),
        };
        moved.then_some(swipe)
    }

    /// Closes the viewer and returns the tag to search for.
    pub fn tag_clicked(&mut self, tag: &str) -> String {
        self.close();
        tag.to_string()
    }
}
