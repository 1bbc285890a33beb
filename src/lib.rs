pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod layout;
pub mod lightbox;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod subscription;
pub mod view;
pub mod tasks {
    pub mod debounce;
    pub mod gallery;
    pub mod loader;
}
