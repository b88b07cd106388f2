//! Streaming catalog access
//!
//! - [`target`] recognizes the input URLs
//! - [`models`] holds the API wire shapes and the domain types built from them
//! - [`client`] defines the [`CatalogApi`] seam and its `reqwest` implementation

pub mod client;
pub mod models;
pub mod target;

pub use client::{CatalogApi, CatalogClient};
pub use models::{
    AlbumRef, ArtistItem, ArtistRef, ArtistRelationship, CatalogEntity, EntityAttributes,
    EntityKind, MotionArtwork, MusicVideoInfo, SongInfo, Track, TrackKind,
};
pub use target::Target;
