//! Tubegate - self-hosted front end and stream proxy for a video-hosting platform
//!
//! Metadata is fetched through an external extraction engine, normalized into
//! typed records, and media streams are re-served to browsers through a
//! same-origin proxy with synthesized HLS manifests.

pub mod config;
pub mod error;
pub mod extract;
pub mod hls;
pub mod model;
pub mod pagination;
pub mod server;
pub mod webvtt;

pub use error::{Error, Result};
