//! Data models shared across the workspace
//!
//! `image` holds the pipeline's input and output types; `record` holds the
//! shapes exchanged with the remote record store.

mod image;
mod record;

pub use image::*;
pub use record::*;
