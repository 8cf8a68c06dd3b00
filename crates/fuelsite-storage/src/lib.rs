//! Fuelsite Storage Library
//!
//! Storage abstraction for uploaded image files and its local filesystem
//! implementation.
//!
//! # Storage key format
//!
//! Keys are flat file names relative to the storage root, e.g.
//! `file-1718000000000-123456789.png` for server uploads or `item-42.jpg` for
//! migrated record images. Keys must not contain `..` or a leading `/`.
//! Key generation is centralized in the `keys` module.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::{generate_upload_key, record_image_key};
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
