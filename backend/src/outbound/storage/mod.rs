//! Object storage adapters for uploaded issue photos.

mod filesystem;

pub use filesystem::{FilesystemObjectStorage, StorageSetupError};
