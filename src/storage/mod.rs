pub mod base;
pub mod disk;
pub mod layout;

pub use base::{StorageBackend, StorageError};
pub use disk::DiskStorage;
pub use layout::{destination, extract_filename, extract_site_and_section, Destination};
