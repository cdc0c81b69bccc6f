//! zapimg storage library
//!
//! Storage abstraction and backends for stored media objects. Objects are
//! write-once: keys are generated (never user-chosen), and there is no
//! update or delete surface. The S3 backend targets any S3-compatible
//! provider via `object_store`; the local backend serves development and
//! tests.

pub mod factory;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
