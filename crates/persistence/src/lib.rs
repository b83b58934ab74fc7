#![deny(warnings)]

//! Persistence layer: versioned save documents, schema migrations and
//! key-value storage backends.
//!
//! A save slot is three documents under their own keys: the session, the
//! research state and the progress book. Only the session document is
//! versioned; it is migrated step by step on load.

pub mod document;
pub mod error;
pub mod migration;
pub mod save;
pub mod store;

pub use document::{deserialize, deserialize_with, restore, serialize, to_json, SaveDocument};
pub use error::{PersistError, StoreError};
pub use migration::{migrate, CURRENT_VERSION};
pub use save::{LoadedGame, SaveManager};
pub use store::{default_sqlite_url, init_db, FileStore, KeyValueStore, MemoryStore, SqliteStore};
