//! Repository Pattern Implementation
//!
//! This module provides abstract interfaces for data access, allowing easy
//! swapping of storage backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Repository Traits               │
//! │  (Abstract interface for data access)   │
//! └──────────────┬──────────────────────────┘
//!                │
//!        ┌───────┴──────────────┐
//!        │                      │
//! ┌──────▼──────────┐  ┌────────▼─────────────┐
//! │SqliteTrackRepo  │  │FilePreferencesRepo   │
//! │                 │  │                      │
//! │- Offline tracks │  │- JSON document       │
//! │- Whole records  │  │- Atomic replace      │
//! └─────────────────┘  └──────────────────────┘
//! ```

pub mod factory;
pub mod file;
pub mod sqlite;
pub mod traits;

// Re-export main types
pub use factory::{RepositoryFactory, RepositoryManager};
pub use file::FilePreferencesRepository;
pub use sqlite::SqliteTrackRepository;
pub use traits::{PreferencesRepository, TrackRepository};
