//! # CellKV
//!
//! A minimal log-structured key-value store for fixed-size byte-addressable
//! storage (EEPROM cell arrays or a single persistent file):
//! - Append-only log of text records, one per line
//! - In-place tombstones instead of byte shifting
//! - Compaction to reclaim tombstoned space
//! - Point lookups by linear scan, no index in RAM
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store Facade                          │
//! │    begin / format / get / insert / remove / exists / ...     │
//! └──────┬──────────────────┬──────────────────┬────────────────┘
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//!  ┌───────────┐     ┌─────────────┐    ┌─────────────┐
//!  │  Scanner  │     │  Compactor  │    │    Size     │
//!  │ (lookups) │     │ (rewrites)  │    │ Accountant  │
//!  └─────┬─────┘     └──────┬──────┘    └──────┬──────┘
//!        │                  │                  │
//!        └─────────┬────────┴──────────────────┘
//!                  ▼
//!          ┌──────────────┐
//!          │ Record Codec │
//!          └──────┬───────┘
//!                 ▼
//!          ┌──────────────┐
//!          │Storage Medium│  (MemoryMedium / FileMedium)
//!          └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cellkv::{MemoryMedium, Store};
//!
//! let mut store = Store::new(MemoryMedium::new(64));
//! store.begin().unwrap();
//! store.format().unwrap();
//!
//! store.insert("a", "1").unwrap();
//! store.insert("b", "22").unwrap();
//! store.remove("a").unwrap();
//! store.insert("c", "333").unwrap();
//!
//! assert_eq!(store.get("a", "?").unwrap(), "?");
//! assert_eq!(store.get("b", "?").unwrap(), "22");
//! assert_eq!(store.get("c", "?").unwrap(), "333");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod medium;
pub mod record;
pub mod scanner;
pub mod accountant;
pub mod compactor;
pub mod store;
pub mod backup;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CellError, Result, Status};
pub use config::Config;
pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CellKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
