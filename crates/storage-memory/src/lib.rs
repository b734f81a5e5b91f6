//! In-memory storage implementation for Tallybook.
//!
//! This crate implements the repository traits defined in `tallybook-core`
//! over concurrent hash maps. It exists so the engine is usable and
//! integration-testable without a database; any persistent adapter must match
//! the semantics implemented here.
//!
//! ```text
//!          core (domain)
//!                │
//!                ▼
//!       storage-memory (this crate)
//! ```

pub mod amortizations;
pub mod assets;
pub mod vouchers;

pub use amortizations::MemoryAmortizationRepository;
pub use assets::MemoryAssetRepository;
pub use vouchers::MemoryVoucherRepository;

// Re-export from tallybook-core for convenience
pub use tallybook_core::errors::{DatabaseError, Error, Result};
