//! # Library Ledger
//!
//! Circulation records for a small library: the book catalog, registered
//! members, and the loans between them, kept in a single JSON file.
//!
//! ## Core Concepts
//!
//! - **Store**: named collections of structured records with equality lookup,
//!   persisted in full after every mutation
//! - **Models**: typed `Book`, `Member` and `Loan` records
//! - **Circulation**: the manager enforcing unique ids, book availability,
//!   member activity and the checkout/return lifecycle
//!
//! ## Example
//!
//! ```no_run
//! use library_ledger::{CirculationManager, StoreConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CirculationManager::open(StoreConfig {
//!     path: "./library.json".into(),
//!     ..Default::default()
//! })?;
//!
//! manager.add_book("978-1234", "El Quijote", "Miguel de Cervantes")?;
//! manager.register_member("U1", "Ana", "ana@email.com")?;
//! manager.checkout("978-1234", "U1")?;
//! manager.return_book("978-1234")?;
//! # Ok(())
//! # }
//! ```

pub mod circulation;
pub mod error;
pub mod models;
pub mod store;
pub mod types;

// Re-exports
pub use circulation::{CirculationManager, LoanIdGenerator, LOAN_ID_PREFIX};
pub use error::{
    CirculationError, CirculationResult, EntityKind, Result, StateViolation, StoreError,
};
pub use models::{Book, Loan, Member, Model};
pub use store::{CorruptPolicy, Store, StoreConfig};
pub use types::*;
