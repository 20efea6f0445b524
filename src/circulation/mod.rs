//! Circulation rules on top of the record store.
//!
//! The manager is the only writer of books, members and loans. It validates
//! every request before touching the store, so a rejected request never
//! leaves a partial mutation behind.

mod loan_id;
mod manager;

pub use loan_id::{LoanIdGenerator, LOAN_ID_PREFIX};
pub use manager::CirculationManager;
