//! Document-store layer for campus-resolve.
//!
//! Complaints and user profiles live in a hosted document store. This crate
//! describes that store as the [`DocumentStore`] trait, ships an in-memory
//! implementation, and wraps the two collections the application reads in
//! repositories.

pub mod document;
pub mod memory;
pub mod repositories;

pub use document::{Direction, Document, DocumentStore, FieldUpdate, Query, StoredDocument};
pub use memory::InMemoryDocumentStore;
pub use repositories::{ComplaintRepository, UserRepository, user::UserRecord};
