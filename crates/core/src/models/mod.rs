//! Typed complaint records.

pub mod comment;
pub mod complaint;

pub use comment::{Comment, Role};
pub use complaint::{Category, Complaint, Priority, Status, StatusUpdate};
