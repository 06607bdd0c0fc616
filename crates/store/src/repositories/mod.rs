//! Repository layer over the document store.

pub mod complaint;
pub mod user;

pub use complaint::ComplaintRepository;
pub use user::UserRepository;
