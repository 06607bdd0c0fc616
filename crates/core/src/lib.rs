//! Core logic for campus-resolve.
//!
//! Raw records come in through a [`ComplaintSource`], are normalized into
//! [`Complaint`] values, held by a [`ComplaintList`] whose view is derived by
//! the [`pipeline`], and mutated through [`AdminActions`].

pub mod actions;
pub mod auth;
pub mod list;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod priority;
pub mod source;
pub mod view;

pub use actions::{Actor, AdminActions, ComplaintGateway, NewComment, StatusChange, StoreGateway};
pub use auth::{
    AdminAccess, Credential, IdentityProvider, ProviderError, RoleDirectory, Session, SignInForm,
    SignInService,
};
pub use list::{ComplaintList, LoadPhase};
pub use models::{Category, Comment, Complaint, Priority, Role, Status, StatusUpdate};
pub use normalize::{NormalizeOptions, normalize, normalize_all, normalize_with};
pub use notify::{Notice, NoticeLevel, NoticeLog, Notifier, TracingNotifier};
pub use pipeline::{CategoryFilter, ListQuery, SearchScope, SortOrder, StatusCounts, StatusFilter};
pub use priority::suggest_priority;
pub use source::{ComplaintSource, StoreScope, StoreSource};
pub use view::{ListRow, RowAction};
