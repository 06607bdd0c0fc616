//! HTTP adapter for the campus-resolve backend.
//!
//! [`HttpComplaintClient`] reads complaints from `/api/complaint/...` and
//! implements the core [`ComplaintSource`](campus_core::ComplaintSource) and
//! [`ComplaintGateway`](campus_core::ComplaintGateway) traits.

pub mod http;

pub use http::HttpComplaintClient;
