//! Core domain models, storage and error handling.
//!
//! Provides the request data model with its redacted client view, the
//! PostgreSQL repository behind the [`RequestStore`] seam, and the error
//! taxonomy shared by the HTTP layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;

pub use error::{CoreError, RemitError, Result};
pub use models::{Amount, NewRequest, Request, RequestId, StoredRequest};
pub use storage::{RequestStore, Storage};
