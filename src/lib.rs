//! Humble Bundle library sync core.
//!
//! Loads a browser cookie export, discovers the purchase keys of the signed-in
//! account, resolves each purchase to its download variants and mirrors the
//! files of one format to a local library directory.
//!
//! # Architecture
//!
//! - [`auth`] - Netscape cookie-file parsing and validation
//! - [`session`] - cookie-authenticated HTTP session and endpoint layout
//! - [`library`] - purchase-key discovery from the library page
//! - [`purchase`] - purchase-detail records and the order API resolver
//! - [`download`] - download planning and sequential transfer
//! - [`error`] - crate-wide error type and failure classes

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod download;
pub mod error;
pub mod library;
pub mod purchase;
pub mod session;
mod user_agent;

// Re-export commonly used types
pub use download::{
    BarProgress, DownloadPlan, DownloadPlanner, ErrorPolicy, NoProgress, ProgressReporter,
    TransferOutcome, TransferQueue, TransferStatus, TransferSummary, TransferTask, Transferrer,
};
pub use error::{ErrorKind, SyncError};
pub use library::{LibraryPage, PurchaseKeySource, extract_purchase_keys};
pub use purchase::{PurchaseDetail, PurchaseDetailResolver, PurchaseKey};
pub use session::{DEFAULT_BASE_URL, Session, SessionOptions};
