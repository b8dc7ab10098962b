//! HILQ Core - Core types, errors and session documents
//!
//! This crate provides the foundational types shared by the learning engine
//! and the command line driver.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::neg_cmp_op_on_partial_ord)]

pub mod error;
pub mod session;
pub mod types;
pub mod util;

pub use error::{HilqError, Result};
pub use session::{FeedbackRecord, Session, SessionConfig, SessionResult, TableEntry, TableExport};
pub use types::*;
