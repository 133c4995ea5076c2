//! Receipt Printing Module
//!
//! - **receipt**: order → receipt text
//! - **service**: resolves the branch printer and delivers through `chai-printer`,
//!   degrading to a warning when the printer is unreachable

pub mod receipt;
pub mod service;

pub use receipt::ReceiptFormatter;
pub use service::{PrintKind, PrintOutcome, PrintReport, PrintRequest, PrintService};
