//! # chai-printer
//!
//! Raw network receipt printer client - delivery only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Raw TCP printing (port 9100, no framing, no acknowledgement frame)
//! - Bounded connect / idle timeouts
//! - Clean-close detection after the payload is flushed
//!
//! Business logic (WHAT to print) stays in application code:
//! - Receipt text → pos-server `printing::receipt`
//!
//! ## Example
//!
//! ```ignore
//! use chai_printer::{NetworkPrinter, Printer};
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print("THE CUTTING CHAI\n\n\n".as_bytes()).await?;
//! ```

mod error;
mod printer;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use printer::{DEFAULT_PORT, DEFAULT_TIMEOUT, NetworkPrinter, Printer};
