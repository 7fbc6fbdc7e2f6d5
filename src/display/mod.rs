//! Display formatting for terminal output
//!
//! Formats audit records for terminal display as tables and detail views.

pub mod change;
pub mod request;

pub use change::{format_change_details, format_change_list};
pub use request::{format_request_details, format_request_list};
