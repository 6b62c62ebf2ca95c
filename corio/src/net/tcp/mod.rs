//! TCP networking implementation.
//!
//! It is split into:
//! - [`listener`]: accepting incoming TCP connections,
//! - [`stream`]: connected TCP streams.

pub mod listener;
pub mod stream;
