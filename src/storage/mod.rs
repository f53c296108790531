//! Result persistence.
//!
//! Site records are written as CSV with one row per registrable domain:
//!
//! ```text
//! URL,Phones,Emails,OrderingLinks
//! example.com,949-555-1212;310-555-0199,hi@example.com,https://example.com/order
//! ```

pub mod sink;

pub use sink::{CsvSink, SinkReport};
