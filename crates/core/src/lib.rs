#![forbid(unsafe_code)]

pub mod ingest;
pub mod model;
pub mod stats;
pub mod time;
pub mod validation;

pub use time::Clock;
