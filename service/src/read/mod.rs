//! Read entities definitions.

pub mod job;
pub mod report;
