//! Background [`Task`]s definitions.

mod background;
pub mod expire_jobs;

pub use common::Handler as Task;

pub use self::{background::Background, expire_jobs::ExpireJobs};
