//! [`Handler`] abstractions.
//!
//! Commands, queries, background tasks and database operations are all
//! expressed as a [`Handler`] of some argument type, so a single service may
//! handle many different operations, each with its own output and error.

use std::future::Future;

/// Executable handler of `Args`.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
