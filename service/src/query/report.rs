//! [`Query`] collection of reports.

use common::operations::By;

use crate::{domain::company, read};
#[cfg(doc)]
use crate::{
    domain::{Company, Job},
    Query,
};

use super::DatabaseQuery;

/// Queries numbers of [`Job`]s per status, either of a single [`Company`] or
/// across all of them.
pub type JobStatuses =
    DatabaseQuery<By<read::report::JobStatuses, Option<company::Id>>>;
