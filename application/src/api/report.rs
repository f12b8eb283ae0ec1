//! Reports definitions.

use derive_more::From;
use juniper::graphql_object;
use service::{domain, read};

use crate::{api, Context};

/// Report counting `Job`s per status.
#[derive(Clone, Debug, From)]
pub struct JobStatuses(read::report::JobStatuses);

impl JobStatuses {
    /// Returns the number of `Job`s having the provided status.
    fn count(&self, status: domain::job::Status) -> i32 {
        i32::try_from(self.0.count(status)).unwrap_or(i32::MAX)
    }
}

/// Report counting `Job`s per status.
#[graphql_object(name = "JobStatusReport", context = Context)]
impl JobStatuses {
    /// Number of active `Job`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "JobStatusReport.active",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn active(&self) -> i32 {
        self.count(domain::job::Status::Active)
    }

    /// Number of inactive `Job`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "JobStatusReport.inactive",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn inactive(&self) -> i32 {
        self.count(domain::job::Status::Inactive)
    }

    /// Number of closed `Job`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "JobStatusReport.closed",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn closed(&self) -> i32 {
        self.count(domain::job::Status::Closed)
    }

    /// Number of expired `Job`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "JobStatusReport.expired",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn expired(&self) -> i32 {
        self.count(domain::job::Status::Expired)
    }

    /// Total number of `Job`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "JobStatusReport.total",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total(&self) -> i32 {
        i32::try_from(self.0.total()).unwrap_or(i32::MAX)
    }
}
