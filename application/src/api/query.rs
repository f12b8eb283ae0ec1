//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{domain, query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `USER_NOT_EXISTS` - the authenticated `User` has been deleted.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        Self::user(my_id, ctx).await
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Company` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `COMPANY_NOT_EXISTS` - the `Company` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "company",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn company(
        id: api::company::Id,
        ctx: &Context,
    ) -> Result<api::Company, Error> {
        ctx.service()
            .execute(query::company::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| CompanyError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Job` with the specified ID.
    ///
    /// An overdue `Job` is returned already expired.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `JOB_NOT_EXISTS` - the `Job` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "job",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn job(
        id: api::job::Id,
        ctx: &Context,
    ) -> Result<api::Job, Error> {
        ctx.service()
            .execute(query::job::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| JobError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Job`s, newest first.
    ///
    /// Lists `ACTIVE` `Job`s unless another `status` is specified. Text
    /// filters match any of their words case-insensitively.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            company_id = ?company_id,
            first = ?first,
            gql.name = "jobs",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            status = ?status,
            title = ?title.as_ref().map(ToString::to_string),
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn jobs(
        first: Option<i32>,
        after: Option<api::job::list::Cursor>,
        last: Option<i32>,
        before: Option<api::job::list::Cursor>,
        status: Option<api::job::Status>,
        company_id: Option<api::company::Id>,
        posted_by: Option<api::user::Id>,
        title: Option<api::job::Title>,
        location: Option<api::job::Location>,
        work_type: Option<api::job::WorkType>,
        employment_type: Option<api::job::EmploymentType>,
        experience_level: Option<api::job::ExperienceLevel>,
        min_salary: Option<api::job::Salary>,
        ctx: &Context,
    ) -> Result<api::job::list::Connection, Error> {
        api::job::list::Connection::fetch(
            first,
            after,
            last,
            before,
            read::job::list::Filter {
                status: status.map_or(domain::job::Status::Active, Into::into),
                company_id: company_id.map(Into::into),
                created_by: posted_by.map(Into::into),
                title: title.map(Into::into),
                location: location.map(Into::into),
                work_type: work_type.map(Into::into),
                employment_type: employment_type.map(Into::into),
                experience_level: experience_level.map(Into::into),
                min_salary: min_salary.map(Into::into),
            },
            ctx,
        )
        .await
    }

    /// Counts `Job`s per status, either across the whole job board or within
    /// the specified `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            company_id = ?company_id,
            gql.name = "jobStatusReport",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn job_status_report(
        company_id: Option<api::company::Id>,
        ctx: &Context,
    ) -> Result<api::report::JobStatuses, Error> {
        ctx.service()
            .execute(query::report::JobStatuses::by(company_id.map(Into::into)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum CompanyError {
        #[code = "COMPANY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Company` with the provided ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum JobError {
        #[code = "JOB_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Job` with the provided ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the provided ID does not exist"]
        NotExists,
    }
}
