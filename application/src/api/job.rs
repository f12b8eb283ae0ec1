//! [`Job`]-related definitions.

use std::future;

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A job posted by a company.
#[derive(Clone, Debug, From)]
pub struct Job {
    /// ID of this [`Job`].
    id: Id,

    /// Underlying [`domain::Job`].
    job: OnceCell<domain::Job>,
}

impl From<domain::Job> for Job {
    fn from(job: domain::Job) -> Self {
        Self {
            id: job.id.into(),
            job: OnceCell::new_with(Some(job)),
        }
    }
}

impl Job {
    /// Creates a new [`Job`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Job`] with the provided ID exists,
    /// otherwise accessing this [`Job`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            job: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Job`].
    ///
    /// An overdue [`domain::Job`] is expired while being loaded.
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Job`] doesn't exist.
    async fn job(&self, ctx: &Context) -> Result<&domain::Job, Error> {
        let id = self.id.into();
        self.job
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::job::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|j| {
                        future::ready(j.ok_or_else(|| {
                            api::query::JobError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Indicates whether the current [`Session`] may manage this [`Job`].
    ///
    /// [`Session`]: crate::Session
    async fn is_managed_by_me(&self, ctx: &Context) -> Result<bool, Error> {
        let Some(my_id) = ctx.try_current_session().await?.map(|s| s.user_id)
        else {
            return Ok(false);
        };
        let job = self.job(ctx).await?;

        let me = ctx
            .service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let company = ctx
            .service()
            .execute(query::company::ById::by(job.company_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(me
            .zip(company)
            .is_some_and(|(me, company)| job.is_managed_by(&me, &company)))
    }
}

/// A job posted by a company.
#[graphql_object(context = Context)]
impl Job {
    /// Unique identifier of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Company` this `Job` belongs to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.company",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn company(&self, ctx: &Context) -> Result<api::Company, Error> {
        let company_id = self.job(ctx).await?.company_id;
        #[expect(unsafe_code, reason = "`Company` is referenced by `Job`")]
        Ok(unsafe { api::Company::new_unchecked(company_id) })
    }

    /// `User` who posted this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.postedBy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn posted_by(&self, ctx: &Context) -> Result<api::User, Error> {
        let author_id = self.job(ctx).await?.created_by;
        #[expect(unsafe_code, reason = "author is referenced by `Job`")]
        Ok(unsafe { api::User::new_unchecked(author_id) })
    }

    /// Title of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.title",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.job(ctx).await?.title.clone().into())
    }

    /// Description of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.description",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Description, Error> {
        Ok(self.job(ctx).await?.description.clone().into())
    }

    /// Skills required by this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.skills",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn skills(&self, ctx: &Context) -> Result<Vec<Skill>, Error> {
        Ok(self
            .job(ctx)
            .await?
            .skills
            .iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Salary offered by this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.salary",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn salary(&self, ctx: &Context) -> Result<Salary, Error> {
        Ok(self.job(ctx).await?.salary.into())
    }

    /// Location of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.location",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn location(&self, ctx: &Context) -> Result<Location, Error> {
        Ok(self.job(ctx).await?.location.clone().into())
    }

    /// Where the work on this `Job` happens.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.workType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn work_type(&self, ctx: &Context) -> Result<WorkType, Error> {
        Ok(self.job(ctx).await?.work_type.into())
    }

    /// Kind of employment offered by this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.employmentType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn employment_type(
        &self,
        ctx: &Context,
    ) -> Result<EmploymentType, Error> {
        Ok(self.job(ctx).await?.employment_type.into())
    }

    /// Seniority required by this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.experienceLevel",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn experience_level(
        &self,
        ctx: &Context,
    ) -> Result<ExperienceLevel, Error> {
        Ok(self.job(ctx).await?.experience_level.into())
    }

    /// Education required by this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.education",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn education(&self, ctx: &Context) -> Result<Education, Error> {
        Ok(self.job(ctx).await?.education.clone().into())
    }

    /// Industry of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.industry",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn industry(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::company::Industry>, Error> {
        Ok(self.job(ctx).await?.industry.clone().map(Into::into))
    }

    /// Number of open positions of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.positions",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn positions(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(i32::from(self.job(ctx).await?.positions.get()))
    }

    /// Number of `User`s applied for this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.applicantsCount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn applicants_count(&self, ctx: &Context) -> Result<i32, Error> {
        let count = self.job(ctx).await?.applicants.len();
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    /// `User`s applied for this `Job`, in the order they applied.
    ///
    /// Visible to the author of this `Job`, the owner of its `Company` and
    /// admins only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.applicants",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn applicants(
        &self,
        ctx: &Context,
    ) -> Result<Option<Vec<api::User>>, Error> {
        if !self.is_managed_by_me(ctx).await? {
            return Ok(None);
        }
        Ok(Some(
            self.job(ctx)
                .await?
                .applicants
                .iter()
                .map(|id| {
                    #[expect(
                        unsafe_code,
                        reason = "applicants are referenced by `Job`"
                    )]
                    unsafe {
                        api::User::new_unchecked(*id)
                    }
                })
                .collect(),
        ))
    }

    /// Indicator whether the current `User` has applied for this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.hasApplied",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn has_applied(&self, ctx: &Context) -> Result<bool, Error> {
        let Some(my_id) = ctx.try_current_session().await?.map(|s| s.user_id)
        else {
            return Ok(false);
        };
        Ok(self.job(ctx).await?.applicants.contains(&my_id.into()))
    }

    /// Status of this `Job`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.job(ctx).await?.status.into())
    }

    /// `DateTime` when this `Job` was posted.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.postedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn posted_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.job(ctx).await?.posted_at.coerce())
    }

    /// `DateTime` after which this `Job` is no longer active.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.expiresAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn expires_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.job(ctx).await?.expires_at.coerce())
    }

    /// `DateTime` when this `Job` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.job(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Job` was modified the last time.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Job.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.job(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Job`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::job::Id)]
#[into(domain::job::Id)]
#[graphql(name = "JobId", transparent)]
pub struct Id(Uuid);

/// Title of a `Job`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "JobTitle",
    with = scalar::Via::<domain::job::Title>,
)]
pub struct Title(domain::job::Title);

/// Description of a `Job`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "JobDescription",
    with = scalar::Via::<domain::job::Description>,
)]
pub struct Description(domain::job::Description);

/// Skill required by a `Job`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "JobSkill",
    with = scalar::Via::<domain::job::Skill>,
)]
pub struct Skill(domain::job::Skill);

/// Non-negative decimal salary offered by a `Job`.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "JobSalary",
    with = scalar::Via::<domain::job::Salary>,
)]
pub struct Salary(domain::job::Salary);

/// Location of a `Job`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "JobLocation",
    with = scalar::Via::<domain::job::Location>,
)]
pub struct Location(domain::job::Location);

/// Education required by a `Job`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "JobEducation",
    with = scalar::Via::<domain::job::Education>,
)]
pub struct Education(domain::job::Education);

/// Lifecycle status of a `Job`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "JobStatus")]
pub enum Status {
    /// Published and accepts applications.
    Active,

    /// Hidden by its recruiter or its `Company`.
    Inactive,

    /// Filled and closed.
    Closed,

    /// Outlived its `expiresAt`.
    Expired,
}

impl From<domain::job::Status> for Status {
    fn from(status: domain::job::Status) -> Self {
        use domain::job::Status as S;
        match status {
            S::Active => Self::Active,
            S::Inactive => Self::Inactive,
            S::Closed => Self::Closed,
            S::Expired => Self::Expired,
        }
    }
}

impl From<Status> for domain::job::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => Self::Active,
            Status::Inactive => Self::Inactive,
            Status::Closed => Self::Closed,
            Status::Expired => Self::Expired,
        }
    }
}

/// Where the work on a `Job` happens.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "JobWorkType")]
pub enum WorkType {
    /// At the employer's office.
    OnSite,

    /// From anywhere.
    Remote,

    /// Partly at the office, partly remote.
    Hybrid,
}

impl From<domain::job::WorkType> for WorkType {
    fn from(work_type: domain::job::WorkType) -> Self {
        use domain::job::WorkType as T;
        match work_type {
            T::OnSite => Self::OnSite,
            T::Remote => Self::Remote,
            T::Hybrid => Self::Hybrid,
        }
    }
}

impl From<WorkType> for domain::job::WorkType {
    fn from(work_type: WorkType) -> Self {
        match work_type {
            WorkType::OnSite => Self::OnSite,
            WorkType::Remote => Self::Remote,
            WorkType::Hybrid => Self::Hybrid,
        }
    }
}

/// Kind of employment offered by a `Job`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "JobEmploymentType")]
pub enum EmploymentType {
    /// Full-time employment.
    FullTime,

    /// Part-time employment.
    PartTime,

    /// Fixed-term contract.
    Contract,

    /// Internship.
    Internship,

    /// Freelance engagement.
    Freelance,
}

impl From<domain::job::EmploymentType> for EmploymentType {
    fn from(kind: domain::job::EmploymentType) -> Self {
        use domain::job::EmploymentType as T;
        match kind {
            T::FullTime => Self::FullTime,
            T::PartTime => Self::PartTime,
            T::Contract => Self::Contract,
            T::Internship => Self::Internship,
            T::Freelance => Self::Freelance,
        }
    }
}

impl From<EmploymentType> for domain::job::EmploymentType {
    fn from(kind: EmploymentType) -> Self {
        match kind {
            EmploymentType::FullTime => Self::FullTime,
            EmploymentType::PartTime => Self::PartTime,
            EmploymentType::Contract => Self::Contract,
            EmploymentType::Internship => Self::Internship,
            EmploymentType::Freelance => Self::Freelance,
        }
    }
}

/// Seniority required by a `Job`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "JobExperienceLevel")]
pub enum ExperienceLevel {
    /// Entry level.
    Entry,

    /// Mid level.
    Mid,

    /// Senior level.
    Senior,

    /// Team lead.
    Lead,

    /// Executive.
    Executive,
}

impl From<domain::job::ExperienceLevel> for ExperienceLevel {
    fn from(level: domain::job::ExperienceLevel) -> Self {
        use domain::job::ExperienceLevel as L;
        match level {
            L::Entry => Self::Entry,
            L::Mid => Self::Mid,
            L::Senior => Self::Senior,
            L::Lead => Self::Lead,
            L::Executive => Self::Executive,
        }
    }
}

impl From<ExperienceLevel> for domain::job::ExperienceLevel {
    fn from(level: ExperienceLevel) -> Self {
        match level {
            ExperienceLevel::Entry => Self::Entry,
            ExperienceLevel::Mid => Self::Mid,
            ExperienceLevel::Senior => Self::Senior,
            ExperienceLevel::Lead => Self::Lead,
            ExperienceLevel::Executive => Self::Executive,
        }
    }
}

pub mod list {
    //! Definitions related to the [`Job`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::Job;
    use crate::{
        api::{self, scalar},
        AsError, Context, Error,
    };

    /// Cursor for the `Job` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "JobListCursor",
        with = scalar::Via::<read::job::list::Cursor>,
    )]
    pub struct Cursor(pub read::job::list::Cursor);

    /// Edge in the [`Job`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::job::list::Edge);

    /// Edge in the `Job` list.
    #[graphql_object(name = "JobListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `JobListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `JobListEdge`.
        #[must_use]
        pub fn node(&self) -> Job {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Job` \
                          existence"
            )]
            unsafe {
                Job::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Job`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::job::list::Connection`].
        inner: read::job::list::Connection,

        /// [`read::job::list::Filter`] this [`Connection`] was fetched with.
        filter: read::job::list::Filter,
    }

    impl Connection {
        /// Fetches a [`Connection`] page matching the provided `filter`.
        ///
        /// # Errors
        ///
        /// Errors if the pagination arguments are ambiguous, or the
        /// [`Job`]s cannot be loaded.
        pub(crate) async fn fetch(
            first: Option<i32>,
            after: Option<Cursor>,
            last: Option<i32>,
            before: Option<Cursor>,
            filter: read::job::list::Filter,
            ctx: &Context,
        ) -> Result<Self, Error> {
            const DEFAULT_PAGE_SIZE: i32 = 10;

            let arguments = read::job::list::Arguments::new(
                first,
                after.map(Into::into),
                last,
                before.map(Into::into),
                DEFAULT_PAGE_SIZE,
            )
            .ok_or_else(|| api::PaginationError::Ambiguous.into())
            .map_err(ctx.error())?;

            let inner = ctx
                .service()
                .execute(query::jobs::List::by(read::job::list::Selector {
                    arguments,
                    filter: filter.clone(),
                }))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())?;

            Ok(Self { inner, filter })
        }
    }

    /// Connection of the `Job` list.
    #[graphql_object(name = "JobListConnection", context = Context)]
    impl Connection {
        /// Edges of this `JobListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.inner.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.inner.page_info(),
                start_cursor: self.inner.edges.first().map(|e| e.cursor.into()),
                end_cursor: self.inner.edges.last().map(|e| e.cursor.into()),
                filter: self.filter.clone(),
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::job::list::PageInfo`].
        info: read::job::list::PageInfo,

        /// Start cursor of the page.
        start_cursor: Option<Cursor>,

        /// End cursor of the page.
        end_cursor: Option<Cursor>,

        /// [`read::job::list::Filter`] the page was fetched with.
        filter: read::job::list::Filter,
    }

    /// Information about a `JobListConnection` page.
    #[graphql_object(name = "JobListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.info.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.info.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> &Option<Cursor> {
            &self.start_cursor
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> &Option<Cursor> {
            &self.end_cursor
        }

        /// Total count of `Job`s matching the same filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::jobs::TotalCount::by(self.filter.clone()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
