//! [`Company`]-related definitions.

use std::future;

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A company posting jobs.
#[derive(Clone, Debug, From)]
pub struct Company {
    /// ID of this [`Company`].
    id: Id,

    /// Underlying [`domain::Company`].
    company: OnceCell<domain::Company>,
}

impl From<domain::Company> for Company {
    fn from(company: domain::Company) -> Self {
        Self {
            id: company.id.into(),
            company: OnceCell::new_with(Some(company)),
        }
    }
}

impl Company {
    /// Creates a new [`Company`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Company`] with the provided ID exists,
    /// otherwise accessing this [`Company`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            company: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Company`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Company`] doesn't exist.
    async fn company(&self, ctx: &Context) -> Result<&domain::Company, Error> {
        let id = self.id.into();
        self.company
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::company::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(c.ok_or_else(|| {
                            api::query::CompanyError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A company posting jobs.
#[graphql_object(context = Context)]
impl Company {
    /// Unique identifier of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Unique name of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.company(ctx).await?.name.clone().into())
    }

    /// Status of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.company(ctx).await?.status.into())
    }

    /// `User` owning this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.owner",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn owner(&self, ctx: &Context) -> Result<api::User, Error> {
        let owner_id = self.company(ctx).await?.owner_id;
        #[expect(unsafe_code, reason = "owner is referenced by `Company`")]
        Ok(unsafe { api::User::new_unchecked(owner_id) })
    }

    /// Location of this `Company` headquarters.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.location",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn location(&self, ctx: &Context) -> Result<Location, Error> {
        Ok(self.company(ctx).await?.location.clone().into())
    }

    /// Contact email of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.email",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn email(&self, ctx: &Context) -> Result<Email, Error> {
        Ok(self.company(ctx).await?.email.clone().into())
    }

    /// Contact phone of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Option<Phone>, Error> {
        Ok(self.company(ctx).await?.phone.clone().map(Into::into))
    }

    /// Logo URL of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.logo",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn logo(&self, ctx: &Context) -> Result<Option<Url>, Error> {
        Ok(self.company(ctx).await?.logo.clone().map(Into::into))
    }

    /// Website URL of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.website",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn website(&self, ctx: &Context) -> Result<Option<Url>, Error> {
        Ok(self.company(ctx).await?.website.clone().map(Into::into))
    }

    /// Industry this `Company` operates in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.industry",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn industry(
        &self,
        ctx: &Context,
    ) -> Result<Option<Industry>, Error> {
        Ok(self.company(ctx).await?.industry.clone().map(Into::into))
    }

    /// Headcount range of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.size",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn size(&self, ctx: &Context) -> Result<Option<Size>, Error> {
        Ok(self.company(ctx).await?.size.map(Into::into))
    }

    /// Description of this `Company`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.description",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Option<Description>, Error> {
        Ok(self.company(ctx).await?.description.clone().map(Into::into))
    }

    /// Fetches the page of this `Company`'s `Job`s having the provided
    /// status, newest first.
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
            first = ?first,
            gql.name = "Company.jobs",
            last = ?last,
            otel.name = api::Query::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn jobs(
        &self,
        first: Option<i32>,
        after: Option<api::job::list::Cursor>,
        last: Option<i32>,
        before: Option<api::job::list::Cursor>,
        status: Option<api::job::Status>,
        ctx: &Context,
    ) -> Result<api::job::list::Connection, Error> {
        api::job::list::Connection::fetch(
            first,
            after,
            last,
            before,
            read::job::list::Filter {
                company_id: Some(self.id.into()),
                status: status.map_or(domain::job::Status::Active, Into::into),
                ..read::job::list::Filter::default()
            },
            ctx,
        )
        .await
    }

    /// `DateTime` when this `Company` was registered.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.company(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Company` was modified the last time.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Company.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.company(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Company`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::company::Id)]
#[into(domain::company::Id)]
#[graphql(name = "CompanyId", transparent)]
pub struct Id(Uuid);

/// Unique name of a `Company`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CompanyName",
    with = scalar::Via::<domain::company::Name>,
)]
pub struct Name(domain::company::Name);

/// Location of a `Company` headquarters.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CompanyLocation",
    with = scalar::Via::<domain::company::Location>,
)]
pub struct Location(domain::company::Location);

/// Contact email of a `Company`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CompanyEmail",
    with = scalar::Via::<domain::company::Email>,
)]
pub struct Email(domain::company::Email);

/// Contact phone of a `Company`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CompanyPhone",
    with = scalar::Via::<domain::company::Phone>,
)]
pub struct Phone(domain::company::Phone);

/// URL of a `Company` logo or website.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CompanyUrl",
    with = scalar::Via::<domain::company::Url>,
)]
pub struct Url(domain::company::Url);

/// Industry a `Company` or a `Job` belongs to.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "Industry",
    with = scalar::Via::<domain::company::Industry>,
)]
pub struct Industry(domain::company::Industry);

/// Description of a `Company`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CompanyDescription",
    with = scalar::Via::<domain::company::Description>,
)]
pub struct Description(domain::company::Description);

/// Status of a `Company`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "CompanyStatus")]
pub enum Status {
    /// Operating, so its jobs may be active.
    Active,

    /// Suspended, so none of its jobs is active.
    Inactive,
}

impl From<domain::company::Status> for Status {
    fn from(status: domain::company::Status) -> Self {
        use domain::company::Status as S;
        match status {
            S::Active => Self::Active,
            S::Inactive => Self::Inactive,
        }
    }
}

impl From<Status> for domain::company::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => Self::Active,
            Status::Inactive => Self::Inactive,
        }
    }
}

/// Headcount range of a `Company`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "CompanySize")]
pub enum Size {
    /// 1-10 employees.
    Micro,

    /// 11-50 employees.
    Small,

    /// 51-200 employees.
    Medium,

    /// 201-500 employees.
    Large,

    /// More than 500 employees.
    Enterprise,
}

impl From<domain::company::Size> for Size {
    fn from(size: domain::company::Size) -> Self {
        use domain::company::Size as S;
        match size {
            S::Micro => Self::Micro,
            S::Small => Self::Small,
            S::Medium => Self::Medium,
            S::Large => Self::Large,
            S::Enterprise => Self::Enterprise,
        }
    }
}

impl From<Size> for domain::company::Size {
    fn from(size: Size) -> Self {
        match size {
            Size::Micro => Self::Micro,
            Size::Small => Self::Small,
            Size::Medium => Self::Medium,
            Size::Large => Self::Large,
            Size::Enterprise => Self::Enterprise,
        }
    }
}
