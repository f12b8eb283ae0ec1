//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `User` with the provided credentials and role.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `ROLE_NOT_ALLOWED` - provided `UserRole` cannot be self-registered.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUser",
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            role = ?role,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: api::user::Email,
        role: api::user::Role,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.into(),
                role: role.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Registers a new `Company` owned by the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NAME_OCCUPIED` - provided `CompanyName` is taken by another
    ///                     `Company`;
    /// - `NOT_RECRUITER` - the current `User` is neither a recruiter nor an
    ///                     admin.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createCompany",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn create_company(
        name: api::company::Name,
        location: api::company::Location,
        email: api::company::Email,
        phone: Option<api::company::Phone>,
        logo: Option<api::company::Url>,
        website: Option<api::company::Url>,
        industry: Option<api::company::Industry>,
        size: Option<api::company::Size>,
        description: Option<api::company::Description>,
        ctx: &Context,
    ) -> Result<api::Company, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateCompany {
                initiator_id: my_id.into(),
                name: name.into(),
                location: location.into(),
                email: email.into(),
                phone: phone.map(Into::into),
                logo: logo.map(Into::into),
                website: website.map(Into::into),
                industry: industry.map(Into::into),
                size: size.map(Into::into),
                description: description.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Changes the status of the specified `Company`.
    ///
    /// Deactivating a `Company` deactivates all its `Job`s at once, or fails
    /// leaving everything as it was. Activating a `Company` doesn't activate
    /// its `Job`s back.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `COMPANY_NOT_EXISTS` - the `Company` with the specified ID does not
    ///                          exist;
    /// - `NOT_PERMITTED` - the current `User` is neither the owner of the
    ///                     `Company` nor an admin;
    /// - `CASCADE_FAILED` - deactivating the `Job`s of the `Company` failed,
    ///                      so nothing has been changed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "changeCompanyStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn change_company_status(
        id: api::company::Id,
        status: api::company::Status,
        ctx: &Context,
    ) -> Result<api::Company, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ChangeCompanyStatus {
                company_id: id.into(),
                status: status.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|out| out.company.into())
    }

    /// Posts a new `Job` of the specified `Company`.
    ///
    /// The `Job` expires in 7 days. A `Job` of an inactive `Company` is
    /// posted inactive.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MISSING_FIELD` - a required field is not provided;
    /// - `COMPANY_NOT_EXISTS` - the `Company` with the specified ID does not
    ///                          exist;
    /// - `NOT_PERMITTED` - the current `User` is neither the owner of the
    ///                     `Company` nor an admin.
    #[tracing::instrument(
        skip_all,
        fields(
            company_id = ?company_id,
            gql.name = "createJob",
            otel.name = Self::SPAN_NAME,
            title = ?title.as_ref().map(ToString::to_string),
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn create_job(
        company_id: Option<api::company::Id>,
        title: Option<api::job::Title>,
        description: Option<api::job::Description>,
        skills: Option<Vec<api::job::Skill>>,
        salary: Option<api::job::Salary>,
        location: Option<api::job::Location>,
        work_type: Option<api::job::WorkType>,
        employment_type: Option<api::job::EmploymentType>,
        experience_level: Option<api::job::ExperienceLevel>,
        education: Option<api::job::Education>,
        industry: Option<api::company::Industry>,
        positions: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Job, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let positions = positions
            .map(|n| {
                u16::try_from(n)
                    .ok()
                    .and_then(service::domain::job::Positions::new)
                    .ok_or_else(|| Error::from(InputError::Positions))
            })
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateJob {
                initiator_id: my_id.into(),
                company_id: company_id.map(Into::into),
                title: title.map(Into::into),
                description: description.map(Into::into),
                skills: skills
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                salary: salary.map(Into::into),
                location: location.map(Into::into),
                work_type: work_type.map(Into::into),
                employment_type: employment_type.map(Into::into),
                experience_level: experience_level.map(Into::into),
                education: education.map(Into::into),
                industry: industry.map(Into::into),
                positions,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Changes the status of the specified `Job`.
    ///
    /// Only `ACTIVE`, `INACTIVE` and `EXPIRED` may be requested.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `STATUS_NOT_ALLOWED` - the requested `JobStatus` cannot be requested;
    /// - `JOB_NOT_EXISTS` - the `Job` with the specified ID does not exist;
    /// - `COMPANY_INACTIVE` - the `Company` of the `Job` is inactive, so the
    ///                        `Job` has been made inactive instead;
    /// - `JOB_EXPIRED` - the `Job` has expired, so cannot be activated;
    /// - `NOT_PERMITTED` - the current `User` is neither the author of the
    ///                     `Job`, nor the owner of its `Company`, nor an
    ///                     admin.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "changeJobStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn change_job_status(
        id: api::job::Id,
        status: api::job::Status,
        ctx: &Context,
    ) -> Result<api::Job, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ChangeJobStatus {
                job_id: id.into(),
                status: status.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `Job` along with its pending expiration.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `JOB_NOT_EXISTS` - the `Job` with the specified ID does not exist;
    /// - `NOT_PERMITTED` - the current `User` is neither the author of the
    ///                     `Job`, nor the owner of its `Company`, nor an
    ///                     admin.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteJob",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_job(
        id: api::job::Id,
        ctx: &Context,
    ) -> Result<api::Job, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteJob {
                job_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Applies the current `User` for the specified `Job`.
    ///
    /// Applying twice has no effect.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `JOB_NOT_EXISTS` - the `Job` with the specified ID does not exist;
    /// - `JOB_NOT_ACTIVE` - the `Job` doesn't accept applications;
    /// - `NOT_JOB_SEEKER` - the current `User` is not a job seeker.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "applyForJob",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn apply_for_job(
        id: api::job::Id,
        ctx: &Context,
    ) -> Result<api::Job, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ApplyForJob {
                job_id: id.into(),
                applicant_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum InputError {
        #[code = "INVALID_POSITIONS"]
        #[status = BAD_REQUEST]
        #[message = "`positions` must be between 1 and 65535"]
        Positions,
    }
}

/// Creates a [`Error`] with the provided `code` and `status_code`, describing
/// it with the provided `err`.
fn described(
    code: &'static str,
    status_code: http::StatusCode,
    err: &impl ToString,
) -> Error {
    Error {
        code,
        status_code,
        message: err.to_string(),
        backtrace: None,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another \
                             `User`"]
                LoginOccupied,

                #[code = "ROLE_NOT_ALLOWED"]
                #[status = FORBIDDEN]
                #[message = "`UserRole` cannot be self-registered"]
                RoleNotAllowed,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::RoleNotAllowed(_) => Some(Error::RoleNotAllowed.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_company::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`CompanyName` is taken by another `Company`"]
                NameOccupied,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NameOccupied(_) => Error::NameOccupied.into(),
            Self::UserNotExists(_) => return None,
            Self::UserNotRecruiter(_) => api::PrivilegeError::Recruiter.into(),
        })
    }
}

impl AsError for command::change_company_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CASCADE_FAILED"]
                #[status = INTERNAL_SERVER_ERROR]
                #[message = "Deactivating `Job`s of the `Company` failed, so \
                             nothing has been changed"]
                CascadeFailed,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Cascade(_) => Error::CascadeFailed.into(),
            Self::UserNotExists(_) => return None,
            Self::CompanyNotExists(_) => {
                api::query::CompanyError::NotExists.into()
            }
            Self::UserNotPermitted(_) => api::PrivilegeError::Manager.into(),
        })
    }
}

impl AsError for command::create_job::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::CompanyNotExists(_) => {
                api::query::CompanyError::NotExists.into()
            }
            Self::MissingField(_) => described(
                "MISSING_FIELD",
                http::StatusCode::BAD_REQUEST,
                self,
            ),
            Self::UserNotExists(_) => return None,
            Self::UserNotPermitted(_) => api::PrivilegeError::Manager.into(),
        })
    }
}

impl AsError for command::change_job_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "COMPANY_INACTIVE"]
                #[status = CONFLICT]
                #[message = "`Company` of the `Job` is inactive, so the `Job` \
                             has been made inactive"]
                CompanyInactive,

                #[code = "JOB_EXPIRED"]
                #[status = CONFLICT]
                #[message = "`Job` has expired, so cannot be activated"]
                JobExpired,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::CompanyInactive(_) => Error::CompanyInactive.into(),
            Self::CompanyNotExists(_) | Self::UserNotExists(_) => return None,
            Self::JobExpired(_) => Error::JobExpired.into(),
            Self::JobNotExists(_) => api::query::JobError::NotExists.into(),
            Self::StatusNotAllowed(_) => described(
                "STATUS_NOT_ALLOWED",
                http::StatusCode::BAD_REQUEST,
                self,
            ),
            Self::UserNotPermitted(_) => api::PrivilegeError::Manager.into(),
        })
    }
}

impl AsError for command::delete_job::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::CompanyNotExists(_) | Self::UserNotExists(_) => return None,
            Self::JobNotExists(_) => api::query::JobError::NotExists.into(),
            Self::UserNotPermitted(_) => api::PrivilegeError::Manager.into(),
        })
    }
}

impl AsError for command::apply_for_job::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "JOB_NOT_ACTIVE"]
                #[status = CONFLICT]
                #[message = "`Job` doesn't accept applications"]
                JobNotActive,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::JobNotActive(_) => Error::JobNotActive.into(),
            Self::JobNotExists(_) => api::query::JobError::NotExists.into(),
            Self::UserNotExists(_) => return None,
            Self::UserNotJobSeeker(_) => api::PrivilegeError::JobSeeker.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{change_company_status, change_job_status},
        domain::job,
        infra::{database, postgres},
    };

    use crate::AsError as _;

    #[test]
    fn failed_cascade_has_its_own_code() {
        let db = database::Error::from(postgres::Error::from(
            postgres::connection::PoolError::Closed,
        ));
        let err = change_company_status::ExecutionError::Cascade(
            change_company_status::CascadeError::from(db),
        );

        let err = err.try_as_error().unwrap();

        assert_eq!(err.code, "CASCADE_FAILED");
        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn expired_job_activation_has_its_own_code() {
        let err = change_job_status::ExecutionError::JobExpired(job::Id::new());

        let err = err.try_as_error().unwrap();

        assert_eq!(err.code, "JOB_EXPIRED");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }
}
