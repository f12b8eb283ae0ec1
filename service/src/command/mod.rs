//! [`Command`] definition.

pub mod apply_for_job;
pub mod authorize_user_session;
pub mod change_company_status;
pub mod change_job_status;
pub mod create_company;
pub mod create_job;
pub mod create_user;
pub mod create_user_session;
pub mod delete_job;
pub mod sweep_expired_jobs;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    apply_for_job::ApplyForJob, authorize_user_session::AuthorizeUserSession,
    change_company_status::ChangeCompanyStatus,
    change_job_status::ChangeJobStatus, create_company::CreateCompany,
    create_job::CreateJob, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_job::DeleteJob,
    sweep_expired_jobs::SweepExpiredJobs,
};

#[cfg(test)]
pub(crate) mod fixture {
    //! Shortcuts for populating a [`Memory`] database in tests.

    use common::{operations::Insert, DateTime};
    use rust_decimal::Decimal;

    use super::{Command as _, CreateCompany, CreateJob};
    use crate::{
        domain::{
            company, job,
            user::{self, Role},
            Company, Job, User,
        },
        infra::{database::Memory, Database as _},
        Service,
    };

    /// Password of every [`User`] created by [`user()`].
    pub(crate) const PASSWORD: &str = "correct horse battery";

    /// Stores a new [`User`] with the provided `login` and [`Role`].
    ///
    /// Goes to the database directly, so admins can be created too.
    pub(crate) async fn user(
        svc: &Service<Memory>,
        login: &str,
        role: Role,
    ) -> User {
        let user = User {
            id: user::Id::new(),
            name: user::Name::new(format!("{login} Doe")).unwrap(),
            login: user::Login::new(login).unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new(PASSWORD).unwrap(),
            ),
            email: user::Email::new(format!("{login}@acme.io")).unwrap(),
            role,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        svc.database().execute(Insert(user.clone())).await.unwrap();
        user
    }

    /// Builds a [`CreateCompany`] owned by the provided [`User`].
    pub(crate) fn company_input(owner: &User, name: &str) -> CreateCompany {
        CreateCompany {
            initiator_id: owner.id,
            name: company::Name::new(name).unwrap(),
            location: company::Location::new("Kyiv").unwrap(),
            email: company::Email::new("hr@acme.io").unwrap(),
            phone: company::Phone::new("+380 501 234 5678"),
            logo: None,
            website: company::Url::new("https://acme.io"),
            industry: company::Industry::new("Software"),
            size: Some(company::Size::Small),
            description: None,
        }
    }

    /// Registers a new [`Company`] owned by the provided [`User`].
    pub(crate) async fn company(
        svc: &Service<Memory>,
        owner: &User,
        name: &str,
    ) -> Company {
        svc.execute(company_input(owner, name)).await.unwrap()
    }

    /// Builds a [`CreateJob`] with every field provided.
    pub(crate) fn job_input(
        author: &User,
        company: &Company,
        title: &str,
    ) -> CreateJob {
        CreateJob {
            initiator_id: author.id,
            company_id: Some(company.id),
            title: job::Title::new(title),
            description: job::Description::new("Build things that last."),
            skills: vec![job::Skill::new("rust").unwrap()],
            salary: job::Salary::new(Decimal::from(5000)),
            location: job::Location::new("Kyiv"),
            work_type: Some(job::WorkType::Hybrid),
            employment_type: Some(job::EmploymentType::FullTime),
            experience_level: Some(job::ExperienceLevel::Mid),
            education: job::Education::new("Bachelor"),
            industry: None,
            positions: job::Positions::new(1),
        }
    }

    /// Posts a new [`Job`] of the provided [`Company`].
    pub(crate) async fn job(
        svc: &Service<Memory>,
        author: &User,
        company: &Company,
        title: &str,
    ) -> Job {
        svc.execute(job_input(author, company, title)).await.unwrap()
    }
}
