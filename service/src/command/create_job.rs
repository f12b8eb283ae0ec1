//! [`Command`] for posting a new [`Job`].

use std::collections::BTreeSet;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::job::{
    Description, Education, EmploymentType, ExperienceLevel, Industry,
    Location, Positions, Salary, Skill, Title, WorkType,
};
use crate::{
    domain::{company, job, user, Company, Job, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for posting a new [`Job`].
///
/// Required fields are optional here, so the missing one is reported by
/// [`ExecutionError::MissingField`] rather than rejected by the caller.
#[derive(Clone, Debug, Default)]
pub struct CreateJob {
    /// ID of the [`User`] posting the [`Job`].
    pub initiator_id: user::Id,

    /// ID of the [`Company`] a new [`Job`] belongs to.
    pub company_id: Option<company::Id>,

    /// [`Title`] of a new [`Job`].
    pub title: Option<job::Title>,

    /// [`Description`] of a new [`Job`].
    pub description: Option<job::Description>,

    /// [`Skill`]s required by a new [`Job`].
    pub skills: Vec<job::Skill>,

    /// [`Salary`] of a new [`Job`].
    pub salary: Option<job::Salary>,

    /// [`Location`] of a new [`Job`].
    pub location: Option<job::Location>,

    /// [`WorkType`] of a new [`Job`].
    ///
    /// [`WorkType::OnSite`] if not specified.
    pub work_type: Option<job::WorkType>,

    /// [`EmploymentType`] of a new [`Job`].
    pub employment_type: Option<job::EmploymentType>,

    /// [`ExperienceLevel`] of a new [`Job`].
    pub experience_level: Option<job::ExperienceLevel>,

    /// [`Education`] required by a new [`Job`].
    pub education: Option<job::Education>,

    /// [`Industry`] of a new [`Job`].
    pub industry: Option<job::Industry>,

    /// Number of open [`Positions`] of a new [`Job`].
    pub positions: Option<job::Positions>,
}

impl<Db> Command<CreateJob> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Company, company::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Company>, company::Id>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<Insert<Job>, Err = Traced<database::Error>>
        + Database<Insert<job::Expiration>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Job;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateJob) -> Result<Self::Ok, Self::Err> {
        use job::Field as F;
        use ExecutionError as E;

        /// Unwraps the required field or fails naming it.
        fn required<T>(
            value: Option<T>,
            field: job::Field,
        ) -> Result<T, Traced<ExecutionError>> {
            value.ok_or_else(|| tracerr::new!(E::MissingField(field)))
        }

        let CreateJob {
            initiator_id,
            company_id,
            title,
            description,
            skills,
            salary,
            location,
            work_type,
            employment_type,
            experience_level,
            education,
            industry,
            positions,
        } = cmd;

        let company_id = required(company_id, F::CompanyId)?;
        let title = required(title, F::Title)?;
        let description = required(description, F::Description)?;
        let salary = required(salary, F::Salary)?;
        let location = required(location, F::Location)?;
        let employment_type = required(employment_type, F::EmploymentType)?;
        let experience_level =
            required(experience_level, F::ExperienceLevel)?;
        let education = required(education, F::Education)?;
        let positions = required(positions, F::Positions)?;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with a concurrent `Company` status change.
        tx.execute(Lock(By::new(company_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let company = tx
            .execute(Select(By::<Option<Company>, _>::new(company_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CompanyNotExists(company_id))
            .map_err(tracerr::wrap!())?;
        if !company.is_managed_by(&initiator) {
            return Err(tracerr::new!(E::UserNotPermitted(initiator_id)));
        }

        let now = DateTime::now();
        let expires_at = (now + Job::EXPIRATION_PERIOD).coerce();
        let job = Job {
            id: job::Id::new(),
            company_id,
            created_by: initiator.id,
            title,
            description,
            skills: skills.into_iter().collect::<BTreeSet<_>>(),
            salary,
            location,
            work_type: work_type.unwrap_or(job::WorkType::OnSite),
            employment_type,
            experience_level,
            education,
            industry,
            positions,
            applicants: vec![],
            status: job::Status::Active.under(company.status),
            posted_at: now.coerce(),
            expires_at,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        tx.execute(Insert(job.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(job::Expiration {
            job_id: job.id,
            due_at: expires_at,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(job)
    }
}

/// Error of [`CreateJob`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Company`] with the provided ID does not exist.
    #[display("`Company(id: {_0})` does not exist")]
    #[from(ignore)]
    CompanyNotExists(#[error(not(source))] company::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Required [`job::Field`] is not provided.
    #[display("`{_0}` is required")]
    #[from(ignore)]
    MissingField(#[error(not(source))] job::Field),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is neither the owner of the [`Company`] nor an admin.
    #[display("`User(id: {_0})` cannot post `Job`s of the `Company`")]
    #[from(ignore)]
    UserNotPermitted(#[error(not(source))] user::Id),
}
