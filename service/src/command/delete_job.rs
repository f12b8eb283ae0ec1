//! [`Command`] for deleting a [`Job`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{company, job, user, Company, Job, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Job`] along with its scheduled
/// [`job::Expiration`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteJob {
    /// ID of the [`Job`] to delete.
    pub job_id: job::Id,

    /// ID of the [`User`] deleting the [`Job`].
    pub initiator_id: user::Id,
}

impl<Db> Command<DeleteJob> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Job>, job::Id>>,
            Ok = Option<Job>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Company, company::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Company>, company::Id>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Job>, job::Id>>,
            Ok = Option<Job>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<job::Expiration, Vec<job::Id>>>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<Job, job::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Job;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteJob) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteJob {
            job_id,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let company_id = self
            .database()
            .execute(Select(By::<Option<Job>, _>::new(job_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::JobNotExists(job_id))
            .map_err(tracerr::wrap!())?
            .company_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

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
        let job = tx
            .execute(Select(By::<Option<Job>, _>::new(job_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::JobNotExists(job_id))
            .map_err(tracerr::wrap!())?;
        if !job.is_managed_by(&initiator, &company) {
            return Err(tracerr::new!(E::UserNotPermitted(initiator_id)));
        }

        tx.execute(Delete(By::<job::Expiration, _>::new(vec![job_id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Job, _>::new(job_id)))
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

/// Error of [`DeleteJob`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Company`] of the [`Job`] does not exist.
    #[display("`Company(id: {_0})` does not exist")]
    #[from(ignore)]
    CompanyNotExists(#[error(not(source))] company::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Job`] with the provided ID does not exist.
    #[display("`Job(id: {_0})` does not exist")]
    #[from(ignore)]
    JobNotExists(#[error(not(source))] job::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is neither the author of the [`Job`], nor the owner of its
    /// [`Company`], nor an admin.
    #[display("`User(id: {_0})` cannot manage the `Job`")]
    #[from(ignore)]
    UserNotPermitted(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use super::{DeleteJob, ExecutionError};
    use crate::{
        command::fixture, domain::user::Role, infra::database::Memory,
        Command as _,
    };

    #[tokio::test]
    async fn drops_job_with_its_expiration() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let deleted = svc
            .execute(DeleteJob {
                job_id: job.id,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        assert_eq!(deleted.id, job.id);
        assert!(db.job(job.id).is_none());
        assert!(db.expiration(job.id).is_none());
    }

    #[tokio::test]
    async fn rejects_applicant() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let err = svc
            .execute(DeleteJob {
                job_id: job.id,
                initiator_id: seeker.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotPermitted(_)));
        assert!(db.job(job.id).is_some());
    }
}
