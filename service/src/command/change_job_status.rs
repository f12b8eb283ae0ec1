//! [`Command`] for changing a [`Job`] status explicitly.

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{company, job, user, Company, Job, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing a [`Job`] status explicitly.
///
/// A [`Job`] of an inactive [`Company`] cannot be activated: it's stored as
/// [`job::Status::Inactive`] and [`ExecutionError::CompanyInactive`] is
/// returned.
///
/// An expired [`Job`], or one whose [`Job::expires_at`] has passed, cannot be
/// activated either.
#[derive(Clone, Copy, Debug)]
pub struct ChangeJobStatus {
    /// ID of the [`Job`] to change the status of.
    pub job_id: job::Id,

    /// Requested [`job::Status`].
    pub status: job::Status,

    /// ID of the [`User`] changing the status.
    pub initiator_id: user::Id,
}

impl<Db> Command<ChangeJobStatus> for Service<Db>
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
        > + Database<Update<Job>, Err = Traced<database::Error>>
        + Database<Insert<job::Expiration>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Job;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ChangeJobStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ChangeJobStatus {
            job_id,
            status,
            initiator_id,
        } = cmd;

        if !status.is_requestable() {
            return Err(tracerr::new!(E::StatusNotAllowed(status)));
        }

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
        let mut job = tx
            .execute(Select(By::<Option<Job>, _>::new(job_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::JobNotExists(job_id))
            .map_err(tracerr::wrap!())?;
        if !job.is_managed_by(&initiator, &company) {
            return Err(tracerr::new!(E::UserNotPermitted(initiator_id)));
        }
        if status == job::Status::Active
            && (job.status == job::Status::Expired
                || job.is_past_expiration(DateTime::now()))
        {
            return Err(tracerr::new!(E::JobExpired(job_id)));
        }

        let applied = status.under(company.status);
        if job.status != applied {
            job.status = applied;
            job.updated_at = DateTime::now().coerce();
            tx.execute(Update(job.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            // A reactivated `Job` keeps its original expiration, whose work
            // item may already be consumed.
            if applied == job::Status::Active {
                tx.execute(Insert(job::Expiration {
                    job_id,
                    due_at: job.expires_at,
                }))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            }
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        if applied != status {
            log::debug!(
                "`Job(id: {job_id})` kept `{applied}` instead of `{status}`: \
                 `Company(id: {company_id})` is inactive",
            );
            return Err(tracerr::new!(E::CompanyInactive(company_id)));
        }

        Ok(job)
    }
}

/// Error of [`ChangeJobStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Company`] of the [`Job`] is inactive, so the [`Job`] cannot be
    /// activated and has been deactivated instead.
    #[display("`Company(id: {_0})` is inactive")]
    #[from(ignore)]
    CompanyInactive(#[error(not(source))] company::Id),

    /// [`Company`] of the [`Job`] does not exist.
    #[display("`Company(id: {_0})` does not exist")]
    #[from(ignore)]
    CompanyNotExists(#[error(not(source))] company::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Job`] has expired, so cannot be activated.
    #[display("`Job(id: {_0})` has expired")]
    #[from(ignore)]
    JobExpired(#[error(not(source))] job::Id),

    /// [`Job`] with the provided ID does not exist.
    #[display("`Job(id: {_0})` does not exist")]
    #[from(ignore)]
    JobNotExists(#[error(not(source))] job::Id),

    /// [`job::Status`] cannot be requested explicitly.
    #[display("`{_0}` status cannot be requested")]
    #[from(ignore)]
    StatusNotAllowed(#[error(not(source))] job::Status),

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
    use common::datetime;

    use super::{ChangeJobStatus, ExecutionError};
    use crate::{
        command::{
            fixture, ApplyForJob, ChangeCompanyStatus, SweepExpiredJobs,
        },
        domain::{company, job, user::Role},
        infra::database::Memory,
        Command as _,
    };

    #[tokio::test]
    async fn deactivates_and_reactivates() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        for status in [job::Status::Inactive, job::Status::Active] {
            let changed = svc
                .execute(ChangeJobStatus {
                    job_id: job.id,
                    status,
                    initiator_id: owner.id,
                })
                .await
                .unwrap();

            assert_eq!(changed.status, status);
            assert_eq!(db.job(job.id).unwrap().status, status);
        }
    }

    #[tokio::test]
    async fn reactivated_job_keeps_its_expiration() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Inactive,
                initiator_id: owner.id,
            })
            .await
            .unwrap();
        db.rewind(datetime::days(3));
        let expired = svc.execute(SweepExpiredJobs).await.unwrap();
        assert!(expired.is_empty());

        let reactivated = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap();
        let stored = db.job(job.id).unwrap();
        assert_eq!(reactivated.expires_at, stored.expires_at);
        assert_eq!(
            db.expiration(job.id).map(|e| e.due_at),
            Some(stored.expires_at),
        );

        db.rewind(datetime::days(5));
        let expired = svc.execute(SweepExpiredJobs).await.unwrap();
        assert_eq!(*expired, vec![job.id]);
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn refuses_to_reactivate_expired_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Expired,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::JobExpired(_)));
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn refuses_to_reactivate_overdue_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Inactive,
                initiator_id: owner.id,
            })
            .await
            .unwrap();
        db.rewind(datetime::days(8));

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::JobExpired(_)));
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Inactive);
    }

    #[tokio::test]
    async fn keeps_applicants() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(ApplyForJob {
                job_id: job.id,
                applicant_id: seeker.id,
            })
            .await
            .unwrap();

        for status in [job::Status::Inactive, job::Status::Active] {
            _ = svc
                .execute(ChangeJobStatus {
                    job_id: job.id,
                    status,
                    initiator_id: owner.id,
                })
                .await
                .unwrap();

            assert_eq!(db.job(job.id).unwrap().applicants, vec![seeker.id]);
        }
    }

    #[tokio::test]
    async fn activation_under_inactive_company_fails_inactive() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(ChangeCompanyStatus {
                company_id: acme.id,
                status: company::Status::Inactive,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CompanyInactive(_)));
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Inactive);
    }

    #[tokio::test]
    async fn stray_active_job_is_forced_inactive() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(ChangeCompanyStatus {
                company_id: acme.id,
                status: company::Status::Inactive,
                initiator_id: owner.id,
            })
            .await
            .unwrap();
        // Emulates a write bypassing the cascade.
        db.modify_job(job.id, |j| j.status = job::Status::Active);

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CompanyInactive(_)));
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Inactive);
    }

    #[tokio::test]
    async fn expires_explicitly() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let changed = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Expired,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        assert_eq!(changed.status, job::Status::Expired);
    }

    #[tokio::test]
    async fn refuses_to_close() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Closed,
                initiator_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::StatusNotAllowed(job::Status::Closed),
        ));
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Active);
    }

    #[tokio::test]
    async fn only_author_owner_or_admin_may_change() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let admin = fixture::user(&svc, "admin", Role::Admin).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Inactive,
                initiator_id: seeker.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotPermitted(_)));

        let changed = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Inactive,
                initiator_id: admin.id,
            })
            .await
            .unwrap();
        assert_eq!(changed.status, job::Status::Inactive);
    }

    #[tokio::test]
    async fn rejects_unknown_job() {
        let svc = Memory::default().service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;

        let err = svc
            .execute(ChangeJobStatus {
                job_id: job::Id::new(),
                status: job::Status::Inactive,
                initiator_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::JobNotExists(_)));
    }
}
