//! [`Command`] for applying for a [`Job`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{job, user, Job, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for applying for an active [`Job`].
///
/// Applying twice has no effect.
#[derive(Clone, Copy, Debug)]
pub struct ApplyForJob {
    /// ID of the [`Job`] to apply for.
    pub job_id: job::Id,

    /// ID of the applying [`User`].
    pub applicant_id: user::Id,
}

impl<Db> Command<ApplyForJob> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Job>, job::Id>>,
            Ok = Option<Job>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<job::Application>,
            Ok = Option<Job>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Job;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ApplyForJob) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyForJob {
            job_id,
            applicant_id,
        } = cmd;

        let applicant = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(applicant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(applicant_id))
            .map_err(tracerr::wrap!())?;
        if applicant.role != user::Role::JobSeeker {
            return Err(tracerr::new!(E::UserNotJobSeeker(applicant_id)));
        }

        // Touches the applicants of a still active `Job` only.
        let applied = self
            .database()
            .execute(Insert(job::Application {
                job_id,
                applicant_id,
                applied_at: DateTime::now().coerce(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(job) = applied {
            return Ok(job);
        }

        let exists = self
            .database()
            .execute(Select(By::<Option<Job>, _>::new(job_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some();
        Err(tracerr::new!(if exists {
            E::JobNotActive(job_id)
        } else {
            E::JobNotExists(job_id)
        }))
    }
}

/// Error of [`ApplyForJob`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Job`] doesn't accept applications.
    #[display("`Job(id: {_0})` is not active")]
    #[from(ignore)]
    JobNotActive(#[error(not(source))] job::Id),

    /// [`Job`] with the provided ID does not exist.
    #[display("`Job(id: {_0})` does not exist")]
    #[from(ignore)]
    JobNotExists(#[error(not(source))] job::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// Only job seekers may apply for [`Job`]s.
    #[display("`User(id: {_0})` is not a job seeker")]
    #[from(ignore)]
    UserNotJobSeeker(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{datetime, operations::Update};

    use super::{ApplyForJob, ExecutionError};
    use crate::{
        command::{fixture, ChangeJobStatus, DeleteJob, SweepExpiredJobs},
        domain::{job, user::Role},
        infra::{database::Memory, Database as _},
        Command as _,
    };

    #[tokio::test]
    async fn records_applicant_once() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        for _ in 0..2 {
            let applied = svc
                .execute(ApplyForJob {
                    job_id: job.id,
                    applicant_id: seeker.id,
                })
                .await
                .unwrap();
            assert_eq!(applied.applicants, vec![seeker.id]);
        }

        assert_eq!(db.job(job.id).unwrap().applicants, vec![seeker.id]);
    }

    #[tokio::test]
    async fn records_every_applicant() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let jane = fixture::user(&svc, "jane", Role::JobSeeker).await;
        let john = fixture::user(&svc, "john", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let (a, b) = tokio::join!(
            svc.execute(ApplyForJob {
                job_id: job.id,
                applicant_id: jane.id,
            }),
            svc.execute(ApplyForJob {
                job_id: job.id,
                applicant_id: john.id,
            }),
        );
        _ = a.unwrap();
        _ = b.unwrap();

        let applicants = db.job(job.id).unwrap().applicants;
        assert_eq!(applicants.len(), 2);
        assert!(applicants.contains(&jane.id));
        assert!(applicants.contains(&john.id));
    }

    #[tokio::test]
    async fn rejects_inactive_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
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

        let err = svc
            .execute(ApplyForJob {
                job_id: job.id,
                applicant_id: seeker.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::JobNotActive(_)));
        let stored = db.job(job.id).unwrap();
        assert_eq!(stored.status, job::Status::Inactive);
        assert!(stored.applicants.is_empty());
    }

    #[tokio::test]
    async fn rejects_overdue_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(8));

        let err = svc
            .execute(ApplyForJob {
                job_id: job.id,
                applicant_id: seeker.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::JobNotActive(_)));
    }

    #[tokio::test]
    async fn never_reactivates_expired_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(8));
        _ = svc.execute(SweepExpiredJobs).await.unwrap();

        let err = svc
            .execute(ApplyForJob {
                job_id: job.id,
                applicant_id: seeker.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::JobNotActive(_)));
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn never_revives_deleted_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc
            .execute(DeleteJob {
                job_id: job.id,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        let err = svc
            .execute(ApplyForJob {
                job_id: job.id,
                applicant_id: seeker.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::JobNotExists(_)));

        // A write of a `Job` read before its deletion.
        db.execute(Update(job.clone())).await.unwrap();
        assert!(db.job(job.id).is_none());
        assert!(db.expiration(job.id).is_none());
    }

    #[tokio::test]
    async fn survives_write_of_job_read_before_applying() {
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

        let mut stale = job.clone();
        stale.status = job::Status::Inactive;
        db.execute(Update(stale)).await.unwrap();

        let stored = db.job(job.id).unwrap();
        assert_eq!(stored.status, job::Status::Inactive);
        assert_eq!(stored.applicants, vec![seeker.id]);
    }

    #[tokio::test]
    async fn rejects_recruiter() {
        let svc = Memory::default().service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let err = svc
            .execute(ApplyForJob {
                job_id: job.id,
                applicant_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotJobSeeker(_)));
    }
}
