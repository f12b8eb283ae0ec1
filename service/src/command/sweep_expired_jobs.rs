//! [`Command`] for expiring overdue [`Job`]s.

use common::{
    operations::{By, Commit, Delete, Select, Transact, Transacted, Update},
    DateTime,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{job, Job},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for expiring overdue [`Job`]s.
///
/// Processes every due [`job::Expiration`] and then expires the active
/// [`Job`]s created more than [`Job::STALE_PERIOD`] ago. A [`Job`] hit by
/// both is expired once.
#[derive(Clone, Copy, Debug, Default)]
pub struct SweepExpiredJobs;

impl<Db> Command<SweepExpiredJobs> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<job::Expiration>, job::ExpirationDateTime>>,
            Ok = Vec<job::Expiration>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Job>, job::Id>>,
            Ok = Option<Job>,
            Err = Traced<database::Error>,
        > + Database<
            Update<By<read::job::Expired, Vec<job::Id>>>,
            Ok = read::job::Expired,
            Err = Traced<database::Error>,
        > + Database<
            Update<By<read::job::Expired, job::CreationDateTime>>,
            Ok = read::job::Expired,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<job::Expiration, Vec<job::Id>>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = read::job::Expired;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: SweepExpiredJobs,
    ) -> Result<Self::Ok, Self::Err> {
        let now = DateTime::now();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        let due = tx
            .execute(Select(
                By::<Vec<job::Expiration>, job::ExpirationDateTime>::new(
                    now.coerce(),
                ),
            ))
            .await
            .map_err(tracerr::wrap!())?;

        let mut processed = Vec::with_capacity(due.len());
        let mut overdue = vec![];
        for job::Expiration { job_id, .. } in due {
            processed.push(job_id);
            match tx
                .execute(Select(By::<Option<Job>, _>::new(job_id)))
                .await
                .map_err(tracerr::wrap!())?
            {
                None => {
                    log::debug!(
                        "skipped stale expiration of `Job(id: {job_id})`",
                    );
                }
                Some(j) if !j.is_active() => {
                    log::debug!(
                        "`Job(id: {job_id})` is `{}` already, not expiring",
                        j.status,
                    );
                }
                Some(_) => overdue.push(job_id),
            }
        }

        let mut expired = if overdue.is_empty() {
            read::job::Expired::default()
        } else {
            tx.execute(Update(By::<read::job::Expired, _>::new(overdue)))
                .await
                .map_err(tracerr::wrap!())?
        };
        if !processed.is_empty() {
            tx.execute(Delete(By::<job::Expiration, _>::new(processed)))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
        }

        let stale = tx
            .execute(Update(
                By::<read::job::Expired, job::CreationDateTime>::new(
                    (now - Job::STALE_PERIOD).coerce(),
                ),
            ))
            .await
            .map_err(tracerr::wrap!())?;
        expired.0.extend(stale.0);

        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(expired)
    }
}

/// Error of [`SweepExpiredJobs`] [`Command`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use common::datetime;

    use super::SweepExpiredJobs;
    use crate::{
        command::{fixture, ChangeCompanyStatus, ChangeJobStatus, DeleteJob},
        domain::{company, job, user::Role, Job},
        infra::database::Memory,
        Command as _,
    };

    #[tokio::test]
    async fn keeps_fresh_job_active() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(6));

        let expired = svc.execute(SweepExpiredJobs).await.unwrap();

        assert!(expired.is_empty());
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Active);
        assert!(db.expiration(job.id).is_some());
    }

    #[tokio::test]
    async fn expires_job_once_due() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(8));

        let expired = svc.execute(SweepExpiredJobs).await.unwrap();

        assert_eq!(*expired, vec![job.id]);
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
        assert!(db.expiration(job.id).is_none());
    }

    #[tokio::test]
    async fn expiring_twice_is_noop() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(8));
        _ = svc.execute(SweepExpiredJobs).await.unwrap();
        let updated_at = db.job(job.id).unwrap().updated_at;

        let expired = svc.execute(SweepExpiredJobs).await.unwrap();

        assert!(expired.is_empty());
        let stored = db.job(job.id).unwrap();
        assert_eq!(stored.status, job::Status::Expired);
        assert_eq!(stored.updated_at, updated_at);
    }

    #[tokio::test]
    async fn leaves_inactive_job_alone() {
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
        db.rewind(datetime::days(40));

        let expired = svc.execute(SweepExpiredJobs).await.unwrap();

        assert!(expired.is_empty());
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Inactive);
        assert!(db.expiration(job.id).is_none());
    }

    #[tokio::test]
    async fn never_revives_expired_job() {
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

        for days in [1, 7, 30] {
            db.rewind(datetime::days(days));
            _ = svc.execute(SweepExpiredJobs).await.unwrap();

            assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
        }
    }

    #[tokio::test]
    async fn skips_work_item_of_deleted_job() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let gone = fixture::job(&svc, &owner, &acme, "Gone").await;
        let kept = fixture::job(&svc, &owner, &acme, "Kept").await;
        // Emulates a work item left behind by the deleted `Job`.
        let stale = db.expiration(gone.id).unwrap();
        _ = svc
            .execute(DeleteJob {
                job_id: gone.id,
                initiator_id: owner.id,
            })
            .await
            .unwrap();
        db.schedule(stale);
        db.rewind(datetime::days(8));

        let expired = svc.execute(SweepExpiredJobs).await.unwrap();

        assert_eq!(*expired, vec![kept.id]);
        assert!(db.job(gone.id).is_none());
        assert!(db.expiration(gone.id).is_none());
    }

    #[tokio::test]
    async fn work_item_survives_restart() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let db = db.restart();
        db.rewind(datetime::days(10));
        let expired = db.service().execute(SweepExpiredJobs).await.unwrap();

        assert_eq!(*expired, vec![job.id]);
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn expires_stale_job_without_work_item() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.unschedule(job.id);

        db.rewind(datetime::days(29));
        let expired = svc.execute(SweepExpiredJobs).await.unwrap();
        assert!(expired.is_empty());
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Active);

        db.rewind(datetime::days(2));
        let expired = svc.execute(SweepExpiredJobs).await.unwrap();
        assert_eq!(*expired, vec![job.id]);
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn expires_each_job_once_when_both_apply() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(Job::STALE_PERIOD + datetime::days(1));

        let expired = svc.execute(SweepExpiredJobs).await.unwrap();

        assert_eq!(*expired, vec![job.id]);
    }
}
