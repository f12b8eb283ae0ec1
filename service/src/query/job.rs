//! [`Query`] collection related to a single [`Job`].

use common::{
    operations::{By, Select, Update},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{job, Job},
    infra::{database, Database},
    read, Query, Service,
};

/// Queries a [`Job`] by its [`job::Id`].
///
/// An overdue [`Job`] is expired before being returned, so its status never
/// lags behind its [`Job::expires_at`].
#[derive(Clone, Copy, Debug)]
pub struct ById(job::Id);

impl ById {
    /// Creates a new [`ById`] [`Query`] for the provided [`job::Id`].
    #[must_use]
    pub const fn by(id: job::Id) -> Self {
        Self(id)
    }
}

impl<Db> Query<ById> for Service<Db>
where
    Db: Database<
            Select<By<Option<Job>, job::Id>>,
            Ok = Option<Job>,
            Err = Traced<database::Error>,
        > + Database<
            Update<By<read::job::Expired, Vec<job::Id>>>,
            Ok = read::job::Expired,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Job>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ById(id): ById,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(mut job) = self
            .database()
            .execute(Select(By::<Option<Job>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let now = DateTime::now();
        if job.is_overdue(now) {
            let expired = self
                .database()
                .execute(Update(By::<read::job::Expired, _>::new(vec![id])))
                .await
                .map_err(tracerr::wrap!())?;
            if expired.contains(&id) {
                _ = job.expire(now);
            } else {
                // Changed concurrently, so re-read the actual state.
                return self
                    .database()
                    .execute(Select(By::<Option<Job>, _>::new(id)))
                    .await
                    .map_err(tracerr::wrap!());
            }
        }

        Ok(Some(job))
    }
}

#[cfg(test)]
mod spec {
    use common::datetime;

    use super::ById;
    use crate::{
        command::fixture,
        domain::{job, user::Role},
        infra::database::Memory,
        Query as _,
    };

    #[tokio::test]
    async fn expires_overdue_job_on_read() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(8));

        let found = svc.execute(ById::by(job.id)).await.unwrap().unwrap();

        assert_eq!(found.status, job::Status::Expired);
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn returns_fresh_job_as_is() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;

        let found = svc.execute(ById::by(job.id)).await.unwrap().unwrap();

        assert_eq!(found.status, job::Status::Active);
    }

    #[tokio::test]
    async fn finds_nothing_for_unknown_id() {
        let svc = Memory::default().service();

        let found = svc.execute(ById::by(job::Id::new())).await.unwrap();

        assert!(found.is_none());
    }
}
