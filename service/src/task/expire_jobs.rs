//! [`ExpireJobs`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Job;
use crate::{
    command::{self, sweep_expired_jobs},
    read, Service,
};

use super::Task;

/// Configuration for [`ExpireJobs`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between sweeps of overdue [`Job`]s.
    #[default(time::Duration::from_secs(60))]
    pub interval: time::Duration,
}

/// [`Task`] periodically expiring overdue [`Job`]s, so they don't wait for
/// the next read to be swept.
#[derive(Clone, Copy, Debug)]
pub struct ExpireJobs<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpireJobs<Self>, Config>>> for Service<Db>
where
    ExpireJobs<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireJobs<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireJobs {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpireJobs` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireJobs<Service<Db>>
where
    Service<Db>: command::Command<
        command::SweepExpiredJobs,
        Ok = read::job::Expired,
        Err = Traced<sweep_expired_jobs::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = Traced<sweep_expired_jobs::ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let expired = self
            .service
            .execute(command::SweepExpiredJobs)
            .await
            .map_err(tracerr::wrap!())?;
        if !expired.is_empty() {
            log::info!("`task::ExpireJobs` expired {} `Job`s", expired.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use common::{datetime, operations::Perform};

    use super::{Config, ExpireJobs};
    use crate::{
        command::fixture,
        domain::{job, user::Role},
        infra::database::Memory,
        Task as _,
    };

    #[tokio::test]
    async fn expires_overdue_jobs_on_each_run() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let company = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &company, "Rust engineer").await;

        let task = ExpireJobs {
            config: Config::default(),
            service: svc.clone(),
        };

        task.execute(Perform(())).await.unwrap();
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Active);

        db.rewind(datetime::days(8));
        task.execute(Perform(())).await.unwrap();
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }
}
