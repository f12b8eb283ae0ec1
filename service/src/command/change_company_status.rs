//! [`Command`] for changing a [`Company`] status.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Job;
use crate::{
    domain::{company, user, Company, User},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for changing a [`Company`] status.
///
/// Deactivating a [`Company`] deactivates all its [`Job`]s in the same
/// transaction, whatever their status is. Activating it leaves the [`Job`]s
/// untouched.
#[derive(Clone, Copy, Debug)]
pub struct ChangeCompanyStatus {
    /// ID of the [`Company`] to change the status of.
    pub company_id: company::Id,

    /// New [`company::Status`].
    pub status: company::Status,

    /// ID of the [`User`] changing the status.
    pub initiator_id: user::Id,
}

/// Output of [`ChangeCompanyStatus`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Company`] with its new status.
    pub company: Company,

    /// [`Job`]s deactivated along with the [`Company`].
    pub deactivated: read::job::Deactivated,
}

impl<Db> Command<ChangeCompanyStatus> for Service<Db>
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
        > + Database<Update<Company>, Err = Traced<database::Error>>
        + Database<
            Update<By<read::job::Deactivated, company::Id>>,
            Ok = read::job::Deactivated,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ChangeCompanyStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ChangeCompanyStatus {
            company_id,
            status,
            initiator_id,
        } = cmd;

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

        // Serialize with other writes of the `Company` and its `Job`s.
        tx.execute(Lock(By::new(company_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut company = tx
            .execute(Select(By::<Option<Company>, _>::new(company_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CompanyNotExists(company_id))
            .map_err(tracerr::wrap!())?;
        if !company.is_managed_by(&initiator) {
            return Err(tracerr::new!(E::UserNotPermitted(initiator_id)));
        }

        company.status = status;
        company.updated_at = DateTime::now().coerce();
        tx.execute(Update(company.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let deactivated = match status {
            company::Status::Inactive => tx
                .execute(Update(By::new(company_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> CascadeError))
                .map_err(tracerr::map_from_and_wrap!(=> E))?,
            company::Status::Active => read::job::Deactivated::default(),
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if !deactivated.is_empty() {
            log::info!(
                "deactivated {} `Job`s of `Company(id: {company_id})`",
                deactivated.len(),
            );
        }

        Ok(Output {
            company,
            deactivated,
        })
    }
}

/// Error of [`ChangeCompanyStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Deactivating [`Job`]s of the [`Company`] failed, so its status is left
    /// unchanged.
    #[display("Cascading `Company` status failed: {_0}")]
    Cascade(CascadeError),

    /// [`Company`] with the provided ID does not exist.
    #[display("`Company(id: {_0})` does not exist")]
    #[from(ignore)]
    CompanyNotExists(#[error(not(source))] company::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is neither the owner of the [`Company`] nor an admin.
    #[display("`User(id: {_0})` cannot manage the `Company`")]
    #[from(ignore)]
    UserNotPermitted(#[error(not(source))] user::Id),
}

/// Error of deactivating [`Job`]s of a [`Company`].
#[derive(Debug, Display, Error, From)]
#[display("failed to deactivate `Job`s: {_0}")]
pub struct CascadeError(database::Error);

#[cfg(test)]
mod spec {
    use super::{ChangeCompanyStatus, ExecutionError};
    use crate::{
        command::{fixture, ChangeJobStatus},
        domain::{
            company, job,
            user::{self, Role},
        },
        infra::database::{memory::Faults, Memory},
        query, Command as _,
    };

    fn deactivate(
        company: company::Id,
        initiator: user::Id,
    ) -> ChangeCompanyStatus {
        ChangeCompanyStatus {
            company_id: company,
            status: company::Status::Inactive,
            initiator_id: initiator,
        }
    }

    #[tokio::test]
    async fn deactivates_every_job_of_company() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let other = fixture::company(&svc, &owner, "Other").await;

        let active = fixture::job(&svc, &owner, &acme, "Active").await;
        let expired = fixture::job(&svc, &owner, &acme, "Expired").await;
        let closed = fixture::job(&svc, &owner, &acme, "Closed").await;
        let foreign = fixture::job(&svc, &owner, &other, "Foreign").await;
        db.modify_job(expired.id, |j| j.status = job::Status::Expired);
        db.modify_job(closed.id, |j| j.status = job::Status::Closed);

        let out = svc.execute(deactivate(acme.id, owner.id)).await.unwrap();

        assert_eq!(out.company.status, company::Status::Inactive);
        assert_eq!(out.deactivated.len(), 3);
        for id in [active.id, expired.id, closed.id] {
            assert_eq!(db.job(id).unwrap().status, job::Status::Inactive);
        }
        assert_eq!(db.job(foreign.id).unwrap().status, job::Status::Active);
    }

    #[tokio::test]
    async fn leaves_no_active_job_visible() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        for title in ["A", "B", "C"] {
            _ = fixture::job(&svc, &owner, &acme, title).await;
        }

        _ = svc.execute(deactivate(acme.id, owner.id)).await.unwrap();

        let report = svc
            .execute(query::report::JobStatuses::by(Some(acme.id)))
            .await
            .unwrap();
        assert_eq!(report.count(job::Status::Active), 0);
        assert_eq!(report.count(job::Status::Inactive), 3);
    }

    #[tokio::test]
    async fn reactivation_does_not_restore_jobs() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        _ = svc.execute(deactivate(acme.id, owner.id)).await.unwrap();

        let out = svc
            .execute(ChangeCompanyStatus {
                company_id: acme.id,
                status: company::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        assert_eq!(out.company.status, company::Status::Active);
        assert!(out.deactivated.is_empty());
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Inactive);

        // Jobs come back only explicitly.
        let job = svc
            .execute(ChangeJobStatus {
                job_id: job.id,
                status: job::Status::Active,
                initiator_id: owner.id,
            })
            .await
            .unwrap();
        assert_eq!(job.status, job::Status::Active);
    }

    #[tokio::test]
    async fn failed_cascade_keeps_company_active() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.inject(Faults {
            deactivate_jobs: true,
            ..Faults::default()
        });

        let err = svc.execute(deactivate(acme.id, owner.id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Cascade(_)));
        assert_eq!(
            db.company(acme.id).unwrap().status,
            company::Status::Active,
        );
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Active);
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_change() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let stranger = fixture::user(&svc, "stranger", Role::Recruiter).await;
        let admin = fixture::user(&svc, "admin", Role::Admin).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;

        let err = svc
            .execute(deactivate(acme.id, stranger.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotPermitted(_)));

        let out = svc.execute(deactivate(acme.id, admin.id)).await.unwrap();
        assert_eq!(out.company.status, company::Status::Inactive);
    }

    #[tokio::test]
    async fn rejects_unknown_company() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;

        let err = svc
            .execute(deactivate(company::Id::new(), owner.id))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CompanyNotExists(_)));
    }
}
