//! [`Command`] for registering a new [`Company`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::company::{
    Description, Email, Industry, Location, Name, Phone, Size, Url,
};
use crate::{
    domain::{company, user, Company, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`Company`].
///
/// The initiator becomes the owner of the [`Company`], which starts
/// [`company::Status::Active`].
#[derive(Clone, Debug)]
pub struct CreateCompany {
    /// ID of the [`User`] registering the [`Company`].
    pub initiator_id: user::Id,

    /// Unique [`Name`] of a new [`Company`].
    pub name: company::Name,

    /// [`Location`] of a new [`Company`].
    pub location: company::Location,

    /// Contact [`Email`] of a new [`Company`].
    pub email: company::Email,

    /// Contact [`Phone`] of a new [`Company`].
    pub phone: Option<company::Phone>,

    /// Logo [`Url`] of a new [`Company`].
    pub logo: Option<company::Url>,

    /// Website [`Url`] of a new [`Company`].
    pub website: Option<company::Url>,

    /// [`Industry`] of a new [`Company`].
    pub industry: Option<company::Industry>,

    /// [`Size`] of a new [`Company`].
    pub size: Option<company::Size>,

    /// [`Description`] of a new [`Company`].
    pub description: Option<company::Description>,
}

impl<Db> Command<CreateCompany> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<By<Option<Company>, &'l company::Name>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<Insert<Company>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Company;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateCompany,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCompany {
            initiator_id,
            name,
            location,
            email,
            phone,
            logo,
            website,
            industry,
            size,
            description,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if initiator.role == user::Role::JobSeeker {
            return Err(tracerr::new!(E::UserNotRecruiter(initiator_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<Company>, _>::new(&name)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let now = DateTime::now();
        let company = Company {
            id: company::Id::new(),
            owner_id: initiator.id,
            name,
            status: company::Status::Active,
            logo,
            location,
            website,
            industry,
            size,
            description,
            email,
            phone,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        // The name may be taken concurrently since the check above.
        tx.execute(Insert(company.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map_err(|e| match e.as_ref() {
                E::Db(db)
                    if db.is_unique_violation(Some("companies_name_key")) =>
                {
                    tracerr::new!(E::NameOccupied(company.name.clone()))
                }
                _ => e,
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(company)
    }
}

/// Error of [`CreateCompany`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`company::Name`] is already taken by another [`Company`].
    #[display("`{_0}` company name is occupied")]
    NameOccupied(#[error(not(source))] company::Name),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is not allowed to register [`Company`]s.
    #[display("`User(id: {_0})` is not a recruiter")]
    UserNotRecruiter(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use super::ExecutionError;
    use crate::{
        command::fixture,
        domain::{company, user::Role},
        infra::database::{memory::Faults, Memory},
        Command as _,
    };

    #[tokio::test]
    async fn registers_active_company_owned_by_initiator() {
        let svc = Memory::default().service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;

        let company = svc
            .execute(fixture::company_input(&owner, "Acme"))
            .await
            .unwrap();

        assert_eq!(company.owner_id, owner.id);
        assert_eq!(company.status, company::Status::Active);
    }

    #[tokio::test]
    async fn rejects_occupied_name() {
        let svc = Memory::default().service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        _ = fixture::company(&svc, &owner, "Acme").await;

        let err = svc
            .execute(fixture::company_input(&owner, "Acme"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NameOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_name_occupied_concurrently() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        db.inject(Faults {
            stale_unique_reads: true,
            ..Faults::default()
        });

        let err = svc
            .execute(fixture::company_input(&owner, "Acme"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NameOccupied(_)));
        assert_eq!(db.company(acme.id).unwrap().name, acme.name);
    }

    #[tokio::test]
    async fn rejects_job_seeker() {
        let svc = Memory::default().service();
        let seeker = fixture::user(&svc, "seeker", Role::JobSeeker).await;

        let err = svc
            .execute(fixture::company_input(&seeker, "Acme"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotRecruiter(_)));
    }
}
