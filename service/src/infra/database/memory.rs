//! In-memory [`Database`] implementation used by tests.
//!
//! Mirrors the [`Postgres`] semantics the commands rely on: transactions see
//! their own writes and are discarded unless committed, [`Job`] writes are
//! forced inactive for inactive [`Company`]s and deleting a [`Job`] drops
//! its [`job::Expiration`].
//!
//! [`Postgres`]: crate::infra::Postgres

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    DateTime,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{company, job, user, Company, Job, User},
    infra::{database, Database},
    read, task, Config, Service,
};

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed [`State`].
    committed: Arc<Mutex<State>>,

    /// [`State`] of the ongoing transaction, if any.
    tx: Option<Arc<Mutex<State>>>,

    /// [`Faults`] to inject into operations.
    faults: Arc<Mutex<Faults>>,
}

/// Stored entities.
#[derive(Clone, Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Company`]s.
    companies: HashMap<company::Id, Company>,

    /// Stored [`Job`]s.
    jobs: HashMap<job::Id, Job>,

    /// Scheduled [`job::Expiration`]s.
    expirations: HashMap<job::Id, job::ExpirationDateTime>,
}

/// Failures to inject into [`Memory`] operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Faults {
    /// Fail deactivating [`Job`]s of a [`Company`].
    pub deactivate_jobs: bool,

    /// Miss [`User`]s by login and [`Company`]s by name, as if they were
    /// inserted concurrently after the read.
    pub stale_unique_reads: bool,
}

/// [`Memory`] error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Injected failure of the named operation.
    #[display("injected failure of `{_0}`")]
    Injected(#[error(not(source))] &'static str),

    /// Commit outside of a transaction.
    #[display("no transaction to commit")]
    NotInTransaction,

    /// Unique constraint violation.
    #[display("unique constraint `{_0}` violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if this [`Error`] is a violation of the specified unique
    /// constraint, or of any one if none is specified.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(violated) => {
                constraint.map_or(true, |c| c == *violated)
            }
            Self::Injected(_) | Self::NotInTransaction => false,
        }
    }
}

/// Locks the provided [`Mutex`] ignoring poisoning.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shortcut for failing with a [`Memory`] [`Error`].
fn fail<T>(e: Error) -> Result<T, Traced<database::Error>> {
    Err(tracerr::new!(database::Error::from(e)))
}

impl Memory {
    /// Returns the [`State`] visible to this [`Memory`] handle.
    fn state(&self) -> MutexGuard<'_, State> {
        lock(self.tx.as_ref().unwrap_or(&self.committed))
    }

    /// Sets the [`Faults`] to inject.
    pub fn inject(&self, faults: Faults) {
        *lock(&self.faults) = faults;
    }

    /// Moves every stored date back by the provided [`Duration`], as if it
    /// has passed.
    pub fn rewind(&self, by: Duration) {
        let mut state = self.state();
        for job in state.jobs.values_mut() {
            job.posted_at = job.posted_at - by;
            job.expires_at = job.expires_at - by;
            job.created_at = job.created_at - by;
            job.updated_at = job.updated_at - by;
        }
        for due_at in state.expirations.values_mut() {
            *due_at = *due_at - by;
        }
    }

    /// Emulates a process restart: the stored data stays, while nothing
    /// in-process survives.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self {
            committed: Arc::new(Mutex::new(lock(&self.committed).clone())),
            tx: None,
            faults: Arc::default(),
        }
    }

    /// Returns the stored [`Job`], if any.
    #[must_use]
    pub fn job(&self, id: job::Id) -> Option<Job> {
        self.state().jobs.get(&id).cloned()
    }

    /// Updates the stored [`Job`] in place, bypassing any checks.
    pub fn modify_job(&self, id: job::Id, f: impl FnOnce(&mut Job)) {
        if let Some(job) = self.state().jobs.get_mut(&id) {
            f(job);
        }
    }

    /// Returns the stored [`Company`], if any.
    #[must_use]
    pub fn company(&self, id: company::Id) -> Option<Company> {
        self.state().companies.get(&id).cloned()
    }

    /// Returns the scheduled [`job::Expiration`] of a [`Job`], if any.
    #[must_use]
    pub fn expiration(&self, id: job::Id) -> Option<job::Expiration> {
        self.state()
            .expirations
            .get(&id)
            .map(|&due_at| job::Expiration { job_id: id, due_at })
    }

    /// Stores the provided [`job::Expiration`], bypassing any checks.
    pub fn schedule(&self, expiration: job::Expiration) {
        drop(
            self.state()
                .expirations
                .insert(expiration.job_id, expiration.due_at),
        );
    }

    /// Drops the scheduled [`job::Expiration`] of a [`Job`], if any.
    pub fn unschedule(&self, id: job::Id) {
        drop(self.state().expirations.remove(&id));
    }

    /// Creates a new [`Service`] over this [`Memory`].
    #[must_use]
    pub fn service(&self) -> Service<Self> {
        Service {
            config: Config {
                jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                    b"secret",
                ),
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    b"secret",
                ),
                expire_jobs: task::expire_jobs::Config::default(),
            },
            database: self.clone(),
        }
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.tx.is_some() {
            return Ok(self.clone());
        }
        let snapshot = lock(&self.committed).clone();
        Ok(Self {
            committed: Arc::clone(&self.committed),
            tx: Some(Arc::new(Mutex::new(snapshot))),
            faults: Arc::clone(&self.faults),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(tx) = &self.tx else {
            return fail(Error::NotInTransaction);
        };
        *lock(&self.committed) = lock(tx).clone();
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .users
            .get(by.inner())
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Login>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        if lock(&self.faults).stale_unique_reads {
            return Ok(None);
        }

        let login = by.into_inner();
        Ok(self
            .state()
            .users
            .values()
            .find(|u| &u.login == login && u.deleted_at.is_none())
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state
            .users
            .values()
            .any(|u| u.login == user.login && u.id != user.id)
        {
            return fail(Error::UniqueViolation("users_login_idx"));
        }
        drop(state.users.insert(user.id, user));
        Ok(())
    }
}

impl Database<Select<By<Option<Company>, company::Id>>> for Memory {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().companies.get(by.inner()).cloned())
    }
}

impl<'l> Database<Select<By<Option<Company>, &'l company::Name>>> for Memory {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, &'l company::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        if lock(&self.faults).stale_unique_reads {
            return Ok(None);
        }

        let name = by.into_inner();
        Ok(self
            .state()
            .companies
            .values()
            .find(|c| &c.name == name)
            .cloned())
    }
}

impl Database<Insert<Company>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(company): Insert<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state.companies.contains_key(&company.id) {
            return fail(Error::UniqueViolation("companies_pkey"));
        }
        if state.companies.values().any(|c| c.name == company.name) {
            return fail(Error::UniqueViolation("companies_name_key"));
        }
        drop(state.companies.insert(company.id, company));
        Ok(())
    }
}

impl Database<Update<Company>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(company): Update<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().companies.insert(company.id, company));
        Ok(())
    }
}

impl Database<Lock<By<Company, company::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Company, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Job>, job::Id>>> for Memory {
    type Ok = Option<Job>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Job>, job::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().jobs.get(by.inner()).cloned())
    }
}

impl Database<Insert<Job>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(mut job): Insert<Job>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state.jobs.contains_key(&job.id) {
            return fail(Error::UniqueViolation("jobs_pkey"));
        }
        if let Some(company) = state.companies.get(&job.company_id) {
            job.status = job.status.under(company.status);
        }
        drop(state.jobs.insert(job.id, job));
        Ok(())
    }
}

impl Database<Update<Job>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(job): Update<Job>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let company_status =
            state.companies.get(&job.company_id).map(|c| c.status);
        let Some(stored) = state.jobs.get_mut(&job.id) else {
            return Ok(());
        };
        *stored = Job {
            status: company_status
                .map_or(job.status, |status| job.status.under(status)),
            applicants: std::mem::take(&mut stored.applicants),
            created_at: stored.created_at,
            ..job
        };
        Ok(())
    }
}

impl Database<Insert<job::Application>> for Memory {
    type Ok = Option<Job>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(application): Insert<job::Application>,
    ) -> Result<Self::Ok, Self::Err> {
        let job::Application {
            job_id,
            applicant_id,
            applied_at,
        } = application;

        let mut state = self.state();
        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if !job.is_active() || job.is_past_expiration(applied_at) {
            return Ok(None);
        }
        if job.add_applicant(applicant_id) {
            job.updated_at = applied_at;
        }
        Ok(Some(job.clone()))
    }
}

impl Database<Delete<By<Job, job::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Job, job::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        drop(state.jobs.remove(by.inner()));
        drop(state.expirations.remove(by.inner()));
        Ok(())
    }
}

impl Database<Insert<job::Expiration>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(expiration): Insert<job::Expiration>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.state()
                .expirations
                .insert(expiration.job_id, expiration.due_at),
        );
        Ok(())
    }
}

impl Database<Select<By<Vec<job::Expiration>, job::ExpirationDateTime>>>
    for Memory
{
    type Ok = Vec<job::Expiration>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<job::Expiration>, job::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();
        let mut due = self
            .state()
            .expirations
            .iter()
            .filter(|&(_, &due_at)| due_at <= now)
            .map(|(&job_id, &due_at)| job::Expiration { job_id, due_at })
            .collect::<Vec<_>>();
        due.sort_by_key(|e| e.due_at);
        Ok(due)
    }
}

impl Database<Delete<By<job::Expiration, Vec<job::Id>>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<job::Expiration, Vec<job::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        for id in by.into_inner() {
            drop(state.expirations.remove(&id));
        }
        Ok(())
    }
}

impl Database<Update<By<read::job::Expired, Vec<job::Id>>>> for Memory {
    type Ok = read::job::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::job::Expired, Vec<job::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = DateTime::now();
        let mut state = self.state();
        Ok(read::job::Expired(
            by.into_inner()
                .into_iter()
                .filter(|id| {
                    state.jobs.get_mut(id).is_some_and(|j| j.expire(now))
                })
                .collect(),
        ))
    }
}

impl Database<Update<By<read::job::Expired, job::CreationDateTime>>>
    for Memory
{
    type Ok = read::job::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::job::Expired, job::CreationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let threshold = by.into_inner();
        let now = DateTime::now();
        Ok(read::job::Expired(
            self.state()
                .jobs
                .values_mut()
                .filter(|j| j.created_at < threshold)
                .filter_map(|j| j.expire(now).then_some(j.id))
                .collect(),
        ))
    }
}

impl Database<Update<By<read::job::Deactivated, company::Id>>> for Memory {
    type Ok = read::job::Deactivated;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::job::Deactivated, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        if lock(&self.faults).deactivate_jobs {
            return fail(Error::Injected("deactivate_jobs"));
        }

        let company_id = by.into_inner();
        let now = DateTime::now();
        Ok(read::job::Deactivated(
            self.state()
                .jobs
                .values_mut()
                .filter(|j| {
                    j.company_id == company_id
                        && j.status != job::Status::Inactive
                })
                .map(|j| {
                    j.status = job::Status::Inactive;
                    j.updated_at = now.coerce();
                    j.id
                })
                .collect(),
        ))
    }
}

impl
    Database<
        Select<By<read::job::list::Page, read::job::list::Selector>>,
    > for Memory
{
    type Ok = read::job::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::job::list::Page, read::job::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        use common::pagination::Arguments as A;

        let read::job::list::Selector { arguments, filter } = by.into_inner();

        // Newest first.
        let mut all = self
            .state()
            .jobs
            .values()
            .filter(|j| filter.matches(j))
            .map(|j| read::job::list::Cursor {
                posted_at: j.posted_at,
                id: j.id,
            })
            .collect::<Vec<_>>();
        all.sort_unstable_by(|a, b| b.cmp(a));

        let selected = match arguments {
            A::Forward {
                after, including, ..
            } => all
                .into_iter()
                .filter(|c| match after {
                    Some(a) if including => *c <= a,
                    Some(a) => *c < a,
                    None => true,
                })
                .collect::<Vec<_>>(),
            A::Backward {
                before, including, ..
            } => {
                let mut older_first = all
                    .into_iter()
                    .rev()
                    .filter(|c| match before {
                        Some(b) if including => *c >= b,
                        Some(b) => *c > b,
                        None => true,
                    })
                    .collect::<Vec<_>>();
                let has_more = older_first.len() > arguments.limit();
                older_first.truncate(arguments.limit());
                older_first.reverse();
                return Ok(read::job::list::Page::new(
                    &arguments,
                    older_first.into_iter().map(|c| (c, c.id)),
                    has_more,
                ));
            }
        };

        let has_more = selected.len() > arguments.limit();
        Ok(read::job::list::Page::new(
            &arguments,
            selected
                .into_iter()
                .take(arguments.limit())
                .map(|c| (c, c.id)),
            has_more,
        ))
    }
}

impl Database<Select<By<read::job::list::TotalCount, read::job::list::Filter>>>
    for Memory
{
    type Ok = read::job::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::job::list::TotalCount, read::job::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let count = self
            .state()
            .jobs
            .values()
            .filter(|j| filter.matches(j))
            .count();
        Ok(i32::try_from(count).unwrap_or(i32::MAX).into())
    }
}

impl Database<Select<By<read::report::JobStatuses, Option<company::Id>>>>
    for Memory
{
    type Ok = read::report::JobStatuses;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::report::JobStatuses, Option<company::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let company_id = by.into_inner();
        Ok(self
            .state()
            .jobs
            .values()
            .filter(|j| company_id.map_or(true, |id| j.company_id == id))
            .map(|j| (j.status, 1))
            .collect())
    }
}
