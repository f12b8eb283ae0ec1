//! [`Query`] collection related to the multiple [`Job`]s.

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Job;
use crate::{
    command::{self, SweepExpiredJobs},
    domain::job,
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries a page of [`Job`]s, newest first.
///
/// Listing [`job::Status::Active`] [`Job`]s sweeps the overdue ones first, so
/// none of them is listed.
#[derive(Clone, Debug)]
pub struct List(read::job::list::Selector);

impl List {
    /// Creates a new [`List`] [`Query`] with the provided
    /// [`read::job::list::Selector`].
    #[must_use]
    pub const fn by(selector: read::job::list::Selector) -> Self {
        Self(selector)
    }
}

impl<Db> Query<List> for Service<Db>
where
    Db: Database<
        Select<By<read::job::list::Page, read::job::list::Selector>>,
        Ok = read::job::list::Page,
        Err = Traced<database::Error>,
    >,
    Self: command::Command<
        SweepExpiredJobs,
        Ok = read::job::Expired,
        Err = Traced<command::sweep_expired_jobs::ExecutionError>,
    >,
{
    type Ok = read::job::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        List(selector): List,
    ) -> Result<Self::Ok, Self::Err> {
        if selector.filter.status == job::Status::Active {
            _ = self
                .execute(SweepExpiredJobs)
                .await
                .map_err(tracerr::wrap!())?;
        }

        self.database()
            .execute(Select(By::new(selector)))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Queries total count of [`Job`]s matching a [`read::job::list::Filter`].
pub type TotalCount =
    DatabaseQuery<By<read::job::list::TotalCount, read::job::list::Filter>>;

#[cfg(test)]
mod spec {
    use common::{datetime, pagination::Arguments};

    use super::List;
    use crate::{
        command::{fixture, ChangeJobStatus},
        domain::{job, user::Role},
        infra::database::Memory,
        read::job::list::{Filter, Selector},
        Query as _,
    };

    fn first(n: usize, filter: Filter) -> List {
        List::by(Selector {
            arguments: Arguments::Forward {
                first: n,
                after: None,
                including: false,
            },
            filter,
        })
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let older = fixture::job(&svc, &owner, &acme, "Older").await;
        db.rewind(datetime::days(1));
        let newer = fixture::job(&svc, &owner, &acme, "Newer").await;

        let page = svc.execute(first(10, Filter::default())).await.unwrap();

        let ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert!(!page.page_info().has_next_page);
    }

    #[tokio::test]
    async fn never_lists_overdue_job_as_active() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let job = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        db.rewind(datetime::days(8));

        let page = svc.execute(first(10, Filter::default())).await.unwrap();

        assert!(page.edges.is_empty());
        assert_eq!(db.job(job.id).unwrap().status, job::Status::Expired);
    }

    #[tokio::test]
    async fn pages_through_jobs() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        for title in ["A", "B", "C"] {
            _ = fixture::job(&svc, &owner, &acme, title).await;
            db.rewind(datetime::days(1));
        }

        let page = svc.execute(first(2, Filter::default())).await.unwrap();
        assert_eq!(page.edges.len(), 2);
        assert!(page.page_info().has_next_page);

        let rest = svc
            .execute(List::by(Selector {
                arguments: Arguments::Forward {
                    first: 2,
                    after: page.page_info().end_cursor,
                    including: false,
                },
                filter: Filter::default(),
            }))
            .await
            .unwrap();
        assert_eq!(rest.edges.len(), 1);
        assert!(!rest.page_info().has_next_page);
    }

    #[tokio::test]
    async fn filters_by_status_and_title() {
        let db = Memory::default();
        let svc = db.service();
        let owner = fixture::user(&svc, "owner", Role::Recruiter).await;
        let acme = fixture::company(&svc, &owner, "Acme").await;
        let rust = fixture::job(&svc, &owner, &acme, "Rust engineer").await;
        let go = fixture::job(&svc, &owner, &acme, "Go engineer").await;
        _ = svc
            .execute(ChangeJobStatus {
                job_id: go.id,
                status: job::Status::Inactive,
                initiator_id: owner.id,
            })
            .await
            .unwrap();

        let page = svc
            .execute(first(
                10,
                Filter {
                    title: job::Title::new("rust"),
                    ..Filter::default()
                },
            ))
            .await
            .unwrap();
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            vec![rust.id],
        );

        let page = svc
            .execute(first(
                10,
                Filter {
                    status: job::Status::Inactive,
                    ..Filter::default()
                },
            ))
            .await
            .unwrap();
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            vec![go.id],
        );
    }
}
