//! [`Job`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select, Update},
    pagination::Order,
    DateTime,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{company, job, Job},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of a [`Job`] row.
const COLUMNS: &str = "\
    id, company_id, created_by, \
    title, description, skills, salary, location, \
    work_type, employment_type, experience_level, education, industry, \
    positions, applicants, \
    status, posted_at, expires_at, created_at, updated_at";

/// Reads a [`Job`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Job {
    Job {
        id: row.get("id"),
        company_id: row.get("company_id"),
        created_by: row.get("created_by"),
        title: row.get("title"),
        description: row.get("description"),
        skills: row
            .get::<_, Vec<job::Skill>>("skills")
            .into_iter()
            .collect(),
        salary: row.get("salary"),
        location: row.get("location"),
        work_type: row.get("work_type"),
        employment_type: row.get("employment_type"),
        experience_level: row.get("experience_level"),
        education: row.get("education"),
        industry: row.get("industry"),
        positions: u16::try_from(row.get::<_, i32>("positions"))
            .ok()
            .and_then(job::Positions::new)
            .expect("`positions` is checked to be positive"),
        applicants: row.get("applicants"),
        status: row.get("status"),
        posted_at: row.get("posted_at"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Job>, job::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Job>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Job>, job::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM jobs \
             WHERE id = $1::UUID",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Job>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(job): Insert<Job>,
    ) -> Result<Self::Ok, Self::Err> {
        let Job {
            id,
            company_id,
            created_by,
            title,
            description,
            skills,
            salary,
            location,
            work_type,
            employment_type,
            experience_level,
            education,
            industry,
            positions,
            applicants,
            status,
            posted_at,
            expires_at,
            created_at,
            updated_at,
        } = job;
        let skills = skills.into_iter().collect::<Vec<_>>();
        let positions = i32::from(positions.get());

        // The status of the `Company` is read by the very statement writing
        // the `Job`, so an inactive `Company` never gets an active `Job`.
        let sql = format!(
            "INSERT INTO jobs ({COLUMNS}) \
             SELECT $1::UUID, $2::UUID, $3::UUID, \
                    $4::VARCHAR, $5::TEXT, $6::VARCHAR[], $7::NUMERIC, \
                    $8::VARCHAR, \
                    $9::INT2, $10::INT2, $11::INT2, $12::VARCHAR, \
                    $13::VARCHAR, \
                    $14::INT4, $15::UUID[], \
                    CASE WHEN c.status = $21::INT2 \
                         THEN $22::INT2 \
                         ELSE $16::INT2 \
                    END, \
                    $17::TIMESTAMPTZ, $18::TIMESTAMPTZ, \
                    $19::TIMESTAMPTZ, $20::TIMESTAMPTZ \
             FROM companies AS c \
             WHERE c.id = $2::UUID",
        );
        self.exec(
            &sql,
            &[
                &id,
                &company_id,
                &created_by,
                &title,
                &description,
                &skills,
                &salary,
                &location,
                &work_type,
                &employment_type,
                &experience_level,
                &education,
                &industry,
                &positions,
                &applicants,
                &status,
                &posted_at,
                &expires_at,
                &created_at,
                &updated_at,
                &company::Status::Inactive,
                &job::Status::Inactive,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Job>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(job): Update<Job>,
    ) -> Result<Self::Ok, Self::Err> {
        // `applicants` are written by `Insert<job::Application>` only, and
        // `created_at` never changes.
        let Job {
            id,
            company_id,
            created_by,
            title,
            description,
            skills,
            salary,
            location,
            work_type,
            employment_type,
            experience_level,
            education,
            industry,
            positions,
            applicants: _,
            status,
            posted_at,
            expires_at,
            created_at: _,
            updated_at,
        } = job;
        let skills = skills.into_iter().collect::<Vec<_>>();
        let positions = i32::from(positions.get());

        const SQL: &str = "\
            UPDATE jobs AS j \
            SET company_id = $2::UUID, \
                created_by = $3::UUID, \
                title = $4::VARCHAR, \
                description = $5::TEXT, \
                skills = $6::VARCHAR[], \
                salary = $7::NUMERIC, \
                location = $8::VARCHAR, \
                work_type = $9::INT2, \
                employment_type = $10::INT2, \
                experience_level = $11::INT2, \
                education = $12::VARCHAR, \
                industry = $13::VARCHAR, \
                positions = $14::INT4, \
                status = CASE WHEN c.status = $19::INT2 \
                              THEN $20::INT2 \
                              ELSE $15::INT2 \
                         END, \
                posted_at = $16::TIMESTAMPTZ, \
                expires_at = $17::TIMESTAMPTZ, \
                updated_at = $18::TIMESTAMPTZ \
            FROM companies AS c \
            WHERE j.id = $1::UUID \
              AND c.id = $2::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &company_id,
                &created_by,
                &title,
                &description,
                &skills,
                &salary,
                &location,
                &work_type,
                &employment_type,
                &experience_level,
                &education,
                &industry,
                &positions,
                &status,
                &posted_at,
                &expires_at,
                &updated_at,
                &company::Status::Inactive,
                &job::Status::Inactive,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Insert<job::Application>> for Postgres<C>
where
    C: Connection,
{
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

        // No row is returned unless the `Job` is active and not overdue at
        // the moment of writing.
        let sql = format!(
            "UPDATE jobs \
             SET applicants = CASE WHEN $2::UUID = ANY(applicants) \
                                   THEN applicants \
                                   ELSE array_append(applicants, $2::UUID) \
                              END, \
                 updated_at = CASE WHEN $2::UUID = ANY(applicants) \
                                   THEN updated_at \
                                   ELSE $3::TIMESTAMPTZ \
                              END \
             WHERE id = $1::UUID \
               AND status = $4::INT2 \
               AND expires_at >= $3::TIMESTAMPTZ \
             RETURNING {COLUMNS}",
        );
        Ok(self
            .query_opt(
                &sql,
                &[&job_id, &applicant_id, &applied_at, &job::Status::Active],
            )
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Delete<By<Job, job::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Job, job::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: job::Id = by.into_inner();

        // `job_expirations` rows go away by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM jobs \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<job::Expiration>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(expiration): Insert<job::Expiration>,
    ) -> Result<Self::Ok, Self::Err> {
        let job::Expiration { job_id, due_at } = expiration;

        const SQL: &str = "\
            INSERT INTO job_expirations (job_id, due_at) \
            VALUES ($1::UUID, $2::TIMESTAMPTZ) \
            ON CONFLICT (job_id) DO UPDATE \
            SET due_at = EXCLUDED.due_at";
        self.exec(SQL, &[&job_id, &due_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<job::Expiration>, job::ExpirationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<job::Expiration>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<job::Expiration>, job::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();

        // Concurrent sweeps split the due rows instead of waiting on them.
        const SQL: &str = "\
            SELECT job_id, due_at \
            FROM job_expirations \
            WHERE due_at <= $1::TIMESTAMPTZ \
            ORDER BY due_at ASC \
            FOR UPDATE SKIP LOCKED";
        Ok(self
            .query(SQL, &[&now])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| job::Expiration {
                job_id: row.get("job_id"),
                due_at: row.get("due_at"),
            })
            .collect())
    }
}

impl<C> Database<Delete<By<job::Expiration, Vec<job::Id>>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<job::Expiration, Vec<job::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        if ids.is_empty() {
            return Ok(());
        }

        const SQL: &str = "\
            DELETE FROM job_expirations \
            WHERE job_id = ANY($1::UUID[])";
        self.exec(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<By<read::job::Expired, Vec<job::Id>>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::job::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::job::Expired, Vec<job::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        if ids.is_empty() {
            return Ok(read::job::Expired::default());
        }
        let now: job::ModificationDateTime = DateTime::now().coerce();

        const SQL: &str = "\
            UPDATE jobs \
            SET status = $2::INT2, \
                updated_at = $4::TIMESTAMPTZ \
            WHERE id = ANY($1::UUID[]) \
              AND status = $3::INT2 \
            RETURNING id";
        Ok(read::job::Expired(
            self.query(
                SQL,
                &[&ids, &job::Status::Expired, &job::Status::Active, &now],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect(),
        ))
    }
}

impl<C> Database<Update<By<read::job::Expired, job::CreationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::job::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::job::Expired, job::CreationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let threshold = by.into_inner();
        let now: job::ModificationDateTime = DateTime::now().coerce();

        const SQL: &str = "\
            UPDATE jobs \
            SET status = $2::INT2, \
                updated_at = $4::TIMESTAMPTZ \
            WHERE created_at < $1::TIMESTAMPTZ \
              AND status = $3::INT2 \
            RETURNING id";
        Ok(read::job::Expired(
            self.query(
                SQL,
                &[
                    &threshold,
                    &job::Status::Expired,
                    &job::Status::Active,
                    &now,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect(),
        ))
    }
}

impl<C> Database<Update<By<read::job::Deactivated, company::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::job::Deactivated;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::job::Deactivated, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let company_id = by.into_inner();
        let now: job::ModificationDateTime = DateTime::now().coerce();

        const SQL: &str = "\
            UPDATE jobs \
            SET status = $2::INT2, \
                updated_at = $3::TIMESTAMPTZ \
            WHERE company_id = $1::UUID \
              AND status <> $2::INT2 \
            RETURNING id";
        Ok(read::job::Deactivated(
            self.query(SQL, &[&company_id, &job::Status::Inactive, &now])
                .await
                .map_err(tracerr::wrap!())?
                .into_iter()
                .map(|row| row.get("id"))
                .collect(),
        ))
    }
}

/// Renders the provided [`read::job::list::Filter`] into SQL conditions,
/// pushing their parameters into the `ps`.
///
/// `patterns` are the [`FuzzPattern`]s of the title and the location.
fn conditions<'p>(
    filter: &'p read::job::list::Filter,
    patterns: &'p (Option<FuzzPattern>, Option<FuzzPattern>),
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> Vec<String> {
    let read::job::list::Filter {
        status,
        company_id,
        created_by,
        title: _,
        location: _,
        work_type,
        employment_type,
        experience_level,
        min_salary,
    } = filter;
    let (title, location) = patterns;

    ps.push(status);
    let mut conds = vec![format!("status = ${}::INT2", ps.len())];
    if let Some(id) = company_id {
        ps.push(id);
        conds.push(format!("company_id = ${}::UUID", ps.len()));
    }
    if let Some(id) = created_by {
        ps.push(id);
        conds.push(format!("created_by = ${}::UUID", ps.len()));
    }
    if let Some(pattern) = title {
        ps.push(pattern);
        conds.push(format!(
            "LOWER(title) SIMILAR TO LOWER(${}::VARCHAR)",
            ps.len(),
        ));
    }
    if let Some(pattern) = location {
        ps.push(pattern);
        conds.push(format!(
            "LOWER(location) SIMILAR TO LOWER(${}::VARCHAR)",
            ps.len(),
        ));
    }
    if let Some(t) = work_type {
        ps.push(t);
        conds.push(format!("work_type = ${}::INT2", ps.len()));
    }
    if let Some(t) = employment_type {
        ps.push(t);
        conds.push(format!("employment_type = ${}::INT2", ps.len()));
    }
    if let Some(l) = experience_level {
        ps.push(l);
        conds.push(format!("experience_level = ${}::INT2", ps.len()));
    }
    if let Some(s) = min_salary {
        ps.push(s);
        conds.push(format!("salary >= ${}::NUMERIC", ps.len()));
    }
    conds
}

/// Builds the [`FuzzPattern`]s of the provided [`read::job::list::Filter`].
fn patterns(
    filter: &read::job::list::Filter,
) -> (Option<FuzzPattern>, Option<FuzzPattern>) {
    (
        filter.title.as_ref().map(|t| FuzzPattern::new(t.as_ref())),
        filter.location.as_ref().map(|l| FuzzPattern::new(l.as_ref())),
    )
}

impl<C>
    Database<Select<By<read::job::list::Page, read::job::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::job::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::job::list::Page, read::job::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::job::list::Selector { arguments, filter } = by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);
        let patterns = patterns(&filter);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let conds = conditions(&filter, &patterns, &mut ps);
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(&c.posted_at);
            ps.push(&c.id);
            ps.len() - 1
        });

        // Newest first.
        let kind = arguments.kind();
        let sql = format!(
            "SELECT id, posted_at \
             FROM jobs \
             WHERE {conds} \
                   {cursor} \
             ORDER BY posted_at {order}, id {order} \
             LIMIT $1::INT4",
            conds = conds.iter().format(" AND "),
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = kind.operator_for(Order::Descending);
                f(&format_args!(
                    "AND (posted_at, id) {op} \
                         (${idx}::TIMESTAMPTZ, ${}::UUID)",
                    idx + 1,
                ))
            }),
            order = kind.order_for(Order::Descending).sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let mut edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let cursor = read::job::list::Cursor {
                    posted_at: row.get("posted_at"),
                    id: row.get("id"),
                };
                (cursor, cursor.id)
            })
            .collect::<Vec<_>>();
        if kind.is_backward() {
            edges.reverse();
        }

        Ok(read::job::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<Select<By<read::job::list::TotalCount, read::job::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
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
        let patterns = patterns(&filter);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let conds = conditions(&filter, &patterns, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM jobs \
             WHERE {}",
            conds.iter().format(" AND "),
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Select<By<read::report::JobStatuses, Option<company::Id>>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::report::JobStatuses;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::report::JobStatuses, Option<company::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let company_id = by.into_inner();

        const SQL: &str = "\
            SELECT status, COUNT(*)::INT8 AS count \
            FROM jobs \
            WHERE $1::UUID IS NULL \
               OR company_id = $1::UUID \
            GROUP BY status";
        Ok(self
            .query(SQL, &[&company_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let count = row.get::<_, i64>("count");
                (row.get("status"), u64::try_from(count).unwrap_or_default())
            })
            .collect())
    }
}
