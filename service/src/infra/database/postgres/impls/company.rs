//! [`Company`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{company, Company},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of a [`Company`] row.
const COLUMNS: &str = "\
    id, owner_id, name, status, \
    logo, location, website, industry, size, description, \
    email, phone, \
    created_at, updated_at";

/// Reads a [`Company`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Company {
    Company {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        status: row.get("status"),
        logo: row.get("logo"),
        location: row.get("location"),
        website: row.get("website"),
        industry: row.get("industry"),
        size: row.get("size"),
        description: row.get("description"),
        email: row.get("email"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Company>, company::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM companies \
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

impl<'l, C> Database<Select<By<Option<Company>, &'l company::Name>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, &'l company::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM companies \
             WHERE name = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&name])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Company>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(company): Insert<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        let Company {
            id,
            owner_id,
            name,
            status,
            logo,
            location,
            website,
            industry,
            size,
            description,
            email,
            phone,
            created_at,
            updated_at,
        } = company;

        let sql = format!(
            "INSERT INTO companies ({COLUMNS}) \
             VALUES (\
                 $1::UUID, $2::UUID, $3::VARCHAR, $4::INT2, \
                 $5::VARCHAR, $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, \
                 $9::INT2, $10::TEXT, \
                 $11::VARCHAR, $12::VARCHAR, \
                 $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
             )",
        );
        self.exec(
            &sql,
            &[
                &id,
                &owner_id,
                &name,
                &status,
                &logo,
                &location,
                &website,
                &industry,
                &size,
                &description,
                &email,
                &phone,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Company>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(company): Update<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        let Company {
            id,
            owner_id,
            name,
            status,
            logo,
            location,
            website,
            industry,
            size,
            description,
            email,
            phone,
            created_at: _,
            updated_at,
        } = company;

        const SQL: &str = "\
            UPDATE companies \
            SET owner_id = $2::UUID, \
                name = $3::VARCHAR, \
                status = $4::INT2, \
                logo = $5::VARCHAR, \
                location = $6::VARCHAR, \
                website = $7::VARCHAR, \
                industry = $8::VARCHAR, \
                size = $9::INT2, \
                description = $10::TEXT, \
                email = $11::VARCHAR, \
                phone = $12::VARCHAR, \
                updated_at = $13::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &name,
                &status,
                &logo,
                &location,
                &website,
                &industry,
                &size,
                &description,
                &email,
                &phone,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Company, company::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Company, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: company::Id = by.into_inner();

        // Touching the row keeps it locked until the transaction ends.
        const SQL: &str = "\
            INSERT INTO companies_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
