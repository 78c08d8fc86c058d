use sea_query::{ColumnDef, Expr as SeaExpr, Func as SeaFunc, Iden, OnConflict, Order as SeaOrder, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::SqlxBinder;
use sqlx::{Error as DbError, Row, postgres::PgRow};

use crate::{
    FlowRepoError, Result,
    store::{
        DbCollection, data,
        db::postgres::{DbInit, DbRow},
        map_db_err,
    },
};

use super::DbConnection;

#[derive(Debug)]
pub struct ProjectCollection {
    conn: DbConnection,
}

#[derive(Iden)]
#[iden = "projects"]
enum CollectionIden {
    Table,

    Name,
    Pipeline,
    Scripts,
    Manifests,
    CreateTime,
    UpdateTime,
}

const COLUMNS: [CollectionIden; 6] = [
    CollectionIden::Name,
    CollectionIden::Pipeline,
    CollectionIden::Scripts,
    CollectionIden::Manifests,
    CollectionIden::CreateTime,
    CollectionIden::UpdateTime,
];

impl DbCollection for ProjectCollection {
    type Item = data::ProjectRecord;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .expr(SeaFunc::count(SeaExpr::col(CollectionIden::Name)))
            .and_where(SeaExpr::col(CollectionIden::Name).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        let count = self.conn.query_optional(sql.as_str(), values).map_err(map_db_err)?.map(|row| row.get::<i64, usize>(0)).unwrap_or_default();

        Ok(count > 0)
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        let (sql, values) =
            SeaQuery::select().from(CollectionIden::Table).columns(COLUMNS).and_where(SeaExpr::col(CollectionIden::Name).eq(id)).build_sqlx(PostgresQueryBuilder);

        let row = self.conn.query_optional(&sql, values).map_err(map_db_err)?.ok_or(FlowRepoError::NotFound(format!("project {}", id)))?;
        Self::Item::from_row(&row).map_err(map_db_err)
    }

    fn list(&self) -> Result<Vec<Self::Item>> {
        let (sql, values) = SeaQuery::select().from(CollectionIden::Table).columns(COLUMNS).order_by(CollectionIden::Name, SeaOrder::Asc).build_sqlx(PostgresQueryBuilder);

        self.conn.query(&sql, values).map_err(map_db_err)?.iter().map(|row| Self::Item::from_row(row).map_err(map_db_err)).collect()
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let data = data.clone();
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns(COLUMNS)
            .values([data.name.into(), data.pipeline.into(), data.scripts.into(), data.manifests.into(), data.create_time.into(), data.update_time.into()])
            .map_err(map_db_err)?
            .on_conflict(OnConflict::column(CollectionIden::Name).do_nothing().to_owned())
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let model = data.clone();
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::Pipeline, model.pipeline.into()),
                (CollectionIden::Scripts, model.scripts.into()),
                (CollectionIden::Manifests, model.manifests.into()),
                (CollectionIden::CreateTime, model.create_time.into()),
                (CollectionIden::UpdateTime, model.update_time.into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Name).eq(data.id()))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) =
            SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Name).eq(id)).build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

impl DbRow for data::ProjectRecord {
    fn id(&self) -> &str {
        &self.name
    }

    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        Ok(Self {
            name: row.try_get("name")?,
            pipeline: row.try_get("pipeline")?,
            scripts: row.try_get("scripts")?,
            manifests: row.try_get("manifests")?,
            create_time: row.try_get("create_time")?,
            update_time: row.try_get("update_time")?,
        })
    }
}

impl DbInit for ProjectCollection {
    fn init(&self) -> Result<()> {
        let sql = [Table::create()
            .table(CollectionIden::Table)
            .if_not_exists()
            .col(ColumnDef::new(CollectionIden::Name).string().not_null().primary_key())
            .col(ColumnDef::new(CollectionIden::Pipeline).text())
            .col(ColumnDef::new(CollectionIden::Scripts).text().not_null())
            .col(ColumnDef::new(CollectionIden::Manifests).text().not_null())
            .col(ColumnDef::new(CollectionIden::CreateTime).big_integer().default(0))
            .col(ColumnDef::new(CollectionIden::UpdateTime).big_integer().default(0))
            .build(PostgresQueryBuilder)];

        self.conn.batch_execute(&sql).map_err(map_db_err)
    }
}

impl ProjectCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
