use std::{future::Future, sync::Arc, time::Duration};

use sqlx::{
    Database, Error, IntoArguments, PgPool, Postgres,
    postgres::{PgPoolOptions, PgRow},
};
use tokio::{
    runtime::{Handle, Runtime},
    task::block_in_place,
};

const MAX_CONNECTIONS: u32 = 16;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drive `fut` to completion on `runtime` from sync code.
///
/// Inside a runtime worker the thread is handed over with `block_in_place` first.
fn run<F: Future>(
    runtime: &Runtime,
    fut: F,
) -> F::Output {
    if Handle::try_current().is_ok() {
        block_in_place(|| runtime.block_on(fut))
    } else {
        runtime.block_on(fut)
    }
}

/// Blocking facade over a `PgPool`, driven by a shared runtime.
#[derive(Debug, Clone)]
pub struct SynClient {
    pool: PgPool,

    runtime: Arc<Runtime>,
}

impl SynClient {
    pub fn connect(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Result<Self, Error> {
        let options = PgPoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT).max_connections(MAX_CONNECTIONS);
        let pool = run(&runtime, options.connect(db_url))?;

        Ok(Self {
            pool,
            runtime,
        })
    }

    pub fn query_optional<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<Option<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;
            sqlx::query_with(sql, params).fetch_optional(&mut *conn).await
        })
    }

    pub fn query<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<Vec<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;
            sqlx::query_with(sql, params).fetch_all(&mut *conn).await
        })
    }

    pub fn execute<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<<Postgres as Database>::QueryResult, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;
            sqlx::query_with(sql, params).execute(&mut *conn).await
        })
    }

    /// Run every statement in one transaction.
    pub fn batch_execute(
        &self,
        sqls: &[String],
    ) -> Result<(), Error> {
        run(&self.runtime, async move {
            let mut tx = self.pool.begin().await?;
            for sql in sqls {
                sqlx::query(sql).execute(&mut *tx).await?;
            }
            tx.commit().await
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::runtime::Builder;

    use super::*;

    #[test]
    fn test_run_outside_runtime() {
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        assert_eq!(run(&runtime, async { 40 + 2 }), 42);
    }

    #[test]
    fn test_connect_reports_bad_url() {
        let runtime = Arc::new(Builder::new_current_thread().enable_all().build().unwrap());
        assert!(SynClient::connect("not-a-database-url", runtime).is_err());
    }
}
