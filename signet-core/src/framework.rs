use sqlx::PgPool;

/// Executes SQL processors against the shared connection pool.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
