use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    FromRow, PgPool, Postgres,
};

use crate::database::manager::DatabaseError;
use crate::domain::Entity;

/// Persistence boundary of one entity type
#[async_trait]
pub trait Store<E: Entity>: Send + Sync {
    /// Insert when `record` has no id, overwrite otherwise. Returns the stored row.
    async fn save(&self, record: E) -> Result<E, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<E>, DatabaseError>;

    async fn find_all(&self) -> Result<Vec<E>, DatabaseError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError>;

    /// Cheap connectivity probe for `/health`
    async fn health(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

pub type PgQueryAs<'q, E> = QueryAs<'q, Postgres, E, PgArguments>;

/// Row mapping of an entity stored in its own PostgreSQL table
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> + Unpin {
    /// Table whose `id` is a `bigserial` (or identity) column owning a sequence
    const TABLE: &'static str;

    /// Every column except `id`, in `bind_columns` order
    const COLUMNS: &'static [&'static str];

    fn bind_columns<'q>(&self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self>;
}

/// `sqlx` store over the entity's table
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: PgEntity> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    // Upsert keyed by id: update never checks for existence first
    fn upsert_sql() -> String {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len() + 1).map(|i| format!("${}", i)).collect();
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect();
        format!(
            "INSERT INTO \"{}\" (id, {}) VALUES ({}) ON CONFLICT (id) DO UPDATE SET {} RETURNING *",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", "),
            assignments.join(", ")
        )
    }

    // Moves the id sequence past a caller-chosen id; never moves it back
    fn sync_sequence_sql() -> String {
        format!(
            "SELECT setval(seq, $1) FROM (SELECT pg_get_serial_sequence('\"{}\"', 'id')::regclass AS seq) s \
             WHERE $1 > COALESCE(pg_sequence_last_value(seq), 0)",
            T::TABLE
        )
    }

    fn select_sql(by_id: bool) -> String {
        if by_id {
            format!("SELECT * FROM \"{}\" WHERE id = $1", T::TABLE)
        } else {
            format!("SELECT * FROM \"{}\" ORDER BY id", T::TABLE)
        }
    }
}

#[async_trait]
impl<T: PgEntity> Store<T> for Repository<T> {
    async fn save(&self, record: T) -> Result<T, DatabaseError> {
        let saved = match record.id() {
            None => {
                let sql = Self::insert_sql();
                let query = sqlx::query_as::<_, T>(&sql);
                record.bind_columns(query).fetch_one(&self.pool).await?
            }
            Some(id) => {
                let mut tx = self.pool.begin().await?;
                let sql = Self::upsert_sql();
                let query = sqlx::query_as::<_, T>(&sql).bind(id);
                let saved = record.bind_columns(query).fetch_one(&mut *tx).await?;

                // Ids handed out by POST must never collide with this one
                sqlx::query(&Self::sync_sequence_sql())
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                saved
            }
        };
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        let sql = Self::select_sql(true);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = Self::select_sql(false);
        let rows: Vec<T> = sqlx::query_as::<_, T>(&sql)
            .fetch(&self.pool)
            .try_collect()
            .await?;
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", T::TABLE);
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Invoice, Passenger};

    #[test]
    fn insert_lists_columns_without_id() {
        assert_eq!(
            Repository::<Passenger>::insert_sql(),
            "INSERT INTO \"passenger\" (login, first_name, last_name, email) VALUES ($1, $2, $3, $4) RETURNING *"
        );
    }

    #[test]
    fn upsert_binds_id_first_and_overwrites_every_column() {
        let sql = Repository::<Invoice>::upsert_sql();
        assert!(sql.starts_with("INSERT INTO \"invoice\" (id, invoice_number, amount, passenger_id, booking_number, payment_id) VALUES ($1, $2, $3, $4, $5, $6)"));
        assert!(sql.contains("ON CONFLICT (id) DO UPDATE SET invoice_number = EXCLUDED.invoice_number"));
        assert!(sql.ends_with("payment_id = EXCLUDED.payment_id RETURNING *"));
    }

    #[test]
    fn explicit_id_advances_the_table_sequence() {
        let sql = Repository::<Invoice>::sync_sequence_sql();
        assert!(sql.starts_with("SELECT setval(seq, $1) FROM (SELECT pg_get_serial_sequence('\"invoice\"', 'id')::regclass AS seq)"));
        assert!(sql.ends_with("WHERE $1 > COALESCE(pg_sequence_last_value(seq), 0)"));
    }

    #[test]
    fn select_all_is_ordered_by_id() {
        assert_eq!(Repository::<Passenger>::select_sql(false), "SELECT * FROM \"passenger\" ORDER BY id");
        assert_eq!(Repository::<Passenger>::select_sql(true), "SELECT * FROM \"passenger\" WHERE id = $1");
    }
}
