//! Database operations for `merchants`.

use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Insert `name` if no merchant with the same case-insensitive name exists,
/// then return the id of the stored merchant.
///
/// The first spelling seen is the one kept.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn upsert_merchant(conn: &mut PgConnection, name: &str) -> Result<i64, DbError> {
    sqlx::query("INSERT INTO merchants (name) VALUES ($1) ON CONFLICT (LOWER(name)) DO NOTHING")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM merchants WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// All merchant names, alphabetically.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_merchant_names(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM merchants ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(names)
}
