use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Location, LookupEntry};

/// Connectivity check.
pub async fn ping(pool: &PgPool) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await
}

/// Most recent lookup for an exact raw input, with its location joined in.
pub async fn find_latest_lookup(
    pool: &PgPool,
    user_input: &str,
) -> Result<Option<LookupEntry>, sqlx::Error> {
    sqlx::query_as::<_, LookupEntry>(
        "SELECT lk.user_input, lk.looked_up_at,
                loc.zmw, loc.name, loc.url, loc.cache, loc.last_updated
         FROM lookups lk
         JOIN locations loc ON loc.zmw = lk.location_zmw
         WHERE lk.user_input = $1
         ORDER BY lk.looked_up_at DESC
         LIMIT 1",
    )
    .bind(user_input)
    .fetch_optional(pool)
    .await
}

/// Stored location by its provider id.
pub async fn find_location(pool: &PgPool, zmw: &str) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "SELECT zmw, name, url, cache, last_updated FROM locations WHERE zmw = $1",
    )
    .bind(zmw)
    .fetch_optional(pool)
    .await
}

/// Insert a location or overwrite the stored copy with the same `zmw`.
///
/// Concurrent writers for one `zmw` converge on a single row; the last
/// writer's payload wins. A missing `last_updated` never clears a stored one.
pub async fn upsert_location(pool: &PgPool, location: &Location) -> Result<Location, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "INSERT INTO locations (zmw, name, url, cache, last_updated, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
         ON CONFLICT (zmw) DO UPDATE SET
            name = EXCLUDED.name,
            url = EXCLUDED.url,
            cache = EXCLUDED.cache,
            last_updated = COALESCE(EXCLUDED.last_updated, locations.last_updated),
            updated_at = NOW()
         RETURNING zmw, name, url, cache, last_updated",
    )
    .bind(&location.zmw)
    .bind(&location.name)
    .bind(&location.url)
    .bind(&location.cache)
    .bind(location.last_updated)
    .fetch_one(pool)
    .await
}

/// Append a lookup history row (append-only).
pub async fn insert_lookup(
    pool: &PgPool,
    user_input: &str,
    zmw: &str,
    looked_up_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO lookups (id, user_input, location_zmw, looked_up_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(user_input)
    .bind(zmw)
    .bind(looked_up_at)
    .execute(pool)
    .await?;
    Ok(())
}
