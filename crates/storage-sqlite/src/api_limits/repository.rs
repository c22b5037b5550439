use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use coinpulse_core::limits::{ApiLimitCounter, ApiLimitRepositoryTrait};
use coinpulse_core::Result;

use super::model::ApiLimitDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::api_limits::dsl;
use crate::utils::to_storage_string;

// Insert, reset or increment in one statement. The fourth and fifth binds
// are both the window cutoff; a row last reset before it starts a new window.
const RECORD_REQUEST_SQL: &str = "
    INSERT INTO api_limits (api_name, daily_limit, request_count, last_reset)
    VALUES (?, ?, 1, ?)
    ON CONFLICT(api_name) DO UPDATE SET
        request_count = CASE WHEN api_limits.last_reset < ?
            THEN 1 ELSE api_limits.request_count + 1 END,
        last_reset = CASE WHEN api_limits.last_reset < ?
            THEN excluded.last_reset ELSE api_limits.last_reset END
    RETURNING api_name, daily_limit, request_count, last_reset";

const SET_LIMIT_SQL: &str = "
    INSERT INTO api_limits (api_name, daily_limit, request_count, last_reset)
    VALUES (?, ?, 0, ?)
    ON CONFLICT(api_name) DO UPDATE SET daily_limit = excluded.daily_limit
    RETURNING api_name, daily_limit, request_count, last_reset";

pub struct ApiLimitRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ApiLimitRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ApiLimitRepositoryTrait for ApiLimitRepository {
    async fn record_request(
        &self,
        api_name: &str,
        default_limit: i32,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<ApiLimitCounter> {
        let api_name = api_name.to_string();
        let now_text = to_storage_string(now);
        let cutoff = to_storage_string(now - window);

        let row = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ApiLimitDB> {
                let row = sql_query(RECORD_REQUEST_SQL)
                    .bind::<Text, _>(api_name)
                    .bind::<Integer, _>(default_limit)
                    .bind::<Text, _>(now_text)
                    .bind::<Text, _>(cutoff.clone())
                    .bind::<Text, _>(cutoff)
                    .get_result::<ApiLimitDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(row)
            })
            .await?;

        Ok(ApiLimitCounter::try_from(row)?)
    }

    fn get_counter(&self, api_name: &str) -> Result<Option<ApiLimitCounter>> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::api_limits
            .find(api_name)
            .select(ApiLimitDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(|r| ApiLimitCounter::try_from(r).map_err(Into::into))
            .transpose()
    }

    async fn set_daily_limit(
        &self,
        api_name: &str,
        daily_limit: i32,
        now: DateTime<Utc>,
    ) -> Result<ApiLimitCounter> {
        let api_name = api_name.to_string();
        let now_text = to_storage_string(now);

        let row = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ApiLimitDB> {
                let row = sql_query(SET_LIMIT_SQL)
                    .bind::<Text, _>(api_name)
                    .bind::<Integer, _>(daily_limit)
                    .bind::<Text, _>(now_text)
                    .get_result::<ApiLimitDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(row)
            })
            .await?;

        Ok(ApiLimitCounter::try_from(row)?)
    }
}
