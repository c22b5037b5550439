use diesel::prelude::*;

use coinpulse_core::limits::ApiLimitCounter;

use crate::errors::StorageError;
use crate::utils::parse_timestamp;

#[derive(Queryable, QueryableByName, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::api_limits)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ApiLimitDB {
    pub api_name: String,
    pub daily_limit: i32,
    pub request_count: i32,
    pub last_reset: String,
}

impl TryFrom<ApiLimitDB> for ApiLimitCounter {
    type Error = StorageError;

    fn try_from(db: ApiLimitDB) -> Result<Self, Self::Error> {
        Ok(Self {
            last_reset: parse_timestamp("last_reset", &db.last_reset)?,
            api_name: db.api_name,
            daily_limit: db.daily_limit,
            request_count: db.request_count,
        })
    }
}
