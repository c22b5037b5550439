use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use coinpulse_core::articles::{ArticleRepositoryTrait, GeneratedArticle};
use coinpulse_core::Result;

use super::model::GeneratedArticleDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::generated_articles::dsl;
use crate::utils::{parse_timestamp, to_storage_string};

pub struct ArticleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ArticleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ArticleRepositoryTrait for ArticleRepository {
    async fn insert_article(&self, article: GeneratedArticle) -> Result<GeneratedArticle> {
        let row = GeneratedArticleDB::from(&article);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(dsl::generated_articles)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;

        Ok(article)
    }

    fn latest_article_created_at(&self) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<String> = dsl::generated_articles
            .select(diesel::dsl::max(dsl::created_at))
            .first(&mut conn)
            .map_err(StorageError::from)?;

        latest
            .map(|t| parse_timestamp("created_at", &t).map_err(Into::into))
            .transpose()
    }

    fn latest_article(&self) -> Result<Option<GeneratedArticle>> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::generated_articles
            .order((dsl::created_at.desc(), dsl::id.desc()))
            .select(GeneratedArticleDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(|r| GeneratedArticle::try_from(r).map_err(Into::into))
            .transpose()
    }

    fn article_for_bucket(&self, bucket: DateTime<Utc>) -> Result<Option<GeneratedArticle>> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::generated_articles
            .filter(dsl::created_at.ge(to_storage_string(bucket)))
            .filter(dsl::created_at.lt(to_storage_string(bucket + Duration::hours(1))))
            .order((dsl::created_at.desc(), dsl::id.desc()))
            .select(GeneratedArticleDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(|r| GeneratedArticle::try_from(r).map_err(Into::into))
            .transpose()
    }
}
