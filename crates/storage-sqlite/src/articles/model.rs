use diesel::prelude::*;

use coinpulse_core::articles::GeneratedArticle;

use crate::errors::StorageError;
use crate::utils::{parse_timestamp, to_storage_string};

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::generated_articles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GeneratedArticleDB {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&GeneratedArticle> for GeneratedArticleDB {
    fn from(a: &GeneratedArticle) -> Self {
        Self {
            id: a.id.clone(),
            content: a.content.clone(),
            created_at: to_storage_string(a.created_at),
            updated_at: to_storage_string(a.updated_at),
        }
    }
}

impl TryFrom<GeneratedArticleDB> for GeneratedArticle {
    type Error = StorageError;

    fn try_from(db: GeneratedArticleDB) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp("created_at", &db.created_at)?,
            updated_at: parse_timestamp("updated_at", &db.updated_at)?,
            id: db.id,
            content: db.content,
        })
    }
}
