use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{NewUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

use super::{PostgresRepositories, map_sqlx_error};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, profile_picture, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    profile_picture: Option<String>,
    created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_picture: row.profile_picture,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn insert_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "INSERT INTO users (username, email, first_name, last_name, profile_picture) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );

        let row = query_as::<_, UserRow>(&sql)
            .bind(&params.username)
            .bind(&params.email)
            .bind(&params.first_name)
            .bind(&params.last_name)
            .bind(&params.profile_picture)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }
}
