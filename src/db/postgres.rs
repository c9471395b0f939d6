use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{ListOp, Movie, MovieId, UserDocument, UserPatch, WatchList},
    services::store::UserStore,
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: String,
    username: String,
    profile_picture: String,
    my_list: Json<Vec<Movie>>,
}

impl From<UserRow> for UserDocument {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            user_id: row.user_id,
            profile_picture: row.profile_picture,
            my_list: WatchList::from(row.my_list.0),
        }
    }
}

/// User documents in the `users` table
///
/// `my_list` is a JSONB array. Union and remove each run as one UPDATE keyed
/// on the entries' `id`, so concurrent mutations commute.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn union_movie(&self, user_id: &str, movie: &Movie) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET my_list = CASE
                    WHEN EXISTS (
                        SELECT 1 FROM jsonb_array_elements(my_list) AS entry
                        WHERE entry->'id' = $2::jsonb->'id'
                    ) THEN my_list
                    ELSE my_list || jsonb_build_array($2::jsonb)
                END,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(Json(movie))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Ids are compared as JSON numbers, so the full `u64` range works
    async fn remove_movies(&self, user_id: &str, ids: &[MovieId]) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET my_list = COALESCE(
                    (
                        SELECT jsonb_agg(entry ORDER BY position)
                        FROM jsonb_array_elements(my_list) WITH ORDINALITY AS t(entry, position)
                        WHERE NOT ($2::jsonb @> jsonb_build_array(entry->'id'))
                    ),
                    '[]'::jsonb
                ),
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(Json(ids))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        username: Option<&str>,
        profile_picture: Option<&str>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                profile_picture = COALESCE($3, profile_picture),
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(profile_picture)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    async fn get_document(&self, user_id: &str) -> AppResult<Option<UserDocument>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, profile_picture, my_list
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserDocument::from))
    }

    async fn set_document(&self, user_id: &str, document: &UserDocument) -> AppResult<()> {
        let movies: Vec<&Movie> = document.my_list.iter().collect();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, profile_picture, my_list)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET username = EXCLUDED.username,
                profile_picture = EXCLUDED.profile_picture,
                my_list = EXCLUDED.my_list,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(&document.username)
        .bind(&document.profile_picture)
        .bind(Json(movies))
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, "User document written");
        Ok(())
    }

    async fn update_fields(&self, user_id: &str, patch: UserPatch) -> AppResult<()> {
        let mut touched = 0;

        if patch.username.is_some() || patch.profile_picture.is_some() {
            touched += self
                .update_profile(
                    user_id,
                    patch.username.as_deref(),
                    patch.profile_picture.as_deref(),
                )
                .await?;
        }

        match &patch.my_list {
            Some(ListOp::Union(movies)) => {
                for movie in movies {
                    touched += self.union_movie(user_id, movie).await?;
                }
            }
            Some(ListOp::Remove(ids)) => {
                touched += self.remove_movies(user_id, ids).await?;
            }
            None => {}
        }

        if touched == 0 {
            return Err(AppError::NotFound(format!("User document {}", user_id)));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
