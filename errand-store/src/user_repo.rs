use async_trait::async_trait;
use errand_core::{RepoResult, UserRepository};
use errand_shared::{User, UserId};
use sqlx::PgPool;

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn query_user_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| User::new(r.id, r.username)))
    }
}
