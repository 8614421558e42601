//! # User Repository
//!
//! Staff accounts. Passwords arrive already hashed; this module never sees
//! plain text.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use sonho_core::{Role, UserProfile};

use crate::error::{DbError, DbResult};

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Already normalized (trimmed, lowercase).
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password_hash: String,
}

/// A profile together with its password hash, for sign-in only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub profile: UserProfile,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account. `UniqueViolation` on a taken email.
    pub async fn insert(&self, user: &NewUser) -> DbResult<UserProfile> {
        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            created_at: Utc::now(),
        };

        debug!(id = %profile.id, role = %profile.role, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, role, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role)
        .bind(&user.password_hash)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &user.email),
            other => other,
        })?;

        Ok(profile)
    }

    pub async fn find_credentials_by_email(&self, email: &str) -> DbResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, email, full_name, role, created_at, password_hash
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, full_name, role, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Maria Silva".to_string(),
            role,
            password_hash: "$argon2id$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let created = users.insert(&new_user("maria@sonhodoce.com", Role::Gerente)).await.unwrap();

        let found = users
            .find_credentials_by_email("  MARIA@sonhodoce.com ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.profile.id, created.id);
        assert_eq!(found.profile.role, Role::Gerente);
        assert_eq!(found.password_hash, "$argon2id$fake");

        let by_id = users.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "maria@sonhodoce.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users.insert(&new_user("joao@sonhodoce.com", Role::Atendente)).await.unwrap();
        let err = users
            .insert(&new_user("joao@sonhodoce.com", Role::Padeiro))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }
}
