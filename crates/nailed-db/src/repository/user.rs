//! # User Repository
//!
//! Application users and their credentials.
//!
//! ## Credential Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Password Lifecycle                                   │
//! │                                                                         │
//! │  create / update(password)                                             │
//! │       │  argon2id + random salt (PHC string)                           │
//! │       ▼                                                                 │
//! │  users.password_hash ── never selected into `User`                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  authenticate(email, password) → Option<User>                          │
//! │                                                                         │
//! │  forgot password:  set_reset_token(email) → token (1 h)                │
//! │  reset password:   reset_password(token, new) → rehash, clear token    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use nailed_core::validation::{clean_optional, validate_password};
use nailed_core::{User, UserInput};

const USER_SELECT: &str = r#"
    SELECT id, document_number, full_name, email, role, status, created_at, updated_at
    FROM users
"#;

/// A user together with the stored password hash. Only used for login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
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

    /// Lists users ordered by full name. Hashes are never included.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("{USER_SELECT} ORDER BY full_name");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get(&self, id: &str) -> DbResult<User> {
        let sql = format!("{USER_SELECT} WHERE id = ?1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Looks a user up by email (case-insensitive) with the stored hash.
    pub async fn find_credentials_by_email(&self, email: &str) -> DbResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, document_number, full_name, email, role, status,
                   created_at, updated_at, password_hash
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }

    /// Checks an email/password pair.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - Password matches. The caller still checks `status`.
    /// * `Ok(None)` - Unknown email or wrong password
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let Some(credentials) = self.find_credentials_by_email(email).await? else {
            debug!("Login for unknown email");
            return Ok(None);
        };

        if verify_password(password, &credentials.password_hash) {
            Ok(Some(credentials.user))
        } else {
            warn!(user_id = %credentials.user.id, "Password mismatch");
            Ok(None)
        }
    }

    /// Creates a user, hashing the password with argon2.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email or document number taken
    pub async fn create(&self, input: &UserInput) -> DbResult<User> {
        input.validate(true)?;
        let password = clean_optional(&input.password).unwrap_or_default();
        let hash = hash_password(&password)?;

        let id = Uuid::new_v4().to_string();
        let email = input.email.trim();
        debug!(email = %email, role = input.role.as_str(), "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, document_number, full_name, email, password_hash, role, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&id)
        .bind(input.document_number.trim())
        .bind(input.full_name.trim())
        .bind(email)
        .bind(&hash)
        .bind(input.role)
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(email))?;

        self.get(&id).await
    }

    /// Updates a user. The password is only replaced when one is given.
    pub async fn update(&self, id: &str, input: &UserInput) -> DbResult<User> {
        input.validate(false)?;
        let email = input.email.trim();
        let new_hash = match clean_optional(&input.password) {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        debug!(id = %id, rehash = new_hash.is_some(), "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                document_number = ?2,
                full_name = ?3,
                email = ?4,
                role = ?5,
                status = ?6,
                password_hash = COALESCE(?7, password_hash),
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.document_number.trim())
        .bind(input.full_name.trim())
        .bind(email)
        .bind(input.role)
        .bind(input.status)
        .bind(new_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        self.get(id).await
    }

    pub async fn set_status(&self, id: &str, status: bool) -> DbResult<()> {
        debug!(id = %id, status, "Setting user status");

        let result = sqlx::query("UPDATE users SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Stores a fresh reset token for an active user.
    ///
    /// ## Returns
    /// * `Ok(Some(token))` - Token stored, valid until `expires_at`
    /// * `Ok(None)` - No active user with that email
    pub async fn set_reset_token(
        &self,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<Option<String>> {
        let token = generate_reset_token();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                reset_token = ?2,
                reset_token_expires_at = ?3,
                updated_at = ?4
            WHERE email = ?1 AND status = 1
            "#,
        )
        .bind(email.trim())
        .bind(&token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!("Password reset token issued");
        Ok(Some(token))
    }

    /// Replaces the password of the user holding `token` and clears it.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Token unknown or expired
    pub async fn reset_password(&self, token: &str, new_password: &str) -> DbResult<()> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = ?2,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = ?3
            WHERE reset_token = ?1 AND reset_token_expires_at > ?3
            "#,
        )
        .bind(token)
        .bind(&hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!("Password reset with unknown or expired token");
            return Err(DbError::not_found("Reset token", "invalid or expired"));
        }
        info!("Password reset completed");
        Ok(())
    }
}

/// Hashes a password for storage as a PHC string.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Length of a reset token in bytes before hex encoding.
const RESET_TOKEN_BYTES: usize = 32;

/// 64 lowercase hex characters from the OS random source.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use chrono::Duration;
    use nailed_core::Role;

    fn input(email: &str, password: Option<&str>) -> UserInput {
        UserInput {
            document_number: "V-1".to_string(),
            full_name: "Ana Ruiz".to_string(),
            email: email.to_string(),
            password: password.map(str::to_string),
            role: Role::Operator,
            status: true,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
        assert!(!verify_password("correct-horse", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = memory_db().await;
        let user = db
            .users()
            .create(&input("ana@example.com", Some("correct-horse")))
            .await
            .unwrap();

        let ok = db
            .users()
            .authenticate("ANA@example.com", "correct-horse")
            .await
            .unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(db
            .users()
            .authenticate("ana@example.com", "wrong-horse")
            .await
            .unwrap()
            .is_none());
        assert!(db
            .users()
            .authenticate("nobody@example.com", "correct-horse")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_requires_password() {
        let db = memory_db().await;
        let err = db
            .users()
            .create(&input("ana@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_absent() {
        let db = memory_db().await;
        let user = db
            .users()
            .create(&input("ana@example.com", Some("correct-horse")))
            .await
            .unwrap();

        let mut change = input("ana@example.com", None);
        change.role = Role::Admin;
        let updated = db.users().update(&user.id, &change).await.unwrap();
        assert_eq!(updated.role, Role::Admin);

        assert!(db
            .users()
            .authenticate("ana@example.com", "correct-horse")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_ignoring_case() {
        let db = memory_db().await;
        db.users()
            .create(&input("ana@example.com", Some("correct-horse")))
            .await
            .unwrap();

        let mut other = input("Ana@Example.com", Some("correct-horse"));
        other.document_number = "V-2".to_string();
        let err = db.users().create(&other).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let db = memory_db().await;
        db.users()
            .create(&input("ana@example.com", Some("correct-horse")))
            .await
            .unwrap();

        let token = db
            .users()
            .set_reset_token("ana@example.com", Utc::now() + Duration::hours(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.len(), 64);

        db.users()
            .reset_password(&token, "battery-staple")
            .await
            .unwrap();
        assert!(db
            .users()
            .authenticate("ana@example.com", "battery-staple")
            .await
            .unwrap()
            .is_some());

        // Tokens are single use.
        let err = db
            .users()
            .reset_password(&token, "another-pass")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_expired_reset_token_rejected() {
        let db = memory_db().await;
        db.users()
            .create(&input("ana@example.com", Some("correct-horse")))
            .await
            .unwrap();

        let token = db
            .users()
            .set_reset_token("ana@example.com", Utc::now() - Duration::minutes(1))
            .await
            .unwrap()
            .unwrap();

        let err = db
            .users()
            .reset_password(&token, "battery-staple")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reset_token_for_unknown_email() {
        let db = memory_db().await;
        let token = db
            .users()
            .set_reset_token("nobody@example.com", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert!(token.is_none());
    }

    #[test]
    fn test_reset_token_shape() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }
}
