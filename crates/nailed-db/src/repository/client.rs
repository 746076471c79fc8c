//! # Client Repository
//!
//! Customers sales are issued to. Keyed by their national document number.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use nailed_core::validation::clean_optional;
use nailed_core::{Client, ClientInput};

const CLIENT_SELECT: &str = r#"
    SELECT id, document_number, full_name, email, phone, status, created_at, updated_at
    FROM clients
"#;

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists clients ordered by full name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let sql = format!("{CLIENT_SELECT} ORDER BY full_name");
        let clients = sqlx::query_as::<_, Client>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    pub async fn get(&self, id: &str) -> DbResult<Client> {
        let sql = format!("{CLIENT_SELECT} WHERE id = ?1");
        sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Looks a client up by document number, as the sale form does before
    /// offering to register a new one.
    pub async fn find_by_document_number(&self, document_number: &str) -> DbResult<Option<Client>> {
        let sql = format!("{CLIENT_SELECT} WHERE document_number = ?1");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(document_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    pub async fn create(&self, input: &ClientInput) -> DbResult<Client> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let document_number = input.document_number.trim();
        debug!(document_number = %document_number, "Creating client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, document_number, full_name, email, phone, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(document_number)
        .bind(input.full_name.trim())
        .bind(clean_optional(&input.email))
        .bind(clean_optional(&input.phone))
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(document_number))?;

        self.get(&id).await
    }

    pub async fn update(&self, id: &str, input: &ClientInput) -> DbResult<Client> {
        input.validate()?;

        let document_number = input.document_number.trim();
        debug!(id = %id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                document_number = ?2,
                full_name = ?3,
                email = ?4,
                phone = ?5,
                status = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(document_number)
        .bind(input.full_name.trim())
        .bind(clean_optional(&input.email))
        .bind(clean_optional(&input.phone))
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(document_number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        self.get(id).await
    }

    pub async fn set_status(&self, id: &str, status: bool) -> DbResult<()> {
        debug!(id = %id, status, "Setting client status");

        let result = sqlx::query("UPDATE clients SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE status = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn input(document: &str, name: &str) -> ClientInput {
        ClientInput {
            document_number: document.to_string(),
            full_name: name.to_string(),
            email: Some("  ".to_string()),
            phone: Some(" 555-0101 ".to_string()),
            status: true,
        }
    }

    #[tokio::test]
    async fn test_create_trims_optional_fields() {
        let db = memory_db().await;
        let client = db.clients().create(&input("C-1", "Luis Perez")).await.unwrap();

        assert_eq!(client.email, None);
        assert_eq!(client.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn test_find_by_document_number() {
        let db = memory_db().await;
        db.clients().create(&input("C-1", "Luis Perez")).await.unwrap();

        let found = db.clients().find_by_document_number(" C-1 ").await.unwrap();
        assert_eq!(found.map(|c| c.full_name).as_deref(), Some("Luis Perez"));
        assert!(db
            .clients()
            .find_by_document_number("C-2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_document_number() {
        let db = memory_db().await;
        db.clients().create(&input("C-1", "Luis Perez")).await.unwrap();

        let err = db.clients().create(&input("C-1", "Other")).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_list_ordered_and_disable() {
        let db = memory_db().await;
        let zoe = db.clients().create(&input("C-1", "Zoe")).await.unwrap();
        db.clients().create(&input("C-2", "Ana")).await.unwrap();

        let names: Vec<String> = db
            .clients()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.full_name)
            .collect();
        assert_eq!(names, vec!["Ana", "Zoe"]);

        db.clients().set_status(&zoe.id, false).await.unwrap();
        assert_eq!(db.clients().count_active().await.unwrap(), 1);
    }
}
