/// Postgres-backed account repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AccountRepository;
use crate::domain::Account;
use crate::error::AppError;

type AccountRow = (Uuid, String, String, String, String, String, DateTime<Utc>);

fn into_account(row: AccountRow) -> Account {
    let (id, email, password, name, image_url, website, created_at) = row;
    Account {
        id,
        email,
        password,
        name,
        image_url,
        website,
        created_at: Some(created_at),
    }
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, password, name, image_url, website, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("account with id {}", id)))?;

        Ok(into_account(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, password, name, image_url, website, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("account with email {}", email)))?;

        Ok(into_account(row))
    }

    async fn create(&self, mut account: Account) -> Result<Account, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password, name, image_url, website, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&account.email)
        .bind(&account.password)
        .bind(&account.name)
        .bind(&account.image_url)
        .bind(&account.website)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(account_id = %id, "Account created");

        account.id = id;
        account.created_at = Some(now);
        Ok(account)
    }
}
