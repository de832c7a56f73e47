use sqlx::migrate::{Migrate, Migrator};
use sqlx::PgPool;
use uuid::Uuid;

use skillswap_common::AppError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_all_migrations(&self) -> Result<(), AppError> {
        tracing::info!("Starting database migrations...");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.into()))?;

        tracing::info!("All migrations completed successfully");
        Ok(())
    }

    pub async fn check_migration_status(&self) -> Result<MigrationStatus, AppError> {
        let mut conn = self.pool.acquire().await?;
        conn.ensure_migrations_table()
            .await
            .map_err(|e| AppError::Database(e.into()))?;
        let applied = conn
            .list_applied_migrations()
            .await
            .map_err(|e| AppError::Database(e.into()))?;

        let total_migrations = MIGRATOR.iter().count();
        let applied_count = applied.len();
        let pending_count = total_migrations.saturating_sub(applied_count);

        Ok(MigrationStatus {
            total: total_migrations,
            applied: applied_count,
            pending: pending_count,
            is_up_to_date: pending_count == 0,
        })
    }

    /// Creates the administrator account, or promotes the existing account
    /// with that email. Returns the admin's id.
    pub async fn seed_admin(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<Uuid, AppError> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(id) = existing {
            sqlx::query(
                "UPDATE users SET is_admin = TRUE, is_banned = FALSE, updated_at = now() WHERE id = $1",
            )
            .bind(id)
            .execute(&self.pool)
            .await?;

            tracing::info!(user_id = %id, "Existing user promoted to administrator");
            return Ok(id);
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, is_admin)
            VALUES ($1, $2, $3, $4, TRUE)
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %id, "Admin user created");
        Ok(id)
    }
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
    pub pending: usize,
    pub is_up_to_date: bool,
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Migrations: {}/{} applied, {} pending",
            self.applied, self.total, self.pending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_status_display() {
        let status = MigrationStatus {
            total: 1,
            applied: 0,
            pending: 1,
            is_up_to_date: false,
        };
        assert_eq!(status.to_string(), "Migrations: 0/1 applied, 1 pending");
    }

    #[test]
    fn test_embedded_migrations_present() {
        assert!(MIGRATOR.iter().count() >= 1);
    }
}
