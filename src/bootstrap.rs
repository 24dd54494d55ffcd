use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::employee::ContractType;
use crate::model::profile::Profile;
use anyhow::{Context, Result, anyhow};
use sqlx::MySqlPool;

const ROOT_SERVICE_CODE: &str = "DG001";
const ADMIN_EMPLOYEE_NUMBER: &str = "ADM001";

/// Seeds the first administrator on an empty database so the API can be
/// used at all. Does nothing once any account exists or when no admin
/// credentials are configured.
pub async fn initialize_admin(pool: &MySqlPool, config: &Config) -> Result<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        tracing::debug!("No admin credentials configured, skipping bootstrap");
        return Ok(());
    };

    let (accounts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await
        .context("Failed to count accounts")?;

    if accounts > 0 {
        tracing::info!("Accounts already exist, skipping admin bootstrap");
        return Ok(());
    }

    tracing::info!(username = %username, "Creating initial administrator");

    let password_hash =
        hash_password(password).map_err(|e| anyhow!("Failed to hash admin password: {e}"))?;

    let mut tx = pool.begin().await?;

    let service_id = match sqlx::query_as::<_, (u64,)>("SELECT id FROM services WHERE service_code = ?")
        .bind(ROOT_SERVICE_CODE)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some((id,)) => id,
        None => sqlx::query(
            "INSERT INTO services (service_code, service_name, description) VALUES (?, ?, ?)",
        )
        .bind(ROOT_SERVICE_CODE)
        .bind("Direction Générale")
        .bind("Root service created at bootstrap")
        .execute(&mut *tx)
        .await?
        .last_insert_id(),
    };

    let employee_id = sqlx::query(
        r#"
        INSERT INTO employees (employee_number, last_name, first_name, service_id, contract_type, position)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(ADMIN_EMPLOYEE_NUMBER)
    .bind("Administrator")
    .bind("System")
    .bind(service_id)
    .bind(ContractType::Cdi.as_ref())
    .bind("Administrator")
    .execute(&mut *tx)
    .await
    .context("Failed to create administrator employee")?
    .last_insert_id();

    sqlx::query("INSERT INTO accounts (employee_id, username, password, profile) VALUES (?, ?, ?, ?)")
        .bind(employee_id)
        .bind(username)
        .bind(password_hash)
        .bind(Profile::Administrator.as_ref())
        .execute(&mut *tx)
        .await
        .context("Failed to create administrator account")?;

    tx.commit().await?;

    tracing::info!(username = %username, employee_id, "Initial administrator created");
    Ok(())
}
