//! Database operations for external integrations
//!
//! One row per (user, provider) pair holding the OAuth tokens the Drive
//! client authenticates with.

use super::models::ExternalIntegration;
use super::DbPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const INTEGRATION_COLUMNS: &str = "id, user_id, provider, access_token, refresh_token, \
     token_expiry, provider_user_id, provider_email, created_at, updated_at";

/// Get the integration for a user and provider, if linked
pub async fn get_by_user_and_provider(
    pool: &DbPool,
    user_id: Uuid,
    provider: &str,
) -> anyhow::Result<Option<ExternalIntegration>> {
    let integration = sqlx::query_as::<_, ExternalIntegration>(&format!(
        r#"
        SELECT {INTEGRATION_COLUMNS}
        FROM external_integrations
        WHERE user_id = $1 AND provider = $2
        "#,
    ))
    .bind(user_id)
    .bind(provider)
    .fetch_optional(pool)
    .await?;

    Ok(integration)
}

/// Create or update the integration row for (user, provider).
/// A re-link after token revocation replaces the stored tokens; the refresh
/// token is kept when the provider does not send a new one.
pub async fn upsert(
    pool: &DbPool,
    user_id: Uuid,
    provider: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    token_expiry: Option<DateTime<Utc>>,
    provider_user_id: Option<&str>,
    provider_email: Option<&str>,
) -> anyhow::Result<ExternalIntegration> {
    let integration = sqlx::query_as::<_, ExternalIntegration>(&format!(
        r#"
        INSERT INTO external_integrations
            (user_id, provider, access_token, refresh_token, token_expiry, provider_user_id, provider_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, provider) DO UPDATE SET
            access_token = EXCLUDED.access_token,
            refresh_token = COALESCE(EXCLUDED.refresh_token, external_integrations.refresh_token),
            token_expiry = EXCLUDED.token_expiry,
            provider_user_id = EXCLUDED.provider_user_id,
            provider_email = EXCLUDED.provider_email,
            updated_at = NOW()
        RETURNING {INTEGRATION_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(provider)
    .bind(access_token)
    .bind(refresh_token)
    .bind(token_expiry)
    .bind(provider_user_id)
    .bind(provider_email)
    .fetch_one(pool)
    .await?;

    Ok(integration)
}

/// Store a refreshed access token and its new expiry
pub async fn update_access_token(
    pool: &DbPool,
    id: Uuid,
    access_token: &str,
    token_expiry: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE external_integrations
        SET access_token = $2, token_expiry = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(access_token)
    .bind(token_expiry)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the integration for a user and provider
pub async fn delete_by_user_and_provider(
    pool: &DbPool,
    user_id: Uuid,
    provider: &str,
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM external_integrations WHERE user_id = $1 AND provider = $2")
        .bind(user_id)
        .bind(provider)
        .execute(pool)
        .await?;

    Ok(())
}
