use sqlx::PgPool;
use tower_sessions::Session;
use uuid::Uuid;

use super::session::SESSION_KEY_ACCOUNT_ID;
use crate::error::AppError;
use crate::models::account::{Account, AccountRole};

/// Authorization failures, mapped onto the crate error taxonomy.
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    Forbidden(&'static str),
    Session,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => AppError::Unauthorized,
            AuthError::Forbidden(msg) => AppError::Forbidden(msg.to_string()),
            AuthError::Session => AppError::Internal(anyhow::anyhow!("session store error")),
        }
    }
}

/// Resolves the session to its account row. Identity issuance is external;
/// this backend only reads the account id the login service stored in the
/// session.
pub async fn current_account(session: &Session, pool: &PgPool) -> Result<Account, AuthError> {
    let account_id: Uuid = session
        .get(SESSION_KEY_ACCOUNT_ID)
        .await
        .map_err(|_| AuthError::Session)?
        .ok_or(AuthError::Unauthorized)?;

    Account::find_by_id(pool, account_id)
        .await
        .map_err(|_| AuthError::Session)?
        .ok_or(AuthError::Unauthorized)
}

pub async fn require_admin(session: &Session, pool: &PgPool) -> Result<Account, AuthError> {
    let account = current_account(session, pool).await?;
    if account.role != AccountRole::Admin {
        return Err(AuthError::Forbidden("Admin access required"));
    }
    Ok(account)
}

/// Vendor-role account together with the vendor it manages.
pub async fn require_vendor(
    session: &Session,
    pool: &PgPool,
) -> Result<(Account, Uuid), AuthError> {
    let account = current_account(session, pool).await?;
    if account.role != AccountRole::Vendor {
        return Err(AuthError::Forbidden("Vendor access required"));
    }
    let vendor_id = account
        .vendor_id
        .ok_or(AuthError::Forbidden("No vendor linked to this account"))?;
    Ok((account, vendor_id))
}

/// Admin, or the vendor account managing `vendor_id`.
pub async fn require_vendor_or_admin(
    session: &Session,
    pool: &PgPool,
    vendor_id: Uuid,
) -> Result<Account, AuthError> {
    let account = current_account(session, pool).await?;
    match account.role {
        AccountRole::Admin => Ok(account),
        AccountRole::Vendor if account.vendor_id == Some(vendor_id) => Ok(account),
        _ => Err(AuthError::Forbidden(
            "You do not manage this vendor listing",
        )),
    }
}
