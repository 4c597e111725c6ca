//! Account lookup and first-sign-in provisioning.

use rusqlite::Row;

use flashme_api::db::users;
use flashme_api::{Account, AuthError, ServiceError, service};

use crate::storage::{Db, sq_execute, sq_query_opt};

/// Persistence contract the sign-in and session code rely on.
pub trait AccountStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Account>, ServiceError>;

    /// Insert a new account. A duplicate email is an error, not a lookup.
    fn create(&self, email: &str, name: &str) -> Result<Account, ServiceError>;
}

pub(crate) fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl AccountStore for Db {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        let conn = self.conn();
        sq_query_opt(&conn, users::get_by_email(email), account_from_row)
            .map_err(ServiceError::from_db("find account by email"))
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Account>, ServiceError> {
        let conn = self.conn();
        sq_query_opt(&conn, users::get_by_id(id), account_from_row)
            .map_err(ServiceError::from_db("find account by id"))
    }

    fn create(&self, email: &str, name: &str) -> Result<Account, ServiceError> {
        let account = Account {
            id: service::new_id(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let conn = self.conn();
        sq_execute(
            &conn,
            users::insert(&account.id, &account.email, &account.name, &account.created_at),
        )
        .map_err(ServiceError::from_db("insert account"))?;
        Ok(account)
    }
}

/// Find the account owning `email`, creating it on first sign-in.
///
/// Returns the account and whether it was just created. A concurrent sign-in
/// for the same email loses on the unique constraint and reports `Internal`.
pub fn resolve_account(
    store: &impl AccountStore,
    email: &str,
    display_name: &str,
) -> Result<(Account, bool), AuthError> {
    let email = service::normalize_email(email);

    if let Some(account) = store.find_by_email(&email).inspect_err(|e| {
        tracing::error!("account lookup failed: {e}");
    })? {
        return Ok((account, false));
    }

    let account = store.create(&email, display_name).inspect_err(|e| {
        tracing::error!("account creation failed: {e}");
    })?;
    tracing::info!(account_id = %account.id, "provisioned account on first sign-in");
    Ok((account, true))
}
