//! Account query builders.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Users;

/// Column order every account select returns: id, email, name, created_at.
const ACCOUNT_COLUMNS: [Users; 4] = [Users::Id, Users::Email, Users::Name, Users::CreatedAt];

/// Find account by id.
pub fn get_by_id(user_id: &str) -> Built {
    Query::select()
        .columns(ACCOUNT_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Find account by (already normalized) email.
pub fn get_by_email(email: &str) -> Built {
    Query::select()
        .columns(ACCOUNT_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Insert a new account.
pub fn insert(id: &str, email: &str, name: &str, created_at: &str) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([Users::Id, Users::Email, Users::Name, Users::CreatedAt])
        .values_panic([id.into(), email.into(), name.into(), created_at.into()])
        .build(SqliteQueryBuilder)
}

/// Delete an account (its flashcards cascade).
pub fn delete(user_id: &str) -> Built {
    Query::delete()
        .from_table(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}
