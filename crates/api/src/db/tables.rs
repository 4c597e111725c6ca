//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    Name,
    CreatedAt,
}

#[derive(Iden)]
pub enum Flashcards {
    Table,
    Id,
    UserId,
    Front,
    Back,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}
