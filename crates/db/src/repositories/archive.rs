//! Leave archive queries.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;

use leavedesk_shared::types::OrganizationId;

use crate::entities::{leave_archives, users};

/// An archive row with its user.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    /// The archive row.
    #[serde(flatten)]
    pub archive: leave_archives::Model,
    /// User's name.
    pub full_name: Option<String>,
    /// User's email.
    pub email: Option<String>,
}

/// Escapes `LIKE` wildcards in user input.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

/// Leave archive repository.
#[derive(Debug, Clone)]
pub struct ArchiveRepository {
    db: DatabaseConnection,
}

impl ArchiveRepository {
    /// Creates a new archive repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Archive rows of an organization and year, optionally filtered by a
    /// case-insensitive match on the user's name or email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        year: i32,
        search: Option<&str>,
    ) -> Result<Vec<ArchiveEntry>, DbErr> {
        let mut query = leave_archives::Entity::find()
            .filter(leave_archives::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(leave_archives::Column::Year.eq(year))
            .find_also_related(users::Entity);

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((users::Entity, users::Column::FullName))))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((users::Entity, users::Column::Email))))
                            .like(pattern),
                    ),
            );
        }

        let rows = query
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(archive, user)| ArchiveEntry {
                archive,
                full_name: user.as_ref().and_then(|u| u.full_name.clone()),
                email: user.map(|u| u.email),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
