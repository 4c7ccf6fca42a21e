//! Balance repository: atomic ledger mutations.
//!
//! Every debit and credit is a single `UPDATE` that reads the old value
//! under a row lock and writes the new one, so concurrent approvals for the
//! same user cannot lose updates.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, Statement,
};
use tracing::debug;

use leavedesk_core::balance::{AppliedEffect, BalanceSheet, LedgerEffect};
use leavedesk_shared::types::{Days, OrganizationId, UserId};

use crate::entities::users;

#[derive(Debug, FromQueryResult)]
struct BalanceChange {
    prev_balance: Decimal,
    new_balance: Decimal,
}

/// Builds the single-statement update for one ledger effect.
///
/// `$1` is the user id and `$2` the requested days.
fn ledger_sql(effect: &LedgerEffect) -> String {
    let column = effect.field().column();
    let next = if effect.is_debit() {
        "GREATEST(0, old.b - $2)"
    } else {
        "old.b + $2"
    };
    format!(
        "WITH old AS (SELECT {column} AS b FROM users WHERE id = $1 FOR UPDATE) \
         UPDATE users SET {column} = {next}, updated_at = now() \
         FROM old WHERE users.id = $1 \
         RETURNING old.b AS prev_balance, users.{column} AS new_balance"
    )
}

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Applies one effect on `conn` (usually an open transaction).
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the user does not exist, or the
    /// underlying database error.
    pub async fn apply_in<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        effect: LedgerEffect,
    ) -> Result<AppliedEffect, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            ledger_sql(&effect),
            [user_id.into_inner().into(), effect.days().amount().into()],
        );

        let row = BalanceChange::find_by_statement(stmt)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;

        let applied =
            AppliedEffect::observed(effect, Days::new(row.prev_balance), Days::new(row.new_balance));

        debug!(
            user_id = %user_id,
            field = %effect.field(),
            debit = effect.is_debit(),
            requested = %applied.requested,
            applied = %applied.applied,
            before = %applied.before,
            after = %applied.after,
            "Balance ledger updated"
        );

        Ok(applied)
    }

    /// Applies effects in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing effect.
    pub async fn apply_all_in<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        effects: &[LedgerEffect],
    ) -> Result<Vec<AppliedEffect>, DbErr> {
        let mut applied = Vec::with_capacity(effects.len());
        for effect in effects {
            applied.push(Self::apply_in(conn, user_id, *effect).await?);
        }
        Ok(applied)
    }

    /// Reads a user's casual and medical balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sheet(&self, user_id: UserId) -> Result<Option<BalanceSheet>, DbErr> {
        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await?;

        Ok(user.map(|u| BalanceSheet::new(Days::new(u.balance_casual), Days::new(u.balance_medical))))
    }

    /// Resets every casual and medical balance in an organization.
    ///
    /// Returns the number of users updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn reset_organization(
        &self,
        organization_id: OrganizationId,
        casual: Days,
        medical: Days,
    ) -> Result<u64, DbErr> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::BalanceCasual, Expr::value(casual.amount()))
            .col_expr(users::Column::BalanceMedical, Expr::value(medical.amount()))
            .col_expr(users::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(users::Column::OrganizationId.eq(organization_id.into_inner()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk_core::balance::BalanceField;

    #[test]
    fn test_debit_sql_floors_at_zero() {
        let sql = ledger_sql(&LedgerEffect::Debit {
            field: BalanceField::Casual,
            days: Days::ONE,
        });
        assert!(sql.contains("SET balance_casual = GREATEST(0, old.b - $2)"));
        assert!(sql.contains("FOR UPDATE"));
    }

    #[test]
    fn test_credit_sql_adds_back() {
        let sql = ledger_sql(&LedgerEffect::Credit {
            field: BalanceField::Medical,
            days: Days::HALF,
        });
        assert!(sql.contains("SET balance_medical = old.b + $2"));
        assert!(sql.contains("RETURNING old.b AS prev_balance, users.balance_medical AS new_balance"));
    }
}
