use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

use crate::{
    EngineError, ResultEngine,
    bill_counter::{self, COUNTER_ROW},
    util::format_bill_number,
};

use super::{Engine, with_tx};

impl Engine {
    /// Issue the next bill number (`#<n>`).
    ///
    /// Committed numbers are strictly increasing. The counter moves inside
    /// the drawing operation's transaction, so a rolled-back operation
    /// gives its number back to the next caller.
    pub async fn next_bill_number(&self) -> ResultEngine<String> {
        with_tx!(self, |db_tx| self.allocate_bill_number(&db_tx).await)
    }

    /// Value the next issued bill number will carry, without consuming it.
    pub async fn peek_bill_number(&self) -> ResultEngine<String> {
        let count = bill_counter::Entity::find_by_id(COUNTER_ROW)
            .one(&self.database)
            .await?
            .map_or(self.bill_counter_seed, |model| model.count);
        Ok(format_bill_number(count))
    }

    /// Draw a bill number inside the caller's transaction.
    ///
    /// The increment is a single `UPDATE count = count + 1` issued before the
    /// read, so the write lock is held from the moment the row is touched and
    /// concurrent writers cannot observe the same value.
    pub(super) async fn allocate_bill_number(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<String> {
        let seed = bill_counter::ActiveModel {
            id: ActiveValue::Set(COUNTER_ROW),
            count: ActiveValue::Set(self.bill_counter_seed),
        };
        bill_counter::Entity::insert(seed)
            .on_conflict(
                OnConflict::column(bill_counter::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;

        bill_counter::Entity::update_many()
            .col_expr(
                bill_counter::Column::Count,
                Expr::col(bill_counter::Column::Count).add(1),
            )
            .filter(bill_counter::Column::Id.eq(COUNTER_ROW))
            .exec(db_tx)
            .await?;
        let next = bill_counter::Entity::find_by_id(COUNTER_ROW)
            .one(db_tx)
            .await?
            .map(|model| model.count)
            .ok_or_else(|| EngineError::NotFound("bill counter".to_string()))?;

        let bill_no = format_bill_number(next - 1);
        debug!(%bill_no, "bill number issued");
        Ok(bill_no)
    }
}
