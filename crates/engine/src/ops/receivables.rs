use chrono::{Local, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::{debug, info};

use crate::{
    Actor, EngineError, PaymentApplication, PendingBill, PendingBillEdit, ResultEngine,
    SettlementOutcome, UpsertPendingBillCmd, clients, entry,
    pending_bills::{self, CASH_CLIENT_CODE, OpenBill, settle},
    util::{normalize_optional, normalize_required},
};

use super::{Engine, with_tx};

/// Values of a receivable about to be written.
pub(super) struct ReceivableDraft<'a> {
    pub client_code: &'a str,
    pub client_name: &'a str,
    pub bill_no: &'a str,
    pub amount_minor: i64,
    pub reason: String,
    pub nimbus_no: Option<String>,
    pub photo_url: Option<String>,
    pub is_cash: bool,
    pub created_by: &'a str,
}

/// Pair a receivable is moved to, with the client name it takes along.
pub(super) struct ReceivableKey<'a> {
    pub bill_no: &'a str,
    pub client_code: &'a str,
    pub client_name: &'a str,
}

impl Engine {
    /// Open a receivable, or update the one already keyed by the same
    /// `(bill_no, client_code)`.
    ///
    /// Receivables without a bill number are never merged.
    pub async fn upsert_pending_bill(&self, cmd: UpsertPendingBillCmd) -> ResultEngine<PendingBill> {
        if cmd.amount_minor < 0 {
            return Err(EngineError::InvalidInput(
                "pending amount must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let (code, name, is_cash) = match cmd.client_code.as_deref() {
                Some(key) => {
                    let client = self.require_client(&db_tx, key).await?;
                    (client.code, client.name, false)
                }
                None => {
                    let name = normalize_required(
                        cmd.client_name.as_deref().unwrap_or_default(),
                        "customer name",
                    )?;
                    (CASH_CLIENT_CODE.to_string(), name, true)
                }
            };
            let bill_no = cmd.bill_no.trim().to_string();

            let model = self
                .upsert_receivable(
                    &db_tx,
                    ReceivableDraft {
                        client_code: &code,
                        client_name: &name,
                        bill_no: &bill_no,
                        amount_minor: cmd.amount_minor,
                        reason: normalize_optional(cmd.reason.as_deref()).unwrap_or_default(),
                        nimbus_no: normalize_optional(cmd.nimbus_no.as_deref()),
                        photo_url: normalize_optional(cmd.photo_url.as_deref()),
                        is_cash,
                        created_by: &cmd.actor.username,
                    },
                )
                .await?;
            Ok(PendingBill::from(model))
        })
    }

    pub async fn pending_bill(&self, bill_id: i32) -> ResultEngine<PendingBill> {
        with_tx!(self, |db_tx| {
            let model = self.require_pending_bill(&db_tx, bill_id).await?;
            Ok(PendingBill::from(model))
        })
    }

    /// Receivables oldest first, optionally for one client code.
    pub async fn pending_bills(
        &self,
        client_code: Option<&str>,
        include_paid: bool,
    ) -> ResultEngine<Vec<PendingBill>> {
        with_tx!(self, |db_tx| {
            let mut query = pending_bills::Entity::find()
                .order_by_asc(pending_bills::Column::CreatedAt)
                .order_by_asc(pending_bills::Column::Id);
            if let Some(code) = client_code {
                query = query.filter(pending_bills::Column::ClientCode.eq(code.trim()));
            }
            if !include_paid {
                query = query.filter(pending_bills::Column::IsPaid.eq(false));
            }
            let models = query.all(&db_tx).await?;
            Ok(models.into_iter().map(PendingBill::from).collect())
        })
    }

    /// Replace a receivable's fields. Movements that carried the old
    /// `(bill_no, client_code)` follow the new pair; returns how many did.
    ///
    /// An open receivable cannot be moved onto a pair that already has one.
    pub async fn edit_pending_bill(
        &self,
        bill_id: i32,
        edit: PendingBillEdit,
    ) -> ResultEngine<(PendingBill, u64)> {
        if edit.amount_minor < 0 {
            return Err(EngineError::InvalidInput(
                "pending amount must be >= 0".to_string(),
            ));
        }
        let new_code = normalize_required(&edit.client_code, "client code")?;
        with_tx!(self, |db_tx| {
            let bill = self.require_pending_bill(&db_tx, bill_id).await?;
            let new_name = if bill.is_cash && new_code == CASH_CLIENT_CODE {
                bill.client_name.clone()
            } else {
                self.find_client_by_code(&db_tx, &new_code)
                    .await?
                    .ok_or_else(|| {
                        EngineError::InvalidReference(format!("unknown client \"{new_code}\""))
                    })?
                    .name
            };
            let new_bill_no = edit.bill_no.trim().to_string();

            if !bill.is_paid && !new_bill_no.is_empty() {
                let taken = pending_bills::Entity::find()
                    .filter(pending_bills::Column::BillNo.eq(new_bill_no.clone()))
                    .filter(pending_bills::Column::ClientCode.eq(new_code.clone()))
                    .filter(pending_bills::Column::IsPaid.eq(false))
                    .filter(pending_bills::Column::Id.ne(bill_id))
                    .one(&db_tx)
                    .await?;
                if taken.is_some() {
                    return Err(EngineError::PolicyViolation(format!(
                        "bill {new_bill_no} is already open for {new_code}"
                    )));
                }
            }

            let entries = if bill.bill_no.is_empty() {
                0
            } else {
                entry::Entity::update_many()
                    .col_expr(entry::Column::BillNo, Expr::value(new_bill_no.clone()))
                    .col_expr(entry::Column::ClientCode, Expr::value(new_code.clone()))
                    .col_expr(entry::Column::Client, Expr::value(new_name.clone()))
                    .filter(entry::Column::BillNo.eq(bill.bill_no.clone()))
                    .filter(entry::Column::ClientCode.eq(bill.client_code.clone()))
                    .exec(&db_tx)
                    .await?
                    .rows_affected
            };

            let model = pending_bills::ActiveModel {
                id: ActiveValue::Set(bill_id),
                client_code: ActiveValue::Set(new_code),
                client_name: ActiveValue::Set(new_name),
                bill_no: ActiveValue::Set(new_bill_no),
                nimbus_no: ActiveValue::Set(normalize_optional(edit.nimbus_no.as_deref())),
                amount_minor: ActiveValue::Set(edit.amount_minor),
                reason: ActiveValue::Set(normalize_optional(edit.reason.as_deref()).unwrap_or_default()),
                photo_url: ActiveValue::Set(normalize_optional(edit.photo_url.as_deref())),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            info!(bill_id, entries, "pending bill edited");
            Ok((PendingBill::from(model), entries))
        })
    }

    /// Delete a receivable. Non-admins may only delete the day's receivables.
    pub async fn delete_pending_bill(&self, bill_id: i32, actor: &Actor) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let bill = self.require_pending_bill(&db_tx, bill_id).await?;
            let bill_date = bill
                .date
                .unwrap_or_else(|| bill.created_at.with_timezone(&Local).date_naive());
            self.ensure_same_day(actor, bill_date, "delete pending bills of")?;

            pending_bills::Entity::delete_by_id(bill_id)
                .exec(&db_tx)
                .await?;
            info!(bill_id, bill_no = %bill.bill_no, user = %actor.username, "pending bill deleted");
            Ok(())
        })
    }

    /// Flip the paid flag of a receivable.
    pub async fn toggle_paid(&self, bill_id: i32) -> ResultEngine<PendingBill> {
        with_tx!(self, |db_tx| {
            let bill = self.require_pending_bill(&db_tx, bill_id).await?;
            let model = pending_bills::ActiveModel {
                id: ActiveValue::Set(bill_id),
                is_paid: ActiveValue::Set(!bill.is_paid),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(PendingBill::from(model))
        })
    }

    /// Apply a payment to a client's open receivables, oldest first.
    ///
    /// With `target_bill_no` only the receivables carrying that number are
    /// considered.
    pub async fn apply_payment(
        &self,
        client: &str,
        amount_minor: i64,
        target_bill_no: Option<&str>,
    ) -> ResultEngine<Vec<PaymentApplication>> {
        with_tx!(self, |db_tx| {
            let client = self.require_client(&db_tx, client).await?;
            self.apply_payment_in(&db_tx, &client, amount_minor, target_bill_no)
                .await
        })
    }

    pub(super) async fn apply_payment_in(
        &self,
        db_tx: &DatabaseTransaction,
        client: &clients::Model,
        amount_minor: i64,
        target_bill_no: Option<&str>,
    ) -> ResultEngine<Vec<PaymentApplication>> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidInput(
                "payment amount must be > 0".to_string(),
            ));
        }

        let mut query = pending_bills::Entity::find()
            .filter(pending_bills::Column::ClientCode.eq(client.code.clone()))
            .filter(pending_bills::Column::IsPaid.eq(false))
            .order_by_asc(pending_bills::Column::CreatedAt)
            .order_by_asc(pending_bills::Column::Id);
        if let Some(bill_no) = normalize_optional(target_bill_no) {
            query = query.filter(pending_bills::Column::BillNo.eq(bill_no));
        }
        let open: Vec<OpenBill> = query
            .all(db_tx)
            .await?
            .into_iter()
            .map(|model| OpenBill {
                id: model.id,
                bill_no: model.bill_no,
                amount_minor: model.amount_minor,
            })
            .collect();

        let applications = settle(amount_minor, &open);
        for application in &applications {
            let (amount_minor, is_paid) = match application.outcome {
                SettlementOutcome::Paid => (0, true),
                SettlementOutcome::Partial { remaining_minor } => (remaining_minor, false),
            };
            pending_bills::ActiveModel {
                id: ActiveValue::Set(application.bill_id),
                amount_minor: ActiveValue::Set(amount_minor),
                is_paid: ActiveValue::Set(is_paid),
                ..Default::default()
            }
            .update(db_tx)
            .await?;
        }

        info!(
            client = %client.code,
            amount_minor,
            bills = applications.len(),
            "payment applied"
        );
        Ok(applications)
    }

    pub(super) async fn upsert_receivable(
        &self,
        db_tx: &DatabaseTransaction,
        draft: ReceivableDraft<'_>,
    ) -> ResultEngine<pending_bills::Model> {
        let existing = if draft.bill_no.is_empty() {
            None
        } else {
            pending_bills::Entity::find()
                .filter(pending_bills::Column::BillNo.eq(draft.bill_no))
                .filter(pending_bills::Column::ClientCode.eq(draft.client_code))
                .order_by_asc(pending_bills::Column::IsPaid)
                .order_by_asc(pending_bills::Column::Id)
                .one(db_tx)
                .await?
        };

        let model = match existing {
            Some(existing) => {
                let mut model = pending_bills::ActiveModel {
                    id: ActiveValue::Set(existing.id),
                    client_name: ActiveValue::Set(draft.client_name.to_string()),
                    amount_minor: ActiveValue::Set(draft.amount_minor),
                    is_paid: ActiveValue::Set(draft.amount_minor <= 0),
                    ..Default::default()
                };
                if !draft.reason.is_empty() {
                    model.reason = ActiveValue::Set(draft.reason);
                }
                if draft.nimbus_no.is_some() {
                    model.nimbus_no = ActiveValue::Set(draft.nimbus_no);
                }
                if draft.photo_url.is_some() {
                    model.photo_url = ActiveValue::Set(draft.photo_url);
                }
                let model = model.update(db_tx).await?;
                debug!(bill_no = %model.bill_no, client = %model.client_code, "pending bill updated");
                model
            }
            None => {
                let model = pending_bills::ActiveModel {
                    id: ActiveValue::NotSet,
                    client_code: ActiveValue::Set(draft.client_code.to_string()),
                    client_name: ActiveValue::Set(draft.client_name.to_string()),
                    bill_no: ActiveValue::Set(draft.bill_no.to_string()),
                    nimbus_no: ActiveValue::Set(draft.nimbus_no),
                    amount_minor: ActiveValue::Set(draft.amount_minor),
                    date: ActiveValue::Set(Some(self.today())),
                    reason: ActiveValue::Set(draft.reason),
                    photo_url: ActiveValue::Set(draft.photo_url),
                    is_paid: ActiveValue::Set(draft.amount_minor <= 0),
                    is_cash: ActiveValue::Set(draft.is_cash),
                    created_at: ActiveValue::Set(Utc::now()),
                    created_by: ActiveValue::Set(draft.created_by.to_string()),
                }
                .insert(db_tx)
                .await?;
                debug!(bill_no = %model.bill_no, client = %model.client_code, "pending bill opened");
                model
            }
        };
        Ok(model)
    }

    /// Move the receivables of `(bill_no, client_code)` to `to`.
    ///
    /// If `to` already has an open receivable, the open amounts being moved
    /// are added to it and their rows deleted, so the pair keeps a single
    /// open receivable. Returns how many rows were moved or merged.
    pub(super) async fn repoint_receivables(
        &self,
        db_tx: &DatabaseTransaction,
        bill_no: &str,
        client_code: &str,
        to: ReceivableKey<'_>,
    ) -> ResultEngine<u64> {
        let moving = pending_bills::Entity::find()
            .filter(pending_bills::Column::BillNo.eq(bill_no))
            .filter(pending_bills::Column::ClientCode.eq(client_code))
            .all(db_tx)
            .await?;
        if moving.is_empty() {
            return Ok(0);
        }

        let same_pair = bill_no == to.bill_no && client_code == to.client_code;
        let target = if same_pair || to.bill_no.is_empty() {
            None
        } else {
            pending_bills::Entity::find()
                .filter(pending_bills::Column::BillNo.eq(to.bill_no))
                .filter(pending_bills::Column::ClientCode.eq(to.client_code))
                .filter(pending_bills::Column::IsPaid.eq(false))
                .order_by_asc(pending_bills::Column::Id)
                .one(db_tx)
                .await?
        };

        let mut merged = 0;
        let open: Vec<&pending_bills::Model> = moving.iter().filter(|m| !m.is_paid).collect();
        if let Some(target) = target
            && !open.is_empty()
        {
            let amount_minor =
                target.amount_minor + open.iter().map(|m| m.amount_minor).sum::<i64>();
            pending_bills::ActiveModel {
                id: ActiveValue::Set(target.id),
                client_name: ActiveValue::Set(to.client_name.to_string()),
                amount_minor: ActiveValue::Set(amount_minor),
                is_paid: ActiveValue::Set(amount_minor <= 0),
                ..Default::default()
            }
            .update(db_tx)
            .await?;
            merged = pending_bills::Entity::delete_many()
                .filter(pending_bills::Column::Id.is_in(open.iter().map(|m| m.id)))
                .exec(db_tx)
                .await?
                .rows_affected;
            info!(
                bill_no = %to.bill_no,
                client = %to.client_code,
                merged,
                amount_minor,
                "pending bills merged"
            );
        }

        let moved = pending_bills::Entity::update_many()
            .col_expr(pending_bills::Column::BillNo, Expr::value(to.bill_no))
            .col_expr(pending_bills::Column::ClientCode, Expr::value(to.client_code))
            .col_expr(pending_bills::Column::ClientName, Expr::value(to.client_name))
            .filter(pending_bills::Column::BillNo.eq(bill_no))
            .filter(pending_bills::Column::ClientCode.eq(client_code))
            .exec(db_tx)
            .await?
            .rows_affected;
        Ok(merged + moved)
    }

    /// Mark the receivable of `(bill_no, client_code)` as settled, if any.
    pub(super) async fn settle_receivable(
        &self,
        db_tx: &DatabaseTransaction,
        bill_no: &str,
        client_code: &str,
    ) -> ResultEngine<u64> {
        Ok(pending_bills::Entity::update_many()
            .col_expr(pending_bills::Column::AmountMinor, Expr::value(0_i64))
            .col_expr(pending_bills::Column::IsPaid, Expr::value(true))
            .filter(pending_bills::Column::BillNo.eq(bill_no))
            .filter(pending_bills::Column::ClientCode.eq(client_code))
            .exec(db_tx)
            .await?
            .rows_affected)
    }

    async fn require_pending_bill(
        &self,
        db_tx: &DatabaseTransaction,
        bill_id: i32,
    ) -> ResultEngine<pending_bills::Model> {
        pending_bills::Entity::find_by_id(bill_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("pending bill {bill_id}")))
    }
}
