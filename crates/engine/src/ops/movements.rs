use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    Actor, EditMovementCmd, EngineError, Entry, MaterialDaySummary, MaterialStock,
    MovementKind, RecordMovementCmd, ResultEngine, booking_items, bookings, clients, entry,
    materials, pending_bills,
    stock::{self, Movement},
    util::normalize_optional,
};

use super::{
    Engine, invoices::InvoiceDraft, now_time, owned_by, receivables::{ReceivableDraft, ReceivableKey}, with_tx,
};

/// Result of an edited movement and what happened to its receivable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovementEdit {
    pub entry: Entry,
    pub pending_bills_repointed: u64,
    pub pending_bills_deleted: u64,
}

fn validate_qty(qty: f64) -> ResultEngine<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(EngineError::InvalidInput(
            "quantity must be a positive number".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Record a stock movement.
    ///
    /// Dispatches (`OUT`) go to a registered, active client that has booked
    /// the material. A client requiring manual invoices must give a bill
    /// number unless an invoice is issued. With `pending_amount` the
    /// dispatch also opens (or updates) the receivable of its bill number.
    pub async fn record_movement(&self, cmd: RecordMovementCmd) -> ResultEngine<Entry> {
        validate_qty(cmd.qty)?;
        self.ensure_same_day(&cmd.actor, cmd.date, "create")?;
        if cmd.kind == MovementKind::In && (cmd.create_invoice || cmd.pending_amount_minor.is_some())
        {
            return Err(EngineError::InvalidInput(
                "invoices and receivables only apply to dispatches".to_string(),
            ));
        }
        if cmd.pending_amount_minor.is_some_and(|amount| amount < 0) {
            return Err(EngineError::InvalidInput(
                "pending amount must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let material = self.require_material(&db_tx, &cmd.material).await?;
            let client_key = normalize_optional(cmd.client.as_deref());
            let client = match client_key.as_deref() {
                Some(key) => self.lookup_client(&db_tx, key).await?,
                None => None,
            };
            let mut bill_no = normalize_optional(cmd.bill_no.as_deref());
            let mut invoice_id = None;

            if cmd.kind == MovementKind::Out {
                let client = require_dispatch_client(client.as_ref(), client_key.as_deref())?;
                if !self.has_booking(&db_tx, client, &material.name).await? {
                    warn!(client = %client.code, material = %material.name, "dispatch without booking");
                    return Err(EngineError::PolicyViolation(
                        "no booking found for this client and material".to_string(),
                    ));
                }
                if client.require_manual_invoice && bill_no.is_none() && !cmd.create_invoice {
                    return Err(EngineError::PolicyViolation(format!(
                        "manual invoice required for client {}",
                        client.code
                    )));
                }

                if cmd.create_invoice || (client.require_manual_invoice && bill_no.is_some()) {
                    let amount = cmd.pending_amount_minor.unwrap_or(0);
                    let invoice = self
                        .allocate_invoice_in(
                            &db_tx,
                            InvoiceDraft {
                                is_manual: bill_no.is_some(),
                                candidate_no: bill_no.clone(),
                                client_code: &client.code,
                                client_name: &client.name,
                                total_minor: amount,
                                balance_minor: amount,
                                is_cash: false,
                                created_by: &cmd.actor.username,
                            },
                        )
                        .await?;
                    bill_no = Some(invoice.invoice_no);
                    invoice_id = Some(invoice.id);
                }
            }

            let model = entry::ActiveModel {
                id: ActiveValue::NotSet,
                date: ActiveValue::Set(cmd.date),
                time: ActiveValue::Set(now_time()),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                material: ActiveValue::Set(material.name.clone()),
                client: ActiveValue::Set(
                    client.as_ref().map(|c| c.name.clone()).or(client_key.clone()),
                ),
                client_code: ActiveValue::Set(client.as_ref().map(|c| c.code.clone())),
                client_category: ActiveValue::Set(client.as_ref().map(|c| c.category.clone())),
                qty: ActiveValue::Set(cmd.qty),
                bill_no: ActiveValue::Set(bill_no.clone()),
                auto_bill_no: ActiveValue::Set(None),
                nimbus_no: ActiveValue::Set(normalize_optional(cmd.nimbus_no.as_deref())),
                invoice_id: ActiveValue::Set(invoice_id),
                created_by: ActiveValue::Set(cmd.actor.username.clone()),
            }
            .insert(&db_tx)
            .await?;

            if let (Some(amount), Some(client)) = (cmd.pending_amount_minor, client.as_ref())
                && amount > 0
            {
                let bill_no = bill_no.as_deref().ok_or_else(|| {
                    EngineError::InvalidInput(
                        "a receivable needs a bill number or an invoice".to_string(),
                    )
                })?;
                self.upsert_receivable(
                    &db_tx,
                    ReceivableDraft {
                        client_code: &client.code,
                        client_name: &client.name,
                        bill_no,
                        amount_minor: amount,
                        reason: format!("Dispatch: {}", material.name),
                        nimbus_no: model.nimbus_no.clone(),
                        photo_url: None,
                        is_cash: false,
                        created_by: &cmd.actor.username,
                    },
                )
                .await?;
            }

            info!(
                entry_id = model.id,
                kind = %model.kind,
                material = %model.material,
                qty = model.qty,
                client = ?model.client_code,
                "movement recorded"
            );
            Entry::try_from(model)
        })
    }

    pub async fn entry(&self, entry_id: i32) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            let model = self.require_entry(&db_tx, entry_id).await?;
            Entry::try_from(model)
        })
    }

    /// Movements of one day in recording order.
    pub async fn entries_on(&self, date: NaiveDate) -> ResultEngine<Vec<Entry>> {
        with_tx!(self, |db_tx| {
            let models = entry::Entity::find()
                .filter(entry::Column::Date.eq(date))
                .order_by_asc(entry::Column::Time)
                .order_by_asc(entry::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Entry::try_from).collect()
        })
    }

    /// Edit a movement.
    ///
    /// If the edited movement is a dispatch that had a bill number, the
    /// receivable keyed by the old `(bill_no, client_code)` follows it: it
    /// is re-pointed to the new pair, or deleted when the number is cleared.
    pub async fn edit_movement(&self, cmd: EditMovementCmd) -> ResultEngine<MovementEdit> {
        if let Some(qty) = cmd.qty {
            validate_qty(qty)?;
        }
        with_tx!(self, |db_tx| {
            let current = self.require_entry(&db_tx, cmd.entry_id).await?;
            self.ensure_same_day(&cmd.actor, current.date, "edit")?;
            if let Some(date) = cmd.date {
                self.ensure_same_day(&cmd.actor, date, "move")?;
            }

            let kind = match cmd.kind {
                Some(kind) => kind,
                None => MovementKind::try_from(current.kind.as_str())?,
            };
            let material = match cmd.material.as_deref() {
                Some(key) => self.require_material(&db_tx, key).await?.name,
                None => current.material.clone(),
            };

            let (client_name, client_code, client_category) = match &cmd.client {
                None => (
                    current.client.clone(),
                    current.client_code.clone(),
                    current.client_category.clone(),
                ),
                Some(key) => {
                    let key = normalize_optional(key.as_deref());
                    let found = match key.as_deref() {
                        Some(key) => self.lookup_client(&db_tx, key).await?,
                        None => None,
                    };
                    match found {
                        Some(client) => (Some(client.name), Some(client.code), Some(client.category)),
                        None => (key, None, None),
                    }
                }
            };
            if kind == MovementKind::Out && client_code.is_none() {
                return Err(EngineError::PolicyViolation(
                    "dispatches need a registered client".to_string(),
                ));
            }

            let bill_no = match &cmd.bill_no {
                None => current.bill_no.clone(),
                Some(value) => normalize_optional(value.as_deref()),
            };
            let nimbus_no = match &cmd.nimbus_no {
                None => current.nimbus_no.clone(),
                Some(value) => normalize_optional(value.as_deref()),
            };

            let model = entry::ActiveModel {
                id: ActiveValue::Set(current.id),
                date: ActiveValue::Set(cmd.date.unwrap_or(current.date)),
                time: ActiveValue::Set(cmd.time.unwrap_or(current.time)),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                material: ActiveValue::Set(material),
                client: ActiveValue::Set(client_name.clone()),
                client_code: ActiveValue::Set(client_code.clone()),
                client_category: ActiveValue::Set(client_category),
                qty: ActiveValue::Set(cmd.qty.unwrap_or(current.qty)),
                bill_no: ActiveValue::Set(bill_no.clone()),
                nimbus_no: ActiveValue::Set(nimbus_no),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            let mut repointed = 0;
            let mut deleted = 0;
            if let (MovementKind::Out, Some(old_bill_no), Some(old_code)) = (
                kind,
                current.bill_no.as_deref(),
                current.client_code.as_deref(),
            ) {
                match (&bill_no, &client_code) {
                    (Some(new_bill_no), Some(new_code)) => {
                        repointed = self
                            .repoint_receivables(
                                &db_tx,
                                old_bill_no,
                                old_code,
                                ReceivableKey {
                                    bill_no: new_bill_no,
                                    client_code: new_code,
                                    client_name: client_name.as_deref().unwrap_or_default(),
                                },
                            )
                            .await?;
                    }
                    _ => {
                        deleted = pending_bills::Entity::delete_many()
                            .filter(linked_receivable(old_bill_no, old_code))
                            .exec(&db_tx)
                            .await?
                            .rows_affected;
                    }
                }
            }

            info!(entry_id = model.id, repointed, deleted, "movement edited");
            Ok(MovementEdit {
                entry: Entry::try_from(model)?,
                pending_bills_repointed: repointed,
                pending_bills_deleted: deleted,
            })
        })
    }

    /// Delete a movement. A dispatch also takes down the receivable keyed by
    /// its `(bill_no, client_code)`; returns how many receivables went.
    pub async fn delete_movement(&self, entry_id: i32, actor: &Actor) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let current = self.require_entry(&db_tx, entry_id).await?;
            self.ensure_same_day(actor, current.date, "delete")?;

            let mut deleted = 0;
            if let (Ok(MovementKind::Out), Some(bill_no)) = (
                MovementKind::try_from(current.kind.as_str()),
                current.bill_no.as_deref(),
            ) && let Some(client_code) = current.client_code.as_deref()
            {
                deleted = pending_bills::Entity::delete_many()
                    .filter(linked_receivable(bill_no, client_code))
                    .exec(&db_tx)
                    .await?
                    .rows_affected;
            }

            entry::Entity::delete_by_id(entry_id).exec(&db_tx).await?;
            info!(entry_id, pending_bills = deleted, user = %actor.username, "movement deleted");
            Ok(deleted)
        })
    }

    /// Opening, in, out and closing stock of every material for `date`.
    pub async fn daily_summary(&self, date: NaiveDate) -> ResultEngine<Vec<MaterialDaySummary>> {
        with_tx!(self, |db_tx| {
            let entries = entry::Entity::find()
                .filter(entry::Column::Date.lte(date))
                .all(&db_tx)
                .await?;
            let registered = materials::Entity::find().all(&db_tx).await?;
            let movements = to_movements(&entries)?;
            Ok(stock::daily_summary(
                date,
                movements,
                registered.iter().map(|m| m.name.as_str()),
            ))
        })
    }

    /// All-time stock of every material.
    pub async fn stock_overview(&self) -> ResultEngine<Vec<MaterialStock>> {
        with_tx!(self, |db_tx| {
            let entries = entry::Entity::find().all(&db_tx).await?;
            let registered = materials::Entity::find().all(&db_tx).await?;
            let movements = to_movements(&entries)?;
            Ok(stock::stock_overview(
                movements,
                registered.iter().map(|m| m.name.as_str()),
            ))
        })
    }

    async fn has_booking(
        &self,
        db_tx: &DatabaseTransaction,
        client: &clients::Model,
        material: &str,
    ) -> ResultEngine<bool> {
        let booking_ids: Vec<i32> = bookings::Entity::find()
            .filter(owned_by(
                bookings::Column::ClientCode,
                bookings::Column::ClientName,
                client,
            ))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();
        if booking_ids.is_empty() {
            return Ok(false);
        }
        let item = booking_items::Entity::find()
            .filter(booking_items::Column::BookingId.is_in(booking_ids))
            .filter(booking_items::Column::MaterialName.eq(material))
            .one(db_tx)
            .await?;
        debug!(client = %client.code, material, booked = item.is_some(), "booking check");
        Ok(item.is_some())
    }

    async fn require_entry(
        &self,
        db_tx: &DatabaseTransaction,
        entry_id: i32,
    ) -> ResultEngine<entry::Model> {
        entry::Entity::find_by_id(entry_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("entry {entry_id}")))
    }
}

fn require_dispatch_client<'a>(
    client: Option<&'a clients::Model>,
    key: Option<&str>,
) -> ResultEngine<&'a clients::Model> {
    let Some(client) = client else {
        return Err(EngineError::PolicyViolation(match key {
            Some(key) => format!("\"{key}\" is not a registered client; record a direct sale instead"),
            None => "dispatches need a registered client".to_string(),
        }));
    };
    if !client.is_active {
        return Err(EngineError::PolicyViolation(format!(
            "client {} was transferred and cannot receive dispatches",
            client.code
        )));
    }
    Ok(client)
}

/// The receivable a dispatch's `(bill_no, client_code)` points at. Without a
/// client code there is none.
fn linked_receivable(bill_no: &str, client_code: &str) -> Condition {
    Condition::all()
        .add(pending_bills::Column::BillNo.eq(bill_no))
        .add(pending_bills::Column::ClientCode.eq(client_code))
}

fn to_movements(entries: &[entry::Model]) -> ResultEngine<Vec<Movement<'_>>> {
    entries
        .iter()
        .map(|e| {
            Ok(Movement {
                date: e.date,
                kind: MovementKind::try_from(e.kind.as_str())?,
                material: e.material.as_str(),
                qty: e.qty,
            })
        })
        .collect()
}
