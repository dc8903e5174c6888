use chrono::{Local, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    Actor, Bill, BillRef, Booking, BookingCmd, DirectSale, DirectSaleCmd, EngineError, Grn,
    GrnCmd, LineItem, MovementKind, Payment, PaymentApplication, PaymentCmd, ResultEngine,
    SaleCustomer, booking_items, bookings, clients, direct_sale_items, direct_sales, entry,
    grn_items, grns, payments,
    pending_bills::{self, CASH_CLIENT_CODE},
    util::{normalize_optional, normalize_required, strip_bill_prefix},
};

use super::{
    Engine, invoices::InvoiceDraft, now_time,
    receivables::{ReceivableDraft, ReceivableKey},
    with_tx,
};

/// A recorded payment and the receivables it settled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub applications: Vec<PaymentApplication>,
}

/// The party a direct sale is made to, after resolution.
struct SaleParty {
    code: Option<String>,
    name: String,
    category: Option<String>,
    require_manual_invoice: bool,
}

impl SaleParty {
    fn receivable_code(&self) -> &str {
        self.code.as_deref().unwrap_or(CASH_CLIENT_CODE)
    }
}

/// Where a sale's receivable lived before an edit.
struct PreviousReceivable<'a> {
    bill_no: &'a str,
    client_code: &'a str,
}

fn clean_items(items: &[LineItem]) -> ResultEngine<Vec<LineItem>> {
    items
        .iter()
        .filter(|item| !item.name.trim().is_empty())
        .map(|item| {
            if !item.qty.is_finite() || item.qty < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "invalid quantity for {}",
                    item.name.trim()
                )));
            }
            if item.price_minor < 0 {
                return Err(EngineError::InvalidInput(format!(
                    "invalid price for {}",
                    item.name.trim()
                )));
            }
            Ok(LineItem::new(item.name.trim(), item.qty, item.price_minor))
        })
        .collect()
}

fn validate_amounts(amount_minor: i64, paid_minor: i64) -> ResultEngine<()> {
    if amount_minor < 0 || paid_minor < 0 {
        return Err(EngineError::InvalidInput(
            "amounts must be >= 0".to_string(),
        ));
    }
    Ok(())
}

fn first_item_reason(prefix: &str, items: &[LineItem]) -> String {
    format!("{prefix}: {}", items.first().map_or("", |i| i.name.as_str()))
}

impl Engine {
    /// Take a booking for a registered client. The unpaid part opens a
    /// receivable under the booking's bill number.
    pub async fn add_booking(&self, cmd: BookingCmd) -> ResultEngine<Booking> {
        let items = clean_items(&cmd.items)?;
        validate_amounts(cmd.amount_minor, cmd.paid_minor)?;
        with_tx!(self, |db_tx| {
            let client = self.require_client(&db_tx, &cmd.client).await?;
            let auto_bill_no = self.allocate_bill_number(&db_tx).await?;

            let model = bookings::ActiveModel {
                id: ActiveValue::NotSet,
                client_code: ActiveValue::Set(Some(client.code.clone())),
                client_name: ActiveValue::Set(client.name.clone()),
                location: ActiveValue::Set(normalize_optional(cmd.location.as_deref())),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                paid_minor: ActiveValue::Set(cmd.paid_minor),
                manual_bill_no: ActiveValue::Set(normalize_optional(cmd.manual_bill_no.as_deref())),
                auto_bill_no: ActiveValue::Set(auto_bill_no),
                invoice_id: ActiveValue::Set(None),
                photo_path: ActiveValue::Set(normalize_optional(cmd.photo_path.as_deref())),
                date_posted: ActiveValue::Set(Utc::now()),
                created_by: ActiveValue::Set(cmd.actor.username.clone()),
            }
            .insert(&db_tx)
            .await?;
            let item_models = insert_booking_items(&db_tx, model.id, &items).await?;
            let booking = Booking::from_parts(model, item_models);

            self.sync_sale_receivable(
                &db_tx,
                None,
                ReceivableDraft {
                    client_code: &client.code,
                    client_name: &client.name,
                    bill_no: booking.effective_bill_no(),
                    amount_minor: booking.outstanding_minor(),
                    reason: first_item_reason("Booking", &booking.items),
                    nimbus_no: None,
                    photo_url: booking.photo_path.clone(),
                    is_cash: false,
                    created_by: &cmd.actor.username,
                },
            )
            .await?;

            info!(bill_no = %booking.auto_bill_no, client = %client.code, "booking added");
            Ok(booking)
        })
    }

    /// Replace a booking's fields and items, then re-sync its receivable.
    pub async fn edit_booking(&self, booking_id: i32, cmd: BookingCmd) -> ResultEngine<Booking> {
        let items = clean_items(&cmd.items)?;
        validate_amounts(cmd.amount_minor, cmd.paid_minor)?;
        with_tx!(self, |db_tx| {
            let current = bookings::Entity::find_by_id(booking_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id}")))?;
            let client = self.require_client(&db_tx, &cmd.client).await?;

            let mut model = bookings::ActiveModel {
                id: ActiveValue::Set(booking_id),
                client_code: ActiveValue::Set(Some(client.code.clone())),
                client_name: ActiveValue::Set(client.name.clone()),
                location: ActiveValue::Set(normalize_optional(cmd.location.as_deref())),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                paid_minor: ActiveValue::Set(cmd.paid_minor),
                manual_bill_no: ActiveValue::Set(normalize_optional(cmd.manual_bill_no.as_deref())),
                ..Default::default()
            };
            if let Some(photo) = normalize_optional(cmd.photo_path.as_deref()) {
                model.photo_path = ActiveValue::Set(Some(photo));
            }
            let model = model.update(&db_tx).await?;

            booking_items::Entity::delete_many()
                .filter(booking_items::Column::BookingId.eq(booking_id))
                .exec(&db_tx)
                .await?;
            let item_models = insert_booking_items(&db_tx, booking_id, &items).await?;
            let booking = Booking::from_parts(model, item_models);

            let previous_bill_no = crate::bookings::effective_bill_no(
                current.manual_bill_no.as_deref(),
                &current.auto_bill_no,
            );
            self.sync_sale_receivable(
                &db_tx,
                current.client_code.as_deref().map(|code| PreviousReceivable {
                    bill_no: previous_bill_no,
                    client_code: code,
                }),
                ReceivableDraft {
                    client_code: &client.code,
                    client_name: &client.name,
                    bill_no: booking.effective_bill_no(),
                    amount_minor: booking.outstanding_minor(),
                    reason: first_item_reason("Booking", &booking.items),
                    nimbus_no: None,
                    photo_url: None,
                    is_cash: false,
                    created_by: &cmd.actor.username,
                },
            )
            .await?;
            if let Some(invoice_id) = booking.invoice_id {
                self.refresh_invoice(
                    &db_tx,
                    invoice_id,
                    booking.amount_minor,
                    booking.outstanding_minor(),
                )
                .await?;
            }

            info!(booking_id, bill_no = %booking.auto_bill_no, "booking edited");
            Ok(booking)
        })
    }

    /// Sell material directly, recording one dispatch per line.
    ///
    /// The unpaid part becomes a receivable unless `has_bill` is off; a
    /// walk-in customer's receivable is a cash receivable under code `CASH`.
    pub async fn add_direct_sale(&self, cmd: DirectSaleCmd) -> ResultEngine<DirectSale> {
        let items = clean_items(&cmd.items)?;
        if items.is_empty() {
            return Err(EngineError::InvalidInput(
                "a sale needs at least one item".to_string(),
            ));
        }
        validate_amounts(cmd.amount_minor, cmd.paid_minor)?;
        with_tx!(self, |db_tx| {
            let party = self.resolve_sale_party(&db_tx, &cmd.customer).await?;
            let manual_bill_no = normalize_optional(cmd.manual_bill_no.as_deref());
            if party.require_manual_invoice && manual_bill_no.is_none() {
                return Err(EngineError::PolicyViolation(format!(
                    "manual invoice required for client {}",
                    party.receivable_code()
                )));
            }
            let items = self.canonical_items(&db_tx, items).await?;
            let auto_bill_no = self.allocate_bill_number(&db_tx).await?;
            let outstanding = (cmd.amount_minor - cmd.paid_minor).max(0);

            let invoice_id = if cmd.create_invoice || party.require_manual_invoice {
                let invoice = self
                    .allocate_invoice_in(
                        &db_tx,
                        InvoiceDraft {
                            is_manual: manual_bill_no.is_some(),
                            candidate_no: Some(
                                manual_bill_no.clone().unwrap_or_else(|| auto_bill_no.clone()),
                            ),
                            client_code: party.receivable_code(),
                            client_name: &party.name,
                            total_minor: cmd.amount_minor,
                            balance_minor: outstanding,
                            is_cash: party.code.is_none(),
                            created_by: &cmd.actor.username,
                        },
                    )
                    .await?;
                Some(invoice.id)
            } else {
                None
            };

            let model = direct_sales::ActiveModel {
                id: ActiveValue::NotSet,
                client_code: ActiveValue::Set(party.code.clone()),
                client_name: ActiveValue::Set(party.name.clone()),
                category: ActiveValue::Set(
                    normalize_optional(cmd.category.as_deref()).or(party.category.clone()),
                ),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                paid_minor: ActiveValue::Set(cmd.paid_minor),
                manual_bill_no: ActiveValue::Set(manual_bill_no),
                auto_bill_no: ActiveValue::Set(auto_bill_no),
                invoice_id: ActiveValue::Set(invoice_id),
                photo_path: ActiveValue::Set(normalize_optional(cmd.photo_path.as_deref())),
                date_posted: ActiveValue::Set(Utc::now()),
                created_by: ActiveValue::Set(cmd.actor.username.clone()),
            }
            .insert(&db_tx)
            .await?;
            let item_models = insert_sale_items(&db_tx, model.id, &items).await?;
            let sale = DirectSale::from_parts(model, item_models);

            self.insert_sale_movements(&db_tx, &sale, &party, self.today(), &cmd.actor)
                .await?;
            if cmd.has_bill {
                self.sync_sale_receivable(&db_tx, None, sale_receivable(&sale, &party, &cmd.actor))
                    .await?;
            }

            info!(
                bill_no = %sale.auto_bill_no,
                customer = %sale.client_name,
                cash = sale.is_cash(),
                outstanding = sale.outstanding_minor(),
                "direct sale added"
            );
            Ok(sale)
        })
    }

    /// Replace a direct sale's fields, items and movements, then re-sync its
    /// receivable and invoice.
    pub async fn edit_direct_sale(&self, sale_id: i32, cmd: DirectSaleCmd) -> ResultEngine<DirectSale> {
        let items = clean_items(&cmd.items)?;
        if items.is_empty() {
            return Err(EngineError::InvalidInput(
                "a sale needs at least one item".to_string(),
            ));
        }
        validate_amounts(cmd.amount_minor, cmd.paid_minor)?;
        with_tx!(self, |db_tx| {
            let current = direct_sales::Entity::find_by_id(sale_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("direct sale {sale_id}")))?;
            let party = self.resolve_sale_party(&db_tx, &cmd.customer).await?;
            let manual_bill_no = normalize_optional(cmd.manual_bill_no.as_deref());
            if party.require_manual_invoice && manual_bill_no.is_none() {
                return Err(EngineError::PolicyViolation(format!(
                    "manual invoice required for client {}",
                    party.receivable_code()
                )));
            }
            let items = self.canonical_items(&db_tx, items).await?;

            let sale_date = entry::Entity::find()
                .filter(entry::Column::AutoBillNo.eq(current.auto_bill_no.clone()))
                .order_by_asc(entry::Column::Id)
                .one(&db_tx)
                .await?
                .map_or_else(
                    || current.date_posted.with_timezone(&Local).date_naive(),
                    |e| e.date,
                );
            let removed = entry::Entity::delete_many()
                .filter(entry::Column::AutoBillNo.eq(current.auto_bill_no.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            direct_sale_items::Entity::delete_many()
                .filter(direct_sale_items::Column::SaleId.eq(sale_id))
                .exec(&db_tx)
                .await?;

            let mut model = direct_sales::ActiveModel {
                id: ActiveValue::Set(sale_id),
                client_code: ActiveValue::Set(party.code.clone()),
                client_name: ActiveValue::Set(party.name.clone()),
                category: ActiveValue::Set(
                    normalize_optional(cmd.category.as_deref()).or(party.category.clone()),
                ),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                paid_minor: ActiveValue::Set(cmd.paid_minor),
                manual_bill_no: ActiveValue::Set(manual_bill_no),
                ..Default::default()
            };
            if let Some(photo) = normalize_optional(cmd.photo_path.as_deref()) {
                model.photo_path = ActiveValue::Set(Some(photo));
            }
            let model = model.update(&db_tx).await?;
            let item_models = insert_sale_items(&db_tx, sale_id, &items).await?;
            let sale = DirectSale::from_parts(model, item_models);
            self.insert_sale_movements(&db_tx, &sale, &party, sale_date, &cmd.actor)
                .await?;

            let previous_code = current.client_code.as_deref().unwrap_or(CASH_CLIENT_CODE);
            let previous_bill_no = crate::bookings::effective_bill_no(
                current.manual_bill_no.as_deref(),
                &current.auto_bill_no,
            );
            if cmd.has_bill {
                self.sync_sale_receivable(
                    &db_tx,
                    Some(PreviousReceivable {
                        bill_no: previous_bill_no,
                        client_code: previous_code,
                    }),
                    sale_receivable(&sale, &party, &cmd.actor),
                )
                .await?;
            } else {
                pending_bills::Entity::delete_many()
                    .filter(pending_bills::Column::BillNo.eq(previous_bill_no))
                    .filter(pending_bills::Column::ClientCode.eq(previous_code))
                    .exec(&db_tx)
                    .await?;
            }
            if let Some(invoice_id) = sale.invoice_id {
                self.refresh_invoice(&db_tx, invoice_id, sale.amount_minor, sale.outstanding_minor())
                    .await?;
            }

            info!(sale_id, bill_no = %sale.auto_bill_no, replaced_movements = removed, "direct sale edited");
            Ok(sale)
        })
    }

    /// Record a payment and settle the client's open receivables with it.
    pub async fn add_payment(&self, cmd: PaymentCmd) -> ResultEngine<PaymentReceipt> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidInput(
                "payment amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let client = self.require_client(&db_tx, &cmd.client).await?;
            let auto_bill_no = self.allocate_bill_number(&db_tx).await?;
            let manual_bill_no = normalize_optional(cmd.manual_bill_no.as_deref());

            let model = payments::ActiveModel {
                id: ActiveValue::NotSet,
                client_code: ActiveValue::Set(Some(client.code.clone())),
                client_name: ActiveValue::Set(client.name.clone()),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                method: ActiveValue::Set(normalize_optional(cmd.method.as_deref())),
                manual_bill_no: ActiveValue::Set(manual_bill_no.clone()),
                auto_bill_no: ActiveValue::Set(auto_bill_no),
                photo_path: ActiveValue::Set(normalize_optional(cmd.photo_path.as_deref())),
                date_posted: ActiveValue::Set(Utc::now()),
                created_by: ActiveValue::Set(cmd.actor.username.clone()),
            }
            .insert(&db_tx)
            .await?;

            let applications = self
                .apply_payment_in(&db_tx, &client, cmd.amount_minor, manual_bill_no.as_deref())
                .await?;
            info!(bill_no = %model.auto_bill_no, client = %client.code, "payment added");
            Ok(PaymentReceipt {
                payment: Payment::from(model),
                applications,
            })
        })
    }

    /// Update a payment record. Receivables already settled by it are left
    /// as they are.
    pub async fn edit_payment(&self, payment_id: i32, cmd: PaymentCmd) -> ResultEngine<Payment> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidInput(
                "payment amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            payments::Entity::find_by_id(payment_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("payment {payment_id}")))?;
            let client = self.require_client(&db_tx, &cmd.client).await?;

            let mut model = payments::ActiveModel {
                id: ActiveValue::Set(payment_id),
                client_code: ActiveValue::Set(Some(client.code)),
                client_name: ActiveValue::Set(client.name),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                method: ActiveValue::Set(normalize_optional(cmd.method.as_deref())),
                manual_bill_no: ActiveValue::Set(normalize_optional(cmd.manual_bill_no.as_deref())),
                ..Default::default()
            };
            if let Some(photo) = normalize_optional(cmd.photo_path.as_deref()) {
                model.photo_path = ActiveValue::Set(Some(photo));
            }
            let model = model.update(&db_tx).await?;
            warn!(payment_id, "payment edited; settled receivables are not recomputed");
            Ok(Payment::from(model))
        })
    }

    /// Record a goods receipt note.
    pub async fn add_grn(&self, cmd: GrnCmd) -> ResultEngine<Grn> {
        let items = clean_items(&cmd.items)?;
        with_tx!(self, |db_tx| {
            let auto_bill_no = self.allocate_bill_number(&db_tx).await?;
            let model = grns::ActiveModel {
                id: ActiveValue::NotSet,
                supplier: ActiveValue::Set(normalize_optional(cmd.supplier.as_deref())),
                manual_bill_no: ActiveValue::Set(normalize_optional(cmd.manual_bill_no.as_deref())),
                auto_bill_no: ActiveValue::Set(auto_bill_no),
                photo_path: ActiveValue::Set(normalize_optional(cmd.photo_path.as_deref())),
                date_posted: ActiveValue::Set(Utc::now()),
                created_by: ActiveValue::Set(cmd.actor.username.clone()),
            }
            .insert(&db_tx)
            .await?;
            let item_models = insert_grn_items(&db_tx, model.id, &items).await?;
            info!(bill_no = %model.auto_bill_no, "goods receipt added");
            Ok(Grn::from_parts(model, item_models))
        })
    }

    /// Replace a goods receipt note's fields and items.
    pub async fn edit_grn(&self, grn_id: i32, cmd: GrnCmd) -> ResultEngine<Grn> {
        let items = clean_items(&cmd.items)?;
        with_tx!(self, |db_tx| {
            grns::Entity::find_by_id(grn_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("grn {grn_id}")))?;
            let mut model = grns::ActiveModel {
                id: ActiveValue::Set(grn_id),
                supplier: ActiveValue::Set(normalize_optional(cmd.supplier.as_deref())),
                manual_bill_no: ActiveValue::Set(normalize_optional(cmd.manual_bill_no.as_deref())),
                ..Default::default()
            };
            if let Some(photo) = normalize_optional(cmd.photo_path.as_deref()) {
                model.photo_path = ActiveValue::Set(Some(photo));
            }
            let model = model.update(&db_tx).await?;
            grn_items::Entity::delete_many()
                .filter(grn_items::Column::GrnId.eq(grn_id))
                .exec(&db_tx)
                .await?;
            let item_models = insert_grn_items(&db_tx, grn_id, &items).await?;
            info!(grn_id, "goods receipt edited");
            Ok(Grn::from_parts(model, item_models))
        })
    }

    pub async fn bill(&self, bill: BillRef) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| self.load_bill(&db_tx, bill).await)
    }

    /// Look a transaction up by its generated bill number, with or without
    /// the leading `#`.
    pub async fn find_bill(&self, bill_no: &str) -> ResultEngine<Option<Bill>> {
        let number = strip_bill_prefix(bill_no);
        if number.is_empty() {
            return Ok(None);
        }
        let search = format!("#{number}");
        with_tx!(self, |db_tx| {
            let found = if let Some(m) = bookings::Entity::find()
                .filter(bookings::Column::AutoBillNo.eq(search.clone()))
                .one(&db_tx)
                .await?
            {
                Some(BillRef::Booking(m.id))
            } else if let Some(m) = payments::Entity::find()
                .filter(payments::Column::AutoBillNo.eq(search.clone()))
                .one(&db_tx)
                .await?
            {
                Some(BillRef::Payment(m.id))
            } else if let Some(m) = grns::Entity::find()
                .filter(grns::Column::AutoBillNo.eq(search.clone()))
                .one(&db_tx)
                .await?
            {
                Some(BillRef::Grn(m.id))
            } else {
                direct_sales::Entity::find()
                    .filter(direct_sales::Column::AutoBillNo.eq(search.clone()))
                    .one(&db_tx)
                    .await?
                    .map(|m| BillRef::DirectSale(m.id))
            };
            match found {
                Some(bill) => Ok(Some(self.load_bill(&db_tx, bill).await?)),
                None => Ok(None),
            }
        })
    }

    /// Delete a transaction. Admin only.
    ///
    /// Line items go with their header; a direct sale also takes its stock
    /// movements and its receivable along.
    pub async fn delete_bill(&self, bill: BillRef, actor: &Actor) -> ResultEngine<()> {
        if !actor.is_admin() {
            warn!(user = %actor.username, ?bill, "bill deletion rejected");
            return Err(EngineError::PolicyViolation(
                "only admins can delete bills".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let loaded = self.load_bill(&db_tx, bill).await?;
            match &loaded {
                Bill::Booking(booking) => {
                    booking_items::Entity::delete_many()
                        .filter(booking_items::Column::BookingId.eq(booking.id))
                        .exec(&db_tx)
                        .await?;
                    bookings::Entity::delete_by_id(booking.id).exec(&db_tx).await?;
                }
                Bill::Payment(payment) => {
                    payments::Entity::delete_by_id(payment.id).exec(&db_tx).await?;
                }
                Bill::Grn(grn) => {
                    grn_items::Entity::delete_many()
                        .filter(grn_items::Column::GrnId.eq(grn.id))
                        .exec(&db_tx)
                        .await?;
                    grns::Entity::delete_by_id(grn.id).exec(&db_tx).await?;
                }
                Bill::DirectSale(sale) => {
                    entry::Entity::delete_many()
                        .filter(entry::Column::AutoBillNo.eq(sale.auto_bill_no.clone()))
                        .exec(&db_tx)
                        .await?;
                    pending_bills::Entity::delete_many()
                        .filter(pending_bills::Column::BillNo.eq(sale.effective_bill_no()))
                        .filter(
                            pending_bills::Column::ClientCode
                                .eq(sale.client_code.as_deref().unwrap_or(CASH_CLIENT_CODE)),
                        )
                        .exec(&db_tx)
                        .await?;
                    direct_sale_items::Entity::delete_many()
                        .filter(direct_sale_items::Column::SaleId.eq(sale.id))
                        .exec(&db_tx)
                        .await?;
                    direct_sales::Entity::delete_by_id(sale.id).exec(&db_tx).await?;
                }
            }
            info!(?bill, bill_no = %loaded.auto_bill_no(), user = %actor.username, "bill deleted");
            Ok(())
        })
    }

    pub(super) async fn load_bill(
        &self,
        db_tx: &DatabaseTransaction,
        bill: BillRef,
    ) -> ResultEngine<Bill> {
        let missing = || EngineError::NotFound(format!("{} {}", bill.kind().as_str(), bill.id()));
        Ok(match bill {
            BillRef::Booking(id) => {
                let model = bookings::Entity::find_by_id(id)
                    .one(db_tx)
                    .await?
                    .ok_or_else(missing)?;
                let items = model
                    .find_related(booking_items::Entity)
                    .order_by_asc(booking_items::Column::Id)
                    .all(db_tx)
                    .await?;
                Bill::Booking(Booking::from_parts(model, items))
            }
            BillRef::Payment(id) => {
                let model = payments::Entity::find_by_id(id)
                    .one(db_tx)
                    .await?
                    .ok_or_else(missing)?;
                Bill::Payment(Payment::from(model))
            }
            BillRef::Grn(id) => {
                let model = grns::Entity::find_by_id(id)
                    .one(db_tx)
                    .await?
                    .ok_or_else(missing)?;
                let items = model
                    .find_related(grn_items::Entity)
                    .order_by_asc(grn_items::Column::Id)
                    .all(db_tx)
                    .await?;
                Bill::Grn(Grn::from_parts(model, items))
            }
            BillRef::DirectSale(id) => {
                let model = direct_sales::Entity::find_by_id(id)
                    .one(db_tx)
                    .await?
                    .ok_or_else(missing)?;
                let items = model
                    .find_related(direct_sale_items::Entity)
                    .order_by_asc(direct_sale_items::Column::Id)
                    .all(db_tx)
                    .await?;
                Bill::DirectSale(DirectSale::from_parts(model, items))
            }
        })
    }

    async fn resolve_sale_party(
        &self,
        db_tx: &DatabaseTransaction,
        customer: &SaleCustomer,
    ) -> ResultEngine<SaleParty> {
        match customer {
            SaleCustomer::Registered(key) => {
                let client: clients::Model = self.require_client(db_tx, key).await?;
                if !client.is_active {
                    return Err(EngineError::PolicyViolation(format!(
                        "client {} was transferred and cannot buy",
                        client.code
                    )));
                }
                Ok(SaleParty {
                    code: Some(client.code),
                    name: client.name,
                    category: Some(client.category),
                    require_manual_invoice: client.require_manual_invoice,
                })
            }
            SaleCustomer::Cash { name } => Ok(SaleParty {
                code: None,
                name: normalize_required(name, "customer name")?,
                category: Some("Cash".to_string()),
                require_manual_invoice: false,
            }),
        }
    }

    /// Replace item names by the registered material names.
    async fn canonical_items(
        &self,
        db_tx: &DatabaseTransaction,
        items: Vec<LineItem>,
    ) -> ResultEngine<Vec<LineItem>> {
        let mut canonical = Vec::with_capacity(items.len());
        for item in items {
            let material = self.require_material(db_tx, &item.name).await?;
            canonical.push(LineItem::new(material.name, item.qty, item.price_minor));
        }
        Ok(canonical)
    }

    async fn insert_sale_movements(
        &self,
        db_tx: &DatabaseTransaction,
        sale: &DirectSale,
        party: &SaleParty,
        date: NaiveDate,
        actor: &Actor,
    ) -> ResultEngine<()> {
        let time = now_time();
        for item in &sale.items {
            entry::ActiveModel {
                id: ActiveValue::NotSet,
                date: ActiveValue::Set(date),
                time: ActiveValue::Set(time),
                kind: ActiveValue::Set(MovementKind::Out.as_str().to_string()),
                material: ActiveValue::Set(item.name.clone()),
                client: ActiveValue::Set(Some(party.name.clone())),
                client_code: ActiveValue::Set(party.code.clone()),
                client_category: ActiveValue::Set(party.category.clone()),
                qty: ActiveValue::Set(item.qty),
                bill_no: ActiveValue::Set(Some(sale.effective_bill_no().to_string())),
                auto_bill_no: ActiveValue::Set(Some(sale.auto_bill_no.clone())),
                nimbus_no: ActiveValue::Set(None),
                invoice_id: ActiveValue::Set(sale.invoice_id),
                created_by: ActiveValue::Set(actor.username.clone()),
            }
            .insert(db_tx)
            .await?;
        }
        Ok(())
    }

    /// Bring the receivable of a booking or sale in line with its unpaid
    /// amount, following it to a new bill number or client first.
    async fn sync_sale_receivable(
        &self,
        db_tx: &DatabaseTransaction,
        previous: Option<PreviousReceivable<'_>>,
        draft: ReceivableDraft<'_>,
    ) -> ResultEngine<()> {
        if let Some(previous) = previous
            && (previous.bill_no != draft.bill_no || previous.client_code != draft.client_code)
        {
            self.repoint_receivables(
                db_tx,
                previous.bill_no,
                previous.client_code,
                ReceivableKey {
                    bill_no: draft.bill_no,
                    client_code: draft.client_code,
                    client_name: draft.client_name,
                },
            )
            .await?;
        }

        if draft.amount_minor > 0 {
            self.upsert_receivable(db_tx, draft).await?;
        } else {
            self.settle_receivable(db_tx, draft.bill_no, draft.client_code)
                .await?;
        }
        Ok(())
    }
}

fn sale_receivable<'a>(
    sale: &'a DirectSale,
    party: &'a SaleParty,
    actor: &'a Actor,
) -> ReceivableDraft<'a> {
    ReceivableDraft {
        client_code: party.receivable_code(),
        client_name: &party.name,
        bill_no: sale.effective_bill_no(),
        amount_minor: sale.outstanding_minor(),
        reason: first_item_reason("Direct sale", &sale.items),
        nimbus_no: None,
        photo_url: sale.photo_path.clone(),
        is_cash: sale.is_cash(),
        created_by: &actor.username,
    }
}

async fn insert_booking_items(
    db_tx: &DatabaseTransaction,
    booking_id: i32,
    items: &[LineItem],
) -> ResultEngine<Vec<booking_items::Model>> {
    let mut models = Vec::with_capacity(items.len());
    for item in items {
        models.push(
            booking_items::ActiveModel {
                id: ActiveValue::NotSet,
                booking_id: ActiveValue::Set(booking_id),
                material_name: ActiveValue::Set(item.name.clone()),
                qty: ActiveValue::Set(item.qty),
                price_minor: ActiveValue::Set(item.price_minor),
            }
            .insert(db_tx)
            .await?,
        );
    }
    Ok(models)
}

async fn insert_sale_items(
    db_tx: &DatabaseTransaction,
    sale_id: i32,
    items: &[LineItem],
) -> ResultEngine<Vec<direct_sale_items::Model>> {
    let mut models = Vec::with_capacity(items.len());
    for item in items {
        models.push(
            direct_sale_items::ActiveModel {
                id: ActiveValue::NotSet,
                sale_id: ActiveValue::Set(sale_id),
                product_name: ActiveValue::Set(item.name.clone()),
                qty: ActiveValue::Set(item.qty),
                price_minor: ActiveValue::Set(item.price_minor),
            }
            .insert(db_tx)
            .await?,
        );
    }
    Ok(models)
}

async fn insert_grn_items(
    db_tx: &DatabaseTransaction,
    grn_id: i32,
    items: &[LineItem],
) -> ResultEngine<Vec<grn_items::Model>> {
    let mut models = Vec::with_capacity(items.len());
    for item in items {
        models.push(
            grn_items::ActiveModel {
                id: ActiveValue::NotSet,
                grn_id: ActiveValue::Set(grn_id),
                mat_name: ActiveValue::Set(item.name.clone()),
                qty: ActiveValue::Set(item.qty),
                price_minor: ActiveValue::Set(item.price_minor),
            }
            .insert(db_tx)
            .await?,
        );
    }
    Ok(models)
}
