use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Local, NaiveDate, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tracing::info;

use crate::{
    BillKind, Booking, DirectSale, MovementKind, ReconBasket, ReconStatus, ReconSummary,
    ResultEngine, booking_items, bookings, direct_sale_items, direct_sales, entry, payments,
    pending_bills, recon_baskets,
    reconcile::{FinanceSide, InventorySide, classify},
    util::normalize_optional,
};

use super::{Engine, with_tx};

fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

fn fold_finance(sides: &mut BTreeMap<String, FinanceSide>, bill_no: &str, side: FinanceSide) {
    match sides.get_mut(bill_no) {
        Some(existing) => existing.absorb(side),
        None => {
            sides.insert(bill_no.to_string(), side);
        }
    }
}

impl Engine {
    /// Recompute every reconciliation basket from scratch.
    ///
    /// Finance records are folded by effective bill number in the order
    /// bookings, direct sales, payments; the first kind seen names the
    /// basket. Dispatches are folded by their bill number.
    pub async fn rebuild_reconciliation(&self) -> ResultEngine<ReconSummary> {
        with_tx!(self, |db_tx| {
            recon_baskets::Entity::delete_many().exec(&db_tx).await?;

            let mut finance: BTreeMap<String, FinanceSide> = BTreeMap::new();
            for (model, items) in bookings::Entity::find()
                .find_with_related(booking_items::Entity)
                .order_by_asc(bookings::Column::Id)
                .all(&db_tx)
                .await?
            {
                let booking = Booking::from_parts(model, items);
                fold_finance(
                    &mut finance,
                    booking.effective_bill_no(),
                    FinanceSide {
                        kind: BillKind::Booking,
                        date: local_date(booking.date_posted),
                        client: booking.client_name.clone(),
                        code: booking.client_code.clone(),
                        amount_minor: booking.amount_minor,
                        qty: booking.items.iter().map(|i| i.qty).sum(),
                    },
                );
            }
            for (model, items) in direct_sales::Entity::find()
                .find_with_related(direct_sale_items::Entity)
                .order_by_asc(direct_sales::Column::Id)
                .all(&db_tx)
                .await?
            {
                let sale = DirectSale::from_parts(model, items);
                fold_finance(
                    &mut finance,
                    sale.effective_bill_no(),
                    FinanceSide {
                        kind: BillKind::DirectSale,
                        date: local_date(sale.date_posted),
                        client: sale.client_name.clone(),
                        code: sale.client_code.clone(),
                        amount_minor: sale.amount_minor,
                        qty: sale.items.iter().map(|i| i.qty).sum(),
                    },
                );
            }
            for payment in payments::Entity::find()
                .order_by_asc(payments::Column::Id)
                .all(&db_tx)
                .await?
            {
                let bill_no = crate::bookings::effective_bill_no(
                    payment.manual_bill_no.as_deref(),
                    &payment.auto_bill_no,
                )
                .to_string();
                fold_finance(
                    &mut finance,
                    &bill_no,
                    FinanceSide {
                        kind: BillKind::Payment,
                        date: local_date(payment.date_posted),
                        client: payment.client_name,
                        code: payment.client_code,
                        amount_minor: payment.amount_minor,
                        qty: 0.0,
                    },
                );
            }

            let mut inventory: BTreeMap<String, InventorySide> = BTreeMap::new();
            for movement in entry::Entity::find()
                .filter(entry::Column::Kind.eq(MovementKind::Out.as_str()))
                .filter(entry::Column::BillNo.is_not_null())
                .order_by_asc(entry::Column::Id)
                .all(&db_tx)
                .await?
            {
                let Some(bill_no) = normalize_optional(movement.bill_no.as_deref()) else {
                    continue;
                };
                let side = InventorySide {
                    date: movement.date,
                    client: movement.client,
                    code: movement.client_code,
                    materials: vec![movement.material],
                    qty: movement.qty,
                };
                match inventory.get_mut(&bill_no) {
                    Some(existing) => existing.absorb(side),
                    None => {
                        inventory.insert(bill_no, side);
                    }
                }
            }

            let receivables: HashSet<String> = pending_bills::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|bill| bill.bill_no)
                .collect();

            let bill_numbers: BTreeSet<&String> = finance.keys().chain(inventory.keys()).collect();
            let created_at = Utc::now();
            let mut summary = ReconSummary::default();
            for bill_no in bill_numbers {
                let fin = finance.get(bill_no);
                let inv = inventory.get(bill_no);
                let (status, score) = classify(fin, inv, receivables.contains(bill_no));
                summary.count(status);

                recon_baskets::ActiveModel {
                    id: ActiveValue::NotSet,
                    bill_no: ActiveValue::Set(bill_no.clone()),
                    fin_kind: ActiveValue::Set(fin.map(|f| f.kind.as_str().to_string())),
                    fin_date: ActiveValue::Set(fin.map(|f| f.date)),
                    fin_client: ActiveValue::Set(fin.map(|f| f.client.clone())),
                    fin_code: ActiveValue::Set(fin.and_then(|f| f.code.clone())),
                    fin_amount_minor: ActiveValue::Set(fin.map_or(0, |f| f.amount_minor)),
                    fin_qty: ActiveValue::Set(fin.map_or(0.0, |f| f.qty)),
                    inv_date: ActiveValue::Set(inv.map(|i| i.date)),
                    inv_client: ActiveValue::Set(inv.and_then(|i| i.client.clone())),
                    inv_code: ActiveValue::Set(inv.and_then(|i| i.code.clone())),
                    inv_material: ActiveValue::Set(inv.map(InventorySide::material_label)),
                    inv_qty: ActiveValue::Set(inv.map_or(0.0, |i| i.qty)),
                    status: ActiveValue::Set(status.as_str().to_string()),
                    match_score: ActiveValue::Set(score),
                    created_at: ActiveValue::Set(created_at),
                }
                .insert(&db_tx)
                .await?;
            }

            info!(
                green = summary.green,
                yellow = summary.yellow,
                red = summary.red,
                blue = summary.blue,
                "reconciliation rebuilt"
            );
            Ok(summary)
        })
    }

    /// Stored baskets ordered by bill number, optionally of one status.
    pub async fn recon_baskets(&self, status: Option<ReconStatus>) -> ResultEngine<Vec<ReconBasket>> {
        with_tx!(self, |db_tx| {
            let mut query = recon_baskets::Entity::find()
                .order_by_asc(recon_baskets::Column::BillNo)
                .order_by_asc(recon_baskets::Column::Id);
            if let Some(status) = status {
                query = query.filter(recon_baskets::Column::Status.eq(status.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(ReconBasket::try_from)
                .collect()
        })
    }
}
