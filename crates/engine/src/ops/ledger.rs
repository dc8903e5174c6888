use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Booking, Client, ClientLedger, DirectSale, Entry, Grn, MaterialDelivery, MaterialLedgerLine,
    MovementKind, Payment, PendingBill, ResultEngine, booking_items, bookings, clients,
    direct_sale_items, direct_sales, entry, grn_items, grns,
    ledger::{financial_lines, material_ledger_lines, merge_deliveries},
    payments, pending_bills,
};

use super::{Engine, owned_by, with_tx};

impl Engine {
    /// Everything known about a client: receivables, money history and
    /// material history.
    pub async fn client_ledger(&self, client_id: i32) -> ResultEngine<ClientLedger> {
        with_tx!(self, |db_tx| {
            let client = self.require_client_by_id(&db_tx, client_id).await?;

            let pending: Vec<PendingBill> = pending_bills::Entity::find()
                .filter(pending_bills::Column::ClientCode.eq(client.code.clone()))
                .order_by_asc(pending_bills::Column::CreatedAt)
                .order_by_asc(pending_bills::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(PendingBill::from)
                .collect();
            let outstanding_minor = pending
                .iter()
                .filter(|bill| !bill.is_paid)
                .map(|bill| bill.amount_minor)
                .sum();

            let booked = client_bookings(&db_tx, &client).await?;
            let paid: Vec<Payment> = payments::Entity::find()
                .filter(owned_by(
                    payments::Column::ClientCode,
                    payments::Column::ClientName,
                    &client,
                ))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Payment::from)
                .collect();
            let sales = client_sales(&db_tx, &client).await?;
            let entries = client_dispatches(&db_tx, &client).await?;

            Ok(ClientLedger {
                financial: financial_lines(&booked, &paid, &sales),
                deliveries: merge_deliveries(&entries, &sales),
                client: Client::from(client),
                pending_bills: pending,
                outstanding_minor,
            })
        })
    }

    /// Material delivered to a client, from dispatches and direct sales,
    /// newest first.
    pub async fn client_material_history(
        &self,
        client_id: i32,
    ) -> ResultEngine<Vec<MaterialDelivery>> {
        with_tx!(self, |db_tx| {
            let client = self.require_client_by_id(&db_tx, client_id).await?;
            let entries = client_dispatches(&db_tx, &client).await?;
            let sales = client_sales(&db_tx, &client).await?;
            Ok(merge_deliveries(&entries, &sales))
        })
    }

    /// Goods received and sold directly for one material, with the running
    /// balance.
    pub async fn material_ledger(&self, material_id: i32) -> ResultEngine<Vec<MaterialLedgerLine>> {
        with_tx!(self, |db_tx| {
            let material = self.require_material_by_id(&db_tx, material_id).await?;

            let mut receipts = Vec::new();
            for (model, items) in grns::Entity::find()
                .find_with_related(grn_items::Entity)
                .filter(grn_items::Column::MatName.eq(material.name.clone()))
                .order_by_asc(grns::Column::Id)
                .all(&db_tx)
                .await?
            {
                receipts.push(Grn::from_parts(model, items));
            }

            let mut sold = Vec::new();
            for (model, items) in direct_sales::Entity::find()
                .find_with_related(direct_sale_items::Entity)
                .filter(direct_sale_items::Column::ProductName.eq(material.name.clone()))
                .order_by_asc(direct_sales::Column::Id)
                .all(&db_tx)
                .await?
            {
                sold.push(DirectSale::from_parts(model, items));
            }

            Ok(material_ledger_lines(&material.name, &receipts, &sold))
        })
    }
}

async fn client_bookings(
    db_tx: &DatabaseTransaction,
    client: &clients::Model,
) -> ResultEngine<Vec<Booking>> {
    Ok(bookings::Entity::find()
        .filter(owned_by(
            bookings::Column::ClientCode,
            bookings::Column::ClientName,
            client,
        ))
        .find_with_related(booking_items::Entity)
        .order_by_asc(bookings::Column::Id)
        .all(db_tx)
        .await?
        .into_iter()
        .map(|(model, items)| Booking::from_parts(model, items))
        .collect())
}

async fn client_sales(
    db_tx: &DatabaseTransaction,
    client: &clients::Model,
) -> ResultEngine<Vec<DirectSale>> {
    Ok(direct_sales::Entity::find()
        .filter(owned_by(
            direct_sales::Column::ClientCode,
            direct_sales::Column::ClientName,
            client,
        ))
        .find_with_related(direct_sale_items::Entity)
        .order_by_asc(direct_sales::Column::Id)
        .all(db_tx)
        .await?
        .into_iter()
        .map(|(model, items)| DirectSale::from_parts(model, items))
        .collect())
}

async fn client_dispatches(
    db_tx: &DatabaseTransaction,
    client: &clients::Model,
) -> ResultEngine<Vec<Entry>> {
    entry::Entity::find()
        .filter(entry::Column::Kind.eq(MovementKind::Out.as_str()))
        .filter(owned_by(
            entry::Column::ClientCode,
            entry::Column::Client,
            client,
        ))
        .order_by_asc(entry::Column::Date)
        .order_by_asc(entry::Column::Id)
        .all(db_tx)
        .await?
        .into_iter()
        .map(Entry::try_from)
        .collect()
}
