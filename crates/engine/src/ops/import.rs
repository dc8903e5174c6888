use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tracing::{debug, info};

use crate::{
    Actor, ImportSummary, PendingBill, PendingBillRow, ResultEngine,
    clients::{self, DEFAULT_CATEGORY},
    import::{CleanRow, clean_row},
    pending_bills,
};

use super::{Engine, receivables::ReceivableDraft, with_tx};

impl Engine {
    /// Load receivables from spreadsheet rows.
    ///
    /// Rows without a usable bill number are skipped. Clients are matched by
    /// code, then by name, and created when neither matches. Each surviving
    /// row is upserted, so re-importing a file updates amounts in place.
    pub async fn import_pending_bills(
        &self,
        rows: Vec<PendingBillRow>,
        actor: &Actor,
    ) -> ResultEngine<ImportSummary> {
        with_tx!(self, |db_tx| {
            let mut summary = ImportSummary::default();
            for row in &rows {
                let Some(row) = clean_row(row) else {
                    summary.skipped += 1;
                    continue;
                };
                let (client, created) = self.import_client(&db_tx, &row).await?;
                if created {
                    summary.clients_created += 1;
                }
                self.upsert_receivable(
                    &db_tx,
                    ReceivableDraft {
                        client_code: &client.code,
                        client_name: &client.name,
                        bill_no: &row.bill_no,
                        amount_minor: row.amount_minor,
                        reason: row.reason.clone(),
                        nimbus_no: row.nimbus_no.clone(),
                        photo_url: None,
                        is_cash: false,
                        created_by: &actor.username,
                    },
                )
                .await?;
                summary.imported += 1;
            }
            info!(
                imported = summary.imported,
                skipped = summary.skipped,
                clients_created = summary.clients_created,
                "pending bills imported"
            );
            Ok(summary)
        })
    }

    /// All receivables, paid ones included, in the import row shape.
    pub async fn export_pending_bills(&self) -> ResultEngine<Vec<PendingBillRow>> {
        with_tx!(self, |db_tx| {
            let models = pending_bills::Entity::find()
                .order_by_asc(pending_bills::Column::ClientCode)
                .order_by_asc(pending_bills::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models
                .into_iter()
                .map(PendingBill::from)
                .map(|bill| PendingBillRow::from(&bill))
                .collect())
        })
    }

    async fn import_client(
        &self,
        db_tx: &DatabaseTransaction,
        row: &CleanRow,
    ) -> ResultEngine<(clients::Model, bool)> {
        if let Some(code) = row.client_code.as_deref()
            && let Some(client) = self.find_client_by_code(db_tx, code).await?
        {
            return Ok((client, false));
        }
        if row.has_lookup_name()
            && let Some(client) = clients::Entity::find()
                .filter(clients::Column::Name.eq(row.client_name.clone()))
                .order_by_asc(clients::Column::Id)
                .one(db_tx)
                .await?
        {
            return Ok((client, false));
        }

        let code = match row.client_code.clone() {
            Some(code) => code,
            None => self.generate_client_code(db_tx).await?,
        };
        let client = clients::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(row.client_name.clone()),
            code: ActiveValue::Set(code),
            phone: ActiveValue::Set(None),
            address: ActiveValue::Set(None),
            category: ActiveValue::Set(DEFAULT_CATEGORY.to_string()),
            is_active: ActiveValue::Set(true),
            require_manual_invoice: ActiveValue::Set(false),
            transferred_to_id: ActiveValue::Set(None),
        }
        .insert(db_tx)
        .await?;
        debug!(code = %client.code, name = %client.name, "client created by import");
        Ok((client, true))
    }
}
