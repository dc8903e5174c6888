use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::{info, warn};

use crate::{
    AllocateInvoiceCmd, EngineError, Invoice, InvoiceStatus, ResultEngine, invoices,
    pending_bills::CASH_CLIENT_CODE, util::normalize_optional,
};

use super::{Engine, with_tx};

/// Invoice about to be allocated.
pub(super) struct InvoiceDraft<'a> {
    pub candidate_no: Option<String>,
    pub is_manual: bool,
    pub client_code: &'a str,
    pub client_name: &'a str,
    pub total_minor: i64,
    pub balance_minor: i64,
    pub is_cash: bool,
    pub created_by: &'a str,
}

impl Engine {
    /// Issue an invoice for a client.
    ///
    /// A manual number already held by the same client updates that invoice;
    /// held by another client it is a conflict. An auto number that is taken
    /// is replaced by freshly drawn bill numbers until one is free.
    pub async fn allocate_invoice(&self, cmd: AllocateInvoiceCmd) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let (code, name) = if cmd.is_cash {
                (CASH_CLIENT_CODE.to_string(), cmd.client.trim().to_string())
            } else {
                let client = self.require_client(&db_tx, &cmd.client).await?;
                (client.code, client.name)
            };
            let model = self
                .allocate_invoice_in(
                    &db_tx,
                    InvoiceDraft {
                        candidate_no: cmd.candidate_no,
                        is_manual: cmd.is_manual,
                        client_code: &code,
                        client_name: &name,
                        total_minor: cmd.total_minor,
                        balance_minor: cmd.balance_minor,
                        is_cash: cmd.is_cash,
                        created_by: &cmd.actor.username,
                    },
                )
                .await?;
            Invoice::try_from(model)
        })
    }

    pub async fn invoice(&self, invoice_id: i32) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let model = self.require_invoice(&db_tx, invoice_id).await?;
            Invoice::try_from(model)
        })
    }

    /// Invoices of a client, newest first.
    pub async fn client_invoices(&self, client_code: &str) -> ResultEngine<Vec<Invoice>> {
        with_tx!(self, |db_tx| {
            let models = invoices::Entity::find()
                .filter(invoices::Column::ClientCode.eq(client_code.trim()))
                .order_by_desc(invoices::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Invoice::try_from).collect()
        })
    }

    /// Mark an invoice cancelled. Its number stays reserved.
    pub async fn cancel_invoice(&self, invoice_id: i32) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            self.require_invoice(&db_tx, invoice_id).await?;
            let model = invoices::ActiveModel {
                id: ActiveValue::Set(invoice_id),
                status: ActiveValue::Set(InvoiceStatus::Cancelled.as_str().to_string()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            info!(invoice_no = %model.invoice_no, "invoice cancelled");
            Invoice::try_from(model)
        })
    }

    pub(super) async fn allocate_invoice_in(
        &self,
        db_tx: &DatabaseTransaction,
        draft: InvoiceDraft<'_>,
    ) -> ResultEngine<invoices::Model> {
        if draft.total_minor < 0 || draft.balance_minor < 0 {
            return Err(EngineError::InvalidInput(
                "invoice amounts must be >= 0".to_string(),
            ));
        }
        let candidate = normalize_optional(draft.candidate_no.as_deref());
        let mut invoice_no = match candidate {
            Some(no) => no,
            None if draft.is_manual => {
                return Err(EngineError::InvalidInput(
                    "a manual invoice needs a number".to_string(),
                ));
            }
            None => self.allocate_bill_number(db_tx).await?,
        };
        let status = InvoiceStatus::from_amounts(draft.total_minor, draft.balance_minor);

        loop {
            let existing = invoices::Entity::find()
                .filter(invoices::Column::InvoiceNo.eq(invoice_no.clone()))
                .one(db_tx)
                .await?;
            let Some(existing) = existing else {
                break;
            };

            if draft.is_manual {
                if existing.client_code != draft.client_code {
                    warn!(%invoice_no, owner = %existing.client_code, "manual invoice number conflict");
                    return Err(EngineError::InvoiceNumberConflict(invoice_no));
                }
                let model = invoices::ActiveModel {
                    id: ActiveValue::Set(existing.id),
                    client_name: ActiveValue::Set(draft.client_name.to_string()),
                    total_minor: ActiveValue::Set(draft.total_minor),
                    balance_minor: ActiveValue::Set(draft.balance_minor),
                    status: ActiveValue::Set(status.as_str().to_string()),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
                info!(%invoice_no, "manual invoice updated");
                return Ok(model);
            }

            warn!(%invoice_no, "auto invoice number already taken, drawing another");
            invoice_no = self.allocate_bill_number(db_tx).await?;
        }

        let model = invoices::ActiveModel {
            id: ActiveValue::NotSet,
            client_code: ActiveValue::Set(draft.client_code.to_string()),
            client_name: ActiveValue::Set(draft.client_name.to_string()),
            invoice_no: ActiveValue::Set(invoice_no),
            is_manual: ActiveValue::Set(draft.is_manual),
            date: ActiveValue::Set(self.today()),
            due_date: ActiveValue::Set(None),
            total_minor: ActiveValue::Set(draft.total_minor),
            balance_minor: ActiveValue::Set(draft.balance_minor),
            status: ActiveValue::Set(status.as_str().to_string()),
            is_cash: ActiveValue::Set(draft.is_cash),
            created_at: ActiveValue::Set(Utc::now()),
            created_by: ActiveValue::Set(draft.created_by.to_string()),
        }
        .insert(db_tx)
        .await?;
        info!(invoice_no = %model.invoice_no, client = %model.client_code, "invoice issued");
        Ok(model)
    }

    /// Refresh amounts and status of a linked invoice after its source changed.
    pub(super) async fn refresh_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        invoice_id: i32,
        total_minor: i64,
        balance_minor: i64,
    ) -> ResultEngine<()> {
        let invoice = self.require_invoice(db_tx, invoice_id).await?;
        if invoice.status == InvoiceStatus::Cancelled.as_str() {
            return Ok(());
        }
        invoices::ActiveModel {
            id: ActiveValue::Set(invoice_id),
            total_minor: ActiveValue::Set(total_minor),
            balance_minor: ActiveValue::Set(balance_minor),
            status: ActiveValue::Set(
                InvoiceStatus::from_amounts(total_minor, balance_minor)
                    .as_str()
                    .to_string(),
            ),
            ..Default::default()
        }
        .update(db_tx)
        .await?;
        Ok(())
    }

    async fn require_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        invoice_id: i32,
    ) -> ResultEngine<invoices::Model> {
        invoices::Entity::find_by_id(invoice_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("invoice {invoice_id}")))
    }
}
