//! The module contains `Invoice` struct, its status and its entity.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::EngineError;

/// Lifecycle of an invoice, derived from how much of it is still owed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Open,
    Partial,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Open => "OPEN",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    /// Status implied by a total and the balance still due.
    pub fn from_amounts(total_minor: i64, balance_minor: i64) -> Self {
        if balance_minor <= 0 {
            return InvoiceStatus::Paid;
        }
        let paid_minor = total_minor - balance_minor;
        if paid_minor > 0 {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Open
        }
    }
}

impl TryFrom<&str> for InvoiceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "OPEN" => Ok(InvoiceStatus::Open),
            "PARTIAL" => Ok(InvoiceStatus::Partial),
            "PAID" => Ok(InvoiceStatus::Paid),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid invoice status: {other}"
            ))),
        }
    }
}

/// A numbered invoice. `invoice_no` is unique across the whole ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub id: i32,
    pub client_code: String,
    pub client_name: String,
    pub invoice_no: String,
    pub is_manual: bool,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_minor: i64,
    pub balance_minor: i64,
    pub status: InvoiceStatus,
    pub is_cash: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_code: String,
    pub client_name: String,
    #[sea_orm(unique)]
    pub invoice_no: String,
    pub is_manual: bool,
    pub date: Date,
    pub due_date: Option<Date>,
    pub total_minor: i64,
    pub balance_minor: i64,
    pub status: String,
    pub is_cash: bool,
    pub created_at: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entry::Entity")]
    Entries,
}

impl Related<super::entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Invoice {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            status: InvoiceStatus::try_from(model.status.as_str())?,
            client_code: model.client_code,
            client_name: model.client_name,
            invoice_no: model.invoice_no,
            is_manual: model.is_manual,
            date: model.date,
            due_date: model.due_date,
            total_minor: model.total_minor,
            balance_minor: model.balance_minor,
            is_cash: model.is_cash,
            created_at: model.created_at,
            created_by: model.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_amounts() {
        assert_eq!(InvoiceStatus::from_amounts(1000, 1000), InvoiceStatus::Open);
        assert_eq!(InvoiceStatus::from_amounts(1000, 400), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::from_amounts(1000, 0), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::from_amounts(0, 0), InvoiceStatus::Paid);
    }

    #[test]
    fn status_round_trips_through_storage() {
        for status in [
            InvoiceStatus::Open,
            InvoiceStatus::Partial,
            InvoiceStatus::Paid,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(InvoiceStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(InvoiceStatus::try_from("VOID").is_err());
    }
}
