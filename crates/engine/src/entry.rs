//! The module contains `Entry`, a single stock movement.

use chrono::{NaiveDate, NaiveTime};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Direction of a stock movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Material received into stock.
    In,
    /// Material dispatched to a client.
    Out,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::In => "IN",
            MovementKind::Out => "OUT",
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(MovementKind::In),
            "OUT" => Ok(MovementKind::Out),
            other => Err(EngineError::InvalidInput(format!(
                "invalid movement kind: {other}"
            ))),
        }
    }
}

/// A stock movement.
///
/// `client`/`client_code` are copied from the client at write time and kept
/// in sync when the client is renamed, recoded or transferred.
/// `auto_bill_no` is only set on movements generated by a direct sale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    pub id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: MovementKind,
    pub material: String,
    pub client: Option<String>,
    pub client_code: Option<String>,
    pub client_category: Option<String>,
    pub qty: f64,
    pub bill_no: Option<String>,
    pub auto_bill_no: Option<String>,
    pub nimbus_no: Option<String>,
    pub invoice_id: Option<i32>,
    pub created_by: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: Date,
    pub time: Time,
    pub kind: String,
    pub material: String,
    pub client: Option<String>,
    pub client_code: Option<String>,
    pub client_category: Option<String>,
    pub qty: f64,
    pub bill_no: Option<String>,
    pub auto_bill_no: Option<String>,
    pub nimbus_no: Option<String>,
    pub invoice_id: Option<i32>,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            date: model.date,
            time: model.time,
            kind: MovementKind::try_from(model.kind.as_str())?,
            material: model.material,
            client: model.client,
            client_code: model.client_code,
            client_category: model.client_category,
            qty: model.qty,
            bill_no: model.bill_no,
            auto_bill_no: model.auto_bill_no,
            nimbus_no: model.nimbus_no,
            invoice_id: model.invoice_id,
            created_by: model.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(MovementKind::try_from("in").unwrap(), MovementKind::In);
        assert_eq!(MovementKind::try_from(" OUT ").unwrap(), MovementKind::Out);
        assert!(MovementKind::try_from("SIDEWAYS").is_err());
    }
}
