//! The module contains `ReconBasket`, one bill number matched across the
//! finance and inventory sides.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{BillKind, EngineError};

/// Match quality of a basket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReconStatus {
    /// Both sides agree on client and quantity.
    Green,
    /// Both sides exist but disagree.
    Yellow,
    /// One side is missing.
    Red,
    /// Money-only or receivable-only bill, nothing to match stock against.
    Blue,
}

impl ReconStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconStatus::Green => "GREEN",
            ReconStatus::Yellow => "YELLOW",
            ReconStatus::Red => "RED",
            ReconStatus::Blue => "BLUE",
        }
    }
}

impl TryFrom<&str> for ReconStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GREEN" => Ok(ReconStatus::Green),
            "YELLOW" => Ok(ReconStatus::Yellow),
            "RED" => Ok(ReconStatus::Red),
            "BLUE" => Ok(ReconStatus::Blue),
            other => Err(EngineError::InvalidInput(format!(
                "invalid reconciliation status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconBasket {
    pub id: i32,
    pub bill_no: String,
    pub fin_kind: Option<BillKind>,
    pub fin_date: Option<NaiveDate>,
    pub fin_client: Option<String>,
    pub fin_code: Option<String>,
    pub fin_amount_minor: i64,
    pub fin_qty: f64,
    pub inv_date: Option<NaiveDate>,
    pub inv_client: Option<String>,
    pub inv_code: Option<String>,
    pub inv_material: Option<String>,
    pub inv_qty: f64,
    pub status: ReconStatus,
    pub match_score: i32,
    pub created_at: DateTime<Utc>,
}

/// Basket counts per status after a rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    pub blue: usize,
}

impl ReconSummary {
    pub(crate) fn count(&mut self, status: ReconStatus) {
        match status {
            ReconStatus::Green => self.green += 1,
            ReconStatus::Yellow => self.yellow += 1,
            ReconStatus::Red => self.red += 1,
            ReconStatus::Blue => self.blue += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.green + self.yellow + self.red + self.blue
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recon_baskets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bill_no: String,
    pub fin_kind: Option<String>,
    pub fin_date: Option<Date>,
    pub fin_client: Option<String>,
    pub fin_code: Option<String>,
    pub fin_amount_minor: i64,
    pub fin_qty: f64,
    pub inv_date: Option<Date>,
    pub inv_client: Option<String>,
    pub inv_code: Option<String>,
    pub inv_material: Option<String>,
    pub inv_qty: f64,
    pub status: String,
    pub match_score: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ReconBasket {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            fin_kind: model
                .fin_kind
                .as_deref()
                .map(BillKind::try_from)
                .transpose()?,
            status: ReconStatus::try_from(model.status.as_str())?,
            bill_no: model.bill_no,
            fin_date: model.fin_date,
            fin_client: model.fin_client,
            fin_code: model.fin_code,
            fin_amount_minor: model.fin_amount_minor,
            fin_qty: model.fin_qty,
            inv_date: model.inv_date,
            inv_client: model.inv_client,
            inv_code: model.inv_code,
            inv_material: model.inv_material,
            inv_qty: model.inv_qty,
            match_score: model.match_score,
            created_at: model.created_at,
        })
    }
}
