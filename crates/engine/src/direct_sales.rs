//! The module contains `DirectSale`, a counter sale that moves stock and
//! money in one step.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{LineItem, bookings::effective_bill_no, direct_sale_items};

/// A sale to a registered client or to a walk-in cash customer
/// (`client_code` is `None`). Every item also exists as an `OUT` movement
/// whose `auto_bill_no` equals the sale's.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectSale {
    pub id: i32,
    pub client_code: Option<String>,
    pub client_name: String,
    pub category: Option<String>,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub manual_bill_no: Option<String>,
    pub auto_bill_no: String,
    pub invoice_id: Option<i32>,
    pub photo_path: Option<String>,
    pub date_posted: DateTime<Utc>,
    pub created_by: String,
    pub items: Vec<LineItem>,
}

impl DirectSale {
    pub fn effective_bill_no(&self) -> &str {
        effective_bill_no(self.manual_bill_no.as_deref(), &self.auto_bill_no)
    }

    pub fn outstanding_minor(&self) -> i64 {
        (self.amount_minor - self.paid_minor).max(0)
    }

    pub fn is_cash(&self) -> bool {
        self.client_code.is_none()
    }

    pub(crate) fn from_parts(model: Model, items: Vec<direct_sale_items::Model>) -> Self {
        Self {
            id: model.id,
            client_code: model.client_code,
            client_name: model.client_name,
            category: model.category,
            amount_minor: model.amount_minor,
            paid_minor: model.paid_minor,
            manual_bill_no: model.manual_bill_no,
            auto_bill_no: model.auto_bill_no,
            invoice_id: model.invoice_id,
            photo_path: model.photo_path,
            date_posted: model.date_posted,
            created_by: model.created_by,
            items: items
                .into_iter()
                .map(|item| LineItem {
                    name: item.product_name,
                    qty: item.qty,
                    price_minor: item.price_minor,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "direct_sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_code: Option<String>,
    pub client_name: String,
    pub category: Option<String>,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub manual_bill_no: Option<String>,
    pub auto_bill_no: String,
    pub invoice_id: Option<i32>,
    pub photo_path: Option<String>,
    pub date_posted: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::direct_sale_items::Entity")]
    Items,
}

impl Related<super::direct_sale_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
