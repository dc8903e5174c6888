//! The module contains `Booking`, an advance order for materials.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{LineItem, booking_items};

/// An order taken before dispatch. Dispatching a material to a client
/// requires a booking of that material for that client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Booking {
    pub id: i32,
    pub client_code: Option<String>,
    pub client_name: String,
    pub location: Option<String>,
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

impl Booking {
    /// Manual bill number when one was given, otherwise the generated one.
    pub fn effective_bill_no(&self) -> &str {
        effective_bill_no(self.manual_bill_no.as_deref(), &self.auto_bill_no)
    }

    pub fn outstanding_minor(&self) -> i64 {
        (self.amount_minor - self.paid_minor).max(0)
    }

    pub(crate) fn from_parts(model: Model, items: Vec<booking_items::Model>) -> Self {
        Self {
            id: model.id,
            client_code: model.client_code,
            client_name: model.client_name,
            location: model.location,
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
                    name: item.material_name,
                    qty: item.qty,
                    price_minor: item.price_minor,
                })
                .collect(),
        }
    }
}

pub(crate) fn effective_bill_no<'a>(manual: Option<&'a str>, auto: &'a str) -> &'a str {
    match manual.map(str::trim) {
        Some(manual) if !manual.is_empty() => manual,
        _ => auto,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_code: Option<String>,
    pub client_name: String,
    pub location: Option<String>,
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
    #[sea_orm(has_many = "super::booking_items::Entity")]
    Items,
}

impl Related<super::booking_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
