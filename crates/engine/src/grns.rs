//! The module contains `Grn`, a goods receipt note for incoming material.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{LineItem, bookings::effective_bill_no, grn_items};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Grn {
    pub id: i32,
    pub supplier: Option<String>,
    pub manual_bill_no: Option<String>,
    pub auto_bill_no: String,
    pub photo_path: Option<String>,
    pub date_posted: DateTime<Utc>,
    pub created_by: String,
    pub items: Vec<LineItem>,
}

impl Grn {
    pub fn effective_bill_no(&self) -> &str {
        effective_bill_no(self.manual_bill_no.as_deref(), &self.auto_bill_no)
    }

    pub(crate) fn from_parts(model: Model, items: Vec<grn_items::Model>) -> Self {
        Self {
            id: model.id,
            supplier: model.supplier,
            manual_bill_no: model.manual_bill_no,
            auto_bill_no: model.auto_bill_no,
            photo_path: model.photo_path,
            date_posted: model.date_posted,
            created_by: model.created_by,
            items: items
                .into_iter()
                .map(|item| LineItem {
                    name: item.mat_name,
                    qty: item.qty,
                    price_minor: item.price_minor,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "grns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub supplier: Option<String>,
    pub manual_bill_no: Option<String>,
    pub auto_bill_no: String,
    pub photo_path: Option<String>,
    pub date_posted: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::grn_items::Entity")]
    Items,
}

impl Related<super::grn_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
