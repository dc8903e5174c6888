//! The module contains `Payment`, money received from a client.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::bookings::effective_bill_no;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub id: i32,
    pub client_code: Option<String>,
    pub client_name: String,
    pub amount_minor: i64,
    pub method: Option<String>,
    pub manual_bill_no: Option<String>,
    pub auto_bill_no: String,
    pub photo_path: Option<String>,
    pub date_posted: DateTime<Utc>,
    pub created_by: String,
}

impl Payment {
    pub fn effective_bill_no(&self) -> &str {
        effective_bill_no(self.manual_bill_no.as_deref(), &self.auto_bill_no)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_code: Option<String>,
    pub client_name: String,
    pub amount_minor: i64,
    pub method: Option<String>,
    pub manual_bill_no: Option<String>,
    pub auto_bill_no: String,
    pub photo_path: Option<String>,
    pub date_posted: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Payment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            client_code: model.client_code,
            client_name: model.client_name,
            amount_minor: model.amount_minor,
            method: model.method,
            manual_bill_no: model.manual_bill_no,
            auto_bill_no: model.auto_bill_no,
            photo_path: model.photo_path,
            date_posted: model.date_posted,
            created_by: model.created_by,
        }
    }
}
