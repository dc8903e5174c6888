//! The module contains `Client` struct and its entity.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;

pub(crate) const DEFAULT_CATEGORY: &str = "General";

/// A customer account.
///
/// The `code` is the stable business key other records point to; the name
/// is only a display label (and a fallback key for legacy rows). A client is
/// either active or has been merged into another client through
/// [`transferred_to_id`](Client::transferred_to_id).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub require_manual_invoice: bool,
    pub transferred_to_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub require_manual_invoice: bool,
    pub transferred_to_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::TransferredToId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    TransferredTo,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Client {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            phone: model.phone,
            address: model.address,
            category: model.category,
            is_active: model.is_active,
            require_manual_invoice: model.require_manual_invoice,
            transferred_to_id: model.transferred_to_id,
        }
    }
}
