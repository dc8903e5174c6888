//! The module contains `Material` struct and its entity.

use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A stock-keeping unit. Movements reference it by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Material {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub unit_price_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub unit_price_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Material {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            unit_price_minor: model.unit_price_minor,
        }
    }
}
