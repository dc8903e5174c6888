use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grn_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub grn_id: i32,
    pub mat_name: String,
    pub qty: f64,
    pub price_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grns::Entity",
        from = "Column::GrnId",
        to = "super::grns::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Grns,
}

impl Related<super::grns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
