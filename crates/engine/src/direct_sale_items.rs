use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "direct_sale_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sale_id: i32,
    pub product_name: String,
    pub qty: f64,
    pub price_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::direct_sales::Entity",
        from = "Column::SaleId",
        to = "super::direct_sales::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    DirectSales,
}

impl Related<super::direct_sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DirectSales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
