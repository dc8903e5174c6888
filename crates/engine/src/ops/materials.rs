use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::info;

use crate::{
    EngineError, Material, ResultEngine, entry, materials,
    util::{MATERIAL_CODE_PREFIX, next_material_code, normalize_optional, normalize_required},
};

use super::{Engine, with_tx};

/// Replacement values for a material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialUpdate {
    pub name: String,
    pub code: String,
    pub unit_price_minor: i64,
}

impl Engine {
    /// Register a material. A blank code is replaced by a generated one.
    pub async fn new_material(
        &self,
        name: &str,
        code: &str,
        unit_price_minor: i64,
    ) -> ResultEngine<Material> {
        let name = normalize_required(name, "material name")?;
        if unit_price_minor < 0 {
            return Err(EngineError::InvalidInput(
                "unit price must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let code = match normalize_optional(Some(code)) {
                Some(code) => code,
                None => self.generate_material_code(&db_tx).await?,
            };
            let taken = materials::Entity::find()
                .filter(materials::Column::Code.eq(code.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::DuplicateCode(code));
            }

            let model = materials::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                code: ActiveValue::Set(code),
                unit_price_minor: ActiveValue::Set(unit_price_minor),
            }
            .insert(&db_tx)
            .await?;
            info!(code = %model.code, name = %model.name, "material created");
            Ok(Material::from(model))
        })
    }

    /// Materials sorted by name.
    pub async fn materials(&self) -> ResultEngine<Vec<Material>> {
        with_tx!(self, |db_tx| {
            let models = materials::Entity::find()
                .order_by_asc(materials::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Material::from).collect())
        })
    }

    /// Update a material. A new name is carried to every movement that
    /// referenced the old one; returns the number of movements renamed.
    pub async fn update_material(
        &self,
        material_id: i32,
        update: MaterialUpdate,
    ) -> ResultEngine<(Material, u64)> {
        let name = normalize_required(&update.name, "material name")?;
        let code = normalize_required(&update.code, "material code")?;
        with_tx!(self, |db_tx| {
            let current = self.require_material_by_id(&db_tx, material_id).await?;
            let taken = materials::Entity::find()
                .filter(materials::Column::Code.eq(code.clone()))
                .filter(materials::Column::Id.ne(material_id))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::DuplicateCode(code));
            }

            let renamed = if current.name == name {
                0
            } else {
                entry::Entity::update_many()
                    .col_expr(entry::Column::Material, Expr::value(name.clone()))
                    .filter(entry::Column::Material.eq(current.name.clone()))
                    .exec(&db_tx)
                    .await?
                    .rows_affected
            };

            let model = materials::ActiveModel {
                id: ActiveValue::Set(material_id),
                name: ActiveValue::Set(name),
                code: ActiveValue::Set(code),
                unit_price_minor: ActiveValue::Set(update.unit_price_minor),
            }
            .update(&db_tx)
            .await?;
            info!(code = %model.code, renamed, "material updated");
            Ok((Material::from(model), renamed))
        })
    }

    pub async fn delete_material(&self, material_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let material = self.require_material_by_id(&db_tx, material_id).await?;
            materials::Entity::delete_by_id(material_id)
                .exec(&db_tx)
                .await?;
            info!(code = %material.code, "material deleted");
            Ok(())
        })
    }

    /// Next free generated material code (`tmpm-NNNNN`).
    pub async fn next_material_code(&self) -> ResultEngine<String> {
        with_tx!(self, |db_tx| self.generate_material_code(&db_tx).await)
    }

    pub(super) async fn require_material_by_id(
        &self,
        db_tx: &DatabaseTransaction,
        material_id: i32,
    ) -> ResultEngine<materials::Model> {
        materials::Entity::find_by_id(material_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("material {material_id}")))
    }

    /// Resolve a material by code or name.
    pub(super) async fn require_material(
        &self,
        db_tx: &DatabaseTransaction,
        code_or_name: &str,
    ) -> ResultEngine<materials::Model> {
        let key = code_or_name.trim();
        let by_code = materials::Entity::find()
            .filter(materials::Column::Code.eq(key))
            .one(db_tx)
            .await?;
        if let Some(model) = by_code {
            return Ok(model);
        }
        materials::Entity::find()
            .filter(materials::Column::Name.eq(key))
            .order_by_asc(materials::Column::Id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::InvalidReference(format!("unknown material \"{key}\"")))
    }

    async fn generate_material_code(&self, db_tx: &DatabaseTransaction) -> ResultEngine<String> {
        let last = materials::Entity::find()
            .filter(materials::Column::Code.starts_with(MATERIAL_CODE_PREFIX))
            .order_by_desc(materials::Column::Code)
            .one(db_tx)
            .await?;
        Ok(next_material_code(last.as_ref().map(|m| m.code.as_str())))
    }
}
