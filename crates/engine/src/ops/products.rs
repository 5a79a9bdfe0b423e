use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, Product, ResultEngine, products};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Add a product for the account and return its id.
    pub async fn insert_product(&self, account_id: i64, name: &str) -> ResultEngine<i64> {
        let name = normalize_required_name(name, "product")?;
        let product = products::ActiveModel {
            name: ActiveValue::Set(name),
            account_id: ActiveValue::Set(account_id),
            deleted: ActiveValue::Set(false),
            ..Default::default()
        }
        .insert(&self.database)
        .await
        .map_err(EngineError::from_statement)?;
        Ok(product.id)
    }

    /// Visible products of the account, by name.
    pub async fn get_products_by_account(&self, account_id: i64) -> ResultEngine<Vec<Product>> {
        let models = products::Entity::find()
            .filter(products::Column::AccountId.eq(account_id))
            .filter(products::Column::Deleted.eq(false))
            .order_by_asc(products::Column::Name)
            .order_by_asc(products::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Product::from).collect())
    }
}
