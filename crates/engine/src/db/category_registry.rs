use async_trait::async_trait;
use sea_orm::{DatabaseConnection, prelude::*};

use crate::{
    Category, CategoryId, ResultEngine, categories, stores::CategoryRegistry, util::storage_error,
};

#[derive(Clone, Debug)]
pub struct SqlCategoryRegistry {
    db: DatabaseConnection,
}

impl SqlCategoryRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRegistry for SqlCategoryRegistry {
    async fn category(&self, category_id: CategoryId) -> ResultEngine<Option<Category>> {
        Ok(categories::Entity::find_by_id(category_id)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(Category::from))
    }
}
