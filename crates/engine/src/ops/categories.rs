use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{ResultEngine, categories, sub_categories, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Add a user category.
    pub async fn new_category(&self, user_id: &str, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let id = Uuid::new_v4();
            let active = categories::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name),
                system_kind: ActiveValue::Set(None),
            };
            active.insert(&db_tx).await?;
            Ok(id)
        })
    }

    /// Add a sub-category under `category_id`.
    pub async fn new_sub_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        name: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "sub category")?;
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, category_id).await?;
            let id = Uuid::new_v4();
            let active = sub_categories::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                category_id: ActiveValue::Set(category_id.to_string()),
                name: ActiveValue::Set(name),
            };
            active.insert(&db_tx).await?;
            Ok(id)
        })
    }
}
