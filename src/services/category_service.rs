use crate::{db::DbPool, error::AppResult, models::Category};

pub async fn list_categories(pool: &DbPool) -> AppResult<Vec<Category>> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(pool)
            .await?;
    Ok(categories)
}
