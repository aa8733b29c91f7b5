use axum::{Json, Router, extract::State, routing::get};

use crate::{
    db::DbPool,
    dto::products::CategoryList,
    error::AppResult,
    response::ApiResponse,
    services::category_service,
};

pub fn router() -> Router<DbPool> {
    Router::new().route("/categories", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "List categories", body = ApiResponse<CategoryList>),
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let items = category_service::list_categories(&pool).await?;
    Ok(Json(ApiResponse::success(CategoryList { items })))
}
