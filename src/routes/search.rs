use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    db::DbPool,
    dto::products::ProductList,
    error::AppResult,
    response::ApiResponse,
    routes::params::SearchQuery,
    services::search_service,
};

pub fn router() -> Router<DbPool> {
    Router::new().route("/search", get(search_products))
}

#[utoipa::path(
    get,
    path = "/search",
    params(
        ("name" = Option<String>, Query, description = "Product name, partial match, min 3 chars"),
        ("category" = Option<String>, Query, description = "Category name, partial match"),
        ("min_price" = Option<String>, Query, description = "Inclusive lower price bound"),
        ("max_price" = Option<String>, Query, description = "Inclusive upper price bound"),
        ("color" = Option<String>, Query, description = "Color, partial match"),
        ("size" = Option<String>, Query, description = "Size, partial match"),
        ("material" = Option<String>, Query, description = "Material, partial match"),
        ("sort" = Option<String>, Query, description = "name, price or date_added, optionally with _desc"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Filtered products", body = ApiResponse<ProductList>),
        (status = 400, description = "Invalid or missing filters"),
    ),
    tag = "Search"
)]
pub async fn search_products(
    State(pool): State<DbPool>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let (items, meta) = search_service::search_products(&pool, query).await?;
    Ok(Json(ApiResponse::paginated(ProductList { items }, meta)))
}
