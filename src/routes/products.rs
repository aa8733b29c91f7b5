use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::{CreateProductRequest, ProductList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Product, ProductWithCategory},
    rate_limit::{self, ClientIp},
    response::ApiResponse,
    routes::params::{ProductListQuery, parse_uuid},
    services::product_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/products",
    params(
        ("id" = Option<String>, Query, description = "Return a single product by id"),
        ("category_id" = Option<String>, Query, description = "Filter by category id"),
        ("search" = Option<String>, Query, description = "Keyword over name and description, min 3 chars"),
        ("sort_by" = Option<String>, Query, description = "name, price or date_added"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Single product or paginated catalog", body = ApiResponse<ProductList>),
        (status = 400, description = "Invalid filter or sort"),
        (status = 404, description = "Product not found"),
        (status = 429, description = "Rate limit exceeded"),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(pool): State<DbPool>,
    client: ClientIp,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Response> {
    // Sub-dispatch on the id parameter: single lookup or catalog listing.
    if let Some(raw) = query.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let id = parse_uuid(raw, "product")?;
        let product = product_service::get_product(&pool, id).await?;
        return Ok(Json(ApiResponse::success(product)).into_response());
    }

    rate_limit::check(&pool, &client.0).await?;

    let (items, meta) = product_service::list_products(&pool, query).await?;
    let data = ProductList { items };
    Ok(Json(ApiResponse::paginated(data, meta)).into_response())
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductWithCategory>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    Path(id): Path<Uuid>,
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<ProductWithCategory>>> {
    let product = product_service::get_product(&pool, id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Create product", body = ApiResponse<Product>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Wrong role"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = product_service::create_product(&pool, &user, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}
