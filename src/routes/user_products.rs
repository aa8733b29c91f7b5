use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    routes::params::{Pagination, ProductIdQuery, parse_uuid},
    services::product_service,
};

pub fn router() -> Router<DbPool> {
    Router::new().route(
        "/user/products",
        get(list_own_products)
            .post(create_own_product)
            .put(update_own_product)
            .delete(delete_own_product),
    )
}

fn required_id(query: &ProductIdQuery) -> AppResult<Uuid> {
    match query.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_uuid(raw, "product"),
        None => Err(AppError::BadRequest("missing product id".to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/user/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Caller's own products", body = ApiResponse<ProductList>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "User products"
)]
pub async fn list_own_products(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let (items, meta) = product_service::list_user_products(&pool, &user, pagination).await?;
    Ok(Json(ApiResponse::paginated(ProductList { items }, meta)))
}

#[utoipa::path(
    post,
    path = "/user/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Create product owned by the caller", body = ApiResponse<Product>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Wrong role"),
    ),
    security(("bearer_auth" = [])),
    tag = "User products"
)]
pub async fn create_own_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = product_service::create_product(&pool, &user, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    put,
    path = "/user/products",
    params(
        ("id" = String, Query, description = "Product ID to update")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 400, description = "Missing or invalid id"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "User products"
)]
pub async fn update_own_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(query): Query<ProductIdQuery>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = required_id(&query)?;
    let product = product_service::update_product(&pool, &user, id, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/user/products",
    params(
        ("id" = String, Query, description = "Product ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Missing or invalid id"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "User products"
)]
pub async fn delete_own_product(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(query): Query<ProductIdQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = required_id(&query)?;
    product_service::delete_product(&pool, &user, id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({}))))
}
