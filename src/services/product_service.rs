use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner, ensure_seller_or_admin},
    models::{Product, ProductWithCategory},
    query::ProductQuery,
    response::PageMeta,
    routes::params::{
        Pagination, ProductListQuery, ProductSortBy, SortOrder, parse_uuid, validate_search_term,
    },
};

const PRODUCT_WITH_CATEGORY: &str = "SELECT p.id, p.name, p.description, p.price, p.category_id, \
     p.size, p.color, p.material, p.date_added, p.user_id, c.name AS category_name \
     FROM products p LEFT JOIN categories c ON c.id = p.category_id WHERE p.id = $1";

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ProductWithCategory> {
    let result = sqlx::query_as::<_, ProductWithCategory>(PRODUCT_WITH_CATEGORY)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match result {
        Some(p) => Ok(p),
        None => Err(AppError::NotFound),
    }
}

/// Catalog listing: optional keyword and category filters with whitelisted
/// sorting. Defaults to newest first.
pub async fn list_products(
    pool: &DbPool,
    query: ProductListQuery,
) -> AppResult<(Vec<ProductWithCategory>, PageMeta)> {
    let mut builder = ProductQuery::new();

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let term = validate_search_term(term)?;
        builder.keyword(&term);
    }

    if let Some(raw) = query.category_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.category_id(parse_uuid(raw, "category")?);
    }

    let sort_by = match query.sort_by.as_deref() {
        Some(raw) => ProductSortBy::parse(raw)?,
        None => ProductSortBy::DateAdded,
    };
    let sort_order = match query.sort_order.as_deref() {
        Some(raw) => SortOrder::parse(raw)?,
        None => SortOrder::Desc,
    };
    builder.order_by(sort_by, sort_order);

    let (page, limit, offset) = Pagination {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    builder.fetch_page(pool, page, limit, offset).await
}

pub async fn list_user_products(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<(Vec<ProductWithCategory>, PageMeta)> {
    let (page, limit, offset) = pagination.normalize();
    let mut builder = ProductQuery::new();
    builder
        .owner(user.user_id)
        .order_by(ProductSortBy::DateAdded, SortOrder::Desc);
    builder.fetch_page(pool, page, limit, offset).await
}

pub async fn create_product(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    ensure_seller_or_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("product name is required".to_string()));
    }
    if payload.price < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "price must not be negative".to_string(),
        ));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, name, description, price, category_id, size, color, material, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.category_id)
    .bind(payload.size)
    .bind(payload.color)
    .bind(payload.material)
    .bind(user.user_id)
    .fetch_one(pool)
    .await?;

    if let Err(err) = audit::record(
        pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(product)
}

/// Ownership check and mutation run in one transaction; the row is locked so
/// the owner cannot change between check and write.
pub async fn update_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    ensure_seller_or_admin(user)?;

    let mut tx = pool.begin().await?;

    let existing =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    ensure_owner(user, existing.user_id)?;

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let category_id = payload.category_id.or(existing.category_id);
    let size = payload.size.or(existing.size);
    let color = payload.color.or(existing.color);
    let material = payload.material.or(existing.material);

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, category_id = $5,
            size = $6, color = $7, material = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(category_id)
    .bind(size)
    .bind(color)
    .bind(material)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if let Err(err) = audit::record(
        pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(product)
}

pub async fn delete_product(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_seller_or_admin(user)?;

    let mut tx = pool.begin().await?;

    let owner: Option<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let owner = match owner {
        Some((owner,)) => owner,
        None => return Err(AppError::NotFound),
    };

    ensure_owner(user, owner)?;

    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if let Err(err) = audit::record(
        pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}
