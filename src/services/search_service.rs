use crate::{
    db::DbPool,
    error::AppResult,
    models::ProductWithCategory,
    query::ProductQuery,
    response::PageMeta,
    routes::params::{SearchFilter, SearchQuery},
};

/// Advanced search: every filter is optional but at least one must be set;
/// all of them land in the statement as bind parameters.
pub async fn search_products(
    pool: &DbPool,
    query: SearchQuery,
) -> AppResult<(Vec<ProductWithCategory>, PageMeta)> {
    let filter = SearchFilter::from_query(query)?;

    let mut builder = ProductQuery::new();
    if let Some(name) = &filter.name {
        builder.name_like(name);
    }
    if let Some(category) = &filter.category {
        builder.category_like(category);
    }
    if let Some(min_price) = filter.min_price {
        builder.min_price(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.max_price(max_price);
    }
    if let Some(color) = &filter.color {
        builder.color_like(color);
    }
    if let Some(material) = &filter.material {
        builder.material_like(material);
    }
    if let Some(size) = &filter.size {
        builder.size_like(size);
    }
    let (sort_by, sort_order) = filter.sort;
    builder.order_by(sort_by, sort_order);

    builder
        .fetch_page(pool, filter.page, filter.limit, filter.offset)
        .await
}
