use axum::Router;

use crate::db::DbPool;

pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod search;
pub mod user_products;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<DbPool> {
    Router::new()
        .merge(products::router())
        .merge(user_products::router())
        .merge(search::router())
        .merge(categories::router())
        .merge(auth::router())
}
