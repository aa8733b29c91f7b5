use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        products::{CategoryList, CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{Category, Product, ProductWithCategory, User},
    response::{ApiResponse, PageMeta},
    routes::{auth, categories, health, params, products, search, user_products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::get_product,
        products::create_product,
        user_products::list_own_products,
        user_products::create_own_product,
        user_products::update_own_product,
        user_products::delete_own_product,
        search::search_products,
        categories::list_categories,
    ),
    components(
        schemas(
            User,
            Product,
            ProductWithCategory,
            Category,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CategoryList,
            params::Pagination,
            params::ProductListQuery,
            params::SearchQuery,
            params::ProductIdQuery,
            params::SortOrder,
            params::ProductSortBy,
            PageMeta,
            ApiResponse<Product>,
            ApiResponse<ProductWithCategory>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<LoginResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Public catalog endpoints"),
        (name = "User products", description = "Owner-scoped product CRUD"),
        (name = "Search", description = "Filtered product search"),
        (name = "Categories", description = "Category listing"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
