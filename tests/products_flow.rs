use catalog_api::{
    db::{DbPool, create_pool},
    dto::auth::RegisterRequest,
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_SELLER},
    rate_limit,
    routes::params::{Pagination, SearchQuery},
    services::{auth_service, product_service, search_service},
};
use rust_decimal::Decimal;
use uuid::Uuid;

// Integration flow: seller creates products; ownership gates update/delete;
// search filters by price range and attributes; pagination and the persisted
// rate-limit window behave across calls.
#[tokio::test]
async fn seller_crud_search_and_pagination_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let pool = setup_pool(&database_url).await?;

    let seller = create_user(&pool, ROLE_SELLER, "seller@example.com").await?;
    let other_seller = create_user(&pool, ROLE_SELLER, "other@example.com").await?;
    let admin = create_user(&pool, ROLE_ADMIN, "admin@example.com").await?;

    // Registration rejects duplicate emails.
    let registered = auth_service::register_user(
        &pool,
        RegisterRequest {
            email: "new-seller@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
        },
    )
    .await?;
    assert_eq!(registered.role, ROLE_SELLER);
    let duplicate = auth_service::register_user(
        &pool,
        RegisterRequest {
            email: "new-seller@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    // Create a product owned by the seller.
    let product = product_service::create_product(
        &pool,
        &seller,
        CreateProductRequest {
            name: "Denim Jacket".to_string(),
            description: Some("Lined denim jacket".to_string()),
            price: Decimal::new(4999, 2),
            category_id: None,
            size: Some("M".to_string()),
            color: Some("blue".to_string()),
            material: Some("denim".to_string()),
        },
    )
    .await?;
    assert_eq!(product.user_id, seller.user_id);

    // A buyer role cannot create at all.
    let buyer = create_user(&pool, "buyer", "buyer@example.com").await?;
    let refused = product_service::create_product(
        &pool,
        &buyer,
        CreateProductRequest {
            name: "Sneaky Listing".to_string(),
            description: None,
            price: Decimal::ONE,
            category_id: None,
            size: None,
            color: None,
            material: None,
        },
    )
    .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    // Non-owner update is forbidden and leaves the row unchanged.
    let hijack = product_service::update_product(
        &pool,
        &other_seller,
        product.id,
        UpdateProductRequest {
            name: Some("Hijacked".to_string()),
            ..empty_update()
        },
    )
    .await;
    assert!(matches!(hijack, Err(AppError::Forbidden(_))));
    let unchanged = product_service::get_product(&pool, product.id).await?;
    assert_eq!(unchanged.name, "Denim Jacket");

    // Owner partial update keeps the fields the payload omits.
    let updated = product_service::update_product(
        &pool,
        &seller,
        product.id,
        UpdateProductRequest {
            price: Some(Decimal::new(3999, 2)),
            ..empty_update()
        },
    )
    .await?;
    assert_eq!(updated.price, Decimal::new(3999, 2));
    assert_eq!(updated.name, "Denim Jacket");

    // Admin bypasses the ownership check.
    let renamed = product_service::update_product(
        &pool,
        &admin,
        product.id,
        UpdateProductRequest {
            name: Some("Denim Jacket II".to_string()),
            ..empty_update()
        },
    )
    .await?;
    assert_eq!(renamed.name, "Denim Jacket II");

    // Pad the seller's inventory to 25 rows and page through it.
    for i in 0..24 {
        product_service::create_product(
            &pool,
            &seller,
            CreateProductRequest {
                name: format!("Plain Tee {i:02}"),
                description: None,
                price: Decimal::from(10 + i),
                category_id: None,
                size: None,
                color: Some("white".to_string()),
                material: Some("cotton".to_string()),
            },
        )
        .await?;
    }
    let (items, meta) = product_service::list_user_products(
        &pool,
        &seller,
        Pagination {
            page: Some(2),
            limit: Some(10),
        },
    )
    .await?;
    assert_eq!(items.len(), 10);
    assert_eq!(meta.total, 25);
    assert_eq!(meta.total_pages, 3);

    // Inclusive price bounds: 10 and 20 are in, 9 and 21 are out.
    for (name, price) in [
        ("Crimson Under", 9),
        ("Crimson Low", 10),
        ("Crimson Mid", 15),
        ("Crimson High", 20),
        ("Crimson Over", 21),
    ] {
        product_service::create_product(
            &pool,
            &other_seller,
            CreateProductRequest {
                name: name.to_string(),
                description: None,
                price: Decimal::from(price),
                category_id: None,
                size: None,
                color: Some("crimson".to_string()),
                material: None,
            },
        )
        .await?;
    }
    let (matches, meta) = search_service::search_products(
        &pool,
        SearchQuery {
            color: Some("crimson".to_string()),
            min_price: Some("10".to_string()),
            max_price: Some("20".to_string()),
            sort: Some("price".to_string()),
            ..SearchQuery::default()
        },
    )
    .await?;
    assert_eq!(meta.total, 3);
    let names: Vec<&str> = matches.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Crimson Low", "Crimson Mid", "Crimson High"]);

    // Category name filter joins the category in.
    let tops: Uuid = sqlx::query_scalar("SELECT id FROM categories WHERE name = 'Tops'")
        .fetch_one(&pool)
        .await?;
    product_service::create_product(
        &pool,
        &other_seller,
        CreateProductRequest {
            name: "Linen Shirt".to_string(),
            description: None,
            price: Decimal::from(35),
            category_id: Some(tops),
            size: Some("L".to_string()),
            color: None,
            material: Some("linen".to_string()),
        },
    )
    .await?;
    let (matches, _) = search_service::search_products(
        &pool,
        SearchQuery {
            category: Some("top".to_string()),
            material: Some("linen".to_string()),
            ..SearchQuery::default()
        },
    )
    .await?;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].category_name.as_deref(), Some("Tops"));

    // Degenerate keyword terms never reach the store.
    let short = search_service::search_products(
        &pool,
        SearchQuery {
            name: Some("ab".to_string()),
            ..SearchQuery::default()
        },
    )
    .await;
    assert!(matches!(short, Err(AppError::BadRequest(_))));

    // Rate-limit counters persist in the store across invocations.
    sqlx::query(
        "INSERT INTO rate_windows (client_key, window_start, request_count) \
         VALUES ($1, now(), $2)",
    )
    .bind("203.0.113.9")
    .bind(rate_limit::WINDOW_LIMIT)
    .execute(&pool)
    .await?;
    let limited = rate_limit::check(&pool, "203.0.113.9").await;
    assert!(matches!(limited, Err(AppError::RateLimited)));

    // A lapsed window resets instead of limiting.
    sqlx::query(
        "UPDATE rate_windows SET window_start = now() - interval '2 minutes' \
         WHERE client_key = $1",
    )
    .bind("203.0.113.9")
    .execute(&pool)
    .await?;
    assert!(rate_limit::check(&pool, "203.0.113.9").await.is_ok());

    // Non-owner delete is forbidden; owner delete removes the row.
    let refused = product_service::delete_product(&pool, &other_seller, product.id).await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));
    product_service::delete_product(&pool, &seller, product.id).await?;
    let gone = product_service::get_product(&pool, product.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    Ok(())
}

async fn setup_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs; categories keep their seeded rows.
    sqlx::query("TRUNCATE TABLE audit_logs, rate_windows, products, users CASCADE")
        .execute(&pool)
        .await?;

    Ok(pool)
}

async fn create_user(pool: &DbPool, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(email)
        .bind("dummy")
        .bind(role)
        .execute(pool)
        .await?;

    Ok(AuthUser {
        user_id: id,
        role: role.to_string(),
    })
}

fn empty_update() -> UpdateProductRequest {
    UpdateProductRequest {
        name: None,
        description: None,
        price: None,
        category_id: None,
        size: None,
        color: None,
        material: None,
    }
}
