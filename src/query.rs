use rust_decimal::Decimal;
use sqlx::Postgres;
use sqlx::query::{QueryAs, QueryScalar};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::ProductWithCategory;
use crate::response::PageMeta;
use crate::routes::params::{ProductSortBy, SortOrder};

const SELECT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.category_id, p.size, \
     p.color, p.material, p.date_added, p.user_id, c.name AS category_name";
const FROM_CLAUSE: &str = "FROM products p LEFT JOIN categories c ON c.id = p.category_id";

/// Assembles the catalog SELECT and its COUNT twin from optional filters.
///
/// Every user-supplied value becomes a numbered bind parameter; the only
/// concatenated fragments are column names and the sort key/direction, which
/// come from fixed enums. Placeholders are numbered in push order, so
/// `apply_bindings` must run before any extra `.bind` calls on the query.
pub struct ProductQuery {
    conditions: Vec<String>,
    bindings: Vec<BindValue>,
    sort: (ProductSortBy, SortOrder),
}

#[derive(Debug, Clone)]
enum BindValue {
    Text(String),
    Price(Decimal),
    Id(Uuid),
}

impl ProductQuery {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            bindings: Vec::new(),
            sort: (ProductSortBy::Name, SortOrder::Asc),
        }
    }

    fn placeholder(&self) -> usize {
        self.bindings.len() + 1
    }

    fn push_like(&mut self, column: &str, term: &str) {
        self.conditions
            .push(format!("{} ILIKE ${}", column, self.placeholder()));
        self.bindings.push(BindValue::Text(format!("%{}%", term)));
    }

    /// Keyword search over name and description with a single bound pattern
    /// per column.
    pub fn keyword(&mut self, term: &str) -> &mut Self {
        let first = self.placeholder();
        self.conditions.push(format!(
            "(p.name ILIKE ${} OR p.description ILIKE ${})",
            first,
            first + 1
        ));
        let pattern = format!("%{}%", term);
        self.bindings.push(BindValue::Text(pattern.clone()));
        self.bindings.push(BindValue::Text(pattern));
        self
    }

    pub fn name_like(&mut self, term: &str) -> &mut Self {
        self.push_like("p.name", term);
        self
    }

    pub fn category_like(&mut self, term: &str) -> &mut Self {
        self.push_like("c.name", term);
        self
    }

    pub fn color_like(&mut self, term: &str) -> &mut Self {
        self.push_like("p.color", term);
        self
    }

    pub fn material_like(&mut self, term: &str) -> &mut Self {
        self.push_like("p.material", term);
        self
    }

    pub fn size_like(&mut self, term: &str) -> &mut Self {
        self.push_like("p.size", term);
        self
    }

    pub fn category_id(&mut self, id: Uuid) -> &mut Self {
        self.conditions
            .push(format!("p.category_id = ${}", self.placeholder()));
        self.bindings.push(BindValue::Id(id));
        self
    }

    pub fn owner(&mut self, user_id: Uuid) -> &mut Self {
        self.conditions
            .push(format!("p.user_id = ${}", self.placeholder()));
        self.bindings.push(BindValue::Id(user_id));
        self
    }

    /// Inclusive lower price bound.
    pub fn min_price(&mut self, price: Decimal) -> &mut Self {
        self.conditions
            .push(format!("p.price >= ${}", self.placeholder()));
        self.bindings.push(BindValue::Price(price));
        self
    }

    /// Inclusive upper price bound.
    pub fn max_price(&mut self, price: Decimal) -> &mut Self {
        self.conditions
            .push(format!("p.price <= ${}", self.placeholder()));
        self.bindings.push(BindValue::Price(price));
        self
    }

    pub fn order_by(&mut self, sort_by: ProductSortBy, order: SortOrder) -> &mut Self {
        self.sort = (sort_by, order);
        self
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Paginated SELECT. LIMIT and OFFSET take the two placeholders after the
    /// filter bindings; bind them after `apply_bindings`.
    pub fn select_sql(&self) -> String {
        let (sort_by, order) = &self.sort;
        format!(
            "SELECT {} {}{} ORDER BY p.{} {} LIMIT ${} OFFSET ${}",
            SELECT_COLUMNS,
            FROM_CLAUSE,
            self.where_clause(),
            sort_by.as_sql(),
            order.as_sql(),
            self.placeholder(),
            self.placeholder() + 1,
        )
    }

    /// COUNT over the same predicate, without pagination or ordering, so
    /// total_pages reflects the full result set.
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) {}{}", FROM_CLAUSE, self.where_clause())
    }

    pub fn apply_bindings<'q, O>(
        &self,
        mut query: QueryAs<'q, Postgres, O, <Postgres as sqlx::Database>::Arguments<'q>>,
    ) -> QueryAs<'q, Postgres, O, <Postgres as sqlx::Database>::Arguments<'q>> {
        for binding in &self.bindings {
            query = match binding {
                BindValue::Text(s) => query.bind(s.clone()),
                BindValue::Price(d) => query.bind(*d),
                BindValue::Id(id) => query.bind(*id),
            };
        }
        query
    }

    /// Run the paginated SELECT and its COUNT twin over the pool and fold
    /// the totals into page metadata.
    pub async fn fetch_page(
        &self,
        pool: &DbPool,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ProductWithCategory>, PageMeta)> {
        let select_sql = self.select_sql();
        let count_sql = self.count_sql();

        let items = self
            .apply_bindings(sqlx::query_as::<_, ProductWithCategory>(&select_sql))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        let total: i64 = self
            .apply_bindings_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(pool)
            .await?;

        Ok((items, PageMeta::new(page, limit, total)))
    }

    pub fn apply_bindings_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Postgres, O, <Postgres as sqlx::Database>::Arguments<'q>>,
    ) -> QueryScalar<'q, Postgres, O, <Postgres as sqlx::Database>::Arguments<'q>> {
        for binding in &self.bindings {
            query = match binding {
                BindValue::Text(s) => query.bind(s.clone()),
                BindValue::Price(d) => query.bind(*d),
                BindValue::Id(id) => query.bind(*id),
            };
        }
        query
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_where_clause() {
        let query = ProductQuery::new();
        assert_eq!(query.where_clause(), "");
    }

    #[test]
    fn unfiltered_select_binds_only_pagination() {
        let query = ProductQuery::new();
        let sql = query.select_sql();
        assert!(sql.ends_with("ORDER BY p.name ASC LIMIT $1 OFFSET $2"), "{sql}");
    }

    #[test]
    fn single_condition() {
        let mut query = ProductQuery::new();
        query.name_like("shirt");
        assert_eq!(query.where_clause(), " WHERE p.name ILIKE $1");
    }

    #[test]
    fn conditions_number_placeholders_in_order() {
        let mut query = ProductQuery::new();
        query
            .name_like("shirt")
            .min_price(Decimal::new(1000, 2))
            .max_price(Decimal::new(2000, 2))
            .color_like("red");
        assert_eq!(
            query.where_clause(),
            " WHERE p.name ILIKE $1 AND p.price >= $2 AND p.price <= $3 AND p.color ILIKE $4"
        );
        let sql = query.select_sql();
        assert!(sql.ends_with("LIMIT $5 OFFSET $6"), "{sql}");
    }

    #[test]
    fn keyword_matches_name_and_description() {
        let mut query = ProductQuery::new();
        query.keyword("denim");
        assert_eq!(
            query.where_clause(),
            " WHERE (p.name ILIKE $1 OR p.description ILIKE $2)"
        );
    }

    #[test]
    fn user_terms_never_reach_the_sql_text() {
        let mut query = ProductQuery::new();
        query
            .name_like("shirt")
            .category_like("outerwear")
            .material_like("cotton")
            .size_like("XL");
        let sql = query.select_sql();
        assert!(!sql.contains("shirt"));
        assert!(!sql.contains("outerwear"));
        assert!(!sql.contains("cotton"));
        assert!(!sql.contains("XL"));
    }

    #[test]
    fn sort_comes_from_the_whitelist_enums() {
        let mut query = ProductQuery::new();
        query.order_by(ProductSortBy::Price, SortOrder::Desc);
        let sql = query.select_sql();
        assert!(sql.contains("ORDER BY p.price DESC"), "{sql}");

        let mut query = ProductQuery::new();
        query.order_by(ProductSortBy::DateAdded, SortOrder::Asc);
        assert!(query.select_sql().contains("ORDER BY p.date_added ASC"));
    }

    #[test]
    fn count_sql_shares_the_predicate_without_pagination() {
        let mut query = ProductQuery::new();
        query.name_like("shirt").min_price(Decimal::new(10, 0));
        let sql = query.count_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM products p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.name ILIKE $1 AND p.price >= $2"
        );
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("ORDER BY"));
    }
}
