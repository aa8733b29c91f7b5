use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;
        (page, limit, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::BadRequest("invalid sort order".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    Name,
    Price,
    DateAdded,
}

impl ProductSortBy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ProductSortBy::Name => "name",
            ProductSortBy::Price => "price",
            ProductSortBy::DateAdded => "date_added",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "name" => Ok(ProductSortBy::Name),
            "price" => Ok(ProductSortBy::Price),
            "date_added" => Ok(ProductSortBy::DateAdded),
            _ => Err(AppError::BadRequest("invalid sort option".to_string())),
        }
    }
}

/// Combined sort form used by /search: a whitelisted key with an optional
/// `_desc` suffix (`price`, `price_desc`, `date_added_desc`, ...).
pub fn parse_sort(raw: &str) -> Result<(ProductSortBy, SortOrder), AppError> {
    let (key, order) = match raw.strip_suffix("_desc") {
        Some(key) => (key, SortOrder::Desc),
        None => (raw, SortOrder::Asc),
    };
    Ok((ProductSortBy::parse(key)?, order))
}

pub const MIN_SEARCH_TERM_LEN: usize = 3;

/// Keyword terms must be long enough to avoid degenerate full-table LIKE
/// scans and restricted to characters that cannot alter a pattern.
pub fn validate_search_term(raw: &str) -> Result<String, AppError> {
    let term = raw.trim();
    if term.chars().count() < MIN_SEARCH_TERM_LEN {
        return Err(AppError::BadRequest(format!(
            "search term must be at least {MIN_SEARCH_TERM_LEN} characters long"
        )));
    }
    if !term
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
    {
        return Err(AppError::BadRequest(
            "invalid characters in search term".to_string(),
        ));
    }
    Ok(term.to_string())
}

pub fn parse_price(raw: &str, label: &str) -> Result<Decimal, AppError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| AppError::BadRequest(format!("invalid {label} price")))
}

pub fn parse_uuid(raw: &str, label: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("invalid {label} id")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Raw /products query string. Values arrive as strings so malformed input
/// turns into a structured 400 instead of a serde rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductListQuery {
    pub id: Option<String>,
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Raw /search query string.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductIdQuery {
    pub id: Option<String>,
}

/// Validated per-request predicate set. Constructed from the raw query,
/// discarded after the statement is built.
#[derive(Debug)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub sort: (ProductSortBy, SortOrder),
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl SearchFilter {
    pub fn from_query(query: SearchQuery) -> Result<Self, AppError> {
        let name = non_empty(query.name);
        let category = non_empty(query.category);
        let color = non_empty(query.color);
        let size = non_empty(query.size);
        let material = non_empty(query.material);
        let min_price = non_empty(query.min_price);
        let max_price = non_empty(query.max_price);

        if name.is_none()
            && category.is_none()
            && color.is_none()
            && size.is_none()
            && material.is_none()
            && min_price.is_none()
            && max_price.is_none()
        {
            return Err(AppError::BadRequest(
                "please provide at least one search filter".to_string(),
            ));
        }

        let name = name.map(|n| validate_search_term(&n)).transpose()?;
        let min_price = min_price.map(|p| parse_price(&p, "minimum")).transpose()?;
        let max_price = max_price.map(|p| parse_price(&p, "maximum")).transpose()?;

        let sort = match non_empty(query.sort) {
            Some(raw) => parse_sort(&raw)?,
            None => (ProductSortBy::Name, SortOrder::Asc),
        };

        let (page, limit, offset) = Pagination {
            page: query.page,
            limit: query.limit,
        }
        .normalize();

        Ok(Self {
            name,
            category,
            min_price,
            max_price,
            color,
            size,
            material,
            sort,
            page,
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_and_offsets() {
        let (page, limit, offset) = Pagination::default().normalize();
        assert_eq!((page, limit, offset), (1, 20, 0));

        let (page, limit, offset) = Pagination {
            page: Some(2),
            limit: Some(10),
        }
        .normalize();
        assert_eq!((page, limit, offset), (2, 10, 10));

        let (page, _, offset) = Pagination {
            page: Some(0),
            limit: Some(10),
        }
        .normalize();
        assert_eq!((page, offset), (1, 0));
    }

    #[test]
    fn short_search_term_is_rejected() {
        assert!(validate_search_term("ab").is_err());
        assert!(validate_search_term("  a  ").is_err());
        assert!(validate_search_term("abc").is_ok());
    }

    #[test]
    fn search_term_character_whitelist() {
        assert!(validate_search_term("blue denim 42").is_ok());
        assert!(validate_search_term("shirt'; DROP TABLE products--").is_err());
        assert!(validate_search_term("100%").is_err());
        assert!(validate_search_term("a_b_c").is_err());
    }

    #[test]
    fn sort_suffix_form() {
        assert_eq!(
            parse_sort("price_desc").unwrap(),
            (ProductSortBy::Price, SortOrder::Desc)
        );
        assert_eq!(
            parse_sort("date_added").unwrap(),
            (ProductSortBy::DateAdded, SortOrder::Asc)
        );
        assert!(parse_sort("price; DROP TABLE products").is_err());
        assert!(parse_sort("created_at").is_err());
    }

    #[test]
    fn non_numeric_price_is_a_validation_error() {
        assert!(parse_price("abc", "minimum").is_err());
        assert!(parse_price("10.50", "minimum").is_ok());
        assert_eq!(parse_price(" 10 ", "maximum").unwrap(), Decimal::from(10));
    }

    #[test]
    fn search_requires_at_least_one_filter() {
        let err = SearchFilter::from_query(SearchQuery::default());
        assert!(err.is_err());

        let filter = SearchFilter::from_query(SearchQuery {
            color: Some("red".to_string()),
            ..SearchQuery::default()
        })
        .unwrap();
        assert_eq!(filter.color.as_deref(), Some("red"));
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let err = SearchFilter::from_query(SearchQuery {
            name: Some("   ".to_string()),
            color: Some(String::new()),
            ..SearchQuery::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn filter_carries_validated_prices_and_sort() {
        let filter = SearchFilter::from_query(SearchQuery {
            name: Some("denim".to_string()),
            min_price: Some("10".to_string()),
            max_price: Some("20".to_string()),
            sort: Some("price_desc".to_string()),
            page: Some(2),
            limit: Some(10),
            ..SearchQuery::default()
        })
        .unwrap();
        assert_eq!(filter.min_price, Some(Decimal::from(10)));
        assert_eq!(filter.max_price, Some(Decimal::from(20)));
        assert_eq!(filter.sort, (ProductSortBy::Price, SortOrder::Desc));
        assert_eq!((filter.page, filter.limit, filter.offset), (2, 10, 10));
    }
}
