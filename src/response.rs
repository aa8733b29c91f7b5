use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn paginated(data: T, meta: PageMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: Some(meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageMeta::new(2, 10, 25).total_pages, 3);
        assert_eq!(PageMeta::new(1, 10, 30).total_pages, 3);
        assert_eq!(PageMeta::new(1, 10, 1).total_pages, 1);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        assert_eq!(PageMeta::new(1, 20, 0).total_pages, 0);
    }
}
