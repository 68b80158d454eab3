use serde::Serialize;

/// Success envelope shared by every endpoint: `{ code, message, data }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            code: 200,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: u16,
    pub message: String,
}

/// Pagination block used by the admin listings.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        PageInfo {
            page,
            page_size,
            total,
            pages: (total + page_size - 1) / page_size,
        }
    }
}

/// Normalized `page`/`page_size` pair with the offset precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paging {
    pub page: i64,
    pub per_page: i64,
}

impl Paging {
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64, max_per_page: i64) -> Self {
        Paging {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max_per_page),
        }
    }

    /// Saturates for absurd page numbers; the query then returns no rows.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_clamps_input() {
        let paging = Paging::new(Some(0), Some(500), 20, 100);
        assert_eq!(paging, Paging { page: 1, per_page: 100 });
        assert_eq!(paging.offset(), 0);

        let paging = Paging::new(Some(3), None, 12, 100);
        assert_eq!(paging.offset(), 24);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let paging = Paging::new(Some(i64::MAX), Some(20), 20, 100);
        assert_eq!(paging.offset(), i64::MAX);
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(PageInfo::new(1, 20, 0).pages, 0);
        assert_eq!(PageInfo::new(1, 20, 20).pages, 1);
        assert_eq!(PageInfo::new(1, 20, 21).pages, 2);
    }

    #[test]
    fn test_message_envelope_serializes_null_data() {
        let body = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(body, serde_json::json!({ "code": 200, "message": "done", "data": null }));
    }
}
