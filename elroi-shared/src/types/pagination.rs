use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Page size, clamped to 1..=100.
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, 100)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_and_page_size_are_clamped() {
        let params = PaginationParams::new(0, 0);
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);

        let page = Paginated::new(vec![1, 2, 3], 3, &params);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn offset_uses_clamped_limit() {
        let params = PaginationParams::new(3, 500);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 200);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let page: Paginated<u8> = Paginated::new(vec![], 0, &PaginationParams::default());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.per_page, 20);
    }
}
