use serde::Deserialize;
use utoipa::IntoParams;

use crate::repository::PageWindow;

const MAX_PER_PAGE: i64 = 100;
const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// Returns `(page, per_page, offset)` with the page clamped to `1..=MAX_PAGE`.
    pub fn normalize(&self, default_per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }

    pub fn window(&self, default_per_page: i64) -> (i64, i64, PageWindow) {
        let (page, per_page, offset) = self.normalize(default_per_page);
        let window = PageWindow {
            limit: per_page as u64,
            offset: offset as u64,
        };
        (page, per_page, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let (page, per_page, offset) = Pagination::default().normalize(12);
        assert_eq!((page, per_page, offset), (1, 12, 0));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let pagination = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(pagination.normalize(10), (1, 100, 0));

        let pagination = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        let (_, _, window) = pagination.window(12);
        assert_eq!(window, PageWindow { limit: 10, offset: 20 });
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let pagination = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        let (page, per_page, window) = pagination.window(12);
        assert_eq!((page, per_page), (MAX_PAGE, 100));
        assert_eq!(window.offset, ((MAX_PAGE - 1) * 100) as u64);

        let pagination = Pagination {
            page: Some(i64::MIN),
            per_page: Some(i64::MIN),
        };
        assert_eq!(pagination.normalize(10), (1, 1, 0));
    }
}
