use serde::{Deserialize, Serialize};

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    pub(crate) offset: i64,
    #[serde(default = "default_limit")]
    pub(crate) max_per_page: i64,
}

impl PageQuery {
    pub(crate) fn clamp(&self) -> (i64, i64) {
        let offset = self.offset.max(0);
        let limit = self.max_per_page.clamp(1, default_limit());
        (offset, limit)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) offset: i64,
    pub(crate) max_per_page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_floors_negative_offset() {
        let query = PageQuery { offset: -5, max_per_page: 10 };
        assert_eq!(query.clamp(), (0, 10));
    }

    #[test]
    fn clamp_caps_oversized_page() {
        let query = PageQuery { offset: 0, max_per_page: 10_000 };
        assert_eq!(query.clamp(), (0, default_limit()));
    }

    #[test]
    fn clamp_raises_zero_page_to_one() {
        let query = PageQuery { offset: 3, max_per_page: 0 };
        assert_eq!(query.clamp(), (3, 1));
    }
}
