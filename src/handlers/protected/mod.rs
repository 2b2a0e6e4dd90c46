// Routes behind the JWT middleware; every handler takes the caller as `AuthUser`
pub mod auth;
pub mod categories;
pub mod costs;
pub mod transactions;
pub mod users;

use serde::Deserialize;
use validator::Validate;

pub use auth::whoami as auth_whoami;

pub const DEFAULT_LIMIT: i64 = 10;

/// `?limit=&offset=` window used by categories, costs and users
#[derive(Debug, Default, Deserialize, Validate)]
pub struct OffsetQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000))]
    pub offset: Option<i64>,
}

impl OffsetQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    /// 1-based page the offset falls on
    pub fn page(&self) -> i64 {
        (self.offset() / self.limit().max(1)).saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_window_defaults() {
        let query = OffsetQuery::default();
        assert_eq!(query.limit(), 10);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn page_follows_offset() {
        let query = OffsetQuery {
            limit: Some(20),
            offset: Some(45),
        };
        assert_eq!(query.page(), 3);
    }

    #[test]
    fn limit_bounds_are_enforced() {
        for limit in [0, 101] {
            let query = OffsetQuery {
                limit: Some(limit),
                offset: None,
            };
            assert!(query.validate().is_err());
        }
        let query = OffsetQuery {
            limit: None,
            offset: Some(-1),
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn huge_offsets_are_rejected() {
        let query = OffsetQuery {
            limit: Some(1),
            offset: Some(i64::MAX),
        };
        assert!(query.validate().is_err());
        assert_eq!(query.page(), i64::MAX);

        let query = OffsetQuery {
            limit: Some(100),
            offset: Some(1_000_000),
        };
        assert!(query.validate().is_ok());
    }
}
