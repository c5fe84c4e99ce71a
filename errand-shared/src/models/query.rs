use serde::{Deserialize, Serialize};

use super::order::OrderStatus;
use super::user::UserId;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreateTime,
    UpdateTime,
    StartTime,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and pagination options for order listings.
///
/// Every filter is optional; an empty query lists all orders newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderQuery {
    pub creator_id: Option<UserId>,
    pub receiver_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub city: Option<String>,
    pub sort: SortField,
    pub direction: SortDirection,
    pub start: i64,
    pub size: i64,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            creator_id: None,
            receiver_id: None,
            status: None,
            city: None,
            sort: SortField::default(),
            direction: SortDirection::default(),
            start: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl OrderQuery {
    pub fn offset(&self) -> i64 {
        self.start.max(0)
    }

    pub fn limit(&self) -> i64 {
        clamp_size(self.size)
    }
}

/// Page sizes outside `1..=MAX_PAGE_SIZE` fall back into range.
pub fn clamp_size(size: i64) -> i64 {
    if size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size.min(MAX_PAGE_SIZE)
    }
}
