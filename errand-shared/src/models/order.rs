use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::{User, UserId};

pub type OrderId = i64;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PublishedUnreceived,
    ReceivedUnread,
    ReceivedRead,
    PublishedRemoved,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PublishedUnreceived => "PUBLISHED_UNRECEIVED",
            OrderStatus::ReceivedUnread => "RECEIVED_UNREAD",
            OrderStatus::ReceivedRead => "RECEIVED_READ",
            OrderStatus::PublishedRemoved => "PUBLISHED_REMOVED",
        }
    }

    /// True once somebody has claimed the order, whether or not the creator
    /// has acknowledged it yet.
    pub fn is_received(&self) -> bool {
        matches!(self, OrderStatus::ReceivedUnread | OrderStatus::ReceivedRead)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLISHED_UNRECEIVED" => Ok(OrderStatus::PublishedUnreceived),
            "RECEIVED_UNREAD" => Ok(OrderStatus::ReceivedUnread),
            "RECEIVED_READ" => Ok(OrderStatus::ReceivedRead),
            "PUBLISHED_REMOVED" => Ok(OrderStatus::PublishedRemoved),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// An errand posted by a creator and claimable by exactly one receiver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub creator_id: UserId,
    pub creator_name: String,
    pub receiver_id: Option<UserId>,
    pub receiver_name: Option<String>,
    pub status: OrderStatus,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub receive_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub remark: Option<String>,
    pub city: Option<String>,
}

impl Order {
    /// Build a freshly published order from a draft. The id stays `0` until
    /// the store assigns one.
    pub fn publish(draft: NewOrder, creator: &User, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            creator_id: creator.id,
            creator_name: creator.username.clone(),
            receiver_id: None,
            receiver_name: None,
            status: OrderStatus::PublishedUnreceived,
            create_time: now,
            update_time: now,
            receive_time: None,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: draft.location,
            remark: draft.remark,
            city: draft.city,
        }
    }

    /// Merge a partial update. Absent and blank fields leave the stored value
    /// alone; `update_time` moves regardless.
    pub fn apply_patch(&mut self, patch: &OrderPatch, now: DateTime<Utc>) {
        self.update_time = now;
        if let Some(start_time) = patch.start_time {
            self.start_time = Some(start_time);
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = Some(end_time);
        }
        if let Some(location) = non_blank(&patch.location) {
            self.location = Some(location.to_string());
        }
        if let Some(remark) = non_blank(&patch.remark) {
            self.remark = Some(remark.to_string());
        }
    }

    /// A window with both ends set must not end before it starts.
    pub fn has_valid_window(&self) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }

    /// Record the receiver and move to `RECEIVED_UNREAD`.
    pub fn mark_received(&mut self, receiver: &User, now: DateTime<Utc>) {
        self.receiver_id = Some(receiver.id);
        self.receiver_name = Some(receiver.username.clone());
        self.receive_time = Some(now);
        self.update_time = now;
        self.status = OrderStatus::ReceivedUnread;
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Draft submitted by a creator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub creator_id: UserId,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Partial update of the task fields of an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    pub id: OrderId,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReceiveRequest {
    pub id: OrderId,
    pub receiver_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn published() -> Order {
        let draft = NewOrder {
            creator_id: 1,
            location: Some("Library".to_string()),
            remark: Some("Pick up two books".to_string()),
            ..Default::default()
        };
        Order::publish(draft, &User::new(1, "alice"), t0())
    }

    #[test]
    fn test_publish_stamps_creator_and_times() {
        let order = published();

        assert_eq!(order.creator_name, "alice");
        assert_eq!(order.status, OrderStatus::PublishedUnreceived);
        assert_eq!(order.create_time, order.update_time);
        assert!(order.receiver_id.is_none());
    }

    #[test]
    fn test_patch_ignores_blank_strings() {
        let mut order = published();
        let later = t0() + Duration::minutes(5);

        let patch = OrderPatch {
            id: order.id,
            location: Some("   ".to_string()),
            remark: Some(String::new()),
            ..Default::default()
        };
        order.apply_patch(&patch, later);

        assert_eq!(order.location.as_deref(), Some("Library"));
        assert_eq!(order.remark.as_deref(), Some("Pick up two books"));
        assert_eq!(order.update_time, later);
    }

    #[test]
    fn test_patch_overwrites_present_fields() {
        let mut order = published();
        let start = t0() + Duration::hours(2);

        let patch = OrderPatch {
            id: order.id,
            start_time: Some(start),
            location: Some("Canteen".to_string()),
            ..Default::default()
        };
        order.apply_patch(&patch, t0());

        assert_eq!(order.start_time, Some(start));
        assert_eq!(order.location.as_deref(), Some("Canteen"));
        assert_eq!(order.remark.as_deref(), Some("Pick up two books"));
    }

    #[test]
    fn test_window_checks_merged_ends() {
        let mut order = published();
        assert!(order.has_valid_window());

        order.end_time = Some(t0());
        assert!(order.has_valid_window());

        order.start_time = Some(t0() + Duration::hours(1));
        assert!(!order.has_valid_window());

        order.end_time = order.start_time;
        assert!(order.has_valid_window());
    }

    #[test]
    fn test_status_wire_format() {
        for status in [
            OrderStatus::PublishedUnreceived,
            OrderStatus::ReceivedUnread,
            OrderStatus::ReceivedRead,
            OrderStatus::PublishedRemoved,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
        assert!("DONE".parse::<OrderStatus>().is_err());
    }
}
