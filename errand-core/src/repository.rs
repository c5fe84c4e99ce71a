use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errand_shared::{Order, OrderId, OrderQuery, OrderStatus, User, UserId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, BoxError>;

/// Result of a write against a single order row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was written.
    Updated,
    /// No row with that id exists.
    NotModified,
    /// The row exists but its status no longer matches the expected one.
    Conflict,
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order and return it with the store-assigned id.
    async fn create_order(&self, order: &Order) -> RepoResult<Order>;

    async fn query_order_by_id(&self, id: OrderId) -> RepoResult<Option<Order>>;

    /// Replace the stored record for `order.id`.
    ///
    /// With `expected_status` set, the write only happens if the stored status
    /// still equals it at write time, otherwise `Conflict` is returned. The
    /// check and the write must be atomic with respect to other writers.
    async fn update_order(
        &self,
        order: &Order,
        expected_status: Option<OrderStatus>,
    ) -> RepoResult<WriteOutcome>;

    async fn delete_order_by_id(&self, id: OrderId) -> RepoResult<WriteOutcome>;

    async fn find_order_by_options(&self, query: &OrderQuery) -> RepoResult<Vec<Order>>;

    /// Orders in `status`, matching `search` against location and remark
    /// (case-insensitive substring) and `city` exactly, newest first.
    async fn find_current_orders(
        &self,
        status: OrderStatus,
        search: Option<&str>,
        city: Option<&str>,
        start: i64,
        size: i64,
    ) -> RepoResult<Vec<Order>>;

    /// Move every `RECEIVED_UNREAD` order created by `user_id` to
    /// `RECEIVED_READ`, returning how many were acknowledged.
    async fn read_all_unread_orders(&self, user_id: UserId, now: DateTime<Utc>)
        -> RepoResult<u64>;
}

/// Repository trait for user lookups
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn query_user_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
}
