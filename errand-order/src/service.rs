use std::sync::Arc;

use errand_core::{BoxError, Clock, OrderRepository, SystemClock, UserRepository, WriteOutcome};
use errand_shared::{
    clamp_size, NewOrder, Order, OrderId, OrderPatch, OrderQuery, OrderStatus, ReceiveRequest, User,
    UserId,
};
use tracing::{debug, info, warn};

pub type OrderResult<T> = Result<T, OrderError>;

/// Business rules for publishing, editing, receiving and deleting orders.
///
/// Holds no state of its own beyond shared handles to the stores; every call
/// is a short read-check-write sequence and the stores are responsible for
/// making the write safe against concurrent callers.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            users,
            clock,
        }
    }

    pub fn with_system_clock(orders: Arc<dyn OrderRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self::new(orders, users, Arc::new(SystemClock))
    }

    /// Publish a new order on behalf of `draft.creator_id`.
    pub async fn create_order(&self, draft: NewOrder) -> OrderResult<Order> {
        let creator = self.require_user(draft.creator_id).await?;
        let order = Order::publish(draft, &creator, self.clock.now());
        if !order.has_valid_window() {
            return Err(OrderError::InvalidTimeWindow);
        }

        let created = self.orders.create_order(&order).await?;
        info!("Order {} published by user {}", created.id, created.creator_id);
        Ok(created)
    }

    pub async fn get_order(&self, id: OrderId) -> OrderResult<Order> {
        self.require_order(id).await
    }

    /// Patch the task fields of an order. `update_time` is refreshed even when
    /// the patch carries nothing.
    pub async fn update_order(&self, patch: OrderPatch) -> OrderResult<Order> {
        let mut order = self.require_order(patch.id).await?;
        let read_status = order.status;
        order.apply_patch(&patch, self.clock.now());
        if !order.has_valid_window() {
            return Err(OrderError::InvalidTimeWindow);
        }

        // Guarding on the status we read keeps a stale copy from overwriting
        // a receive that landed in between.
        match self.orders.update_order(&order, Some(read_status)).await? {
            WriteOutcome::Updated => {
                debug!("Order {} updated", order.id);
                Ok(order)
            }
            WriteOutcome::NotModified => Err(OrderError::order_not_found(order.id)),
            WriteOutcome::Conflict => {
                warn!("Order {} changed while being updated", order.id);
                Err(OrderError::Conflict(order.id))
            }
        }
    }

    /// Claim an order for `request.receiver_id`. Only the first receiver wins.
    pub async fn receive_order(&self, request: ReceiveRequest) -> OrderResult<Order> {
        let mut order = self.require_order(request.id).await?;
        if let Err(e) = check_receivable(&order, request.receiver_id) {
            warn!(
                "User {} cannot receive order {}: {}",
                request.receiver_id, order.id, e
            );
            return Err(e);
        }

        let receiver = self
            .users
            .query_user_by_id(request.receiver_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Receiver {}", request.receiver_id)))?;

        order.mark_received(&receiver, self.clock.now());

        match self
            .orders
            .update_order(&order, Some(OrderStatus::PublishedUnreceived))
            .await?
        {
            WriteOutcome::Updated => {
                info!("Order {} received by user {}", order.id, receiver.id);
                Ok(order)
            }
            WriteOutcome::NotModified => Err(OrderError::order_not_found(order.id)),
            WriteOutcome::Conflict => {
                let err = self.classify_lost_receive(order.id, receiver.id).await;
                warn!("User {} lost the race for order {}: {}", receiver.id, order.id, err);
                Err(err)
            }
        }
    }

    /// Delete an order. Only its creator may do so.
    pub async fn delete_order(&self, user_id: UserId, order_id: OrderId) -> OrderResult<()> {
        let order = self.require_order(order_id).await?;
        if order.creator_id != user_id {
            warn!("User {} tried to delete order {} owned by {}", user_id, order_id, order.creator_id);
            return Err(OrderError::Unauthorized);
        }

        match self.orders.delete_order_by_id(order_id).await? {
            WriteOutcome::Updated => {
                info!("Order {} deleted by user {}", order_id, user_id);
                Ok(())
            }
            WriteOutcome::NotModified => Err(OrderError::order_not_found(order_id)),
            WriteOutcome::Conflict => {
                warn!("Order {} changed while being deleted", order_id);
                Err(OrderError::Conflict(order_id))
            }
        }
    }

    pub async fn find_order_by_options(&self, query: &OrderQuery) -> OrderResult<Vec<Order>> {
        Ok(self.orders.find_order_by_options(query).await?)
    }

    /// Orders still open for receiving.
    pub async fn find_current_orders(
        &self,
        search: Option<&str>,
        city: Option<&str>,
        start: i64,
        size: i64,
    ) -> OrderResult<Vec<Order>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let city = city.map(str::trim).filter(|s| !s.is_empty());

        Ok(self
            .orders
            .find_current_orders(
                OrderStatus::PublishedUnreceived,
                search,
                city,
                start.max(0),
                clamp_size(size),
            )
            .await?)
    }

    /// Acknowledge every freshly received order the user created.
    pub async fn read_all_unread_orders(&self, user_id: UserId) -> OrderResult<u64> {
        self.require_user(user_id).await?;
        let acknowledged = self
            .orders
            .read_all_unread_orders(user_id, self.clock.now())
            .await?;
        debug!("User {} acknowledged {} orders", user_id, acknowledged);
        Ok(acknowledged)
    }

    async fn require_order(&self, id: OrderId) -> OrderResult<Order> {
        self.orders
            .query_order_by_id(id)
            .await?
            .ok_or_else(|| OrderError::order_not_found(id))
    }

    async fn require_user(&self, id: UserId) -> OrderResult<User> {
        self.users
            .query_user_by_id(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("User {}", id)))
    }

    /// The conditional write was rejected, so somebody else changed the order
    /// first. Report what it turned into.
    async fn classify_lost_receive(&self, id: OrderId, receiver_id: UserId) -> OrderError {
        match self.orders.query_order_by_id(id).await {
            Ok(Some(current)) => match check_receivable(&current, receiver_id) {
                Err(e) => e,
                Ok(()) => OrderError::Conflict(id),
            },
            Ok(None) => OrderError::order_not_found(id),
            Err(e) => OrderError::Storage(e),
        }
    }
}

fn check_receivable(order: &Order, receiver_id: UserId) -> OrderResult<()> {
    if order.creator_id == receiver_id {
        return Err(OrderError::SelfReceiveForbidden);
    }
    if order.status.is_received() {
        return Err(OrderError::AlreadyReceived);
    }
    if order.status == OrderStatus::PublishedRemoved {
        return Err(OrderError::OrderDeleted);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Cannot receive your own order")]
    SelfReceiveForbidden,

    #[error("Order has already been received by someone else")]
    AlreadyReceived,

    #[error("Order has been deleted")]
    OrderDeleted,

    #[error("Deleting this order is not permitted")]
    Unauthorized,

    #[error("Order end time must not be before its start time")]
    InvalidTimeWindow,

    #[error("Order {0} was modified concurrently")]
    Conflict(OrderId),

    #[error("Storage failure: {0}")]
    Storage(#[from] BoxError),
}

impl OrderError {
    fn order_not_found(id: OrderId) -> Self {
        OrderError::NotFound(format!("Order {}", id))
    }
}
