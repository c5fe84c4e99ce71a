//! In-memory repositories.
//!
//! Backed by `tokio::sync::RwLock`-guarded maps, these provide the same
//! contracts as the Postgres repositories (including the conditional write on
//! `update_order`, which checks and writes under a single write guard) without
//! any persistence. Used by tests and local tooling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errand_core::{OrderRepository, RepoResult, UserRepository, WriteOutcome};
use errand_shared::{
    Order, OrderId, OrderQuery, OrderStatus, SortDirection, SortField, User, UserId,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct OrderTable {
    last_id: OrderId,
    rows: BTreeMap<OrderId, Order>,
}

#[derive(Clone, Default)]
pub struct MemoryOrderRepository {
    table: Arc<RwLock<OrderTable>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn newest_first(a: &Order, b: &Order) -> Ordering {
    b.create_time.cmp(&a.create_time).then(b.id.cmp(&a.id))
}

fn compare_by(field: SortField, a: &Order, b: &Order) -> Ordering {
    match field {
        SortField::CreateTime => a.create_time.cmp(&b.create_time),
        SortField::UpdateTime => a.update_time.cmp(&b.update_time),
        SortField::StartTime => a.start_time.cmp(&b.start_time),
    }
}

fn contains_ignore_case(haystack: &Option<String>, needle_lower: &str) -> bool {
    haystack
        .as_deref()
        .map(|h| h.to_lowercase().contains(needle_lower))
        .unwrap_or(false)
}

fn page(orders: Vec<Order>, start: i64, size: i64) -> Vec<Order> {
    orders
        .into_iter()
        .skip(start.max(0) as usize)
        .take(size.max(0) as usize)
        .collect()
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create_order(&self, order: &Order) -> RepoResult<Order> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let created = Order {
            id: table.last_id,
            ..order.clone()
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn query_order_by_id(&self, id: OrderId) -> RepoResult<Option<Order>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_status: Option<OrderStatus>,
    ) -> RepoResult<WriteOutcome> {
        let mut table = self.table.write().await;
        let Some(stored) = table.rows.get_mut(&order.id) else {
            return Ok(WriteOutcome::NotModified);
        };
        if let Some(expected) = expected_status {
            if stored.status != expected {
                return Ok(WriteOutcome::Conflict);
            }
        }

        // Same column rules as the SQL update: creator fields stay, receiver
        // fields fill in once.
        stored.receiver_id = stored.receiver_id.or(order.receiver_id);
        stored.receiver_name = stored
            .receiver_name
            .take()
            .or_else(|| order.receiver_name.clone());
        stored.receive_time = stored.receive_time.or(order.receive_time);
        stored.status = order.status;
        stored.update_time = order.update_time;
        stored.start_time = order.start_time;
        stored.end_time = order.end_time;
        stored.location = order.location.clone();
        stored.remark = order.remark.clone();
        stored.city = order.city.clone();
        Ok(WriteOutcome::Updated)
    }

    async fn delete_order_by_id(&self, id: OrderId) -> RepoResult<WriteOutcome> {
        let mut table = self.table.write().await;
        match table.rows.remove(&id) {
            Some(_) => Ok(WriteOutcome::Updated),
            None => Ok(WriteOutcome::NotModified),
        }
    }

    async fn find_order_by_options(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        let table = self.table.read().await;
        let mut matched: Vec<Order> = table
            .rows
            .values()
            .filter(|o| query.creator_id.map_or(true, |id| o.creator_id == id))
            .filter(|o| query.receiver_id.map_or(true, |id| o.receiver_id == Some(id)))
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .filter(|o| {
                query
                    .city
                    .as_deref()
                    .map_or(true, |c| o.city.as_deref() == Some(c))
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let primary = match query.direction {
                SortDirection::Asc => compare_by(query.sort, a, b),
                SortDirection::Desc => compare_by(query.sort, b, a),
            };
            primary.then(b.id.cmp(&a.id))
        });

        Ok(page(matched, query.offset(), query.limit()))
    }

    async fn find_current_orders(
        &self,
        status: OrderStatus,
        search: Option<&str>,
        city: Option<&str>,
        start: i64,
        size: i64,
    ) -> RepoResult<Vec<Order>> {
        let needle = search.map(str::to_lowercase);
        let table = self.table.read().await;
        let mut matched: Vec<Order> = table
            .rows
            .values()
            .filter(|o| o.status == status)
            .filter(|o| {
                needle.as_deref().map_or(true, |n| {
                    contains_ignore_case(&o.location, n) || contains_ignore_case(&o.remark, n)
                })
            })
            .filter(|o| city.map_or(true, |c| o.city.as_deref() == Some(c)))
            .cloned()
            .collect();

        matched.sort_by(newest_first);
        Ok(page(matched, start, size))
    }

    async fn read_all_unread_orders(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let mut table = self.table.write().await;
        let mut acknowledged = 0;
        for order in table.rows.values_mut() {
            if order.creator_id == user_id && order.status == OrderStatus::ReceivedUnread {
                order.status = OrderStatus::ReceivedRead;
                order.update_time = now;
                acknowledged += 1;
            }
        }
        Ok(acknowledged)
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn query_user_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
