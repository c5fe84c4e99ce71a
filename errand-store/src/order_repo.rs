use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errand_core::{OrderRepository, RepoResult, WriteOutcome};
use errand_shared::{Order, OrderId, OrderQuery, OrderStatus, SortDirection, SortField, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};

const ORDER_COLUMNS: &str = "id, creator_id, creator_name, receiver_id, receiver_name, status, \
     create_time, update_time, receive_time, start_time, end_time, location, remark, city";

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: OrderId) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    creator_id: i64,
    creator_name: String,
    receiver_id: Option<i64>,
    receiver_name: Option<String>,
    status: String,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
    receive_time: Option<DateTime<Utc>>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    location: Option<String>,
    remark: Option<String>,
    city: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = errand_shared::models::ParseStatusError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            creator_id: row.creator_id,
            creator_name: row.creator_name,
            receiver_id: row.receiver_id,
            receiver_name: row.receiver_name,
            status: row.status.parse()?,
            create_time: row.create_time,
            update_time: row.update_time,
            receive_time: row.receive_time,
            start_time: row.start_time,
            end_time: row.end_time,
            location: row.location,
            remark: row.remark,
            city: row.city,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> RepoResult<Vec<Order>> {
    rows.into_iter()
        .map(|row| Order::try_from(row).map_err(Into::into))
        .collect()
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreateTime => "create_time",
        SortField::UpdateTime => "update_time",
        SortField::StartTime => "start_time",
    }
}

fn sort_direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => " ASC",
        SortDirection::Desc => " DESC",
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &Order) -> RepoResult<Order> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO orders (creator_id, creator_name, receiver_id, receiver_name, status, create_time, update_time, receive_time, start_time, end_time, location, remark, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(order.creator_id)
        .bind(&order.creator_name)
        .bind(order.receiver_id)
        .bind(&order.receiver_name)
        .bind(order.status.as_str())
        .bind(order.create_time)
        .bind(order.update_time)
        .bind(order.receive_time)
        .bind(order.start_time)
        .bind(order.end_time)
        .bind(&order.location)
        .bind(&order.remark)
        .bind(&order.city)
        .fetch_one(&self.pool)
        .await?;

        Ok(Order { id, ..order.clone() })
    }

    async fn query_order_by_id(&self, id: OrderId) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::try_from).transpose()?)
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_status: Option<OrderStatus>,
    ) -> RepoResult<WriteOutcome> {
        // creator fields and create_time are never rewritten; receiver fields
        // only fill in once.
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                receiver_id = COALESCE(receiver_id, $2),
                receiver_name = COALESCE(receiver_name, $3),
                status = $4,
                update_time = $5,
                receive_time = COALESCE(receive_time, $6),
                start_time = $7,
                end_time = $8,
                location = $9,
                remark = $10,
                city = $11
            WHERE id = $1 AND ($12::TEXT IS NULL OR status = $12)
            "#,
        )
        .bind(order.id)
        .bind(order.receiver_id)
        .bind(&order.receiver_name)
        .bind(order.status.as_str())
        .bind(order.update_time)
        .bind(order.receive_time)
        .bind(order.start_time)
        .bind(order.end_time)
        .bind(&order.location)
        .bind(&order.remark)
        .bind(&order.city)
        .bind(expected_status.map(|s| s.as_str()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Updated);
        }
        if self.exists(order.id).await? {
            Ok(WriteOutcome::Conflict)
        } else {
            Ok(WriteOutcome::NotModified)
        }
    }

    async fn delete_order_by_id(&self, id: OrderId) -> RepoResult<WriteOutcome> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            Ok(WriteOutcome::Updated)
        } else {
            Ok(WriteOutcome::NotModified)
        }
    }

    async fn find_order_by_options(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));

        if let Some(creator_id) = query.creator_id {
            qb.push(" AND creator_id = ").push_bind(creator_id);
        }
        if let Some(receiver_id) = query.receiver_id {
            qb.push(" AND receiver_id = ").push_bind(receiver_id);
        }
        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(city) = &query.city {
            qb.push(" AND city = ").push_bind(city.clone());
        }

        qb.push(" ORDER BY ")
            .push(sort_column(query.sort))
            .push(sort_direction(query.direction))
            .push(", id DESC");
        qb.push(" LIMIT ").push_bind(query.limit());
        qb.push(" OFFSET ").push_bind(query.offset());

        let rows = qb
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;
        into_orders(rows)
    }

    async fn find_current_orders(
        &self,
        status: OrderStatus,
        search: Option<&str>,
        city: Option<&str>,
        start: i64,
        size: i64,
    ) -> RepoResult<Vec<Order>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM orders WHERE status = ", ORDER_COLUMNS));
        qb.push_bind(status.as_str());

        if let Some(term) = search {
            let pattern = like_pattern(term);
            qb.push(" AND (location ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR remark ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(city) = city {
            qb.push(" AND city = ").push_bind(city.to_string());
        }

        qb.push(" ORDER BY create_time DESC, id DESC");
        qb.push(" LIMIT ").push_bind(size);
        qb.push(" OFFSET ").push_bind(start);

        let rows = qb
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;
        into_orders(rows)
    }

    async fn read_all_unread_orders(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, update_time = $2 WHERE creator_id = $3 AND status = $4",
        )
        .bind(OrderStatus::ReceivedRead.as_str())
        .bind(now)
        .bind(user_id)
        .bind(OrderStatus::ReceivedUnread.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
