pub mod order;
pub mod query;
pub mod user;

pub use order::{NewOrder, Order, OrderId, OrderPatch, OrderStatus, ParseStatusError, ReceiveRequest};
pub use query::{clamp_size, OrderQuery, SortDirection, SortField, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use user::{User, UserId};
