pub mod models;
pub mod pii;

pub use models::{
    clamp_size, NewOrder, Order, OrderId, OrderPatch, OrderQuery, OrderStatus, ReceiveRequest,
    SortDirection, SortField, User, UserId, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use pii::Masked;
