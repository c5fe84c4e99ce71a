pub mod clock;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{BoxError, OrderRepository, RepoResult, UserRepository, WriteOutcome};
