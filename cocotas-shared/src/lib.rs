pub mod data;
pub mod errors;
pub mod telemetry;
pub mod types;

pub use data::{DataAccess, MemoryStore, Predicate, RestStore, Subscription};
pub use errors::{AppError, AppResult, ErrorCode};
pub use types::*;
