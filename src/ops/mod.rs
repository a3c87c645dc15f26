pub mod search;
pub mod store;

pub use store::{Change, StoreError, SubscriptionId, TASKS_KEY, TaskStore};
