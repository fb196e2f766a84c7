pub mod error;
pub mod model;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use model::{TaskRecord, TaskStatus};
pub use store::TaskStore;
