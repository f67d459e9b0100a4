pub mod memory;
pub mod query;
pub mod store;

pub use memory::InMemoryContentStore;
pub use query::{Condition, RangeOp, SortDirection, SortKey, StoreQuery};
pub use store::{AppMeta, ContentStoreClient, ImageRef, ListResponse, ReqwestContentStoreClient};
