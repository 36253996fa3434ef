pub mod config;
pub mod policy;
pub mod sync;

pub use config::{build_policy, FilterConfig};
pub use policy::{select_outlinks, DocumentClassificationPolicy};
pub use sync::{SampleSyncClient, SyncError};
