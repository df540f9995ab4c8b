// src/lib.rs
//
// Crate root: module tree plus the public API re-exports.

pub mod constants;
pub mod config;
pub mod error;
pub mod types;

pub mod object_client;
pub mod s3_client;

pub mod paging;
pub mod resolver;
pub mod aggregate;

pub mod filter;
pub mod input;
pub mod views;

pub use aggregate::{aggregate, AggregateResult};
pub use config::{ClientConfig, ViewType};
pub use error::{BatchFailure, ClientError, FilterError, LookupError};
pub use filter::FilterParams;
pub use object_client::ObjectClient;
pub use paging::{page_bucket, EntryStream};
pub use resolver::{lookup_object, resolve_objects, resolve_objects_blocking, LookupOutcome};
pub use s3_client::{run_on_global_rt, S3ObjectClient};
pub use types::{
    BucketInfo, ListRequest, ListingPage, LookupVariant, ObjectEntry, ObjectRecord, PageCursor,
};
