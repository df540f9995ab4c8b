// src/object_client.rs
//
// Remote object-store capability consumed by the resolver and the paging
// walker. `S3ObjectClient` is the production implementation; tests plug in
// in-memory clients.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{BucketInfo, ListRequest, ListingPage, LookupVariant, ObjectRecord};

/// ObjectClient trait for pluggable remote backends.
///
/// Implementations must be safe to share across concurrently running lookups.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Look up `name` in `bucket` with the given variant and return every
    /// matching record. A remote "not found" signal is reported as
    /// [`ClientError::NotFound`]; zero or several matches are not errors here.
    async fn lookup(
        &self,
        bucket: &str,
        name: &str,
        variant: LookupVariant,
    ) -> Result<Vec<ObjectRecord>, ClientError>;

    /// Fetch one page of a bucket listing.
    async fn list_page(&self, request: &ListRequest) -> Result<ListingPage, ClientError>;

    /// Verify the bucket exists and return its details.
    async fn head_bucket(&self, bucket: &str) -> Result<BucketInfo, ClientError>;
}
