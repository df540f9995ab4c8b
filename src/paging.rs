// src/paging.rs
//
//! Turns the cursor-based listing API into one lazy, ordered stream of
//! entries.
//!
//! The next page is requested only after every entry of the current page has
//! been consumed, so at most one page is held in memory. The stream cannot be
//! resumed part-way: iterate again by calling [`page_bucket`] with the
//! original starting cursor.

use async_stream::try_stream;
use futures_core::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::error::ClientError;
use crate::object_client::ObjectClient;
use crate::types::{ListRequest, ListingPage, ObjectEntry};

/// A boxed, pinned, sendable stream of listing entries.
pub type EntryStream = Pin<Box<dyn Stream<Item = Result<ObjectEntry, ClientError>> + Send + 'static>>;

/// Walk every page of `request`, starting at `request.cursor`.
///
/// Entries come out in the order the remote returns them. The first error
/// from the remote is yielded and ends the stream.
pub fn page_bucket<C>(client: Arc<C>, request: ListRequest) -> EntryStream
where
    C: ObjectClient + ?Sized + 'static,
{
    Box::pin(try_stream! {
        let mut request = request;
        let mut page_no = 0usize;

        loop {
            page_no += 1;
            debug!(
                "LIST page {}: bucket={}, prefix={:?}, versions={}, cursor={:?}",
                page_no, request.bucket, request.prefix, request.include_versions, request.cursor
            );

            let ListingPage { objects, versions, next } = client.list_page(&request).await?;
            let entries = if request.include_versions { versions } else { objects };

            for entry in entries {
                yield entry;
            }

            match next {
                Some(cursor) => request.cursor = Some(cursor),
                None => break,
            }
        }
    })
}
