// tests/common/mod.rs
//
// In-memory ObjectClient used by the resolver and paging tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

use s3query::{
    BucketInfo, ClientError, ListRequest, ListingPage, LookupVariant, ObjectClient, ObjectEntry,
    ObjectRecord, PageCursor,
};

/// Scripted answer for one object name.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Return this many records for the name.
    Matches(usize),
    NotFound,
    /// Transport-level failure with the given message.
    Fail(String),
}

pub fn record(name: &str) -> ObjectRecord {
    ObjectRecord {
        key: name.to_string(),
        last_modified: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).single(),
    }
}

pub fn page(keys: &[&str], next: Option<&str>) -> ListingPage {
    ListingPage {
        objects: keys.iter().map(|k| ObjectEntry::new(*k, 1)).collect(),
        versions: Vec::new(),
        next: next.map(PageCursor::new),
    }
}

#[derive(Default)]
pub struct MockObjectClient {
    replies: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
    pages: Vec<Result<ListingPage, String>>,
    buckets: Vec<String>,
    barrier: Option<Arc<Barrier>>,

    lookup_calls: Mutex<Vec<(String, LookupVariant)>>,
    completed_lookups: AtomicUsize,
    list_requests: Mutex<Vec<ListRequest>>,
}

impl MockObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names without a scripted reply resolve as not found.
    pub fn reply(mut self, name: &str, reply: Reply) -> Self {
        self.replies.insert(name.to_string(), reply);
        self
    }

    pub fn found(self, name: &str) -> Self {
        self.reply(name, Reply::Matches(1))
    }

    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Every lookup waits until `parties` lookups are in flight at once.
    pub fn barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Pages are served in the order they were added, one per request.
    pub fn page(mut self, page: ListingPage) -> Self {
        self.pages.push(Ok(page));
        self
    }

    pub fn page_error(mut self, message: &str) -> Self {
        self.pages.push(Err(message.to_string()));
        self
    }

    pub fn bucket(mut self, name: &str) -> Self {
        self.buckets.push(name.to_string());
        self
    }

    pub fn lookup_calls(&self) -> Vec<(String, LookupVariant)> {
        self.lookup_calls.lock().unwrap().clone()
    }

    pub fn variant_for(&self, name: &str) -> Option<LookupVariant> {
        self.lookup_calls()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn completed_lookups(&self) -> usize {
        self.completed_lookups.load(Ordering::SeqCst)
    }

    pub fn list_requests(&self) -> Vec<ListRequest> {
        self.list_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectClient for MockObjectClient {
    async fn lookup(
        &self,
        _bucket: &str,
        name: &str,
        variant: LookupVariant,
    ) -> Result<Vec<ObjectRecord>, ClientError> {
        self.lookup_calls.lock().unwrap().push((name.to_string(), variant));

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.replies.get(name).cloned().unwrap_or(Reply::NotFound) {
            Reply::Matches(n) => Ok((0..n).map(|_| record(name)).collect()),
            Reply::NotFound => Err(ClientError::not_found(name)),
            Reply::Fail(msg) => Err(ClientError::Transport(anyhow::anyhow!(msg))),
        };
        self.completed_lookups.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn list_page(&self, request: &ListRequest) -> Result<ListingPage, ClientError> {
        let idx = {
            let mut requests = self.list_requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };

        match self.pages.get(idx) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(msg)) => Err(ClientError::Transport(anyhow::anyhow!(msg.clone()))),
            None => Ok(ListingPage::default()),
        }
    }

    async fn head_bucket(&self, bucket: &str) -> Result<BucketInfo, ClientError> {
        if self.buckets.iter().any(|b| b == bucket) {
            Ok(BucketInfo {
                name: bucket.to_string(),
                region: None,
            })
        } else {
            Err(ClientError::not_found(bucket))
        }
    }
}
