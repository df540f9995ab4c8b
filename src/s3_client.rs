// src/s3_client.rs
//
//! S3 implementation of [`ObjectClient`] on top of the async AWS Rust SDK.
//! Also owns the global multi-thread Tokio runtime used by the blocking
//! helpers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::DateTime as AwsDateTime;
use aws_sdk_s3::types::{Object, ObjectVersion};
use aws_sdk_s3::{Client, config::Region};
use aws_smithy_http_client::tls;
use aws_smithy_http_client::tls::rustls_provider::CryptoMode;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use tokio::runtime::{Builder as TokioBuilder, Runtime};
use tracing::debug;

use crate::config::ClientConfig;
use crate::constants::DEFAULT_REGION;
use crate::error::ClientError;
use crate::object_client::ObjectClient;
use crate::types::{
    BucketInfo, ListRequest, ListingPage, LookupVariant, ObjectEntry, ObjectRecord, PageCursor,
};

// -----------------------------------------------------------------------------
// Library runtime behind the blocking helpers
// -----------------------------------------------------------------------------
static GLOBAL_RT: OnceCell<Runtime> = OnceCell::new();

/// Multi-thread runtime owned by the library, built on first use and never
/// dropped.
fn global_runtime() -> Result<&'static Runtime> {
    GLOBAL_RT.get_or_try_init(|| {
        let threads = ClientConfig::from_env().runtime_threads;
        debug!("Starting s3query runtime with {} worker threads", threads);
        TokioBuilder::new_multi_thread()
            .worker_threads(threads)
            .thread_name("s3query-rt-worker")
            .enable_all()
            .build()
            .context("Failed to build s3query runtime")
    })
}

/// Run `fut` on the library runtime and park the calling thread until it
/// finishes. Safe to call from plain threads and from blocking sections of
/// another runtime.
pub fn run_on_global_rt<F, T>(fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    global_runtime()?.spawn(async move {
        let _ = tx.send(fut.await);
    });
    // The sender is dropped without a value only if the task panicked.
    rx.recv()
        .map_err(|_| anyhow::anyhow!("task on the s3query runtime ended without a result"))?
}

// -----------------------------------------------------------------------------
// TLS helper, for CA bundle
// -----------------------------------------------------------------------------

/// Create a TLS context using a CA bundle file
fn tls_context_from_pem(filename: impl AsRef<Path>) -> Result<tls::TlsContext> {
    let pem_contents = fs::read(&filename).with_context(|| {
        format!("Failed to read CA bundle file: {}", filename.as_ref().display())
    })?;

    let trust_store = tls::TrustStore::empty().with_pem_certificate(pem_contents.as_slice());

    tls::TlsContext::builder()
        .with_trust_store(trust_store)
        .build()
        .with_context(|| {
            format!("Failed to build TLS context from PEM {}", filename.as_ref().display())
        })
}

// -----------------------------------------------------------------------------
// Error classification
// -----------------------------------------------------------------------------

/// Map an SDK error onto [`ClientError`]. A 404 status or a not-found error
/// code is the remote's not-found signal.
fn classify<E>(err: SdkError<E, HttpResponse>, operation: &str, resource: &str) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());

    if let SdkError::ServiceError(service) = &err {
        let code = service.err().code().unwrap_or_default();
        if status == Some(404) || matches!(code, "NotFound" | "NoSuchKey" | "NoSuchBucket") {
            return ClientError::not_found(resource);
        }
        return ClientError::Service {
            status: status.unwrap_or_default(),
            code: code.to_string(),
            message: service.err().message().unwrap_or_default().to_string(),
        };
    }

    ClientError::Transport(anyhow::Error::new(err).context(format!("{operation} {resource} failed")))
}

fn to_utc(dt: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn entry_from_object(obj: &Object) -> ObjectEntry {
    ObjectEntry {
        key: obj.key().unwrap_or_default().to_string(),
        size: obj.size().unwrap_or_default().max(0) as u64,
        last_modified: obj.last_modified().and_then(to_utc),
        e_tag: obj.e_tag().map(str::to_owned),
        owner: obj.owner().and_then(|o| o.display_name()).map(str::to_owned),
        version_id: None,
        is_latest: true,
    }
}

fn entry_from_version(ver: &ObjectVersion) -> ObjectEntry {
    ObjectEntry {
        key: ver.key().unwrap_or_default().to_string(),
        size: ver.size().unwrap_or_default().max(0) as u64,
        last_modified: ver.last_modified().and_then(to_utc),
        e_tag: ver.e_tag().map(str::to_owned),
        owner: ver.owner().and_then(|o| o.display_name()).map(str::to_owned),
        version_id: ver.version_id().map(str::to_owned),
        is_latest: ver.is_latest().unwrap_or(false),
    }
}

/// Resume point after a ListObjectsV2 page: the last key, when truncated.
fn next_current_cursor(truncated: Option<bool>, objects: &[ObjectEntry]) -> Option<PageCursor> {
    match truncated {
        Some(true) => objects.last().map(|e| PageCursor::new(e.key.clone())),
        _ => None,
    }
}

/// Resume point after a ListObjectVersions page. A truncated page without a
/// key marker cannot be continued.
fn next_version_cursor(
    truncated: Option<bool>,
    key_marker: Option<&str>,
    version_marker: Option<&str>,
) -> Option<PageCursor> {
    match (truncated, key_marker) {
        (Some(true), Some(marker)) => {
            Some(PageCursor::with_version(marker, version_marker.map(str::to_owned)))
        }
        _ => None,
    }
}

/// Latest versions whose key is exactly `name`. Delete markers are not in
/// `versions`, so a deleted object yields nothing.
fn latest_matches(versions: &[ObjectVersion], name: &str) -> Vec<ObjectRecord> {
    versions
        .iter()
        .filter(|v| v.key() == Some(name) && v.is_latest() == Some(true))
        .map(|v| ObjectRecord {
            key: name.to_owned(),
            last_modified: v.last_modified().and_then(to_utc),
        })
        .collect()
}

// -----------------------------------------------------------------------------
// S3ObjectClient
// -----------------------------------------------------------------------------

/// [`ObjectClient`] backed by an `aws_sdk_s3::Client`. Cheap to clone; the
/// underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct S3ObjectClient {
    client: Client,
}

impl S3ObjectClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from `config`. Credentials come from the AWS default
    /// provider chain.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

        if let Some(endpoint) = &config.endpoint_url {
            debug!("Using custom endpoint {}", endpoint);
            loader = loader.endpoint_url(endpoint);
        }

        if let Some(ca_bundle_path) = &config.ca_bundle_path {
            debug!("Loading CA bundle from {}", ca_bundle_path.display());
            let tls_context = tls_context_from_pem(ca_bundle_path)?;
            loader = loader.http_client(
                aws_smithy_http_client::Builder::new()
                    .tls_provider(tls::Provider::Rustls(CryptoMode::AwsLc))
                    .tls_context(tls_context)
                    .build_https(),
            );
        }

        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(config.connect_timeout)
            .operation_timeout(config.operation_timeout)
            .build();

        let cfg = loader.timeout_config(timeout_config).load().await;

        // S3-compatible services behind a custom endpoint need path-style
        // addressing (endpoint/bucket rather than bucket.endpoint).
        let s3_config = aws_sdk_s3::config::Builder::from(&cfg)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        Ok(Self::new(Client::from_conf(s3_config)))
    }

    async fn head_object(&self, bucket: &str, name: &str) -> Result<Vec<ObjectRecord>, ClientError> {
        let out = self
            .client
            .head_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| classify(e, "HeadObject", name))?;

        Ok(vec![ObjectRecord {
            key: name.to_owned(),
            last_modified: out.last_modified().and_then(to_utc),
        }])
    }

    /// Every latest, non-deleted version whose key is exactly `name`.
    async fn latest_versions(&self, bucket: &str, name: &str) -> Result<Vec<ObjectRecord>, ClientError> {
        let mut records = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_marker: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_object_versions()
                .bucket(bucket)
                .prefix(name)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_marker.take())
                .send()
                .await
                .map_err(|e| classify(e, "ListObjectVersions", name))?;

            records.extend(latest_matches(resp.versions(), name));

            match next_version_cursor(
                resp.is_truncated(),
                resp.next_key_marker(),
                resp.next_version_id_marker(),
            ) {
                Some(cursor) => {
                    key_marker = Some(cursor.marker);
                    version_marker = cursor.version_marker;
                }
                None => break,
            }
        }

        Ok(records)
    }

    async fn list_current(&self, request: &ListRequest) -> Result<ListingPage, ClientError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .set_prefix(request.prefix.clone())
            .set_start_after(request.cursor.as_ref().map(|c| c.marker.clone()))
            .fetch_owner(true)
            .send()
            .await
            .map_err(|e| classify(e, "ListObjectsV2", &request.bucket))?;

        let objects: Vec<ObjectEntry> = resp.contents().iter().map(entry_from_object).collect();
        let next = next_current_cursor(resp.is_truncated(), &objects);

        Ok(ListingPage {
            objects,
            versions: Vec::new(),
            next,
        })
    }

    async fn list_versions(&self, request: &ListRequest) -> Result<ListingPage, ClientError> {
        let resp = self
            .client
            .list_object_versions()
            .bucket(&request.bucket)
            .set_prefix(request.prefix.clone())
            .set_key_marker(request.cursor.as_ref().map(|c| c.marker.clone()))
            .set_version_id_marker(request.cursor.as_ref().and_then(|c| c.version_marker.clone()))
            .send()
            .await
            .map_err(|e| classify(e, "ListObjectVersions", &request.bucket))?;

        let versions = resp.versions().iter().map(entry_from_version).collect();
        let next = next_version_cursor(
            resp.is_truncated(),
            resp.next_key_marker(),
            resp.next_version_id_marker(),
        );

        Ok(ListingPage {
            objects: Vec::new(),
            versions,
            next,
        })
    }
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn lookup(
        &self,
        bucket: &str,
        name: &str,
        variant: LookupVariant,
    ) -> Result<Vec<ObjectRecord>, ClientError> {
        match variant {
            LookupVariant::Basic => self.head_object(bucket, name).await,
            LookupVariant::DetailedLatest => self.latest_versions(bucket, name).await,
        }
    }

    async fn list_page(&self, request: &ListRequest) -> Result<ListingPage, ClientError> {
        if request.include_versions {
            self.list_versions(request).await
        } else {
            self.list_current(request).await
        }
    }

    async fn head_bucket(&self, bucket: &str) -> Result<BucketInfo, ClientError> {
        let out = self
            .client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, "HeadBucket", bucket))?;

        Ok(BucketInfo {
            name: bucket.to_owned(),
            region: out.bucket_region().map(str::to_owned),
        })
    }
}
