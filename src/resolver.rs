// src/resolver.rs
//
//! Resolve a batch of object names to their current metadata.
//!
//! One lookup task is spawned per name and all of them run concurrently with
//! no limit on fan-out. The batch waits for every task: a failing lookup never
//! cancels its siblings. Outcomes are classified per name and then merged by
//! [`aggregate`](crate::aggregate::aggregate) into a single all-or-nothing
//! result.

use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use crate::aggregate::{AggregateResult, aggregate};
use crate::error::{ClientError, LookupError};
use crate::object_client::ObjectClient;
use crate::s3_client::run_on_global_rt;
use crate::types::{LookupVariant, ObjectRecord};

/// Result of looking up a single name. Every requested name produces exactly
/// one outcome.
#[derive(Debug)]
pub enum LookupOutcome {
    /// Exactly one record matched.
    Found(ObjectRecord),
    /// The remote reported not-found, or nothing matched.
    NotFound(String),
    /// The lookup errored or matched more than one record.
    Failed { name: String, cause: LookupError },
}

/// Look up one name and classify the answer.
pub async fn lookup_object<C>(client: &C, bucket: &str, name: &str) -> LookupOutcome
where
    C: ObjectClient + ?Sized,
{
    let variant = LookupVariant::for_name(name);
    debug!("LOOKUP {:?}: bucket={}, name={}", variant, bucket, name);

    match client.lookup(bucket, name, variant).await {
        Ok(records) if records.len() > 1 => LookupOutcome::Failed {
            name: name.to_owned(),
            cause: LookupError::AmbiguousMatch {
                name: name.to_owned(),
                matches: records.len(),
            },
        },
        Ok(mut records) => match records.pop() {
            Some(record) => LookupOutcome::Found(record),
            None => LookupOutcome::NotFound(name.to_owned()),
        },
        Err(ClientError::NotFound { .. }) => LookupOutcome::NotFound(name.to_owned()),
        Err(e) => LookupOutcome::Failed {
            name: name.to_owned(),
            cause: e.into(),
        },
    }
}

/// Resolve every name in `names` concurrently and aggregate the outcomes.
///
/// Must be called from within a Tokio runtime. Records of a successful batch
/// are not guaranteed to follow input order; re-sort if order matters.
pub async fn resolve_objects<C>(client: Arc<C>, bucket: &str, names: &[String]) -> AggregateResult
where
    C: ObjectClient + ?Sized + 'static,
{
    debug!("Resolving {} object names in bucket {}", names.len(), bucket);

    let tasks = names.iter().map(|name| {
        let client = Arc::clone(&client);
        let bucket = bucket.to_owned();
        let name = name.clone();
        tokio::spawn(async move { lookup_object(client.as_ref(), &bucket, &name).await })
    });

    // join_all waits for every task, whatever the others returned.
    let joined = join_all(tasks).await;

    let outcomes = names.iter().zip(joined).map(|(name, res)| {
        res.unwrap_or_else(|e| LookupOutcome::Failed {
            name: name.clone(),
            cause: LookupError::Aborted {
                name: name.clone(),
                reason: e.to_string(),
            },
        })
    });

    aggregate(outcomes)
}

/// Blocking wrapper around [`resolve_objects`] for callers without an async
/// context. Runs on the global runtime and parks the current thread until
/// every lookup has finished. A [`BatchFailure`](crate::error::BatchFailure)
/// is returned inside the `anyhow::Error` and can be downcast.
pub fn resolve_objects_blocking<C>(
    client: Arc<C>,
    bucket: &str,
    names: Vec<String>,
) -> anyhow::Result<Vec<ObjectRecord>>
where
    C: ObjectClient + ?Sized + 'static,
{
    let bucket = bucket.to_owned();
    run_on_global_rt(async move {
        resolve_objects(client, &bucket, &names)
            .await
            .map_err(anyhow::Error::from)
    })
}
