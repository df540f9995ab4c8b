// src/aggregate.rs
//
//! Merge per-name lookup outcomes into one batch result.
//!
//! Policy, first match wins:
//! 1. any failed lookup: log every cause, return [`BatchFailure::Unexpected`];
//! 2. any missing name: return [`BatchFailure::Missing`] listing them in the
//!    order the outcomes were observed;
//! 3. otherwise return every resolved record.

use tracing::error;

use crate::error::BatchFailure;
use crate::resolver::LookupOutcome;
use crate::types::ObjectRecord;

pub type AggregateResult = Result<Vec<ObjectRecord>, BatchFailure>;

pub fn aggregate<I>(outcomes: I) -> AggregateResult
where
    I: IntoIterator<Item = LookupOutcome>,
{
    let mut records = Vec::new();
    let mut missing = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            LookupOutcome::Found(record) => records.push(record),
            LookupOutcome::NotFound(name) => missing.push(name),
            LookupOutcome::Failed { name, cause } => failures.push((name, cause)),
        }
    }

    if !failures.is_empty() {
        for (name, cause) in &failures {
            error!("Encountered an error while getting the object details for {}: {}", name, cause);
        }
        return Err(BatchFailure::Unexpected { failures });
    }

    if !missing.is_empty() {
        return Err(BatchFailure::Missing { names: missing });
    }

    Ok(records)
}
