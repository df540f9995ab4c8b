// src/constants.rs
//
// Centralized constants for s3query to avoid hardcoded values throughout the codebase

/// Object names ending in this suffix (case-insensitive) are resolved with the
/// detailed, latest-only lookup. The basic lookup goes through a response path
/// that reformats JSON payloads, so these names must bypass it.
pub const DETAILED_LOOKUP_SUFFIX: &str = ".json";

/// Region used when neither `AWS_REGION` nor the provider chain supplies one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default per-operation timeout enforced by the transport (seconds)
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout enforced by the transport (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Upper bound on worker threads for the global blocking runtime
pub const MAX_RUNTIME_THREADS: usize = 32;

/// Lower bound on worker threads for the global blocking runtime
pub const MIN_RUNTIME_THREADS: usize = 8;

// ============================================================================
// Environment variables
// ============================================================================

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
pub const ENV_CA_BUNDLE_PATH: &str = "AWS_CA_BUNDLE_PATH";
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "S3QUERY_OPERATION_TIMEOUT_SECS";
pub const ENV_RT_THREADS: &str = "S3QUERY_RT_THREADS";

// ============================================================================
// User-facing messages
// ============================================================================

/// Message of a batch that hit at least one failed lookup. Individual causes
/// are logged, not included here.
pub const UNEXPECTED_LOOKUP_ERROR_MSG: &str =
    "Encountered an unexpected error while attempting to get object details for piped files.";

/// Prefix of a batch failure listing missing object names.
pub const MISSING_OBJECTS_PREFIX: &str = "Could not find the following objects: ";

pub const UNKNOWN_BUCKET_MSG: &str = "Error: Unknown bucket.";

pub const EMPTY_BUCKET_MSG: &str = "No objects were reported in bucket.";
