// src/errors.rs
// Typed error surface for the SDK. Fetch-layer failures are retried before they
// reach callers; math-layer failures are fatal to the single call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    /// Network or HTTP failure from an upstream feed (pre-retry detail).
    #[error("fetch failed for '{key}': {reason}")]
    FetchFailed { key: String, reason: String },

    /// Retries exhausted and no stale cache entry to fall back on.
    #[error("data unavailable for '{key}' after {attempts} attempts")]
    Unavailable { key: String, attempts: usize },

    /// Tick outside the protocol domain, or tick data that cannot form a range.
    #[error("invalid tick index {0}")]
    InvalidTick(i32),

    /// Tick range rejected for a specific reason (e.g. lower >= upper, or the
    /// fixed deposit token is inactive for the range).
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Slippage must be in [0, 1).
    #[error("invalid slippage {0}")]
    InvalidSlippage(f64),

    /// Fixed-point intermediate exceeded the representable range.
    #[error("math overflow in {0}")]
    MathOverflow(&'static str),

    /// Pool missing from an upstream feed or on-chain read.
    #[error("pool not found: {0}")]
    PoolNotFound(String),

    /// Per-position valuation failure; callers skip and continue.
    #[error("failed to process position in pool {pool}: {reason}")]
    PositionProcessingFailed { pool: String, reason: String },
}

pub type SdkResult<T> = Result<T, SdkError>;
