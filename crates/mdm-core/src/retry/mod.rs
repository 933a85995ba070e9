//! Attempt budget, backoff and the error types of the retry loop.
//!
//! Every attempt failure is treated as transient: which failure mode a URL
//! hits says little about whether the next strategy will work, so the only
//! inputs to the decision are the attempt number and the budget.

mod error;
mod policy;

pub use error::{AttemptError, ConfigError, ExhaustedError, ItemError};
pub use policy::{RetryDecision, RetryPolicy, MAX_ATTEMPTS};
