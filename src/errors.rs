//! Provides the error type raised while building a [crate::Skeleton].
//!
//! Runtime queries and pose conversions never fail; they return sentinels instead.

use thiserror::Error;

/// Errors raised when a joint list cannot be turned into a valid hierarchy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    /// Parents must precede their children (this also excludes cycles)
    #[error("Joint {joint} references parent {parent} which is not defined before it")]
    InvalidParent { joint: usize, parent: usize },
    #[error("Joint {0} has a degenerate (non-positive) default scale")]
    DegenerateScale(usize),
}
