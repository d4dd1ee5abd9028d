//! Bounded-concurrency admission gates.
//!
//! # Responsibilities
//! - Bound how many operations of one kind are in flight at once
//! - Suspend callers without spinning when a gate is saturated
//! - Grant permits to waiters in arrival order
//!
//! # Design Decisions
//! - One gate per pipeline: the accept pipeline and the request pipeline
//!   guard different resources and never share a limit
//! - Variant (bounded vs. unbounded) is chosen once at construction
//! - Permits are RAII guards; dropping a permit releases it, so a release
//!   without a matching acquire cannot be expressed, and a caller cancelled
//!   after being granted a permit returns it automatically

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A permit source that bounds concurrent work on one pipeline.
///
/// The bounded variant holds a fixed number of permits and queues callers
/// fairly when none are available. The unbounded variant admits every caller
/// immediately and is used when a pipeline's limit is set to the unbounded
/// sentinel.
#[derive(Debug)]
pub struct AdmissionGate {
    inner: Gate,
}

#[derive(Debug)]
enum Gate {
    Bounded {
        semaphore: Arc<Semaphore>,
        capacity: usize,
    },
    Unbounded,
}

impl AdmissionGate {
    /// Create a counting gate with `capacity` permits.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Gate::Bounded {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
            },
        }
    }

    /// Create a gate that never suspends callers.
    pub fn unbounded() -> Self {
        Self {
            inner: Gate::Unbounded,
        }
    }

    /// Obtain one permit, waiting if the gate is saturated.
    ///
    /// This is the only suspension point in the crate. Waiters on a bounded
    /// gate are resumed in the order they arrived. The returned permit must
    /// be held for the duration of the admitted operation; dropping it
    /// returns the permit to the gate.
    pub async fn acquire(&self) -> AdmissionPermit {
        match &self.inner {
            Gate::Bounded { semaphore, .. } => {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("gate semaphore closed unexpectedly");
                AdmissionPermit {
                    _permit: Some(permit),
                }
            }
            Gate::Unbounded => AdmissionPermit { _permit: None },
        }
    }

    /// Configured capacity, or `None` for the unbounded variant.
    pub fn capacity(&self) -> Option<usize> {
        match &self.inner {
            Gate::Bounded { capacity, .. } => Some(*capacity),
            Gate::Unbounded => None,
        }
    }

    /// Permits currently available, or `None` for the unbounded variant.
    pub fn available(&self) -> Option<usize> {
        match &self.inner {
            Gate::Bounded { semaphore, .. } => Some(semaphore.available_permits()),
            Gate::Unbounded => None,
        }
    }

    /// Whether this gate actually limits concurrency.
    pub fn is_bounded(&self) -> bool {
        matches!(self.inner, Gate::Bounded { .. })
    }
}

/// A held admission slot.
///
/// Returned to the gate when dropped. This holds even if the admitted task
/// panics or is cancelled mid-operation.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}
