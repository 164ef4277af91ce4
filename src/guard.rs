//! Single-flight guard for remote calls that must not be issued twice
//! concurrently (upload, launch, the watch loop).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

/// Held while a guarded call is outstanding; releases the guard on drop.
#[derive(Debug)]
pub struct Flight<'a> {
    busy: &'a AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the guard, or returns `None` if a call is already in flight.
    pub fn try_begin(&self) -> Option<Flight<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Flight { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs `fut` unless another guarded call is outstanding, in which case
    /// `fut` is dropped unpolled and `None` is returned.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let _flight = self.try_begin()?;
        Some(fut.await)
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
