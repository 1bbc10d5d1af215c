//! Subscriber registry with snapshot fan-out
//!
//! Delivery iterates over a snapshot of the subscriber list, so
//! registering or removing a sink while a record is in flight never
//! corrupts iteration or skips another listener. A panicking
//! subscriber is contained the same way a failing one is.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::gsmtap::WireRecord;
use crate::sink::RecordSubscriber;

#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Arc<dyn RecordSubscriber>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, subscriber: Arc<dyn RecordSubscriber>) {
        debug!("[Pipeline] Registered sink {}", subscriber.name());
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
    }

    #[cfg(test)]
    pub fn unregister(&self, name: &str) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|subscriber| subscriber.name() != name);
    }

    pub fn count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self) -> Vec<Arc<dyn RecordSubscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Deliver one record to every subscriber registered at call time.
    /// Returns the number of failed deliveries.
    pub fn notify_record(&self, record: &WireRecord) -> usize {
        let mut failures = 0;
        for subscriber in self.snapshot() {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_record(record))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    debug!("[Pipeline] Sink {} rejected record: {}", subscriber.name(), e);
                }
                Err(_) => {
                    failures += 1;
                    warn!(
                        "[Pipeline] Sink {} panicked during delivery",
                        subscriber.name()
                    );
                }
            }
        }
        failures
    }

    pub fn notify_capture_started(&self, source_name: &str) {
        for subscriber in self.snapshot() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                subscriber.on_capture_started(source_name)
            }));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    "[Pipeline] Sink {} failed to start capture: {}",
                    subscriber.name(),
                    e
                ),
                Err(_) => warn!(
                    "[Pipeline] Sink {} panicked on capture start",
                    subscriber.name()
                ),
            }
        }
    }

    pub fn notify_capture_ended(&self, source_name: &str) {
        for subscriber in self.snapshot() {
            let result =
                catch_unwind(AssertUnwindSafe(|| subscriber.on_capture_ended(source_name)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    "[Pipeline] Sink {} failed to end capture: {}",
                    subscriber.name(),
                    e
                ),
                Err(_) => warn!(
                    "[Pipeline] Sink {} panicked on capture end",
                    subscriber.name()
                ),
            }
        }
    }
}
