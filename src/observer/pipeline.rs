use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::time::timeout;

use crate::observer::error::ObserverError;
use crate::observer::traits::{CreationEvent, CreationObserver};

/// Outcome of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans creation events out to the registered observers
#[derive(Default, Clone)]
pub struct ObserverPipeline {
    observers: Vec<Arc<dyn CreationObserver>>,
}

impl ObserverPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn register_observer(&mut self, observer: Arc<dyn CreationObserver>) {
        tracing::debug!("Registered observer '{}'", observer.name());
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer once. Errors and timeouts are logged
    /// and counted, never returned.
    pub async fn created(&self, event: CreationEvent) -> DispatchReport {
        let start_time = Instant::now();

        let outcomes = join_all(self.observers.iter().map(|observer| {
            let event = &event;
            async move {
                let result = match timeout(observer.timeout(), observer.on_created(event)).await {
                    Ok(result) => result,
                    Err(_) => Err(ObserverError::TimeoutError(format!(
                        "observer '{}' exceeded {:?}",
                        observer.name(),
                        observer.timeout()
                    ))),
                };
                if let Err(e) = &result {
                    tracing::warn!(
                        observer = observer.name(),
                        owner_id = event.owner_id(),
                        "creation observer failed for {:?}: {}",
                        event,
                        e
                    );
                }
                result.is_ok()
            }
        }))
        .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let report = DispatchReport {
            delivered,
            failed: outcomes.len() - delivered,
        };

        tracing::debug!(
            "Creation event dispatched in {:?}: {} delivered, {} failed",
            start_time.elapsed(),
            report.delivered,
            report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl CreationObserver for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn on_created(&self, _event: &CreationEvent) -> Result<(), ObserverError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl CreationObserver for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn on_created(&self, _event: &CreationEvent) -> Result<(), ObserverError> {
            Err(ObserverError::StorageError("boom".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl CreationObserver for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(10)
        }

        async fn on_created(&self, _event: &CreationEvent) -> Result<(), ObserverError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn event() -> CreationEvent {
        CreationEvent::SkillCreated {
            owner_id: 1,
            skill_id: 1,
            name: "Rust".to_string(),
        }
    }

    #[tokio::test]
    async fn delivers_once_per_observer() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register_observer(counting.clone());

        let report = pipeline.created(event()).await;

        assert_eq!(report, DispatchReport { delivered: 1, failed: 0 });
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_contained() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register_observer(Arc::new(Failing));
        pipeline.register_observer(Arc::new(Slow));
        pipeline.register_observer(counting.clone());

        let report = pipeline.created(event()).await;

        assert_eq!(report, DispatchReport { delivered: 1, failed: 2 });
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_pipeline_is_a_no_op() {
        let pipeline = ObserverPipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.created(event()).await, DispatchReport::default());
    }
}
