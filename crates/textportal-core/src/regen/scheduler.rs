use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use super::job::Regenerator;

/// In-process replacement for an external cron trigger
pub struct SchedulerService {
    regenerator: Arc<dyn Regenerator>,
    interval: Duration,
}

impl SchedulerService {
    /// A zero `interval` disables scheduling
    pub fn new(regenerator: Arc<dyn Regenerator>, interval: Duration) -> Self {
        Self {
            regenerator,
            interval,
        }
    }

    /// Run the regenerator every interval until shutdown signal
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            info!("Background regeneration disabled (refresh_interval_secs = 0)");
            // Still wait for shutdown
            let _ = shutdown.changed().await;
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "Scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        // Skip the first tick (fires immediately)
        ticker.tick().await;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    debug!("Running scheduled regeneration");
                    match self.regenerator.run().await {
                        Ok(report) => info!(
                            run_id = %report.run_id,
                            articles = report.articles,
                            "Scheduled regeneration finished"
                        ),
                        Err(e) => error!(error = %e, "Scheduled regeneration failed"),
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regen::RegenerationReport;
    use crate::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;
    use uuid::Uuid;

    #[derive(Default)]
    struct CountingRegenerator {
        runs: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Regenerator for CountingRegenerator {
        async fn run(&self) -> Result<RegenerationReport> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            if run % 2 == 1 {
                return Err(Error::Regeneration("store unavailable".to_string()));
            }
            Ok(RegenerationReport {
                run_id: Uuid::new_v4(),
                articles: 0,
                weather_unavailable: 0,
                written: Vec::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_every_interval_until_shutdown() {
        let regenerator = Arc::new(CountingRegenerator::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let service = SchedulerService::new(regenerator.clone(), Duration::from_secs(60));
        let handle = tokio::spawn(service.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(200)).await;
        // Failed runs do not stop the loop
        assert_eq!(regenerator.runs.load(Ordering::SeqCst), 3);

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_disabled_scheduler_waits_for_shutdown() {
        let regenerator = Arc::new(CountingRegenerator::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(SchedulerService::new(regenerator.clone(), Duration::ZERO).run(shutdown_rx));

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        assert_eq!(regenerator.runs.load(Ordering::SeqCst), 0);
    }
}
