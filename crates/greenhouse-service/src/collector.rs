//! Background data collector.
//!
//! Runs one producer per sensor at its configured interval, plus an optional
//! retention sweep.

use std::sync::Arc;
use std::time::Duration;

use greenhouse_core::{SensorKind, spawn_producer, spawn_sweeper};
use tracing::info;

use crate::state::AppState;

/// How long [`Collector::stop`] waits for tasks before aborting them.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Background collector that feeds every sensor on its own interval.
pub struct Collector {
    state: Arc<AppState>,
}

impl Collector {
    /// Create a new collector.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start producing readings for all sensors.
    ///
    /// This spawns a separate task for each sensor. Returns immediately;
    /// production happens in the background. Returns `false` if the
    /// collector was already running.
    pub async fn start(&self) -> bool {
        let (periods, sweep) = {
            let config = self.state.config.read().await;
            let periods: Vec<_> = SensorKind::ALL
                .into_iter()
                .map(|kind| (kind, config.sensors.interval(kind)))
                .collect();
            (periods, config.retention.sweep_interval())
        };

        let registry = &self.state.registry;
        self.state.collector.try_start(|cancel| {
            info!("Starting collector for {} sensor(s)", periods.len());

            let mut tasks: Vec<_> = periods
                .iter()
                .map(|&(kind, period)| {
                    spawn_producer(Arc::clone(registry.get(kind)), period, cancel.child_token())
                })
                .collect();

            if let Some(period) = sweep {
                tasks.push(spawn_sweeper(registry.clone(), period, cancel.child_token()));
            }
            tasks
        })
    }

    /// Stop every task of the current run.
    ///
    /// Returns `None` if the collector was not running, otherwise whether
    /// all tasks of that run stopped within [`STOP_TIMEOUT`]. A run started
    /// while this one is winding down is left alone.
    pub async fn stop(&self) -> Option<bool> {
        let run = self.state.collector.signal_stop()?;
        let clean = run.wait(STOP_TIMEOUT).await;
        info!("Collector stopped");
        Some(clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use greenhouse_core::{ManualClock, SensorRegistry};
    use time::macros::datetime;

    fn create_test_state(config: Config) -> Arc<AppState> {
        let clock = Arc::new(ManualClock::new(datetime!(2024-05-01 10:00 UTC)));
        AppState::new(SensorRegistry::new(clock), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_feeds_every_sensor() {
        let state = create_test_state(Config::default());
        let collector = Collector::new(Arc::clone(&state));

        assert!(collector.start().await);
        tokio::time::sleep(Duration::from_secs(11)).await;

        // Temperature ticks at 0s, 5s and 10s; the slow sensors only once.
        assert_eq!(state.registry.get(SensorKind::Temperature).len(), 3);
        assert_eq!(state.registry.get(SensorKind::Humidity).len(), 1);
        assert_eq!(state.registry.get(SensorKind::Ph).len(), 1);

        assert_eq!(collector.stop().await, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let state = create_test_state(Config::default());
        let collector = Collector::new(Arc::clone(&state));

        assert!(collector.start().await);
        assert!(!collector.start().await);
        assert_eq!(collector.stop().await, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_data_and_halts_production() {
        let state = create_test_state(Config::default());
        let collector = Collector::new(Arc::clone(&state));

        collector.start().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(collector.stop().await, Some(true));

        let before = state.registry.get(SensorKind::Temperature).len();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(state.registry.get(SensorKind::Temperature).len(), before);
        assert!(before > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_during_stop_keeps_new_run_producing() {
        let state = create_test_state(Config::default());
        let collector = Collector::new(Arc::clone(&state));

        assert!(collector.start().await);
        tokio::time::sleep(Duration::from_secs(1)).await;

        // A start request lands between the stop signal and the wait.
        let stopped = state.collector.signal_stop().unwrap();
        assert!(collector.start().await);
        assert!(stopped.wait(STOP_TIMEOUT).await);

        let before = state.registry.get(SensorKind::Temperature).len();
        tokio::time::sleep(Duration::from_secs(60)).await;
        let after = state.registry.get(SensorKind::Temperature).len();

        assert!(state.collector.is_running());
        assert!(after > before, "before={before} after={after}");
        assert_eq!(collector.stop().await, Some(true));
    }

    #[tokio::test]
    async fn test_stop_when_not_running() {
        let state = create_test_state(Config::default());
        let collector = Collector::new(state);
        assert_eq!(collector.stop().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_intervals_and_sweep() {
        let mut config = Config::default();
        config.sensors.ph.interval = Some(2);
        config.retention.sweep_interval = 60;
        let state = create_test_state(config);
        let collector = Collector::new(Arc::clone(&state));

        collector.start().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Ticks at 0s, 2s and 4s.
        assert_eq!(state.registry.get(SensorKind::Ph).len(), 3);
        assert_eq!(collector.stop().await, Some(true));
    }
}
