//! Periodic producers feeding sensors.
//!
//! Each sensor gets its own task that wakes on a fixed interval, generates a
//! value and appends it. Tasks never coordinate with each other, so a slow
//! append on one sensor cannot delay another.
//!
//! Producers stop when their [`CancellationToken`] is cancelled. Cancellation
//! is only observed between ticks; an append that has started always
//! completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::SensorRegistry;
use crate::sensor::Sensor;

/// Shortest period accepted by [`spawn_producer`] and [`spawn_sweeper`].
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawn a task appending a generated reading to `sensor` every `period`.
///
/// The first reading is produced immediately. The task runs until `cancel`
/// is cancelled.
///
/// # Example
///
/// ```ignore
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let handle = spawn_producer(sensor, Duration::from_secs(5), cancel.clone());
///
/// // Later, to stop the producer:
/// cancel.cancel();
/// handle.await?;
/// ```
pub fn spawn_producer(
    sensor: Arc<Sensor>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_producer(sensor, period.max(MIN_PERIOD), cancel))
}

async fn run_producer(sensor: Arc<Sensor>, period: Duration, cancel: CancellationToken) {
    info!(
        "Starting producer for {} (interval: {}s)",
        sensor.name(),
        period.as_secs_f64()
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Producer for {} cancelled, stopping", sensor.name());
                break;
            }
            _ = ticker.tick() => {
                let value = sensor.generate_next();
                let reading = sensor.append(value);
                debug!("{}: {} {}", sensor.name(), reading.value, reading.unit);
            }
        }
    }
}

/// Spawn a task evicting expired readings from every sensor every `period`.
///
/// Sensors evict lazily on append; the sweeper bounds how long an idle sensor
/// can hold stale readings.
pub fn spawn_sweeper(
    registry: SensorRegistry,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = period.max(MIN_PERIOD);
    tokio::spawn(async move {
        info!("Starting retention sweep (interval: {}s)", period.as_secs_f64());

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be stale yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Retention sweep cancelled, stopping");
                    break;
                }
                _ = ticker.tick() => {
                    for (_, sensor) in registry.iter() {
                        let evicted = sensor.evict_expired();
                        if evicted > 0 {
                            debug!("Swept {} expired reading(s) from {}", evicted, sensor.name());
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::SensorKind;
    use time::macros::datetime;

    fn sensor(kind: SensorKind) -> (Arc<ManualClock>, Arc<Sensor>) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-05-01 10:00 UTC)));
        let sensor = Arc::new(Sensor::for_kind(kind, clock.clone()));
        (clock, sensor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_appends_on_each_tick() {
        let (_clock, sensor) = sensor(SensorKind::Temperature);
        let cancel = CancellationToken::new();

        let handle = spawn_producer(Arc::clone(&sensor), Duration::from_secs(5), cancel.clone());
        tokio::time::sleep(Duration::from_secs(12)).await;

        // Ticks at 0s, 5s and 10s.
        assert_eq!(sensor.len(), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_producer_stops_and_keeps_data() {
        let (_clock, sensor) = sensor(SensorKind::Humidity);
        let cancel = CancellationToken::new();

        let handle = spawn_producer(Arc::clone(&sensor), Duration::from_secs(7200), cancel.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sensor.len(), 1);

        cancel.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(3 * 7200)).await;
        assert_eq!(sensor.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_producers_are_independent() {
        let (_t_clock, temperature) = sensor(SensorKind::Temperature);
        let (_p_clock, ph) = sensor(SensorKind::Ph);
        let cancel = CancellationToken::new();

        let fast = spawn_producer(Arc::clone(&temperature), Duration::from_secs(5), cancel.clone());
        let slow = spawn_producer(Arc::clone(&ph), Duration::from_secs(6 * 3600), cancel.clone());
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(temperature.len(), 13);
        assert_eq!(ph.len(), 1);

        cancel.cancel();
        fast.await.unwrap();
        slow.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_idle_sensors() {
        let clock = Arc::new(ManualClock::new(datetime!(2024-05-01 10:00 UTC)));
        let registry = SensorRegistry::new(clock.clone());
        registry.get(SensorKind::Humidity).append(70.0);
        registry.get(SensorKind::Ph).append(6.5);

        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(registry.clone(), Duration::from_secs(60), cancel.clone());

        clock.advance(Duration::from_secs(25 * 3600));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(registry.get(SensorKind::Humidity).is_empty());
        assert_eq!(registry.get(SensorKind::Ph).len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_period_is_clamped() {
        let (_clock, sensor) = sensor(SensorKind::Temperature);
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Would panic inside `interval` if the period were not clamped.
        spawn_producer(sensor, Duration::ZERO, cancel).await.unwrap();
    }
}
