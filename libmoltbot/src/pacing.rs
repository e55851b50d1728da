//! Request pacing and cancellation
//!
//! Every wait the bot performs (jitter between actions, retry backoff,
//! retry-after hints, the poll interval) goes through a [`Sleeper`], so tests
//! can observe exact durations without waiting for them.

use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends the single scheduling thread
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Sleeper that returns immediately and remembers every requested duration
///
/// Available for all builds to support integration tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order
    pub fn durations(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    /// Sum of all requested durations
    pub fn total(&self) -> Duration {
        self.slept.lock().unwrap().iter().sum()
    }

    pub fn count(&self) -> usize {
        self.slept.lock().unwrap().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Cooperative shutdown flag shared between the signal handler and the loop
#[derive(Debug, Default, Clone)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Inclusive range of seconds a jittered delay is sampled from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl JitterRange {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Sample a delay uniformly from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rng.gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[tokio::test]
    async fn test_recording_sleeper_records_without_waiting() {
        let sleeper = RecordingSleeper::new();
        let start = std::time::Instant::now();

        sleeper.sleep(Duration::from_secs(30)).await;
        sleeper.sleep(Duration::from_secs(2)).await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(sleeper.count(), 2);
        assert_eq!(sleeper.total(), Duration::from_secs(32));
    }

    #[tokio::test]
    async fn test_recording_sleeper_clones_share_log() {
        let sleeper = RecordingSleeper::new();
        let clone = sleeper.clone();
        clone.sleep(Duration::from_millis(5)).await;

        assert_eq!(sleeper.durations(), vec![Duration::from_millis(5)]);
    }

    #[test]
    fn test_shutdown_flag_is_shared() {
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        assert!(!shutdown.is_triggered());

        handle.trigger();
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = JitterRange::new(1.0, 3.0);

        for _ in 0..200 {
            let delay = range.sample(&mut rng);
            assert!(delay >= Duration::from_secs(1), "{:?} below range", delay);
            assert!(delay <= Duration::from_secs(3), "{:?} above range", delay);
        }
    }

    #[test]
    fn test_degenerate_jitter_range() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(JitterRange::new(0.0, 0.0).sample(&mut rng), Duration::ZERO);
        assert_eq!(
            JitterRange::new(2.0, 2.0).sample(&mut rng),
            Duration::from_secs(2)
        );
    }
}
