use crossbeam_channel::RecvTimeoutError;
use std::thread;
use std::time::{Duration, Instant};

/// Simple stopwatch for stage timing
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Timing measurements for a single pipeline run
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub load_ms: f64,
    pub preprocess_ms: f64,
    pub recognize_ms: f64,
    pub filter_ms: f64,
    pub correct_ms: f64,
}

impl StageTimings {
    pub fn total_ms(&self) -> f64 {
        self.load_ms + self.preprocess_ms + self.recognize_ms + self.filter_ms + self.correct_ms
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Timings: load {:.1}ms | preprocess {:.1}ms | ocr {:.1}ms | filter {:.1}ms | correct {:.1}ms | total {:.1}ms",
            self.load_ms,
            self.preprocess_ms,
            self.recognize_ms,
            self.filter_ms,
            self.correct_ms,
            self.total_ms()
        );
    }
}

/// Outcome of a job run under a deadline
#[derive(Debug, PartialEq)]
pub enum DeadlineOutcome<T> {
    Finished(T),
    TimedOut,
    /// The worker panicked or could not be spawned
    Abandoned,
}

/// Run `job` on a named worker thread and wait at most `timeout` for it.
///
/// A job that overruns keeps running detached; its result is dropped.
pub fn run_with_deadline<T, F>(name: &str, timeout: Duration, job: F) -> DeadlineOutcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);

    let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
        let _ = tx.send(job());
    });

    if let Err(e) = spawned {
        tracing::error!("Failed to spawn {} worker: {}", name, e);
        return DeadlineOutcome::Abandoned;
    }

    match rx.recv_timeout(timeout) {
        Ok(value) => DeadlineOutcome::Finished(value),
        Err(RecvTimeoutError::Timeout) => DeadlineOutcome::TimedOut,
        Err(RecvTimeoutError::Disconnected) => DeadlineOutcome::Abandoned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_timings_total() {
        let timings = StageTimings {
            load_ms: 1.0,
            preprocess_ms: 2.0,
            recognize_ms: 3.0,
            filter_ms: 0.5,
            correct_ms: 0.5,
        };
        assert_eq!(timings.total_ms(), 7.0);
        assert_eq!(StageTimings::default().total_ms(), 0.0);
    }

    #[test]
    fn test_timer_advances() {
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5.0);
    }

    #[test]
    fn test_deadline_finishes() {
        let outcome = run_with_deadline("quick", Duration::from_secs(5), || 41 + 1);
        assert_eq!(outcome, DeadlineOutcome::Finished(42));
    }

    #[test]
    fn test_deadline_times_out() {
        let outcome = run_with_deadline("slow", Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            1
        });
        assert_eq!(outcome, DeadlineOutcome::TimedOut);
    }

    #[test]
    fn test_deadline_worker_panic() {
        let outcome: DeadlineOutcome<u32> =
            run_with_deadline("panicky", Duration::from_secs(5), || panic!("engine crashed"));
        assert_eq!(outcome, DeadlineOutcome::Abandoned);
    }
}
