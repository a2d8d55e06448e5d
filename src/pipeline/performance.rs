//! Timing layer and the shared statistics it feeds

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::LedgerResult;
use crate::journal::CommandPhase;

/// Last measured durations of one decorated command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub last_execute: Option<Duration>,
    pub last_undo: Option<Duration>,
}

/// Aggregate for one statistics key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStats {
    pub count: u64,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl CommandStats {
    fn first(elapsed: Duration) -> Self {
        Self {
            count: 1,
            total: elapsed,
            min: elapsed,
            max: elapsed,
        }
    }

    fn add(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
    }

    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Thread-safe statistics keyed by command kind
///
/// Lives as long as whoever owns it; cleared only through `reset`.
#[derive(Debug, Default)]
pub struct PerformanceStats {
    entries: Mutex<BTreeMap<String, CommandStats>>,
}

impl PerformanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: &str, elapsed: Duration) {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(stats) => stats.add(elapsed),
            None => {
                entries.insert(key.to_string(), CommandStats::first(elapsed));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<CommandStats> {
        self.lock().get(key).copied()
    }

    /// All keys with their aggregates, sorted by key
    pub fn snapshot(&self) -> Vec<(String, CommandStats)> {
        self.lock()
            .iter()
            .map(|(key, stats)| (key.clone(), *stats))
            .collect()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Render the statistics as a text table
    pub fn report(&self) -> String {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return "No commands have been timed yet.\n".to_string();
        }

        let width = snapshot
            .iter()
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0)
            .max(7);

        let mut output = format!(
            "{:<width$}  {:>6}  {:>10}  {:>10}  {:>10}\n",
            "Command",
            "Count",
            "Avg",
            "Min",
            "Max",
            width = width
        );
        output.push_str(&"-".repeat(width + 44));
        output.push('\n');

        for (key, stats) in snapshot {
            output.push_str(&format!(
                "{:<width$}  {:>6}  {:>10}  {:>10}  {:>10}\n",
                key,
                stats.count,
                format_millis(stats.average()),
                format_millis(stats.min),
                format_millis(stats.max),
                width = width
            ));
        }

        output
    }

    // A panic while recording leaves consistent data behind
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, CommandStats>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn format_millis(duration: Duration) -> String {
    format!("{:.3}ms", duration.as_secs_f64() * 1000.0)
}

/// Statistics key for a step of a command of kind `kind`
pub fn stats_key(kind: &str, phase: CommandPhase) -> String {
    match phase {
        CommandPhase::Execute => kind.to_string(),
        CommandPhase::Undo => format!("{} (undo)", kind),
    }
}

/// Run `f` and record how long it took, whether or not it succeeded
pub fn timed<T>(
    stats: &PerformanceStats,
    timings: &mut Timings,
    kind: &str,
    phase: CommandPhase,
    f: impl FnOnce() -> LedgerResult<T>,
) -> LedgerResult<T> {
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();

    match phase {
        CommandPhase::Execute => timings.last_execute = Some(elapsed),
        CommandPhase::Undo => timings.last_undo = Some(elapsed),
    }
    stats.record(&stats_key(kind, phase), elapsed);
    debug!(
        command = kind,
        %phase,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "Command timed"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stats_aggregate() {
        let stats = PerformanceStats::new();
        stats.record("Transfer", Duration::from_millis(4));
        stats.record("Transfer", Duration::from_millis(2));
        stats.record("Transfer", Duration::from_millis(6));

        let transfer = stats.get("Transfer").unwrap();
        assert_eq!(transfer.count, 3);
        assert_eq!(transfer.min, Duration::from_millis(2));
        assert_eq!(transfer.max, Duration::from_millis(6));
        assert_eq!(transfer.average(), Duration::from_millis(4));
        assert!(stats.get("other").is_none());
    }

    #[test]
    fn test_reset() {
        let stats = PerformanceStats::new();
        stats.record("Transfer", Duration::from_millis(1));
        stats.reset();
        assert!(stats.is_empty());
        assert!(stats.report().contains("No commands"));
    }

    #[test]
    fn test_concurrent_updates() {
        let stats = Arc::new(PerformanceStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record("shared", Duration::from_micros(10));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.get("shared").unwrap().count, 800);
    }

    #[test]
    fn test_timed_records_failures_and_undo_separately() {
        let stats = PerformanceStats::new();
        let mut timings = Timings::default();

        let _ = timed(&stats, &mut timings, "Transfer", CommandPhase::Execute, || Ok(()));
        let err = timed::<()>(&stats, &mut timings, "Transfer", CommandPhase::Undo, || {
            Err(LedgerError::DomainRule("nope".into()))
        });

        assert!(err.is_err());
        assert!(timings.last_execute.is_some());
        assert!(timings.last_undo.is_some());
        assert_eq!(stats.get("Transfer").unwrap().count, 1);
        assert_eq!(stats.get("Transfer (undo)").unwrap().count, 1);
    }

    #[test]
    fn test_report_lists_keys() {
        let stats = PerformanceStats::new();
        stats.record("Create account", Duration::from_millis(1));
        stats.record("Create account", Duration::from_millis(3));
        let report = stats.report();
        assert!(report.contains("Create account"));
        assert!(report.contains("2.000ms"));
        assert!(report.contains("Count"));
    }
}
