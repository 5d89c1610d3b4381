// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-of-run statistics.
//!
//! Per-processor counters live in each [`Sequence`]. At shutdown they are
//! summed by processor name and compared against wall-clock time to give
//! the achieved parallel speed-up.

use crate::engine::sequence::{ProcessorStats, Sequence};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Statistics for one declared processor, summed over every Sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorReport {
    pub name: String,
    /// Events processed to completion; skips are counted separately
    pub events: u64,
    pub skipped: u64,
    /// Seconds spent inside the processor
    pub processor_time: f64,
    /// Seconds including time spent waiting for a critical guard
    pub total_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub strategy: String,
    pub concurrency: usize,
    /// Events that came back from the chain, failed ones included
    pub events: u64,
    pub wall_time: f64,
    pub processor_time: f64,
    pub speedup: f64,
    /// Relative shortfall against ideal linear scaling
    pub deviation: f64,
    pub processors: Vec<ProcessorReport>,
}

impl RunReport {
    /// Aggregate the counters of `sequences` into a report.
    pub fn from_sequences(
        strategy: &str,
        concurrency: usize,
        sequences: &[Sequence],
        events: u64,
        wall_time: Duration,
    ) -> Self {
        let mut merged: IndexMap<&str, ProcessorStats> = IndexMap::new();
        for sequence in sequences {
            for (name, stats) in sequence.stats() {
                merged.entry(name.as_str()).or_default().merge(stats);
            }
        }

        let mut processors: Vec<ProcessorReport> = merged
            .into_iter()
            .map(|(name, stats)| ProcessorReport {
                name: name.to_string(),
                events: stats.events,
                skipped: stats.skipped,
                processor_time: stats.processor_time.as_secs_f64(),
                total_time: stats.total_time.as_secs_f64(),
            })
            .collect();
        processors.sort_by(|a, b| b.processor_time.total_cmp(&a.processor_time));

        let processor_time: f64 = processors.iter().map(|p| p.processor_time).sum();
        let wall = wall_time.as_secs_f64();
        let speedup = if wall > 0.0 { processor_time / wall } else { 0.0 };
        let deviation = if concurrency > 0 {
            (concurrency as f64 - speedup) / concurrency as f64
        } else {
            0.0
        };

        Self {
            strategy: strategy.to_string(),
            concurrency,
            events,
            wall_time: wall,
            processor_time,
            speedup,
            deviation,
            processors,
        }
    }

    pub fn processor(&self, name: &str) -> Option<&ProcessorReport> {
        self.processors.iter().find(|p| p.name == name)
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        writeln!(
            f,
            "{} events, strategy {}, concurrency {}",
            self.events, self.strategy, self.concurrency
        )?;
        writeln!(
            f,
            "{:<24} {:>10} {:>10} {:>14} {:>14}",
            "processor", "events", "skipped", "proc time [s]", "total [s]"
        )?;
        for p in &self.processors {
            writeln!(
                f,
                "{:<24} {:>10} {:>10} {:>14.6} {:>14.6}",
                p.name, p.events, p.skipped, p.processor_time, p.total_time
            )?;
        }
        writeln!(f, "wall time:      {:.6} s", self.wall_time)?;
        writeln!(f, "processor time: {:.6} s", self.processor_time)?;
        write!(
            f,
            "speed-up:       {:.2} ({:.1}% from linear scaling)",
            self.speedup,
            self.deviation * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sequence::SequenceEntry;
    use crate::event::Event;
    use crate::traits::{Outcome, ProcessResult, Processor};
    use std::sync::Arc;

    struct Noop(&'static str);

    impl Processor for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn process_event(&self, _event: &mut Event) -> ProcessResult {
            Ok(Outcome::Continue)
        }
    }

    #[test]
    fn test_empty_report_has_no_speedup() {
        let report = RunReport::from_sequences("parallel", 4, &[], 0, Duration::ZERO);
        assert_eq!(report.speedup, 0.0);
        assert_eq!(report.deviation, 1.0);
        assert!(report.processors.is_empty());
    }

    #[test]
    fn test_processors_are_merged_by_name() {
        let mut sequences = vec![Sequence::new(0), Sequence::new(1)];
        for sequence in &mut sequences {
            let entry = SequenceEntry::new("noop", Arc::new(Noop("noop")), false, true);
            sequence.add_entry(Arc::new(entry)).unwrap();
        }

        let report = RunReport::from_sequences("parallel", 2, &sequences, 0, Duration::from_secs(1));
        assert_eq!(report.processors.len(), 1);
        assert_eq!(report.processor("noop").unwrap().events, 0);
        assert!(report.processor("missing").is_none());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = RunReport::from_sequences("sequential", 1, &[], 3, Duration::from_millis(500));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["strategy"], "sequential");
        assert_eq!(json["events"], 3);
        assert_eq!(json["wall_time"], 0.5);
    }
}
