//! Per transition audit records and the sinks that receive them.
//!
//! Runners hand one [`StepRecord`] to their sink for every transition attempt. The engine never formats or
//! stores the records itself, and its results are the same whichever sink is attached.

use tracing::info;

use crate::set::StateSet;

/// What happened during one transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord<Σ> {
    /// 1 based, sequential within a run.
    pub index: usize,
    /// Symbol consumed.
    pub symbol: Σ,
    /// Active states before the step.
    pub before: StateSet,
    /// Active states after the step, epsilon closed.
    pub after: StateSet,
}

/// Receives the audit records of a run.
pub trait AuditSink<Σ> {
    /// Called once per transition attempt, in order.
    fn record(&mut self, record: &StepRecord<Σ>);
}

/// Discards everything.
impl<Σ> AuditSink<Σ> for () {
    fn record(&mut self, _record: &StepRecord<Σ>) {}
}

/// Keeps a copy of every record.
impl<Σ: Clone> AuditSink<Σ> for Vec<StepRecord<Σ>> {
    fn record(&mut self, record: &StepRecord<Σ>) {
        self.push(record.clone());
    }
}

impl<Σ, S: AuditSink<Σ> + ?Sized> AuditSink<Σ> for &mut S {
    fn record(&mut self, record: &StepRecord<Σ>) {
        (**self).record(record);
    }
}

/// Emits every record as a `tracing` event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    label: &'static str,
}

impl TracingSink {
    /// `label` is attached to every event, to tell several automata apart in one log.
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl<Σ: std::fmt::Debug> AuditSink<Σ> for TracingSink {
    fn record(&mut self, record: &StepRecord<Σ>) {
        info!(
            automaton = self.label,
            step = record.index,
            symbol = ?record.symbol,
            before = ?record.before,
            after = ?record.after,
            "transition"
        );
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<Σ, F: FnMut(&StepRecord<Σ>)> AuditSink<Σ> for FnSink<F> {
    fn record(&mut self, record: &StepRecord<Σ>) {
        (self.0)(record)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(index: usize) -> StepRecord<char> {
        StepRecord {
            index,
            symbol: 'a',
            before: StateSet::default(),
            after: StateSet::default(),
        }
    }

    #[test]
    fn test_vec_sink_through_mut_ref() {
        fn feed<S: AuditSink<char>>(mut sink: S) {
            sink.record(&record(1));
            sink.record(&record(2));
        }

        let mut records: Vec<StepRecord<char>> = Vec::new();
        feed(&mut records);
        assert_eq!(records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_fn_sink() {
        let mut seen = 0;
        let mut sink = FnSink(|r: &StepRecord<char>| seen += r.index);
        sink.record(&record(3));
        sink.record(&record(4));
        drop(sink);
        assert_eq!(seen, 7);
    }

    #[test]
    fn test_silent_sinks_accept_records() {
        ().record(&record(1));
        TracingSink::new("test").record(&record(1));
    }
}
