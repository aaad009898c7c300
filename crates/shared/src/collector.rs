use tracing::{debug, error, info, warn};

use crate::error::{ParseError, SinkWriteError};
use crate::models::{CollectedBatch, RawRecord};
use crate::sink::BatchSink;

/// Source error code for a connection lost after the stream was established.
/// Not an HTTP status.
pub const TRANSPORT_FAILURE_CODE: u16 = 0;

/// Callbacks a push source invokes. Returning `false` asks the source to stop.
pub trait StreamListener {
    fn on_record(&mut self, raw: &str) -> bool;
    fn on_source_error(&mut self, code: u16) -> bool;

    /// A line the source could not turn into text at all.
    fn on_malformed(&mut self, error: ParseError) -> bool {
        warn!(error = %error, "skipping undecodable line");
        true
    }
}

/// What happens to records already collected when the source fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialBatchPolicy {
    #[default]
    Discard,
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Capacity was reached and the full batch was persisted.
    Completed { count: usize, dropped: usize },
    /// The source reported a fatal condition before capacity was reached.
    SourceStopped {
        code: u16,
        collected: usize,
        persisted: bool,
        dropped: usize,
    },
    /// The source ended on its own; nothing was persisted.
    Incomplete { collected: usize, dropped: usize },
}

pub fn is_rate_limit(code: u16) -> bool {
    code == 420 || code == 429
}

enum State {
    Collecting(CollectedBatch),
    Flushed(Result<CollectionOutcome, SinkWriteError>),
}

/// Accumulates records up to `max_count`, then persists them in one write
/// and tells the source to stop.
///
/// Must be driven by a single delivery context; it holds no locks.
pub struct BoundedStreamCollector<S: BatchSink> {
    max_count: usize,
    sink: S,
    policy: PartialBatchPolicy,
    state: State,
    dropped: usize,
}

impl<S: BatchSink> BoundedStreamCollector<S> {
    pub fn new(max_count: usize, sink: S) -> Self {
        Self {
            max_count,
            sink,
            policy: PartialBatchPolicy::default(),
            state: State::Collecting(CollectedBatch::with_capacity(max_count.min(1024))),
            dropped: 0,
        }
    }

    pub fn with_partial_policy(mut self, policy: PartialBatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Records accepted so far. Zero once flushed.
    pub fn count(&self) -> usize {
        match &self.state {
            State::Collecting(batch) => batch.len(),
            State::Flushed(_) => 0,
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_flushed(&self) -> bool {
        matches!(self.state, State::Flushed(_))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Final result of the run. A failed batch write surfaces here.
    pub fn finish(self) -> Result<CollectionOutcome, SinkWriteError> {
        match self.state {
            State::Collecting(batch) => Ok(CollectionOutcome::Incomplete {
                collected: batch.len(),
                dropped: self.dropped,
            }),
            State::Flushed(result) => result,
        }
    }

    fn flush(&mut self, outcome: CollectionOutcome) {
        let State::Collecting(batch) = &mut self.state else {
            return;
        };
        let batch = std::mem::take(batch);
        let result = self.sink.persist(batch).map(|()| outcome);
        if let Err(e) = &result {
            error!(error = %e, "failed to persist collected batch");
        }
        self.state = State::Flushed(result);
    }

    fn reject(&mut self, error: ParseError) -> bool {
        self.dropped += 1;
        warn!(error = %error, "dropping malformed record");
        true
    }

    fn flush_full(&mut self) {
        let outcome = CollectionOutcome::Completed {
            count: self.count(),
            dropped: self.dropped,
        };
        info!(count = self.count(), dropped = self.dropped, "capacity reached");
        self.flush(outcome);
    }
}

impl<S: BatchSink> StreamListener for BoundedStreamCollector<S> {
    fn on_record(&mut self, raw: &str) -> bool {
        let State::Collecting(batch) = &mut self.state else {
            return false;
        };

        // Covers a zero capacity, or a record that arrives after the threshold.
        if batch.len() >= self.max_count {
            self.flush_full();
            return false;
        }

        match RawRecord::parse(raw) {
            Ok(record) => {
                batch.push(record);
                debug!(count = batch.len(), max = self.max_count, "record collected");
            }
            Err(e) => return self.reject(e),
        }

        if batch.len() == self.max_count {
            self.flush_full();
            return false;
        }
        true
    }

    fn on_source_error(&mut self, code: u16) -> bool {
        let State::Collecting(batch) = &self.state else {
            return false;
        };

        if is_rate_limit(code) {
            warn!(code, "Rate limit exhausted");
        } else if code == TRANSPORT_FAILURE_CODE {
            error!("stream connection lost");
        } else {
            error!(code, "stream source reported an error");
        }

        let collected = batch.len();
        match self.policy {
            PartialBatchPolicy::Discard => {
                if collected > 0 {
                    info!(collected, "discarding partial batch");
                }
                self.state = State::Flushed(Ok(CollectionOutcome::SourceStopped {
                    code,
                    collected,
                    persisted: false,
                    dropped: self.dropped,
                }));
            }
            PartialBatchPolicy::Persist => {
                let outcome = CollectionOutcome::SourceStopped {
                    code,
                    collected,
                    persisted: true,
                    dropped: self.dropped,
                };
                self.flush(outcome);
            }
        }
        false
    }

    fn on_malformed(&mut self, error: ParseError) -> bool {
        if self.is_flushed() {
            return false;
        }
        self.reject(error)
    }
}
