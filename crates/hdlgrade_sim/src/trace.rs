//! Optional tracing of an evaluation.
//!
//! The evaluator reports what it does to a [`TraceSink`]. The default
//! [`NoTrace`] discards everything, [`TracingSink`] forwards events to the
//! `tracing` subscriber at `trace` level, and [`RecordingTrace`] keeps them
//! for inspection.

use hdlgrade_common::Value;
use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};

/// One step of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent<'a> {
    /// An input port received its value.
    InputBound {
        /// The port name.
        name: &'a str,
        /// The value, resized to the port width.
        value: Value,
    },
    /// A statement is about to execute.
    StatementStarted {
        /// Position in the module's statement list.
        index: usize,
        /// Source location of the statement.
        span: Span,
    },
    /// An assignment wrote a signal.
    SignalWritten {
        /// The signal name.
        name: &'a str,
        /// The full value of the signal after the write.
        value: Value,
    },
    /// An output port was read after the last statement.
    OutputRead {
        /// The port name.
        name: &'a str,
        /// The final value.
        value: Value,
    },
}

impl TraceEvent<'_> {
    /// Copies the event into an owned form.
    pub fn to_recorded(&self) -> RecordedEvent {
        match *self {
            TraceEvent::InputBound { name, value } => RecordedEvent::InputBound {
                name: name.to_string(),
                value,
            },
            TraceEvent::StatementStarted { index, span } => {
                RecordedEvent::StatementStarted { index, span }
            }
            TraceEvent::SignalWritten { name, value } => RecordedEvent::SignalWritten {
                name: name.to_string(),
                value,
            },
            TraceEvent::OutputRead { name, value } => RecordedEvent::OutputRead {
                name: name.to_string(),
                value,
            },
        }
    }
}

/// An owned [`TraceEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecordedEvent {
    /// See [`TraceEvent::InputBound`].
    InputBound {
        /// The port name.
        name: String,
        /// The value.
        value: Value,
    },
    /// See [`TraceEvent::StatementStarted`].
    StatementStarted {
        /// Statement position.
        index: usize,
        /// Statement location.
        span: Span,
    },
    /// See [`TraceEvent::SignalWritten`].
    SignalWritten {
        /// The signal name.
        name: String,
        /// The value after the write.
        value: Value,
    },
    /// See [`TraceEvent::OutputRead`].
    OutputRead {
        /// The port name.
        name: String,
        /// The final value.
        value: Value,
    },
}

/// Receives evaluation events.
pub trait TraceSink {
    /// Called for every event, in execution order.
    fn event(&mut self, event: &TraceEvent<'_>);
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn event(&mut self, _event: &TraceEvent<'_>) {}
}

/// Forwards events to `tracing` at `trace` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn event(&mut self, event: &TraceEvent<'_>) {
        match event {
            TraceEvent::InputBound { name, value } => {
                tracing::trace!(name, %value, "input bound");
            }
            TraceEvent::StatementStarted { index, span } => {
                tracing::trace!(index, start = span.start, "statement");
            }
            TraceEvent::SignalWritten { name, value } => {
                tracing::trace!(name, %value, "signal written");
            }
            TraceEvent::OutputRead { name, value } => {
                tracing::trace!(name, %value, "output read");
            }
        }
    }
}

/// Keeps every event.
#[derive(Debug, Default, Clone)]
pub struct RecordingTrace {
    /// Events in execution order.
    pub events: Vec<RecordedEvent>,
}

impl RecordingTrace {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the values written to `name`, in order.
    pub fn writes_to(&self, name: &str) -> Vec<Value> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::SignalWritten { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl TraceSink for RecordingTrace {
    fn event(&mut self, event: &TraceEvent<'_>) {
        self.events.push(event.to_recorded());
    }
}
