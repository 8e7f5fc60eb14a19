//! Trace sinks: one named, tagged span per invocation attempt.
//!
//! The invoker only talks to the [`TraceSink`] trait. [`TracingSink`] turns
//! spans into `tracing` spans for whatever subscriber the process installed;
//! [`RecordingSink`] keeps them in memory where they can be searched by name,
//! tag or session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info_span};

/// Opaque identifier for a span opened on a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanHandle(u64);

/// Structured recorder for invocation attempts.
pub trait TraceSink: Send + Sync {
    /// Open a span for one attempt.
    fn begin_span(&self, name: &str, tags: &[String], session_id: &str) -> SpanHandle;

    /// Rename an open span.
    fn rename(&self, handle: SpanHandle, name: &str);

    /// Add a tag to an open span. Adding a tag twice has no effect.
    fn add_tag(&self, handle: SpanHandle, tag: &str);

    /// Close a span once its attempt has resolved.
    fn end_span(&self, _handle: SpanHandle, _succeeded: bool) {}
}

/// Hands out unique span handles.
#[derive(Debug, Default)]
struct HandleCounter(AtomicU64);

impl HandleCounter {
    fn next(&self) -> SpanHandle {
        SpanHandle(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn push_unique(tags: &mut Vec<String>, tag: &str) -> bool {
    if tags.iter().any(|t| t == tag) {
        return false;
    }
    tags.push(tag.to_string());
    true
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NoopSink {
    handles: HandleCounter,
}

impl TraceSink for NoopSink {
    fn begin_span(&self, _name: &str, _tags: &[String], _session_id: &str) -> SpanHandle {
        self.handles.next()
    }

    fn rename(&self, _handle: SpanHandle, _name: &str) {}

    fn add_tag(&self, _handle: SpanHandle, _tag: &str) {}
}

/// Sink backed by `tracing` spans.
///
/// Each attempt becomes an `invocation_attempt` span carrying `trace_name`,
/// `tags` and `session_id` fields; renames and new tags are re-recorded on
/// the live span.
#[derive(Debug, Default)]
pub struct TracingSink {
    handles: HandleCounter,
    open: Mutex<HashMap<SpanHandle, (Span, Vec<String>)>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceSink for TracingSink {
    fn begin_span(&self, name: &str, tags: &[String], session_id: &str) -> SpanHandle {
        let handle = self.handles.next();
        let span = info_span!(
            "invocation_attempt",
            trace_name = name,
            tags = tags.join(",").as_str(),
            session_id = session_id,
        );
        lock(&self.open).insert(handle, (span, tags.to_vec()));
        handle
    }

    fn rename(&self, handle: SpanHandle, name: &str) {
        if let Some((span, _)) = lock(&self.open).get(&handle) {
            span.record("trace_name", name);
        }
    }

    fn add_tag(&self, handle: SpanHandle, tag: &str) {
        if let Some((span, tags)) = lock(&self.open).get_mut(&handle) {
            if push_unique(tags, tag) {
                span.record("tags", tags.join(",").as_str());
            }
        }
    }

    fn end_span(&self, handle: SpanHandle, succeeded: bool) {
        if let Some((span, _)) = lock(&self.open).remove(&handle) {
            span.in_scope(|| debug!(succeeded, "attempt finished"));
        }
    }
}

/// Lifecycle of a recorded span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Open,
    Succeeded,
    Failed,
}

/// A span captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub handle: SpanHandle,
    pub name: String,
    pub tags: Vec<String>,
    pub session_id: String,
    pub status: SpanStatus,
    /// Time between opening and closing; `None` while the span is open.
    pub duration: Option<Duration>,
}

/// Per-session totals over recorded spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Spans opened in the session.
    pub spans: usize,

    /// Spans tagged as retries.
    pub retries: usize,

    /// Spans closed successfully.
    pub succeeded: usize,

    /// Spans closed as failures.
    pub failed: usize,

    /// Summed duration of the closed spans.
    pub duration: Duration,
}

/// In-memory sink whose spans can be queried afterwards.
#[derive(Debug, Default)]
pub struct RecordingSink {
    handles: HandleCounter,
    spans: Mutex<Vec<SpanRecord>>,
    started: Mutex<HashMap<SpanHandle, Instant>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every span recorded so far, in opening order.
    pub fn spans(&self) -> Vec<SpanRecord> {
        lock(&self.spans).clone()
    }

    /// Spans currently named `name`.
    pub fn find_by_name(&self, name: &str) -> Vec<SpanRecord> {
        self.filter(|span| span.name == name)
    }

    /// Spans carrying `tag`.
    pub fn find_by_tag(&self, tag: &str) -> Vec<SpanRecord> {
        self.filter(|span| span.tags.iter().any(|t| t == tag))
    }

    /// Spans belonging to `session_id`.
    pub fn find_by_session(&self, session_id: &str) -> Vec<SpanRecord> {
        self.filter(|span| span.session_id == session_id)
    }

    /// Totals for one session.
    pub fn session_stats(&self, session_id: &str) -> SessionStats {
        self.find_by_session(session_id)
            .iter()
            .fold(SessionStats::default(), |mut stats, span| {
                stats.spans += 1;
                if span.tags.iter().any(|t| t == crate::invoker::RETRY_TAG) {
                    stats.retries += 1;
                }
                match span.status {
                    SpanStatus::Succeeded => stats.succeeded += 1,
                    SpanStatus::Failed => stats.failed += 1,
                    SpanStatus::Open => {}
                }
                stats.duration += span.duration.unwrap_or_default();
                stats
            })
    }

    fn filter(&self, predicate: impl Fn(&SpanRecord) -> bool) -> Vec<SpanRecord> {
        lock(&self.spans)
            .iter()
            .filter(|span| predicate(span))
            .cloned()
            .collect()
    }

    fn with_span(&self, handle: SpanHandle, update: impl FnOnce(&mut SpanRecord)) {
        if let Some(span) = lock(&self.spans).iter_mut().find(|s| s.handle == handle) {
            update(span);
        }
    }
}

impl TraceSink for RecordingSink {
    fn begin_span(&self, name: &str, tags: &[String], session_id: &str) -> SpanHandle {
        let handle = self.handles.next();
        let mut unique = Vec::with_capacity(tags.len());
        for tag in tags {
            push_unique(&mut unique, tag);
        }
        lock(&self.spans).push(SpanRecord {
            handle,
            name: name.to_string(),
            tags: unique,
            session_id: session_id.to_string(),
            status: SpanStatus::Open,
            duration: None,
        });
        lock(&self.started).insert(handle, Instant::now());
        handle
    }

    fn rename(&self, handle: SpanHandle, name: &str) {
        self.with_span(handle, |span| span.name = name.to_string());
    }

    fn add_tag(&self, handle: SpanHandle, tag: &str) {
        self.with_span(handle, |span| {
            push_unique(&mut span.tags, tag);
        });
    }

    fn end_span(&self, handle: SpanHandle, succeeded: bool) {
        let elapsed = lock(&self.started)
            .remove(&handle)
            .as_ref()
            .map(Instant::elapsed);
        self.with_span(handle, |span| {
            span.duration = elapsed;
            span.status = if succeeded {
                SpanStatus::Succeeded
            } else {
                SpanStatus::Failed
            };
        });
    }
}
