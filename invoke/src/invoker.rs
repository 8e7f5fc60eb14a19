//! Bounded-retry driver for a single logical model request.
//!
//! [`ResilientInvoker::invoke_with_retries`] runs an operation until it
//! produces a response the validator accepts, or until `max_attempts`
//! attempts have failed. Failures never reach the caller: they are logged
//! through the [`ProgressLogger`] and the call yields `None`.
//!
//! Every attempt opens a span on the [`TraceSink`]. Retries are renamed
//! `"{name} (retry i)"` and tagged `"retry"`, so a tracing backend can tell a
//! retried attempt from a fresh request.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::error::InvokeError;
use crate::logger::{ProgressLogger, StdoutLogger};
use crate::trace::{TraceSink, TracingSink};

/// Tag added to every span after the first attempt.
pub const RETRY_TAG: &str = "retry";

/// Per-call settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Base trace name.
    pub name: String,

    /// Session the spans belong to.
    pub session_id: String,

    /// Tags put on every span.
    pub tags: Vec<String>,

    /// Upper bound on attempts, the first one included.
    pub max_attempts: u32,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            name: "chain".to_string(),
            session_id: "session".to_string(),
            tags: Vec::new(),
            max_attempts: 5,
        }
    }
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trace name. An empty name keeps the default.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
        self
    }

    /// Set the session id. An empty id keeps the default.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        if !session_id.is_empty() {
            self.session_id = session_id;
        }
        self
    }

    /// Set the span tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

type Validator<'a, R> = Box<dyn Fn(&R) -> Result<(), String> + Send + Sync + 'a>;
type Visualizer<'a, R> = Box<dyn Fn(&R) + Send + Sync + 'a>;

/// Optional callbacks run against each response.
pub struct RetryHooks<'a, R> {
    validator: Option<Validator<'a, R>>,
    visualizer: Option<Visualizer<'a, R>>,
}

impl<R> Default for RetryHooks<'_, R> {
    fn default() -> Self {
        Self {
            validator: None,
            visualizer: None,
        }
    }
}

impl<'a, R> RetryHooks<'a, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject responses for which `validator` errors; a rejection is retried
    /// exactly like a failed operation.
    pub fn with_validator<F, E>(mut self, validator: F) -> Self
    where
        F: Fn(&R) -> Result<(), E> + Send + Sync + 'a,
        E: Display,
    {
        self.validator = Some(Box::new(move |response: &R| {
            validator(response).map_err(|e| format!("{e}"))
        }));
        self
    }

    /// Show the last rejected response after each failed attempt.
    pub fn with_visualizer<F>(mut self, visualizer: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'a,
    {
        self.visualizer = Some(Box::new(visualizer));
        self
    }

    fn validate(&self, response: &R) -> Result<(), String> {
        match &self.validator {
            Some(validator) => validator(response),
            None => Ok(()),
        }
    }
}

/// How one attempt ended.
#[derive(Debug)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(InvokeError),
}

/// Record of one attempt within an invocation.
#[derive(Debug)]
pub struct InvocationAttempt {
    /// Zero-based attempt number.
    pub sequence_number: u32,

    /// Span name used for the attempt.
    pub trace_name: String,

    /// Span tags in effect for the attempt.
    pub tags: Vec<String>,

    pub outcome: AttemptOutcome,
}

/// Final response plus the attempt history.
#[derive(Debug)]
pub struct InvocationReport<R> {
    /// The accepted response, or `None` once every attempt failed.
    pub response: Option<R>,

    pub attempts: Vec<InvocationAttempt>,
}

impl<R> InvocationReport<R> {
    pub fn succeeded(&self) -> bool {
        self.response.is_some()
    }

    /// Attempts made after the first one.
    pub fn retries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }

    pub fn into_response(self) -> Option<R> {
        self.response
    }
}

/// Runs operations with bounded retries, tracing and progress logging.
#[derive(Clone)]
pub struct ResilientInvoker {
    sink: Arc<dyn TraceSink>,
    logger: Arc<dyn ProgressLogger>,
}

impl Default for ResilientInvoker {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink::new()), Arc::new(StdoutLogger))
    }
}

impl ResilientInvoker {
    pub fn new(sink: Arc<dyn TraceSink>, logger: Arc<dyn ProgressLogger>) -> Self {
        Self { sink, logger }
    }

    /// Run `operation(query)` until a response passes validation.
    ///
    /// Returns `None` after `options.max_attempts` failed attempts; errors
    /// are only reported through the logger.
    pub async fn invoke_with_retries<Q, R, E, F, Fut>(
        &self,
        operation: F,
        query: Q,
        hooks: &RetryHooks<'_, R>,
        options: &InvokeOptions,
    ) -> Option<R>
    where
        Q: Clone,
        F: FnMut(Q) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        self.run(operation, query, hooks, options)
            .await
            .into_response()
    }

    /// Same as [`Self::invoke_with_retries`], keeping the attempt history.
    pub async fn run<Q, R, E, F, Fut>(
        &self,
        mut operation: F,
        query: Q,
        hooks: &RetryHooks<'_, R>,
        options: &InvokeOptions,
    ) -> InvocationReport<R>
    where
        Q: Clone,
        F: FnMut(Q) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let name = options.name.as_str();
        let session_id = options.session_id.as_str();
        let max_attempts = options.max_attempts;
        let base_tags = options.tags.clone();

        let mut tags = base_tags.clone();
        let mut last_response: Option<R> = None;
        let mut attempts = Vec::new();

        for attempt in 0..max_attempts {
            let trace_name = if attempt == 0 {
                name.to_string()
            } else {
                format!("{name} (retry {attempt})")
            };

            let handle = self.sink.begin_span(name, &base_tags, session_id);
            if attempt > 0 {
                self.sink.rename(handle, &trace_name);
                self.sink.add_tag(handle, RETRY_TAG);
                if !tags.iter().any(|t| t == RETRY_TAG) {
                    tags.push(RETRY_TAG.to_string());
                }
            }
            debug!("Starting attempt {attempt} as `{trace_name}`");

            let error = match operation(query.clone()).await {
                Ok(response) => match hooks.validate(&response) {
                    Ok(()) => {
                        self.sink.end_span(handle, true);
                        if attempt > 0 {
                            self.logger
                                .log(&format!("Success on `{name}` after {attempt} retries"));
                        }
                        attempts.push(InvocationAttempt {
                            sequence_number: attempt,
                            trace_name,
                            tags,
                            outcome: AttemptOutcome::Succeeded,
                        });
                        return InvocationReport {
                            response: Some(response),
                            attempts,
                        };
                    }
                    Err(reason) => {
                        last_response = Some(response);
                        InvokeError::Validation(reason)
                    }
                },
                Err(e) => InvokeError::Operation(e.to_string()),
            };

            self.sink.end_span(handle, false);
            self.logger.log(&error.to_string());

            if let (Some(response), Some(visualizer)) = (&last_response, &hooks.visualizer) {
                visualizer(response);
            }

            if attempt + 1 < max_attempts {
                self.logger.log(&format!(
                    "Retrying `{name}` ({}/{max_attempts})",
                    attempt + 1
                ));
            }

            attempts.push(InvocationAttempt {
                sequence_number: attempt,
                trace_name,
                tags: tags.clone(),
                outcome: AttemptOutcome::Failed(error),
            });
        }

        self.logger.log(&format!(
            "Failed to get a response for `{name}` after {max_attempts} attempts"
        ));

        InvocationReport {
            response: None,
            attempts,
        }
    }
}
