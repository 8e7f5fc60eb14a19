//! # Invoke
//!
//! Resilience layer around a single logical request to a generative model.
//!
//! ```text
//!   operation(query) ──► validator ──► Some(response)
//!        ▲    │               │
//!        │    └── Err ────────┴──► log, visualize, rename span "(retry i)"
//!        └──────────── next attempt, until max_attempts ──► None
//! ```
//!
//! The operation is any async closure returning `Result`; [`ChatClient`] is
//! the usual one. Retrieved context is placed into the prompt by the caller
//! before the operation is built, so this crate knows nothing about
//! retrieval.
//!
//! ```rust,ignore
//! use lore_invoke::{BackendConfig, ChatClient, InvokeOptions, ResilientInvoker, RetryHooks};
//!
//! let client = ChatClient::new(BackendConfig::for_model("gpt-4o-mini")?)?;
//! let invoker = ResilientInvoker::default();
//! let answer = invoker
//!     .invoke_with_retries(
//!         |question: &str| client.complete(SYSTEM_PROMPT, question),
//!         "Can I bring my cat?",
//!         &RetryHooks::new(),
//!         &InvokeOptions::new().with_name("policy-answer"),
//!     )
//!     .await;
//! ```

pub mod backend;
pub mod chat;
pub mod error;
pub mod invoker;
pub mod logger;
pub mod output;
pub mod trace;

pub use backend::{BackendConfig, ModelFamily};
pub use chat::ChatClient;
pub use error::{InvokeError, Result};
pub use invoker::{
    AttemptOutcome, InvocationAttempt, InvocationReport, InvokeOptions, RETRY_TAG,
    ResilientInvoker, RetryHooks,
};
pub use logger::{ProgressLogger, StdoutLogger, TracingLogger};
pub use output::clean_json_output;
pub use trace::{
    NoopSink, RecordingSink, SessionStats, SpanHandle, SpanRecord, SpanStatus, TraceSink,
    TracingSink,
};
