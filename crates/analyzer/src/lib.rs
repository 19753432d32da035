//! Authentication brute-force detection engine.
//!
//! The engine ingests heterogeneous authentication events (SSH syslog,
//! Windows Security 4624/4625/4634), normalizes them into a common schema,
//! groups them into sessions, and reports successful brute-force logins
//! with per-IP and per-account statistics.
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────┐     ┌─────────────┐     ┌──────────────┐
//!  │ Event source │────▶│  Normalizer │────▶│ RecordTable  │
//!  └──────────────┘     │ (ssh | win) │     │ (sorted,     │
//!                       └─────────────┘     │  ip-indexed) │
//!                                           └──────┬───────┘
//!                                                  │
//!                       ┌─────────────┐     ┌──────▼───────┐
//!                       │   Summary   │◀────│  BruteForce  │
//!                       │   Builder   │     │   Detector   │
//!                       └──────┬──────┘     └──────────────┘
//!                              │
//!                       ┌──────▼──────┐     ┌──────────────┐
//!                       │   Report    │────▶│ Finding sink │
//!                       │   Emitter   │     │ Annot. sink  │
//!                       └─────────────┘     └──────────────┘
//! ```
//!
//! One invocation processes one event stream, entirely in memory and on a
//! single thread; a [`source::CancelToken`] provides cooperative
//! cancellation.
//!
//! ## Usage
//!
//! ```ignore
//! use bruteforce_analyzer::{CancelToken, SshBruteForceAnalyzer};
//!
//! let mut analyzer = SshBruteForceAnalyzer::new();
//! let output = analyzer.run(&mut source, &mut annotations, &mut findings,
//!                           &CancelToken::new());
//! ```

pub mod detector;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod source;
pub mod summary_builder;
pub mod table;

pub use detector::{BruteForceDetector, DetectorConfig, IpDetection};
pub use normalize::ParseOutcome;
pub use pipeline::{RunStats, SshBruteForceAnalyzer, WindowsBruteForceAnalyzer};
pub use report::{human_timestamp, ReportEmitter};
pub use source::{
    Annotation, AnnotationSink, CancelToken, EventSource, FailingAnnotationSink, FindingSink,
    MemoryAnnotationSink, MemoryEventSource, MemoryFindingSink, RawEvent,
};
pub use summary_builder::{from_useraccount, to_useraccount, SummaryBuilder};
pub use table::RecordTable;
