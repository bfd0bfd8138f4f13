//! Dispatch tracing infrastructure.
//!
//! Provides a trait-based tracing system for the dispatch resolver. Every
//! message sent through a [`Runtime`](crate::Runtime) ends in one of a few
//! outcomes, and each has a hook on [`DispatchTracer`]:
//!
//! | Hook | Fired when |
//! |------|------------|
//! | `on_local` | the receiver's own surface (singleton methods or class chain) answered |
//! | `on_forward` | a delegator forwarded the message to its target |
//! | `on_super_fallthrough` | `call_super` found nothing above the caller and fell through to `method_missing` |
//! | `on_not_found` | nothing answered and `NotFound` was raised |
//! | `on_target_set` | a delegator's target was replaced |
//!
//! Concrete implementations:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (default) |
//! | [`StderrTracer`] | Human-readable dispatch log to stderr |
//! | [`ProfilingTracer`] | Per-operation counters and depth tracking |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis |
//!
//! # Usage
//!
//! ```
//! use veneer::{DispatchLimits, RecordingTracer, Runtime};
//!
//! let rt = Runtime::with_config(DispatchLimits::default(), RecordingTracer::new());
//! let tracer: &RecordingTracer = rt.tracer().unwrap();
//! assert_eq!(tracer.event_count(), 0);
//! ```

use std::{any::Any, collections::BTreeMap, fmt};

/// Trace event recorded by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// The receiver's own surface answered.
    Local {
        operation: String,
        /// Class owning the method, or `"singleton"` for per-object methods.
        owner: String,
        depth: usize,
    },
    /// A delegator forwarded the message to its target.
    Forward {
        operation: String,
        /// Real class name of the target that received the message.
        target_type: String,
        depth: usize,
    },
    /// `call_super` fell through to `method_missing`.
    SuperFallthrough { operation: String, depth: usize },
    /// Nothing answered the message.
    NotFound { operation: String, receiver_type: String },
    /// A delegator's target was replaced.
    TargetSet { proxy_id: i64, target_type: String },
}

/// Trait for dispatch tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code. Implementations only override the hooks they care about.
///
/// The runtime stores its tracer as a boxed trait object so host-defined
/// methods keep a single `Runtime` type; use
/// [`Runtime::tracer`](crate::Runtime::tracer) to get the concrete tracer back.
pub trait DispatchTracer: fmt::Debug + Any {
    /// Called before a locally-defined method runs.
    ///
    /// # Arguments
    /// * `operation` - Message name
    /// * `owner` - Class owning the method, or `"singleton"`
    /// * `depth` - Dispatch depth, 1 for a top-level call
    #[inline(always)]
    fn on_local(&mut self, _operation: &str, _owner: &str, _depth: usize) {}

    /// Called before a delegator forwards a message to its target.
    #[inline(always)]
    fn on_forward(&mut self, _operation: &str, _target_type: &str, _depth: usize) {}

    /// Called when `call_super` finds no definition above the calling method.
    #[inline(always)]
    fn on_super_fallthrough(&mut self, _operation: &str, _depth: usize) {}

    /// Called right before `NotFound` is raised.
    #[inline(always)]
    fn on_not_found(&mut self, _operation: &str, _receiver_type: &str) {}

    /// Called after a delegator's target has been replaced.
    #[inline(always)]
    fn on_target_set(&mut self, _proxy_id: i64, _target_type: &str) {}
}

// ============================================================================
// NoopTracer: default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl DispatchTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable dispatch log
// ============================================================================

/// Tracer that prints a human-readable dispatch log to stderr.
///
/// Output format:
/// ```text
///   local    cost                 owner=Sugar     depth=1
///   local    cost                 owner=Milk      depth=2
///   super    cost                 depth=2
///   forward  cost                 -> Coffee       depth=3
/// ```
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of lines before stopping. None = unlimited.
    limit: Option<usize>,
    count: usize,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no line limit.
    #[must_use]
    pub fn new() -> Self {
        Self { limit: None, count: 0 }
    }

    /// Creates a new stderr tracer that stops after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
        }
    }

    /// Returns false once the limit has been hit, printing a marker the first time.
    fn admit(&mut self) -> bool {
        match self.limit {
            Some(limit) if self.count >= limit => false,
            Some(limit) => {
                self.count += 1;
                if self.count == limit {
                    eprintln!("--- trace limit reached ({limit} lines) ---");
                }
                true
            }
            None => true,
        }
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTracer for StderrTracer {
    fn on_local(&mut self, operation: &str, owner: &str, depth: usize) {
        if self.admit() {
            eprintln!("  local    {operation:<20} owner={owner:<10} depth={depth}");
        }
    }

    fn on_forward(&mut self, operation: &str, target_type: &str, depth: usize) {
        if self.admit() {
            eprintln!("  forward  {operation:<20} -> {target_type:<10} depth={depth}");
        }
    }

    fn on_super_fallthrough(&mut self, operation: &str, depth: usize) {
        if self.admit() {
            eprintln!("  super    {operation:<20} depth={depth}");
        }
    }

    fn on_not_found(&mut self, operation: &str, receiver_type: &str) {
        if self.admit() {
            eprintln!("  missing  {operation:<20} for {receiver_type}");
        }
    }

    fn on_target_set(&mut self, proxy_id: i64, target_type: &str) {
        if self.admit() {
            eprintln!("  retarget proxy={proxy_id} -> {target_type}");
        }
    }
}

// ============================================================================
// ProfilingTracer: per-operation counters
// ============================================================================

/// Tracer that counts dispatch outcomes per operation.
///
/// Retrieve results via [`ProfilingTracer::report`].
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    local: BTreeMap<String, u64>,
    forwarded: BTreeMap<String, u64>,
    missing: BTreeMap<String, u64>,
    super_fallthroughs: u64,
    target_sets: u64,
    max_depth: usize,
}

/// Summary report from a profiling trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingReport {
    /// Local hits per operation, most frequent first.
    pub local: Vec<(String, u64)>,
    /// Forwards per operation, most frequent first.
    pub forwarded: Vec<(String, u64)>,
    /// `NotFound` raises per operation, most frequent first.
    pub missing: Vec<(String, u64)>,
    pub super_fallthroughs: u64,
    pub target_sets: u64,
    /// Deepest dispatch observed.
    pub max_depth: usize,
}

impl ProfilingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a report from the collected counters.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        ProfilingReport {
            local: sorted_counts(&self.local),
            forwarded: sorted_counts(&self.forwarded),
            missing: sorted_counts(&self.missing),
            super_fallthroughs: self.super_fallthroughs,
            target_sets: self.target_sets,
            max_depth: self.max_depth,
        }
    }

    fn observe_depth(&mut self, depth: usize) {
        if depth > self.max_depth {
            self.max_depth = depth;
        }
    }
}

fn sorted_counts(counts: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut out: Vec<_> = counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
    // stable sort keeps name order among equal counts
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

impl DispatchTracer for ProfilingTracer {
    fn on_local(&mut self, operation: &str, _owner: &str, depth: usize) {
        *self.local.entry(operation.to_owned()).or_insert(0) += 1;
        self.observe_depth(depth);
    }

    fn on_forward(&mut self, operation: &str, _target_type: &str, depth: usize) {
        *self.forwarded.entry(operation.to_owned()).or_insert(0) += 1;
        self.observe_depth(depth);
    }

    fn on_super_fallthrough(&mut self, _operation: &str, depth: usize) {
        self.super_fallthroughs += 1;
        self.observe_depth(depth);
    }

    fn on_not_found(&mut self, operation: &str, _receiver_type: &str) {
        *self.missing.entry(operation.to_owned()).or_insert(0) += 1;
    }

    fn on_target_set(&mut self, _proxy_id: i64, _target_type: &str) {
        self.target_sets += 1;
    }
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Dispatch Profile ===")?;
        writeln!(f, "max depth:          {}", self.max_depth)?;
        writeln!(f, "super fallthroughs: {}", self.super_fallthroughs)?;
        writeln!(f, "target changes:     {}", self.target_sets)?;
        for (title, rows) in [
            ("local", &self.local),
            ("forwarded", &self.forwarded),
            ("missing", &self.missing),
        ] {
            if rows.is_empty() {
                continue;
            }
            writeln!(f, "--- {title} ---")?;
            for (operation, count) in rows {
                writeln!(f, "  {operation:<20} {count:>8}")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records every event in order.
///
/// Allocates per event, so use it for tests and short debugging sessions.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl DispatchTracer for RecordingTracer {
    fn on_local(&mut self, operation: &str, owner: &str, depth: usize) {
        self.record(TraceEvent::Local {
            operation: operation.to_owned(),
            owner: owner.to_owned(),
            depth,
        });
    }

    fn on_forward(&mut self, operation: &str, target_type: &str, depth: usize) {
        self.record(TraceEvent::Forward {
            operation: operation.to_owned(),
            target_type: target_type.to_owned(),
            depth,
        });
    }

    fn on_super_fallthrough(&mut self, operation: &str, depth: usize) {
        self.record(TraceEvent::SuperFallthrough {
            operation: operation.to_owned(),
            depth,
        });
    }

    fn on_not_found(&mut self, operation: &str, receiver_type: &str) {
        self.record(TraceEvent::NotFound {
            operation: operation.to_owned(),
            receiver_type: receiver_type.to_owned(),
        });
    }

    fn on_target_set(&mut self, proxy_id: i64, target_type: &str) {
        self.record(TraceEvent::TargetSet {
            proxy_id,
            target_type: target_type.to_owned(),
        });
    }
}
