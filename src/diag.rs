// Diagnostics sink and cancellation token

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives per-item warnings emitted in lenient mode.
///
/// Every elided item (skipped document, dangling locator, unclassifiable
/// arc) is reported here in addition to the `tracing` log.
pub trait Diagnostics: Send + Sync {
    fn warning(&self, uri: Option<&str>, message: &str);
}

/// Discards all warnings.
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn warning(&self, _uri: Option<&str>, _message: &str) {}
}

/// Accumulates warnings for later inspection.
#[derive(Default)]
pub struct CollectingDiagnostics {
    warnings: Mutex<Vec<String>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().is_empty()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warning(&self, uri: Option<&str>, message: &str) {
        let line = match uri {
            Some(uri) => format!("{}: {}", uri, message),
            None => message.to_string(),
        };
        self.warnings.lock().push(line);
    }
}

/// Cooperative cancellation for DTS builds.
///
/// Checked between documents during discovery and between arcs during
/// relationship extraction; cancellation discards partial state.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
