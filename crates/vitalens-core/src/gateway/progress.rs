//! Upload progress reporting

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::transport::ByteProgress;

/// Share of the bar covered by the transfer itself; the rest waits for the
/// decoded response
pub const TRANSFER_SHARE: f64 = 0.9;

/// Receives upload progress as a fraction in `[0, 1]`
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Monotonic progress fed to an optional sink
///
/// Reports never go backwards, stay below [`TRANSFER_SHARE`] until
/// [`complete`](Self::complete) is called, and stop entirely once the
/// cancellation token fires. Cancelling does not abort the request.
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
    last: Arc<Mutex<f64>>,
    cancel: CancellationToken,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(f64) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
            last: Arc::new(Mutex::new(0.0)),
            cancel: CancellationToken::new(),
        }
    }

    /// Reporter that tracks progress without emitting it
    pub fn silent() -> Self {
        Self {
            sink: None,
            last: Arc::new(Mutex::new(0.0)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Last value emitted (or tracked, for a silent reporter)
    pub fn last(&self) -> f64 {
        *self.last.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Report transfer progress, clamped to `[0, TRANSFER_SHARE]`
    pub fn report(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        self.emit(fraction.clamp(0.0, TRANSFER_SHARE));
    }

    /// Report `1.0`; call only after the response has been decoded
    pub fn complete(&self) {
        self.emit(1.0);
    }

    fn emit(&self, value: f64) {
        if self.cancel.is_cancelled() {
            return;
        }

        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        if value < *last {
            return;
        }
        *last = value;
        drop(last);

        if let Some(sink) = &self.sink {
            sink(value);
        }
    }

    /// Byte-level callback for the transport
    pub fn bytes_callback(&self) -> ByteProgress {
        let reporter = self.clone();
        Arc::new(move |sent, total| {
            if total == 0 {
                return;
            }
            let ratio = sent.min(total) as f64 / total as f64;
            reporter.report(ratio * TRANSFER_SHARE);
        })
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("last", &self.last())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
