//! This module contains the logging infrastructure for the application.
//!
//! It includes the recorder that keeps recent warnings and errors for the bug
//! report, a `tracing` layer and a panic hook that feed it, and a parser for
//! external log files.
pub mod collector;
pub mod entry;
pub mod ingest;
pub mod recorder;

pub use collector::RecorderLayer;
pub use entry::{LogEntry, Severity};
pub use recorder::{LogRecorder, DEFAULT_CAPACITY};

use anyhow::Result;
use std::backtrace::Backtrace;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

/// A recorder shared between the log sources and the report workflow.
pub type SharedRecorder = Arc<Mutex<LogRecorder>>;

/// Creates a new shared recorder.
pub fn shared(capacity: usize) -> SharedRecorder {
    Arc::new(Mutex::new(LogRecorder::new(capacity)))
}

/// Locks the recorder, recovering it if a panic poisoned the lock.
pub fn lock(recorder: &SharedRecorder) -> MutexGuard<'_, LogRecorder> {
    recorder
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The subscription that routes this process's log events into a recorder.
///
/// Created once at startup and owned by the application for its lifetime.
pub struct LogCapture {
    recorder: SharedRecorder,
}

impl LogCapture {
    /// Installs the global `tracing` subscriber and the panic hook.
    ///
    /// Console output honours `RUST_LOG` (default `info`); the recorder sees
    /// every warning and error regardless of that filter.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already set.
    pub fn install(capacity: usize) -> Result<Self> {
        let recorder = shared(capacity);

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(filter),
            )
            .with(RecorderLayer::new(recorder.clone()));

        tracing::subscriber::set_global_default(subscriber)?;
        install_panic_hook(recorder.clone());

        Ok(Self { recorder })
    }

    /// The recorder fed by this subscription.
    pub fn recorder(&self) -> SharedRecorder {
        self.recorder.clone()
    }
}

/// Records panics as `Exception` entries before running the previous hook.
pub fn install_panic_hook(recorder: SharedRecorder) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        let message = match info.location() {
            Some(location) => format!("{} ({})", payload, location),
            None => payload,
        };
        let trace = Backtrace::force_capture().to_string();

        lock(&recorder).record(Severity::Exception, &message, &trace);
        previous(info);
    }));
}
