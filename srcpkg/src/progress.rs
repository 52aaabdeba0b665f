use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Mirrors the per-package `info`-level events the log sink emits onto a
/// spinner's message, so operator-facing progress during a fetch/build
/// stays driven by the same events the log file consumes instead of a
/// second, independently-maintained set of call sites.
pub struct SpinnerLayer {
    bar: Arc<Mutex<Option<ProgressBar>>>,
}

/// Handle used by the CLI to start and stop the spinner around one
/// long-running operation; the layer itself only ever reads the handle.
#[derive(Clone)]
pub struct SpinnerHandle {
    bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl SpinnerLayer {
    pub fn new() -> (Self, SpinnerHandle) {
        let bar = Arc::new(Mutex::new(None));
        (SpinnerLayer { bar: bar.clone() }, SpinnerHandle { bar })
    }
}

impl SpinnerHandle {
    pub fn start(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("valid spinner template"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(message.to_string());
        *self.bar.lock().unwrap() = Some(pb);
    }

    pub fn stop(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_and_clear();
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    package: Option<String>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            "package" => self.package = Some(format!("{value:?}")),
            _ => {}
        }
    }
}

impl<S: Subscriber> Layer<S> for SpinnerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::INFO {
            return;
        }
        let guard = self.bar.lock().unwrap();
        let Some(pb) = guard.as_ref() else { return };

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.message else { return };
        let text = match visitor.package {
            Some(package) => format!("{package}: {message}"),
            None => message,
        };
        pb.set_message(text);
    }
}
