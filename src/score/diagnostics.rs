use parking_lot::Mutex;
use tracing::debug;

/// Debug hook for intermediate scoring values.
///
/// Purely observational: nothing a sink does may influence the score.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, label: &str, fields: &[(&'static str, f64)]);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _label: &str, _fields: &[(&'static str, f64)]) {}
}

/// Forwards samples as tracing debug events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, label: &str, fields: &[(&'static str, f64)]) {
        let rendered = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        debug!(target: "qoe_score::diagnostics", sample = label, "{}", rendered);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticSample {
    pub label: String,
    pub fields: Vec<(&'static str, f64)>,
}

/// Keeps samples in memory so callers can inspect them afterwards
#[derive(Debug, Default)]
pub struct RecordingSink {
    samples: Mutex<Vec<DiagnosticSample>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<DiagnosticSample> {
        self.samples.lock().clone()
    }

    pub fn find(&self, label: &str) -> Option<DiagnosticSample> {
        self.samples.lock().iter().find(|s| s.label == label).cloned()
    }
}

impl DiagnosticSample {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, label: &str, fields: &[(&'static str, f64)]) {
        self.samples.lock().push(DiagnosticSample {
            label: label.to_string(),
            fields: fields.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit("first", &[("a", 1.0)]);
        sink.emit("second", &[("b", 2.0), ("c", 3.0)]);

        let samples = sink.samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label, "first");
        assert_eq!(sink.find("second").unwrap().get("c"), Some(3.0));
        assert!(sink.find("third").is_none());
    }

    #[test]
    fn test_noop_and_tracing_sinks_accept_samples() {
        NoopSink.emit("x", &[("a", 1.0)]);
        TracingSink.emit("x", &[("a", 1.0)]);
    }
}
