use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Events a running batch reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Progress { completed: usize, total: usize },
    Log { message: String, severity: Severity },
}

/// Receives batch events on the worker thread.
pub trait EventSink: Send {
    fn emit(&self, event: BatchEvent);
}

// A dropped receiver only means nobody is watching any more.
impl EventSink for Sender<BatchEvent> {
    fn emit(&self, event: BatchEvent) {
        let _ = self.send(event);
    }
}
