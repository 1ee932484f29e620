//! Configuration for the services and handlers.

/// Configuration for workflow services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Upper bound on process-to-completion rounds.
    pub max_process_rounds: usize,
    /// Whether committed state changes and rejections are published as events.
    pub emit_state_changes: bool,
}

impl ServiceConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            max_process_rounds: 8,
            emit_state_changes: true,
        }
    }

    /// Sets the round limit for process-to-completion.
    pub fn with_max_process_rounds(mut self, rounds: usize) -> Self {
        self.max_process_rounds = rounds;
        self
    }

    /// Sets whether state changes are published on the bus.
    pub fn with_state_change_events(mut self, emit: bool) -> Self {
        self.emit_state_changes = emit;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
