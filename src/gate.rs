/// Decides when the capture service may be started: only once a start has
/// been requested and the drawing surface exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessGate {
    start_requested: bool,
    surface_available: bool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_start(&mut self) {
        self.start_requested = true;
    }

    pub fn cancel_start(&mut self) {
        self.start_requested = false;
    }

    pub fn surface_created(&mut self) {
        self.surface_available = true;
    }

    pub fn surface_destroyed(&mut self) {
        self.surface_available = false;
    }

    pub fn is_ready(&self) -> bool {
        self.start_requested && self.surface_available
    }

    /// Consumes the pending request; the next start needs a new request.
    pub fn mark_started(&mut self) {
        self.start_requested = false;
    }

    pub fn start_requested(&self) -> bool {
        self.start_requested
    }

    pub fn surface_available(&self) -> bool {
        self.surface_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_both_flags() {
        let mut gate = ReadinessGate::new();
        assert!(!gate.is_ready());
        gate.request_start();
        assert!(!gate.is_ready());
        gate.surface_created();
        assert!(gate.is_ready());
        gate.surface_destroyed();
        assert!(!gate.is_ready());
    }

    #[test]
    fn started_clears_request_but_keeps_surface() {
        let mut gate = ReadinessGate::new();
        gate.surface_created();
        gate.request_start();
        gate.mark_started();
        assert!(!gate.is_ready());
        assert!(gate.surface_available());
        assert!(!gate.start_requested());
    }

    #[test]
    fn cancel_drops_pending_request() {
        let mut gate = ReadinessGate::new();
        gate.request_start();
        gate.cancel_start();
        gate.surface_created();
        assert!(!gate.is_ready());
    }
}
