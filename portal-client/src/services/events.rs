use tokio::sync::broadcast;

/// Session-lifecycle notifications for the embedding shell.
///
/// The library cannot navigate the host UI itself; when the session is
/// torn down (or a request is attempted with no credentials at all) it
/// emits `RedirectToRoot` and the shell performs the actual navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    RedirectToRoot,
}

#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. A shell that has not subscribed yet simply misses
    /// it; that mirrors a navigation fired before any page was mounted.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
