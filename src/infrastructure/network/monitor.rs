use crate::application::ports::connectivity::ConnectivitySignal;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Process-wide connectivity state. Flipped by whatever observes the
/// transport (or by tests); interested parties either poll `is_online`
/// or subscribe to the watch channel.
pub struct ConnectionMonitor {
    online: AtomicBool,
    tx: watch::Sender<bool>,
}

impl ConnectionMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self {
            online: AtomicBool::new(initially_online),
            tx,
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        let _ = self.tx.send(online);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl ConnectivitySignal for ConnectionMonitor {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flips_and_notifies_subscribers() {
        let monitor = ConnectionMonitor::new(true);
        let mut rx = monitor.subscribe();
        assert!(monitor.is_online());

        monitor.set_online(false);
        assert!(!monitor.is_online());
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }
}
