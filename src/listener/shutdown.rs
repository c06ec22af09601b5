use tokio::sync::watch;

pub(crate) fn shutdown_signal() -> (ListenerShutdownHandle, ListenerShutdownSignal) {
    let (tx, rx) = watch::channel(());

    (ListenerShutdownHandle { _tx: tx }, ListenerShutdownSignal { rx })
}

/// Dropping the handle stops every receive loop holding a clone of the signal.
pub(crate) struct ListenerShutdownHandle {
    _tx: watch::Sender<()>,
}

#[derive(Clone)]
pub(crate) struct ListenerShutdownSignal {
    rx: watch::Receiver<()>,
}

impl ListenerShutdownSignal {
    pub(crate) async fn recv(&mut self) {
        // Nothing is ever sent, so this only returns once the handle is dropped.
        while self.rx.changed().await.is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn every_clone_fires_on_drop() {
        let (handle, signal) = shutdown_signal();
        let mut first = signal.clone();
        let mut second = signal;

        assert!(timeout(Duration::from_millis(10), first.recv()).await.is_err());

        drop(handle);
        timeout(Duration::from_millis(10), first.recv()).await.unwrap();
        timeout(Duration::from_millis(10), second.recv()).await.unwrap();
    }
}
