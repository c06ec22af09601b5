use tokio::task::JoinHandle;

/// TaskGuard owns a spawned timer task and aborts it when dropped.
pub(crate) struct TaskGuard(JoinHandle<()>);

impl TaskGuard {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        TaskGuard(tokio::spawn(future))
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn dropping_guard_aborts_task() {
        let (tx, rx) = oneshot::channel::<()>();
        let guard = TaskGuard::spawn(async move {
            std::future::pending::<()>().await;
            let _ = tx.send(());
        });

        drop(guard);
        // Sender is dropped with the aborted task, never sent.
        assert!(rx.await.is_err());
    }
}
