use crate::actor::Event;
use crate::server::DelayedAction;
use std::time::Duration;
use tokio::sync::mpsc;

pub(super) struct TestUtilActor {
    receiver: mpsc::Receiver<Event>,
    timeout: Duration,
}

impl TestUtilActor {
    pub(super) fn new(actor_queue_rx: mpsc::Receiver<Event>) -> Self {
        TestUtilActor {
            receiver: actor_queue_rx,
            timeout: Duration::from_millis(10),
        }
    }

    pub(super) async fn assert_heartbeat_tick_event(&mut self) {
        match self.recv().await {
            Event::HeartbeatTick => {}
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    pub(super) async fn assert_delay_elapsed_event(&mut self, expected: DelayedAction) {
        match self.recv().await {
            Event::DelayElapsed(action) => assert_eq!(action, expected),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    pub(super) async fn assert_no_event(&mut self) {
        tokio::time::timeout(self.timeout, self.receiver.recv())
            .await
            .expect_err("Expected timeout");
    }

    async fn recv(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.receiver.recv())
            .await
            .expect("Unexpected timeout")
            .expect("Expected value")
    }
}
