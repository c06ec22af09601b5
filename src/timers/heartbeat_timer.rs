use crate::actor::WeakActorClient;
use crate::timers::task_guard::TaskGuard;
use crate::timers::time::{Clock, RealClock};
use tokio::time::Duration;

/// HeartbeatTimerHandle keeps the periodic directory heartbeat alive. Dropping it stops the task.
pub(crate) struct HeartbeatTimerHandle {
    _task: TaskGuard,
}

impl HeartbeatTimerHandle {
    pub(crate) fn spawn_timer_task(interval: Duration, actor_client: WeakActorClient) -> Self {
        Self::spawn_with_clock(interval, actor_client, RealClock)
    }

    fn spawn_with_clock<C: Clock>(interval: Duration, actor_client: WeakActorClient, clock: C) -> Self {
        HeartbeatTimerHandle {
            _task: TaskGuard::spawn(run_heartbeats(interval, actor_client, clock)),
        }
    }
}

async fn run_heartbeats<C: Clock>(interval: Duration, actor_client: WeakActorClient, mut clock: C) {
    let mut next_tick = clock.now() + interval;
    loop {
        clock.sleep_until(next_tick).await;
        if actor_client.heartbeat_tick().await.is_err() {
            return;
        }

        // Skip missed ticks rather than bursting to catch up.
        let now = clock.now();
        while next_tick <= now {
            next_tick += interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorClient;
    use crate::timers::test_utils::TestUtilActor;
    use crate::timers::time;

    #[tokio::test]
    async fn heartbeat_timer_lifecycle() {
        let interval = Duration::from_millis(100);
        let (strong_client, rx) = ActorClient::new(10);
        let mut actor = TestUtilActor::new(rx);
        let (mock_clock, mut controller) = time::mocked_clock();

        let handle = HeartbeatTimerHandle::spawn_with_clock(interval, strong_client.weak(), mock_clock);

        // Not eager: nothing until a full interval passes.
        actor.assert_no_event().await;

        for _ in 0..3 {
            controller.advance(interval);
            actor.assert_heartbeat_tick_event().await;
            actor.assert_no_event().await;
        }

        // A big leap yields a single tick.
        controller.advance(interval * 5);
        actor.assert_heartbeat_tick_event().await;
        actor.assert_no_event().await;

        drop(handle);
        controller.advance(interval);
        actor.assert_no_event().await;
    }

    #[tokio::test]
    async fn stops_once_actor_is_gone() {
        let interval = Duration::from_millis(100);
        let (strong_client, rx) = ActorClient::new(10);
        let (mock_clock, mut controller) = time::mocked_clock();

        let weak = strong_client.weak();
        drop(rx);
        drop(strong_client);
        let task = tokio::spawn(run_heartbeats(interval, weak, mock_clock));

        controller.advance(interval);
        task.await.unwrap();
    }
}
