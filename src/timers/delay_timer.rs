use crate::actor::WeakActorClient;
use crate::server::DelayedAction;
use crate::timers::task_guard::TaskGuard;
use crate::timers::time::{Clock, RealClock};
use tokio::time::Duration;

/// DelayTimerHandle fires one `DelayedAction` at the actor after a delay, unless the handle is
/// dropped first.
pub(crate) struct DelayTimerHandle {
    action: DelayedAction,
    _task: TaskGuard,
}

impl DelayTimerHandle {
    pub(crate) fn spawn_timer_task(delay: Duration, action: DelayedAction, actor_client: WeakActorClient) -> Self {
        Self::spawn_with_clock(delay, action, actor_client, RealClock)
    }

    fn spawn_with_clock<C: Clock>(
        delay: Duration,
        action: DelayedAction,
        actor_client: WeakActorClient,
        mut clock: C,
    ) -> Self {
        let task = TaskGuard::spawn(async move {
            clock.sleep(delay).await;
            let _ = actor_client.delay_elapsed(action).await;
        });

        DelayTimerHandle { action, _task: task }
    }

    pub(crate) fn action(&self) -> DelayedAction {
        self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorClient;
    use crate::timers::test_utils::TestUtilActor;
    use crate::timers::time;

    #[tokio::test]
    async fn fires_once_after_delay() {
        let delay = Duration::from_secs(5);
        let (strong_client, rx) = ActorClient::new(10);
        let mut actor = TestUtilActor::new(rx);
        let (mock_clock, mut controller) = time::mocked_clock();

        let handle =
            DelayTimerHandle::spawn_with_clock(delay, DelayedAction::InitialSync, strong_client.weak(), mock_clock);
        assert_eq!(handle.action(), DelayedAction::InitialSync);

        controller.advance(delay / 2);
        actor.assert_no_event().await;

        controller.advance(delay / 2);
        actor.assert_delay_elapsed_event(DelayedAction::InitialSync).await;
        controller.advance(delay);
        actor.assert_no_event().await;
    }

    #[tokio::test]
    async fn dropped_timer_never_fires() {
        let delay = Duration::from_millis(100);
        let (strong_client, rx) = ActorClient::new(10);
        let mut actor = TestUtilActor::new(rx);
        let (mock_clock, mut controller) = time::mocked_clock();

        let handle = DelayTimerHandle::spawn_with_clock(
            delay,
            DelayedAction::CoordinatorRecheck,
            strong_client.weak(),
            mock_clock,
        );

        drop(handle);
        controller.advance(delay);
        actor.assert_no_event().await;
    }
}
