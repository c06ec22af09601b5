mod delay_timer;
mod heartbeat_timer;
mod task_guard;
mod time;

#[cfg(test)]
mod test_utils;

pub(crate) use delay_timer::DelayTimerHandle;
pub(crate) use heartbeat_timer::HeartbeatTimerHandle;
pub(crate) use time::Clock;
pub(crate) use time::RealClock;

#[cfg(test)]
pub(crate) use time::mocked_clock;
