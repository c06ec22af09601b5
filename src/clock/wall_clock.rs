//! Wall clock readings stamped onto outbound envelopes. They are informational only; ordering
//! always comes from the logical clock.

pub fn now_seconds() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
