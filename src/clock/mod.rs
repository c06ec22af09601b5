mod logical_clock;
mod wall_clock;

pub use logical_clock::LogicalClock;
pub use wall_clock::now_millis;
pub use wall_clock::now_seconds;
