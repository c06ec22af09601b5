use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct ServerOptions {
    pub heartbeat_interval: Option<Duration>,
    pub initial_sync_delay: Option<Duration>,
    pub coordinator_recheck_delay: Option<Duration>,
    pub election_probe_timeout: Option<Duration>,
    pub clock_sync_timeout: Option<Duration>,
    pub directory_request_timeout: Option<Duration>,
    pub registration_attempts: Option<u32>,
    pub receive_backoff: Option<Duration>,
    pub sync_jitter_max: Option<Duration>,
}

#[derive(Debug)]
pub(super) struct ServerOptionsValidated {
    pub heartbeat_interval: Duration,
    pub initial_sync_delay: Duration,
    pub coordinator_recheck_delay: Duration,
    pub election_probe_timeout: Duration,
    pub clock_sync_timeout: Duration,
    pub directory_request_timeout: Duration,
    pub registration_attempts: u32,
    pub receive_backoff: Duration,
    pub sync_jitter_max: Duration,
}

impl ServerOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_interval == Duration::from_millis(0) {
            return Err("Heartbeat interval must be greater than zero");
        }
        if self.election_probe_timeout >= self.clock_sync_timeout {
            return Err("Election probe timeout must be less than the clock sync timeout");
        }
        if self.registration_attempts == 0 {
            return Err("Registration needs at least one attempt");
        }

        Ok(())
    }
}

impl TryFrom<ServerOptions> for ServerOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ServerOptions) -> Result<Self, Self::Error> {
        let values = ServerOptionsValidated {
            heartbeat_interval: options.heartbeat_interval.unwrap_or(Duration::from_secs(10)),
            initial_sync_delay: options.initial_sync_delay.unwrap_or(Duration::from_secs(5)),
            coordinator_recheck_delay: options.coordinator_recheck_delay.unwrap_or(Duration::from_secs(1)),
            election_probe_timeout: options.election_probe_timeout.unwrap_or(Duration::from_secs(2)),
            clock_sync_timeout: options.clock_sync_timeout.unwrap_or(Duration::from_secs(5)),
            directory_request_timeout: options.directory_request_timeout.unwrap_or(Duration::from_secs(2)),
            registration_attempts: options.registration_attempts.unwrap_or(3),
            receive_backoff: options.receive_backoff.unwrap_or(Duration::from_millis(100)),
            sync_jitter_max: options.sync_jitter_max.unwrap_or(Duration::from_millis(1000)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ServerOptionsValidated::try_from(ServerOptions::default()).unwrap();
        assert_eq!(options.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(options.election_probe_timeout, Duration::from_secs(2));
        assert_eq!(options.registration_attempts, 3);
    }

    #[test]
    fn probe_timeout_must_stay_below_clock_sync_timeout() {
        let options = ServerOptions {
            election_probe_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        assert!(ServerOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let options = ServerOptions {
            registration_attempts: Some(0),
            ..Default::default()
        };
        assert!(ServerOptionsValidated::try_from(options).is_err());
    }
}
