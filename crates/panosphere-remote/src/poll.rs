//! Shared polling loop for long-running remote jobs.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::RemoteError;

/// How often to poll a job and how long to wait before giving up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Sleep between consecutive status requests.
    pub interval: Duration,
    /// Total wall-clock budget for the job to reach a terminal state.
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Lifecycle of a remote job as observed by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

/// One status observation, produced by a client-specific poll closure.
#[derive(Debug)]
pub(crate) enum JobPoll<T> {
    Running,
    Succeeded(T),
    Failed(String),
}

/// Drive `poll_fn` until the job succeeds, fails, or the deadline passes.
///
/// Transport errors from `poll_fn` abort the loop immediately; a flaky
/// status endpoint is indistinguishable from a lost job at this layer.
pub(crate) fn drive<T, F>(
    job_name: &str,
    policy: PollPolicy,
    mut poll_fn: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Result<JobPoll<T>, RemoteError>,
{
    let started = Instant::now();
    let mut state = JobState::Submitted;
    info!("{job_name}: submitted, polling every {:?}", policy.interval);

    loop {
        match poll_fn()? {
            JobPoll::Succeeded(value) => {
                info!("{job_name}: succeeded after {:?}", started.elapsed());
                return Ok(value);
            }
            JobPoll::Failed(message) => {
                warn!("{job_name}: failed: {message}");
                return Err(RemoteError::JobFailed(message));
            }
            JobPoll::Running => {
                if state != JobState::Running {
                    state = JobState::Running;
                    debug!("{job_name}: running");
                }
            }
        }

        let waited = started.elapsed();
        if waited + policy.interval > policy.timeout {
            warn!("{job_name}: timed out after {waited:?}");
            return Err(RemoteError::Timeout { waited });
        }
        std::thread::sleep(policy.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), Duration::from_millis(50))
    }

    #[test]
    fn succeeds_after_several_running_polls() {
        let mut calls = 0;
        let out = drive("job", fast_policy(), || {
            calls += 1;
            if calls < 4 {
                Ok(JobPoll::Running)
            } else {
                Ok(JobPoll::Succeeded(42u32))
            }
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(calls, 4);
    }

    #[test]
    fn immediate_success_skips_sleep() {
        let started = Instant::now();
        let out = drive("job", fast_policy(), || Ok(JobPoll::Succeeded("done")));
        assert_eq!(out.unwrap(), "done");
        assert!(started.elapsed() < Duration::from_millis(40));
    }

    #[test]
    fn failure_maps_to_job_failed() {
        let out: Result<(), _> = drive("job", fast_policy(), || {
            Ok(JobPoll::Failed("bad prompt".to_string()))
        });
        match out {
            Err(RemoteError::JobFailed(msg)) => assert_eq!(msg, "bad prompt"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[test]
    fn deadline_expiry_maps_to_timeout() {
        let policy = PollPolicy::new(Duration::from_millis(2), Duration::from_millis(10));
        let out: Result<(), _> = drive("job", policy, || Ok(JobPoll::Running));
        match out {
            Err(RemoteError::Timeout { waited }) => {
                assert!(waited < Duration::from_millis(50))
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn poll_error_aborts_loop() {
        let mut calls = 0;
        let out: Result<(), _> = drive("job", fast_policy(), || {
            calls += 1;
            Err(RemoteError::UnexpectedShape("garbage".to_string()))
        });
        assert!(matches!(out, Err(RemoteError::UnexpectedShape(_))));
        assert_eq!(calls, 1);
    }
}
