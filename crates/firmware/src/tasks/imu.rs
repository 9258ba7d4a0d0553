//! Accelerometer logging task.

use embassy_time::Duration;
use platform::Accelerometer;

use super::PeripheralTask;
use crate::log;

/// Samples the accelerometer and logs all three axes.
pub struct ImuTask<A> {
    imu: A,
    period: Duration,
    retry: Duration,
}

impl<A: Accelerometer> ImuTask<A> {
    /// Poll `imu` every `period`, backing off by `retry` after a failure.
    pub fn new(imu: A, period: Duration, retry: Duration) -> Self {
        Self { imu, period, retry }
    }
}

impl<A: Accelerometer> PeripheralTask for ImuTask<A> {
    fn name(&self) -> &'static str {
        "imu"
    }

    async fn step(&mut self) -> Duration {
        match self.imu.acceleration() {
            Ok(acc) => {
                log::info!("acc x: {} y: {} z: {}", acc.x, acc.y, acc.z);
                self.period
            }
            Err(_) => {
                log::warn!("imu: read failed");
                self.retry
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::MockAccelerometer;

    #[tokio::test]
    async fn polls_at_period() {
        let mut task = ImuTask::new(
            MockAccelerometer::default(),
            Duration::from_secs(5),
            Duration::from_secs(10),
        );
        assert_eq!(task.step().await, Duration::from_secs(5));
    }
}
