//! Network time → RTC synchronisation.
//!
//! ```text
//!   WaitingConnectivity ──connected──▶ SyncInProgress ──complete──▶ Synced
//!          ▲   ▲                             │                        │
//!          │   └──────────timeout────────────┘                  rtc written
//!          │                                                          ▼
//!          └─────────────────cooldown elapsed───────────── PersistAndCooldown
//! ```
//!
//! Each call to [`TimeSyncTask::step`] performs exactly one state's work and
//! returns how long to sleep before the next call. The machine only ever
//! leaves `WaitingConnectivity` after the link has been reported up, and a
//! failed RTC write is retried from `Synced` without asking the network
//! again.

use embassy_time::Duration;
use platform::{Connectivity, DateTime, DisplaySurface, I2cPeripheral};

use crate::config::TimingConfig;
use crate::drivers::Pcf8563;
use crate::log;
use crate::tasks::PeripheralTask;
use crate::ui::Publisher;

/// Phase of the synchronisation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncPhase {
    /// Polling the link
    WaitingConnectivity,
    /// Time request issued, polling for completion
    SyncInProgress,
    /// Network time received, not yet persisted
    Synced,
    /// RTC written, sleeping before the next cycle
    PersistAndCooldown,
}

impl SyncPhase {
    /// Short name for log records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingConnectivity => "waiting-connectivity",
            Self::SyncInProgress => "sync-in-progress",
            Self::Synced => "synced",
            Self::PersistAndCooldown => "persist-and-cooldown",
        }
    }
}

/// Drives one connectivity collaborator and one RTC through [`SyncPhase`].
pub struct TimeSyncTask<'a, N, I, D> {
    net: N,
    rtc: Pcf8563<'a, I>,
    publisher: Option<Publisher<'a, D>>,
    timing: TimingConfig,
    utc_offset_secs: i32,
    phase: SyncPhase,
    connected: Option<bool>,
    waited: Duration,
    pending_time: Option<i64>,
    last_sync: Option<DateTime>,
}

impl<'a, N, I, D> TimeSyncTask<'a, N, I, D>
where
    N: Connectivity,
    I: I2cPeripheral,
    D: DisplaySurface,
{
    /// Machine in `WaitingConnectivity`.
    ///
    /// `utc_offset_secs` is added to network time before it is stored.
    pub fn new(
        net: N,
        rtc: Pcf8563<'a, I>,
        publisher: Option<Publisher<'a, D>>,
        timing: TimingConfig,
        utc_offset_secs: i32,
    ) -> Self {
        Self {
            net,
            rtc,
            publisher,
            timing,
            utc_offset_secs,
            phase: SyncPhase::WaitingConnectivity,
            connected: None,
            waited: Duration::from_ticks(0),
            pending_time: None,
            last_sync: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Local time of the last successful RTC write.
    pub fn last_sync(&self) -> Option<DateTime> {
        self.last_sync
    }

    /// The connectivity collaborator.
    pub fn connectivity(&self) -> &N {
        &self.net
    }

    fn enter(&mut self, phase: SyncPhase) {
        if self.phase != phase {
            log::debug!("time sync: {} -> {}", self.phase.as_str(), phase.as_str());
            self.phase = phase;
        }
    }

    async fn wait_connectivity(&mut self) -> Duration {
        let connected = self.net.is_connected();
        if self.connected != Some(connected) {
            log::info!("time sync: link {}", if connected { "up" } else { "down" });
            if let Some(publisher) = &self.publisher {
                publisher.connectivity(connected).await;
            }
            self.connected = Some(connected);
        }

        if !connected {
            return self.timing.connectivity_poll;
        }

        self.net.request_time_sync();
        self.waited = Duration::from_ticks(0);
        self.enter(SyncPhase::SyncInProgress);
        self.timing.sync_poll
    }

    fn poll_completion(&mut self) -> Duration {
        if self.net.time_sync_complete() {
            self.pending_time = Some(self.net.unix_time());
            self.enter(SyncPhase::Synced);
            return Duration::from_ticks(0);
        }

        self.waited = self
            .waited
            .checked_add(self.timing.sync_poll)
            .unwrap_or(Duration::MAX);
        if self.waited >= self.timing.sync_timeout {
            log::warn!("time sync: no answer after {} s, giving up", self.waited.as_secs());
            self.net.stop_time_sync();
            self.enter(SyncPhase::WaitingConnectivity);
            return self.timing.connectivity_poll;
        }
        self.timing.sync_poll
    }

    async fn persist(&mut self) -> Duration {
        let local = self
            .pending_time
            .and_then(|t| t.checked_add(i64::from(self.utc_offset_secs)))
            .and_then(DateTime::from_unix);
        let Some(datetime) = local else {
            log::warn!("time sync: network time out of range");
            self.abandon();
            return self.timing.connectivity_poll;
        };

        match self.rtc.write_time(&datetime).await {
            Ok(()) => {
                log::info!("time sync: rtc set to {}", datetime);
                self.last_sync = Some(datetime);
                self.abandon();
                self.enter(SyncPhase::PersistAndCooldown);
                self.timing.sync_cooldown
            }
            Err(e) => {
                log::warn!("time sync: rtc write failed: {}", e);
                self.timing.bus_retry
            }
        }
    }

    fn abandon(&mut self) {
        self.net.stop_time_sync();
        self.pending_time = None;
        self.enter(SyncPhase::WaitingConnectivity);
    }
}

impl<N, I, D> PeripheralTask for TimeSyncTask<'_, N, I, D>
where
    N: Connectivity,
    I: I2cPeripheral,
    D: DisplaySurface,
{
    fn name(&self) -> &'static str {
        "time_sync"
    }

    async fn step(&mut self) -> Duration {
        match self.phase {
            SyncPhase::WaitingConnectivity => self.wait_connectivity().await,
            SyncPhase::SyncInProgress => self.poll_completion(),
            SyncPhase::Synced => self.persist().await,
            SyncPhase::PersistAndCooldown => {
                self.enter(SyncPhase::WaitingConnectivity);
                Duration::from_ticks(0)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::drivers::pcf8563::REG_SECONDS;
    use crate::port::BusPort;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use platform::mocks::{MockConnectivity, MockDisplay};
    use platform::{EhI2c, PortMap, PCF8563_ADDRESS};

    /// 2024-02-29 12:34:56 UTC
    const T: i64 = 1_709_210_096;
    const LEAP_DAY_REGS: [u8; 7] = [0x56, 0x34, 0x12, 0x29, 0x04, 0x02, 0x24];

    type Task<'a> = TimeSyncTask<'a, MockConnectivity, EhI2c<I2cMock>, MockDisplay>;

    fn bus(expectations: &[Transaction]) -> BusPort<EhI2c<I2cMock>> {
        BusPort::new(
            EhI2c::new(I2cMock::new(expectations), 100_000),
            PortMap::STICK_C_PLUS.internal_bus,
        )
    }

    fn task<'a>(bus: &'a BusPort<EhI2c<I2cMock>>, net: MockConnectivity) -> Task<'a> {
        TimeSyncTask::new(
            net,
            Pcf8563::new(bus, PCF8563_ADDRESS),
            None,
            TimingConfig::DEFAULT,
            0,
        )
    }

    fn write_frame() -> Vec<u8> {
        let mut frame = vec![REG_SECONDS];
        frame.extend_from_slice(&LEAP_DAY_REGS);
        frame
    }

    #[tokio::test]
    async fn stays_waiting_while_disconnected() {
        let bus = bus(&[]);
        {
            let mut sync = task(&bus, MockConnectivity::new(T));
            for _ in 0..10 {
                assert_eq!(sync.step().await, TimingConfig::DEFAULT.connectivity_poll);
                assert_eq!(sync.phase(), SyncPhase::WaitingConnectivity);
            }
            assert_eq!(sync.connectivity().requests, 0);
        }
        bus.into_inner().release().done();
    }

    #[tokio::test]
    async fn full_cycle_persists_network_time() {
        let bus = bus(&[
            Transaction::write(PCF8563_ADDRESS, write_frame()),
            Transaction::write_read(PCF8563_ADDRESS, vec![REG_SECONDS], LEAP_DAY_REGS.to_vec()),
        ]);
        {
            let mut net = MockConnectivity::new(T);
            net.connected = true;
            let mut sync = task(&bus, net);
            let timing = TimingConfig::DEFAULT;

            assert_eq!(sync.step().await, timing.sync_poll);
            assert_eq!(sync.phase(), SyncPhase::SyncInProgress);
            assert_eq!(sync.connectivity().requests, 1);

            sync.step().await;
            assert_eq!(sync.phase(), SyncPhase::Synced);

            assert_eq!(sync.step().await, timing.sync_cooldown);
            assert_eq!(sync.phase(), SyncPhase::PersistAndCooldown);
            assert_eq!(sync.connectivity().stops, 1);

            sync.step().await;
            assert_eq!(sync.phase(), SyncPhase::WaitingConnectivity);
            assert_eq!(sync.last_sync().map(|d| d.to_unix()), Some(T));
        }

        let reading = Pcf8563::new(&bus, PCF8563_ADDRESS).read_time().await.unwrap();
        assert_eq!(reading.datetime.to_unix(), T);
        bus.into_inner().release().done();
    }

    #[tokio::test]
    async fn utc_offset_shifts_stored_time() {
        let mut regs = LEAP_DAY_REGS;
        regs[2] = 0x13;
        let mut frame = vec![REG_SECONDS];
        frame.extend_from_slice(&regs);
        let bus = bus(&[Transaction::write(PCF8563_ADDRESS, frame)]);
        {
            let mut net = MockConnectivity::new(T);
            net.connected = true;
            let mut sync: Task<'_> = TimeSyncTask::new(
                net,
                Pcf8563::new(&bus, PCF8563_ADDRESS),
                None,
                TimingConfig::DEFAULT,
                3600,
            );
            for _ in 0..3 {
                sync.step().await;
            }
            assert_eq!(sync.phase(), SyncPhase::PersistAndCooldown);
        }
        bus.into_inner().release().done();
    }

    #[tokio::test]
    async fn pending_request_times_out() {
        let bus = bus(&[]);
        {
            let mut net = MockConnectivity::new(T);
            net.connected = true;
            net.completes_after = None;
            let mut sync = task(&bus, net);

            sync.step().await;
            let mut polls = 0;
            while sync.phase() == SyncPhase::SyncInProgress {
                sync.step().await;
                polls += 1;
                assert!(polls <= 24, "timeout never fired");
            }
            assert_eq!(polls, 24);
            assert_eq!(sync.phase(), SyncPhase::WaitingConnectivity);
            assert_eq!(sync.connectivity().stops, 1);
        }
        bus.into_inner().release().done();
    }

    #[tokio::test]
    async fn failed_rtc_write_retries_without_new_request() {
        let bus = bus(&[
            Transaction::write(PCF8563_ADDRESS, write_frame())
                .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            Transaction::write(PCF8563_ADDRESS, write_frame()),
        ]);
        {
            let mut net = MockConnectivity::new(T);
            net.connected = true;
            let mut sync = task(&bus, net);

            sync.step().await;
            sync.step().await;
            assert_eq!(sync.step().await, TimingConfig::DEFAULT.bus_retry);
            assert_eq!(sync.phase(), SyncPhase::Synced);

            assert_eq!(sync.step().await, TimingConfig::DEFAULT.sync_cooldown);
            assert_eq!(sync.connectivity().requests, 1);
        }
        bus.into_inner().release().done();
    }
}
