//! Build-time task selection, task-creation parameters and timing.
//!
//! Every period and threshold used by a task lives in [`TimingConfig`] so
//! tests and the simulator can run the whole system on an accelerated clock.

use embassy_time::Duration;

// ---------------------------------------------------------------------------
// Feature selection
// ---------------------------------------------------------------------------

/// Which peripheral tasks this build includes.
///
/// One flag per Cargo feature of the same name. Flags are independent;
/// behaviour spanning two tasks needs both (see the helper methods).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)] // one flag per Cargo feature
pub struct FeatureSet {
    /// Built-in buttons A and B
    pub button: bool,
    /// Button on the hat connector
    pub external_button: bool,
    /// Status LED
    pub led: bool,
    /// LED on the hat connector
    pub external_led: bool,
    /// Buzzer melody
    pub buzzer: bool,
    /// Temperature/humidity unit on Port A
    pub sensor: bool,
    /// RTC readout on the dashboard
    pub clock: bool,
    /// Network time to RTC synchronization
    pub time_sync: bool,
    /// External 4-digit display
    pub digit_display: bool,
    /// Accelerometer logging
    pub imu: bool,
    /// Dashboard widgets
    pub ui: bool,
    /// Colour-cycling RGB LED on the hat connector
    pub rgb_led: bool,
    /// Backlight brightness demo
    pub screen_demo: bool,
}

impl FeatureSet {
    /// Every task enabled.
    pub const ALL: Self = Self {
        button: true,
        external_button: true,
        led: true,
        external_led: true,
        buzzer: true,
        sensor: true,
        clock: true,
        time_sync: true,
        digit_display: true,
        imu: true,
        ui: true,
        rgb_led: true,
        screen_demo: true,
    };

    /// No task enabled.
    pub const NONE: Self = Self {
        button: false,
        external_button: false,
        led: false,
        external_led: false,
        buzzer: false,
        sensor: false,
        clock: false,
        time_sync: false,
        digit_display: false,
        imu: false,
        ui: false,
        rgb_led: false,
        screen_demo: false,
    };

    /// Flags selected by this build's Cargo features.
    pub const fn from_build() -> Self {
        Self {
            button: cfg!(feature = "button"),
            external_button: cfg!(feature = "external-button"),
            led: cfg!(feature = "led"),
            external_led: cfg!(feature = "external-led"),
            buzzer: cfg!(feature = "buzzer"),
            sensor: cfg!(feature = "sensor"),
            clock: cfg!(feature = "clock"),
            time_sync: cfg!(feature = "time-sync"),
            digit_display: cfg!(feature = "digit-display"),
            imu: cfg!(feature = "imu"),
            ui: cfg!(feature = "ui"),
            rgb_led: cfg!(feature = "rgb-led"),
            screen_demo: cfg!(feature = "screen-demo"),
        }
    }

    /// A long-press on button A wakes the buzzer.
    pub const fn button_triggers_buzzer(&self) -> bool {
        self.button && self.buzzer
    }

    /// The sync task persists into the same RTC the clock task reads.
    pub const fn time_sync_enabled(&self) -> bool {
        self.time_sync && self.clock
    }

    /// The RGB LED and the hat LED sit on the same pad; the hat LED wins.
    pub const fn rgb_led_enabled(&self) -> bool {
        self.rgb_led && !self.external_led
    }

    /// Any button task shares the dashboard's button indicator.
    pub const fn any_button(&self) -> bool {
        self.button || self.external_button
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::from_build()
    }
}

// ---------------------------------------------------------------------------
// Task creation parameters
// ---------------------------------------------------------------------------

/// Parameters handed to the runtime when a task is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskSpec {
    /// Diagnostic name (thread name on the simulator)
    pub name: &'static str,
    /// Stack size in bytes
    pub stack_size: usize,
    /// Scheduler priority; all tasks share one level
    pub priority: u8,
    /// Core the task is pinned to
    pub core: u8,
}

impl TaskSpec {
    /// Stack given to every task on the device.
    pub const DEFAULT_STACK: usize = 4096;
    /// Flat priority shared by every task.
    pub const DEFAULT_PRIORITY: u8 = 2;
    /// Application core.
    pub const APP_CORE: u8 = 1;

    /// Spec with the default stack, priority and core.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            stack_size: Self::DEFAULT_STACK,
            priority: Self::DEFAULT_PRIORITY,
            core: Self::APP_CORE,
        }
    }

    /// Built-in button sampler
    pub const BUTTON: Self = Self::new("button_task");
    /// Hat button sampler
    pub const EXTERNAL_BUTTON: Self = Self::new("external_button_task");
    /// Status LED blinker
    pub const LED: Self = Self::new("led_task");
    /// Hat LED blinker
    pub const EXTERNAL_LED: Self = Self::new("external_led_task");
    /// Buzzer player
    pub const BUZZER: Self = Self::new("buzzer_task");
    /// Environmental sensor poller
    pub const SENSOR: Self = Self::new("sensor_task");
    /// Dashboard clock
    pub const CLOCK: Self = Self::new("clock_task");
    /// Network time synchronization
    pub const TIME_SYNC: Self = Self::new("time_sync_task");
    /// 4-digit display refresher
    pub const DIGITS: Self = Self::new("digit_task");
    /// Accelerometer logger
    pub const IMU: Self = Self::new("imu_task");
    /// Hat RGB LED colour cycle
    pub const RGB_LED: Self = Self::new("external_rgb_led_blink_task");
    /// Backlight demo
    pub const SCREEN: Self = Self::new("screen_task");
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Every period, threshold and back-off used by the tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Button sampling cadence
    pub button_period: Duration,
    /// Continuous hold that qualifies as a long-press
    pub long_press: Duration,
    /// LED on/off half-period
    pub led_period: Duration,
    /// Sensor poll period
    pub sensor_period: Duration,
    /// Pause after a successful sensor read
    pub sensor_settle: Duration,
    /// Back-off after a failed bus transaction
    pub bus_retry: Duration,
    /// RTC redisplay period
    pub clock_period: Duration,
    /// Digit display refresh period
    pub digit_period: Duration,
    /// Accelerometer poll period
    pub imu_period: Duration,
    /// Connectivity poll while waiting for a link
    pub connectivity_poll: Duration,
    /// Completion poll while a time request is pending
    pub sync_poll: Duration,
    /// Give up on a pending time request after this long
    pub sync_timeout: Duration,
    /// Pause after a successful RTC update
    pub sync_cooldown: Duration,
    /// Length of each buzzer note
    pub buzzer_note: Duration,
    /// Silence after the last note, still part of one playback
    pub buzzer_rest: Duration,
    /// RGB LED on/off half-period
    pub rgb_period: Duration,
    /// Hold time of each backlight demo step
    pub screen_period: Duration,
}

impl TimingConfig {
    /// Production timing.
    pub const DEFAULT: Self = Self {
        button_period: Duration::from_millis(80),
        long_press: Duration::from_millis(1000),
        led_period: Duration::from_millis(1000),
        sensor_period: Duration::from_millis(5000),
        sensor_settle: Duration::from_millis(100),
        bus_retry: Duration::from_secs(10),
        clock_period: Duration::from_millis(990),
        digit_period: Duration::from_millis(500),
        imu_period: Duration::from_millis(5000),
        connectivity_poll: Duration::from_secs(60),
        sync_poll: Duration::from_secs(5),
        sync_timeout: Duration::from_secs(120),
        sync_cooldown: Duration::from_secs(600),
        buzzer_note: Duration::from_millis(500),
        buzzer_rest: Duration::from_millis(5000),
        rgb_period: Duration::from_millis(1000),
        screen_period: Duration::from_millis(2000),
    };

    /// Divide every duration by `divisor` (accelerated clock).
    ///
    /// A divisor of 0 or 1 returns the timing unchanged. Results never drop
    /// below one tick.
    pub fn scaled(&self, divisor: u32) -> Self {
        if divisor <= 1 {
            return *self;
        }
        let div = |d: Duration| {
            Duration::from_ticks(d.as_ticks().checked_div(u64::from(divisor)).unwrap_or(0).max(1))
        };
        Self {
            button_period: div(self.button_period),
            long_press: div(self.long_press),
            led_period: div(self.led_period),
            sensor_period: div(self.sensor_period),
            sensor_settle: div(self.sensor_settle),
            bus_retry: div(self.bus_retry),
            clock_period: div(self.clock_period),
            digit_period: div(self.digit_period),
            imu_period: div(self.imu_period),
            connectivity_poll: div(self.connectivity_poll),
            sync_poll: div(self.sync_poll),
            sync_timeout: div(self.sync_timeout),
            sync_cooldown: div(self.sync_cooldown),
            buzzer_note: div(self.buzzer_note),
            buzzer_rest: div(self.buzzer_rest),
            rgb_period: div(self.rgb_period),
            screen_period: div(self.screen_period),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the composition root needs besides the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Tasks to start
    pub features: FeatureSet,
    /// Periods and thresholds
    pub timing: TimingConfig,
    /// Local-time offset applied before writing the RTC, in seconds
    pub utc_offset_secs: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            features: FeatureSet::from_build(),
            timing: TimingConfig::DEFAULT,
            utc_offset_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_matches_device_cadences() {
        let t = TimingConfig::default();
        assert_eq!(t.button_period.as_millis(), 80);
        assert_eq!(t.long_press.as_millis(), 1000);
        assert_eq!(t.clock_period.as_millis(), 990);
        assert_eq!(t.sync_cooldown.as_secs(), 600);
    }

    #[test]
    fn scaled_divides_every_period() {
        let t = TimingConfig::DEFAULT.scaled(10);
        assert_eq!(t.button_period.as_millis(), 8);
        assert_eq!(t.connectivity_poll.as_secs(), 6);
        assert_eq!(t.buzzer_rest.as_millis(), 500);
    }

    #[test]
    fn scaled_never_reaches_zero() {
        let t = TimingConfig::DEFAULT.scaled(u32::MAX);
        assert_eq!(t.button_period.as_ticks(), 1);
        assert_eq!(TimingConfig::DEFAULT.scaled(0), TimingConfig::DEFAULT);
    }

    #[test]
    fn dependent_features_need_both_flags() {
        let mut f = FeatureSet::ALL;
        assert!(f.button_triggers_buzzer());
        f.buzzer = false;
        assert!(!f.button_triggers_buzzer());
        f.clock = false;
        assert!(!f.time_sync_enabled());
    }

    #[test]
    fn hat_led_excludes_rgb_led() {
        let mut f = FeatureSet::ALL;
        assert!(!f.rgb_led_enabled());
        f.external_led = false;
        assert!(f.rgb_led_enabled());
    }

    #[test]
    fn task_specs_share_priority_and_core() {
        for spec in [TaskSpec::BUTTON, TaskSpec::TIME_SYNC, TaskSpec::BUZZER] {
            assert_eq!(spec.priority, 2);
            assert_eq!(spec.core, 1);
            assert_eq!(spec.stack_size, 4096);
        }
    }
}
