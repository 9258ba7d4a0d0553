//! Buzzer melody task.
//!
//! The task sleeps on the [`ResumeSignal`] until a long-press wakes it, plays
//! the C-major scale once, then goes back to sleep. Wake-ups that arrive
//! mid-melody are dropped by the signal.

use embassy_time::{Duration, Timer};
use platform::{Buzzer, Tone};

use super::PeripheralTask;
use crate::config::TimingConfig;
use crate::log;
use crate::signal::ResumeSignal;

/// C4 through C5, Hz.
pub const SCALE_HZ: [u32; 8] = [261, 293, 329, 349, 391, 440, 493, 523];

/// Half of the 13-bit duty range.
pub const NOTE_DUTY: u32 = 4094;

/// Notes in one melody.
pub const SEQUENCE_LEN: usize = SCALE_HZ.len();

/// Playback state of a [`BuzzerSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuzzerState {
    /// Waiting for a resume
    Suspended,
    /// Working through the notes
    Playing,
}

/// A fixed melody and its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuzzerSequence {
    notes: [(Tone, Duration); SEQUENCE_LEN],
    rest_duration: Duration,
    index: usize,
    state: BuzzerState,
}

impl BuzzerSequence {
    /// Melody of `(tone, length)` pairs followed by `rest` of silence.
    pub fn new(notes: [(Tone, Duration); SEQUENCE_LEN], rest: Duration) -> Self {
        Self {
            notes,
            rest_duration: rest,
            index: 0,
            state: BuzzerState::Suspended,
        }
    }

    /// Ascending C-major scale with the note and rest lengths of `timing`.
    pub fn c_major(timing: &TimingConfig) -> Self {
        let note = timing.buzzer_note;
        Self::new(SCALE_HZ.map(|hz| (Tone::new(hz, NOTE_DUTY), note)), timing.buzzer_rest)
    }

    /// Current state.
    pub fn state(&self) -> BuzzerState {
        self.state
    }

    /// Index of the next note to play.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Every note with its length, in playing order.
    pub fn notes(&self) -> &[(Tone, Duration)] {
        &self.notes
    }

    fn start(&mut self) {
        self.index = 0;
        self.state = BuzzerState::Playing;
    }

    fn next_note(&mut self) -> Option<(Tone, Duration)> {
        let note = self.notes.get(self.index).copied()?;
        self.index = self.index.saturating_add(1);
        Some(note)
    }

    fn finish(&mut self) {
        self.index = 0;
        self.state = BuzzerState::Suspended;
    }
}

/// Plays [`BuzzerSequence`] on every resume.
pub struct BuzzerTask<'a, B> {
    buzzer: B,
    sequence: BuzzerSequence,
    signal: &'a ResumeSignal,
}

impl<'a, B: Buzzer> BuzzerTask<'a, B> {
    /// Task playing `sequence` on `buzzer` whenever `signal` fires.
    pub fn new(buzzer: B, sequence: BuzzerSequence, signal: &'a ResumeSignal) -> Self {
        Self {
            buzzer,
            sequence,
            signal,
        }
    }

    /// Melody and progress.
    pub fn sequence(&self) -> &BuzzerSequence {
        &self.sequence
    }

    /// Play the melody once, start to finish.
    pub async fn play(&mut self) {
        self.sequence.start();
        while let Some((tone, length)) = self.sequence.next_note() {
            if self.buzzer.play(tone).is_err() {
                log::warn!("buzzer: play {} Hz failed", tone.frequency_hz);
            }
            Timer::after(length).await;
        }
        if self.buzzer.stop().is_err() {
            log::warn!("buzzer: stop failed");
        }
        Timer::after(self.sequence.rest_duration).await;
        self.sequence.finish();
    }
}

impl<B: Buzzer> PeripheralTask for BuzzerTask<'_, B> {
    fn name(&self) -> &'static str {
        "buzzer"
    }

    async fn step(&mut self) -> Duration {
        let signal = self.signal;
        let playback = signal.wait().await;
        log::info!("buzzer: playing");
        self.play().await;
        drop(playback);
        log::info!("buzzer: suspended");
        Duration::from_ticks(0)
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::{BuzzerOp, MockBuzzer};

    fn fast_timing() -> TimingConfig {
        TimingConfig::DEFAULT.scaled(100)
    }

    #[test]
    fn scale_is_eight_notes_at_half_duty() {
        let seq = BuzzerSequence::c_major(&TimingConfig::DEFAULT);
        assert_eq!(seq.notes().len(), 8);
        assert_eq!(seq.notes()[0], (Tone::new(261, 4094), Duration::from_millis(500)));
        assert_eq!(seq.notes()[7].0.frequency_hz, 523);
        assert_eq!(seq.state(), BuzzerState::Suspended);
    }

    #[tokio::test]
    async fn each_note_holds_for_its_own_length() {
        let short = Duration::from_millis(2);
        let mut notes = SCALE_HZ.map(|hz| (Tone::new(hz, NOTE_DUTY), short));
        notes[3].1 = Duration::from_millis(60);
        let buzzer = MockBuzzer::new();
        let signal = ResumeSignal::new();
        let mut task = BuzzerTask::new(
            buzzer.clone(),
            BuzzerSequence::new(notes, Duration::from_millis(1)),
            &signal,
        );

        let started = embassy_time::Instant::now();
        task.play().await;

        assert!(started.elapsed() >= Duration::from_millis(60 + 7 * 2 + 1));
        assert_eq!(buzzer.play_count(), 8);
    }

    #[tokio::test]
    async fn play_runs_every_note_then_stops() {
        let buzzer = MockBuzzer::new();
        let signal = ResumeSignal::new();
        let mut task = BuzzerTask::new(
            buzzer.clone(),
            BuzzerSequence::c_major(&fast_timing()),
            &signal,
        );

        task.play().await;

        let ops = buzzer.ops();
        let played: Vec<u32> = ops
            .iter()
            .filter_map(|op| match op {
                BuzzerOp::Play(tone) => Some(tone.frequency_hz),
                BuzzerOp::Stop => None,
            })
            .collect();
        assert_eq!(played, SCALE_HZ);
        assert_eq!(ops.last(), Some(&BuzzerOp::Stop));
        assert_eq!(task.sequence().state(), BuzzerState::Suspended);
        assert_eq!(task.sequence().index(), 0);
    }

    #[tokio::test]
    async fn resume_during_playback_is_dropped() {
        let buzzer = MockBuzzer::new();
        let signal = ResumeSignal::new();
        let mut task = BuzzerTask::new(
            buzzer.clone(),
            BuzzerSequence::c_major(&fast_timing()),
            &signal,
        );

        assert!(signal.resume());
        let presser = async {
            // Let the buzzer start its first note.
            Timer::after(Duration::from_millis(1)).await;
            assert!(signal.is_playing());
            assert!(!signal.resume());
        };
        tokio::join!(task.step(), presser);

        assert_eq!(buzzer.play_count(), 8);
        assert_eq!(
            buzzer.ops().iter().filter(|op| **op == BuzzerOp::Stop).count(),
            1
        );
        assert!(!signal.is_playing());
        assert!(!signal.is_pending());
    }
}
