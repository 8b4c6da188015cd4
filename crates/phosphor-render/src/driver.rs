use phosphor_core::{FrameClock, ScopeConfig, SignalSource, SignalStage, TickWindow};

use crate::events::{EventQueue, EventSender, PendingEvents};
use crate::pipeline::{PassBackend, Pipeline, TickOutcome};
use crate::settings::RenderSettings;
use crate::targets::Size;

/// Everything one scope run owns between ticks: the signal stage, the clock,
/// the pending-event queue and the pass pipeline.
///
/// A tick drains events, advances time and playback, refreshes the signal
/// buffer, then hands the buffer to the pipeline.
pub struct ScopeDriver {
    stage: SignalStage,
    clock: FrameClock,
    events: EventQueue,
    pipeline: Pipeline,
    audio_output: bool,
}

impl ScopeDriver {
    pub fn new(config: &ScopeConfig, source: SignalSource) -> Self {
        Self {
            stage: SignalStage::new(config.capacity, source),
            clock: FrameClock::new(),
            events: EventQueue::new(),
            pipeline: Pipeline::new(RenderSettings::from(config)),
            audio_output: false,
        }
    }

    /// Whether a real-time output stream is advancing the audio cursor.
    /// Without one, each tick advances it by the tick's duration.
    pub fn set_audio_output(&mut self, active: bool) {
        self.audio_output = active;
    }

    pub fn events(&self) -> EventSender {
        self.events.sender()
    }

    pub fn stage(&self) -> &SignalStage {
        &self.stage
    }

    /// Set the size directly, for hosts without an event source.
    pub fn set_size(&mut self, size: Size) {
        self.pipeline.request_resize(size);
    }

    /// Run a tick ending at wall-clock time `now` (seconds).
    pub fn tick_at<B: PassBackend>(&mut self, backend: &mut B, now: f64) -> Result<TickOutcome, B::Error> {
        let pending = self.events.drain();
        let window = self.clock.tick_at(now);
        self.run(backend, pending, window)
    }

    /// Run a tick of fixed length `dt`, for headless rendering.
    pub fn tick_delta<B: PassBackend>(&mut self, backend: &mut B, dt: f64) -> Result<TickOutcome, B::Error> {
        let pending = self.events.drain();
        let window = self.clock.tick_delta(dt);
        self.run(backend, pending, window)
    }

    fn run<B: PassBackend>(
        &mut self,
        backend: &mut B,
        pending: PendingEvents,
        window: TickWindow,
    ) -> Result<TickOutcome, B::Error> {
        if let Some(size) = pending.resize {
            self.pipeline.request_resize(size);
        }

        if pending.restart && self.stage.audio().is_some() {
            self.stage.restart_audio();
            log::info!("playback restarted");
        }
        if let Some(audio) = self.stage.audio() {
            if pending.start && !pending.restart && !audio.is_playing() {
                audio.start();
                log::info!("playback started");
            }
            if !self.audio_output {
                audio.advance_by_time(window.dt);
            }
        }

        self.stage.update(&window);
        self.pipeline.tick(backend, window.dt, self.stage.buffer())
    }
}
