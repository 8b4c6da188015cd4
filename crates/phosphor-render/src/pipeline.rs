use phosphor_core::{Sample, SignalBuffer};

use crate::settings::RenderSettings;
use crate::targets::Size;
use crate::uniforms::FrameUniforms;

/// One implementation of the scope passes (GPU or CPU).
///
/// Backends only execute passes; [`Pipeline::tick`] owns the order.
pub trait PassBackend {
    type Error;

    /// Replace all three frame targets with ones of `size`.
    fn resize_targets(&mut self, size: Size) -> Result<(), Self::Error>;

    fn write_uniforms(&mut self, uniforms: &FrameUniforms);

    fn upload_signal(&mut self, samples: &[Sample]) -> Result<(), Self::Error>;

    /// Clear the beam target and draw the uploaded samples as a strip,
    /// plus a dot at the newest sample when asked.
    fn beam_pass(&mut self, count: usize, leading_dot: bool);

    /// Blend beam over the decayed afterimage into the composite, then copy
    /// the composite into the afterimage for the next tick.
    fn persistence_pass(&mut self);

    fn graticule_pass(&mut self);

    fn present(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Presented,
    /// Zero-sized viewport; nothing was drawn.
    Skipped,
}

/// Drives a backend through one tick in the fixed pass order:
/// resize, uniforms, signal upload, beam, persistence, graticule, present.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: RenderSettings,
    requested: Size,
    allocated: Option<Size>,
}

impl Pipeline {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            requested: Size::default(),
            allocated: None,
        }
    }

    /// Takes effect at the start of the next tick.
    pub fn request_resize(&mut self, size: Size) {
        self.requested = size;
    }

    pub fn tick<B: PassBackend>(
        &mut self,
        backend: &mut B,
        dt: f64,
        signal: &SignalBuffer,
    ) -> Result<TickOutcome, B::Error> {
        let size = self.requested;
        if size.is_empty() {
            log::trace!("viewport {size} is empty, skipping tick");
            return Ok(TickOutcome::Skipped);
        }

        if self.allocated != Some(size) {
            backend.resize_targets(size)?;
            log::debug!("frame targets now {size}");
            self.allocated = Some(size);
        }

        let uniforms = FrameUniforms::new(&self.settings, dt.max(0.0), size);
        backend.write_uniforms(&uniforms);
        backend.upload_signal(signal.as_slice())?;
        backend.beam_pass(signal.len(), self.settings.leading_dot);
        backend.persistence_pass();
        if self.settings.graticule {
            backend.graticule_pass();
        }
        backend.present();
        Ok(TickOutcome::Presented)
    }
}
