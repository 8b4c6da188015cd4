use glam::Vec4;
use glow::HasContext;

use crate::error::RenderError;
use crate::fbo::RenderTarget;
use crate::program::{compile_fullscreen_program, uniform_location};
use crate::quad::FullscreenQuad;
use crate::shaders;

/// Offset of the blur taps, in pixels (`2 / viewport` in texture space).
pub const BLUR_OFFSET_PX: i32 = 2;

/// One output pixel of the persistence blend, given the cheap-blurred and
/// centre beam values and the cheap-blurred afterimage.
pub fn blend(beam_blur: Vec4, beam_center: Vec4, after_blur: Vec4, decay: f32) -> Vec4 {
    ((beam_blur + beam_center) * 0.5).max(after_blur * decay)
}

/// Pass 2: phosphor persistence.
///
/// Reads the beam and the afterimage committed last tick, writes the
/// composite, then commits the composite as the new afterimage. The
/// afterimage is never bound for writing while it is being sampled.
pub struct PersistencePass {
    program: glow::Program,
    loc_beam: glow::UniformLocation,
    loc_afterimage: glow::UniformLocation,
}

impl PersistencePass {
    pub fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        let program = compile_fullscreen_program(gl, shaders::PERSISTENCE_FRAGMENT)?;
        let locations = uniform_location(gl, program, "u_beam")
            .and_then(|beam| Ok((beam, uniform_location(gl, program, "u_afterimage")?)));
        match locations {
            Ok((loc_beam, loc_afterimage)) => Ok(Self {
                program,
                loc_beam,
                loc_afterimage,
            }),
            Err(e) => {
                unsafe { gl.delete_program(program) };
                Err(e)
            }
        }
    }

    pub fn render(
        &self,
        gl: &glow::Context,
        beam: &RenderTarget,
        afterimage: &RenderTarget,
        composite: &RenderTarget,
        quad: &FullscreenQuad,
    ) {
        unsafe {
            gl.use_program(Some(self.program));
            gl.disable(glow::BLEND);

            composite.bind(gl);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(beam.texture));
            gl.uniform_1_i32(Some(&self.loc_beam), 0);

            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, Some(afterimage.texture));
            gl.uniform_1_i32(Some(&self.loc_afterimage), 1);

            quad.draw(gl);

            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }

        // Commit: next tick reads exactly what was composited this tick.
        composite.blit_to(gl, afterimage);
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.program) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_keeps_brighter_source() {
        let beam = Vec4::splat(0.4);
        let after = Vec4::splat(0.9);
        assert_eq!(blend(beam, beam, after, 0.5), Vec4::splat(0.45));
        assert_eq!(blend(beam, beam, after, 1.0), Vec4::splat(0.9));
    }

    #[test]
    fn test_blend_halves_blur_plus_center() {
        let out = blend(Vec4::splat(0.2), Vec4::splat(1.0), Vec4::ZERO, 1.0);
        assert_eq!(out, Vec4::splat(0.6));
    }
}
