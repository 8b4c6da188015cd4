use std::num::NonZeroU32;

use glow::HasContext;

use phosphor_core::Sample;

use crate::beam::BeamPass;
use crate::driver::ScopeDriver;
use crate::error::RenderError;
use crate::fbo::RenderTarget;
use crate::graticule::GraticulePass;
use crate::persistence::PersistencePass;
use crate::pipeline::{PassBackend, TickOutcome};
use crate::present::{Presenter, Surface};
use crate::quad::FullscreenQuad;
use crate::settings::RenderSettings;
use crate::targets::{FrameTargets, Size};
use crate::uniforms::{FrameUniforms, UniformBuffer};

/// Saved OpenGL state so we can restore the host's GL context after custom rendering.
struct SavedGlState {
    framebuffer: Option<glow::Framebuffer>,
    viewport: [i32; 4],
    blend_enabled: bool,
    blend_src_rgb: i32,
    blend_dst_rgb: i32,
    blend_src_alpha: i32,
    blend_dst_alpha: i32,
    blend_eq_rgb: i32,
    blend_eq_alpha: i32,
    program: Option<glow::Program>,
    vao: Option<glow::VertexArray>,
    array_buffer: Option<glow::Buffer>,
    scissor_enabled: bool,
    active_texture: i32,
    bound_textures: [Option<glow::Texture>; 2],
}

fn gl_name(id: i32) -> Option<NonZeroU32> {
    NonZeroU32::new(id as u32)
}

impl SavedGlState {
    unsafe fn save(gl: &glow::Context) -> Self {
        let framebuffer = gl_name(gl.get_parameter_i32(glow::FRAMEBUFFER_BINDING)).map(glow::NativeFramebuffer);

        let mut viewport = [0i32; 4];
        gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);

        let active_texture = gl.get_parameter_i32(glow::ACTIVE_TEXTURE);
        let mut bound_textures = [None; 2];
        for (i, slot) in bound_textures.iter_mut().enumerate() {
            gl.active_texture(glow::TEXTURE0 + i as u32);
            *slot = gl_name(gl.get_parameter_i32(glow::TEXTURE_BINDING_2D)).map(glow::NativeTexture);
        }
        gl.active_texture(active_texture as u32);

        Self {
            framebuffer,
            viewport,
            blend_enabled: gl.is_enabled(glow::BLEND),
            blend_src_rgb: gl.get_parameter_i32(glow::BLEND_SRC_RGB),
            blend_dst_rgb: gl.get_parameter_i32(glow::BLEND_DST_RGB),
            blend_src_alpha: gl.get_parameter_i32(glow::BLEND_SRC_ALPHA),
            blend_dst_alpha: gl.get_parameter_i32(glow::BLEND_DST_ALPHA),
            blend_eq_rgb: gl.get_parameter_i32(glow::BLEND_EQUATION_RGB),
            blend_eq_alpha: gl.get_parameter_i32(glow::BLEND_EQUATION_ALPHA),
            program: gl_name(gl.get_parameter_i32(glow::CURRENT_PROGRAM)).map(glow::NativeProgram),
            vao: gl_name(gl.get_parameter_i32(glow::VERTEX_ARRAY_BINDING)).map(glow::NativeVertexArray),
            array_buffer: gl_name(gl.get_parameter_i32(glow::ARRAY_BUFFER_BINDING)).map(glow::NativeBuffer),
            scissor_enabled: gl.is_enabled(glow::SCISSOR_TEST),
            active_texture,
            bound_textures,
        }
    }

    unsafe fn restore(&self, gl: &glow::Context) {
        gl.bind_framebuffer(glow::FRAMEBUFFER, self.framebuffer);
        gl.viewport(self.viewport[0], self.viewport[1], self.viewport[2], self.viewport[3]);

        if self.blend_enabled {
            gl.enable(glow::BLEND);
        } else {
            gl.disable(glow::BLEND);
        }
        gl.blend_func_separate(
            self.blend_src_rgb as u32,
            self.blend_dst_rgb as u32,
            self.blend_src_alpha as u32,
            self.blend_dst_alpha as u32,
        );
        gl.blend_equation_separate(self.blend_eq_rgb as u32, self.blend_eq_alpha as u32);

        gl.use_program(self.program);
        gl.bind_vertex_array(self.vao);
        gl.bind_buffer(glow::ARRAY_BUFFER, self.array_buffer);

        if self.scissor_enabled {
            gl.enable(glow::SCISSOR_TEST);
        } else {
            gl.disable(glow::SCISSOR_TEST);
        }

        for (i, texture) in self.bound_textures.iter().enumerate() {
            gl.active_texture(glow::TEXTURE0 + i as u32);
            gl.bind_texture(glow::TEXTURE_2D, *texture);
        }
        gl.active_texture(self.active_texture as u32);
    }
}

/// GPU implementation of the scope passes over a glow context.
///
/// Owns every GL object the pipeline uses; nothing lives in globals.
/// Construction fails if any program does not build.
pub struct ScopeRenderer {
    beam: BeamPass,
    persistence: PersistencePass,
    graticule: GraticulePass,
    presenter: Presenter,
    quad: FullscreenQuad,
    uniforms: UniformBuffer,
    targets: Option<FrameTargets<RenderTarget>>,
    background: [f32; 3],
}

impl ScopeRenderer {
    /// Build every program and static buffer. Must be called with a valid GL context.
    /// On failure every object that did build is released before returning.
    pub fn new(gl: &glow::Context, settings: &RenderSettings) -> Result<Self, RenderError> {
        let parts = (
            BeamPass::new(gl),
            PersistencePass::new(gl),
            GraticulePass::new(gl),
            Presenter::new(gl),
            FullscreenQuad::new(gl),
            UniformBuffer::new(gl),
        );

        match parts {
            (Ok(beam), Ok(persistence), Ok(graticule), Ok(presenter), Ok(quad), Ok(uniforms)) => {
                log::info!("scope programs built");
                Ok(Self {
                    beam,
                    persistence,
                    graticule,
                    presenter,
                    quad,
                    uniforms,
                    targets: None,
                    background: settings.background_color,
                })
            }
            (beam, persistence, graticule, presenter, quad, uniforms) => {
                let mut first = None;
                release(beam, &mut first, |p| p.destroy(gl));
                release(persistence, &mut first, |p| p.destroy(gl));
                release(graticule, &mut first, |p| p.destroy(gl));
                release(presenter, &mut first, |p| p.destroy(gl));
                release(quad, &mut first, |p| p.destroy(gl));
                release(uniforms, &mut first, |p| p.destroy(gl));
                Err(first.unwrap_or_else(|| RenderError::Allocation("renderer construction failed".into())))
            }
        }
    }

    /// Run one tick of `driver` and draw it into the host's current
    /// framebuffer at `viewport` (`[x, y, width, height]`, physical pixels).
    /// Host GL state is restored afterwards.
    pub fn render(
        &mut self,
        gl: &glow::Context,
        driver: &mut ScopeDriver,
        now: f64,
        viewport: [i32; 4],
    ) -> Result<TickOutcome, RenderError> {
        unsafe {
            let saved = SavedGlState::save(gl);
            gl.disable(glow::SCISSOR_TEST);

            let mut backend = GlBackend {
                gl,
                renderer: self,
                surface: Surface {
                    framebuffer: saved.framebuffer,
                    viewport,
                },
            };
            let outcome = driver.tick_at(&mut backend, now);

            saved.restore(gl);
            outcome
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        if let Some(targets) = self.targets.take() {
            targets.destroy(|t| t.destroy(gl));
        }
        self.beam.destroy(gl);
        self.persistence.destroy(gl);
        self.graticule.destroy(gl);
        self.presenter.destroy(gl);
        self.quad.destroy(gl);
        self.uniforms.destroy(gl);
    }
}

/// Destroy a part that built, or keep the first error of one that didn't.
fn release<T>(part: Result<T, RenderError>, first: &mut Option<RenderError>, destroy: impl FnOnce(T)) {
    match part {
        Ok(part) => destroy(part),
        Err(e) => {
            log::error!("{e}");
            first.get_or_insert(e);
        }
    }
}

struct GlBackend<'a> {
    gl: &'a glow::Context,
    renderer: &'a mut ScopeRenderer,
    surface: Surface,
}

impl PassBackend for GlBackend<'_> {
    type Error = RenderError;

    fn resize_targets(&mut self, size: Size) -> Result<(), RenderError> {
        let gl = self.gl;
        let create = |s: Size| RenderTarget::new(gl, s);
        let destroy = |t: RenderTarget| t.destroy(gl);
        if let Some(targets) = &mut self.renderer.targets {
            targets.resize(size, create, destroy)?;
        } else {
            self.renderer.targets = Some(FrameTargets::new(size, create, destroy)?);
        }
        log::info!("frame targets allocated at {size}");
        Ok(())
    }

    fn write_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.renderer.uniforms.write(self.gl, uniforms);
    }

    fn upload_signal(&mut self, samples: &[Sample]) -> Result<(), RenderError> {
        self.renderer.beam.upload(self.gl, samples);
        Ok(())
    }

    fn beam_pass(&mut self, count: usize, leading_dot: bool) {
        let r = &*self.renderer;
        if let Some(targets) = &r.targets {
            r.beam.render(self.gl, targets.beam(), r.background, count, leading_dot);
        }
    }

    fn persistence_pass(&mut self) {
        let r = &*self.renderer;
        if let Some(t) = &r.targets {
            r.persistence.render(self.gl, t.beam(), t.afterimage(), t.composite(), &r.quad);
        }
    }

    fn graticule_pass(&mut self) {
        let r = &*self.renderer;
        if let Some(targets) = &r.targets {
            r.graticule.render(self.gl, targets.composite(), &r.quad);
        }
    }

    fn present(&mut self) {
        let r = &*self.renderer;
        if let Some(targets) = &r.targets {
            r.presenter.render(self.gl, targets.composite(), &self.surface, &r.quad);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_destroys_built_parts_and_keeps_first_error() {
        let mut destroyed = Vec::new();
        let mut first = None;
        release(Ok(1), &mut first, |v| destroyed.push(v));
        release::<i32>(Err(RenderError::MissingUniform("u_beam")), &mut first, |v| destroyed.push(v));
        release::<i32>(Err(RenderError::ProgramLink("late".into())), &mut first, |v| destroyed.push(v));
        release(Ok(4), &mut first, |v| destroyed.push(v));
        assert_eq!(destroyed, vec![1, 4]);
        assert!(matches!(first, Some(RenderError::MissingUniform("u_beam"))));
    }
}
