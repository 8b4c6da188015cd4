use glow::HasContext;

use crate::error::RenderError;
use crate::fbo::RenderTarget;
use crate::program::{compile_fullscreen_program, uniform_location};
use crate::quad::FullscreenQuad;
use crate::shaders;

/// Where the final image goes: a framebuffer (`None` = default) and a
/// `[x, y, width, height]` viewport in physical pixels.
#[derive(Debug, Clone, Copy)]
pub struct Surface {
    pub framebuffer: Option<glow::Framebuffer>,
    pub viewport: [i32; 4],
}

/// Copies the composite onto the visible surface.
///
/// Drawn as a textured quad rather than a framebuffer blit so it works on
/// multisampled and non-float surfaces alike.
pub struct Presenter {
    program: glow::Program,
    loc_composite: glow::UniformLocation,
}

impl Presenter {
    pub fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        let program = compile_fullscreen_program(gl, shaders::PRESENT_FRAGMENT)?;
        match uniform_location(gl, program, "u_composite") {
            Ok(loc_composite) => Ok(Self { program, loc_composite }),
            Err(e) => {
                unsafe { gl.delete_program(program) };
                Err(e)
            }
        }
    }

    pub fn render(&self, gl: &glow::Context, composite: &RenderTarget, surface: &Surface, quad: &FullscreenQuad) {
        let [x, y, w, h] = surface.viewport;
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, surface.framebuffer);
            gl.viewport(x, y, w, h);
            gl.disable(glow::BLEND);

            gl.use_program(Some(self.program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(composite.texture));
            gl.uniform_1_i32(Some(&self.loc_composite), 0);

            quad.draw(gl);

            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.program) }
    }
}
