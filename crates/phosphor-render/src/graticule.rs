use glow::HasContext;

use crate::error::RenderError;
use crate::fbo::RenderTarget;
use crate::program::compile_fullscreen_program;
use crate::quad::FullscreenQuad;
use crate::shaders;
use crate::targets::Size;

/// Divisions per axis.
pub const GRID_CELLS: f32 = 10.0;

/// Whether the pixel whose centre is `(x + 0.5, y + 0.5)` lies on a grid
/// line. Lines are one pixel wide inside the region inset by `margin / 2`
/// of the viewport on each side.
pub fn on_grid_line(x: u32, y: u32, size: Size, margin: f32) -> bool {
    let (w, h) = (size.width as f32, size.height as f32);
    let lim = [w * 0.5 * margin, h * 0.5 * margin];
    let inner = [w - 2.0 * lim[0], h - 2.0 * lim[1]];
    let cell = [inner[0] / GRID_CELLS, inner[1] / GRID_CELLS];
    let gx = x as f32 + 0.5 - lim[0];
    let gy = y as f32 + 0.5 - lim[1];

    if gx < 0.0 || gy < 0.0 || gx > inner[0] + 1.0 || gy > inner[1] + 1.0 {
        return false;
    }
    // GLSL mod: x - y * floor(x / y)
    let m = |v: f32, c: f32| v - c * (v / c).floor();
    m(gx, cell[0]) < 1.0 || m(gy, cell[1]) < 1.0
}

/// Pass 3: darkens the composite under a 10x10 grid.
///
/// Runs after the afterimage commit, so the grid never feeds back into
/// the persistence.
pub struct GraticulePass {
    program: glow::Program,
}

impl GraticulePass {
    pub fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        let program = compile_fullscreen_program(gl, shaders::GRATICULE_FRAGMENT)?;
        Ok(Self { program })
    }

    pub fn render(&self, gl: &glow::Context, composite: &RenderTarget, quad: &FullscreenQuad) {
        unsafe {
            composite.bind(gl);
            gl.use_program(Some(self.program));
            gl.enable(glow::BLEND);
            gl.blend_equation(glow::FUNC_ADD);
            // rgb: dst * src, alpha untouched
            gl.blend_func_separate(glow::DST_COLOR, glow::ZERO, glow::ZERO, glow::ONE);
            quad.draw(gl);
            gl.disable(glow::BLEND);
            gl.use_program(None);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.program) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_pixels_are_clear() {
        let size = Size::new(200, 100);
        for y in 0..100 {
            for x in 0..9 {
                assert!(!on_grid_line(x, y, size, 0.1), "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_eleven_vertical_lines() {
        // 200 px wide, margin 0.1: region starts at 10 px, cells of 18 px.
        let size = Size::new(200, 100);
        let y = 7; // off every horizontal line
        let columns: Vec<u32> = (0..200).filter(|&x| on_grid_line(x, y, size, 0.1)).collect();
        assert_eq!(columns, vec![10, 28, 46, 64, 82, 100, 118, 136, 154, 172, 190]);
    }

    #[test]
    fn test_zero_margin_starts_at_edge() {
        let size = Size::new(100, 100);
        assert!(on_grid_line(0, 55, size, 0.0));
        assert!(on_grid_line(55, 0, size, 0.0));
        assert!(!on_grid_line(55, 55, size, 0.0));
    }
}
