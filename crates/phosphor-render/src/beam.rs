use glow::HasContext;

use phosphor_core::sample::{self, Sample};

use crate::error::RenderError;
use crate::fbo::RenderTarget;
use crate::program::compile_program;
use crate::shaders;

const SAMPLE_STRIDE: i32 = std::mem::size_of::<Sample>() as i32;

/// Pass 1: draws the signal buffer into the beam target.
///
/// The uploaded samples are read twice through instanced attributes: the
/// strip VAO walks consecutive pairs (one quad per segment), the dot VAO
/// points both ends at the newest sample.
pub struct BeamPass {
    program: glow::Program,
    vbo: glow::Buffer,
    strip_vao: glow::VertexArray,
    dot_vao: glow::VertexArray,
    capacity: usize,
}

impl BeamPass {
    pub fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        let program = compile_program(gl, shaders::BEAM_VERTEX, shaders::BEAM_FRAGMENT)?;
        unsafe {
            let vbo = gl.create_buffer();
            let strip_vao = gl.create_vertex_array();
            let dot_vao = gl.create_vertex_array();
            match (vbo, strip_vao, dot_vao) {
                (Ok(vbo), Ok(strip_vao), Ok(dot_vao)) => Ok(Self {
                    program,
                    vbo,
                    strip_vao,
                    dot_vao,
                    capacity: 0,
                }),
                (vbo, strip_vao, dot_vao) => {
                    let mut reason = String::new();
                    match vbo {
                        Ok(vbo) => gl.delete_buffer(vbo),
                        Err(e) => reason = e,
                    }
                    for vao in [strip_vao, dot_vao] {
                        match vao {
                            Ok(vao) => gl.delete_vertex_array(vao),
                            Err(e) => reason = e,
                        }
                    }
                    gl.delete_program(program);
                    Err(RenderError::Allocation(reason))
                }
            }
        }
    }

    /// Transfer this tick's samples. Storage is (re)allocated only when the
    /// sample count changes.
    pub fn upload(&mut self, gl: &glow::Context, samples: &[Sample]) {
        let bytes = sample::as_bytes(samples);
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            if samples.len() != self.capacity {
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STREAM_DRAW);
                self.capacity = samples.len();
                self.configure_vaos(gl);
                log::debug!("beam buffer sized for {} samples", self.capacity);
            } else {
                gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytes);
            }
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    unsafe fn configure_vaos(&self, gl: &glow::Context) {
        let newest = (self.capacity.saturating_sub(1)) as i32 * SAMPLE_STRIDE;
        for (vao, start, end) in [
            (self.strip_vao, 0, SAMPLE_STRIDE),
            (self.dot_vao, newest, newest),
        ] {
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            // a_start: location 0
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, SAMPLE_STRIDE, start);
            gl.vertex_attrib_divisor(0, 1);
            // a_end: location 1
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, SAMPLE_STRIDE, end);
            gl.vertex_attrib_divisor(1, 1);
        }
        gl.bind_vertex_array(None);
    }

    /// Clear `target` to `background` and draw the first `count` samples.
    pub fn render(
        &self,
        gl: &glow::Context,
        target: &RenderTarget,
        background: [f32; 3],
        count: usize,
        leading_dot: bool,
    ) {
        let count = count.min(self.capacity);
        unsafe {
            target.bind(gl);
            gl.disable(glow::BLEND);
            gl.clear_color(background[0], background[1], background[2], 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
            if count == 0 {
                return;
            }

            gl.use_program(Some(self.program));

            if count > 1 {
                gl.bind_vertex_array(Some(self.strip_vao));
                gl.draw_arrays_instanced(glow::TRIANGLES, 0, 6, count as i32 - 1);
            }
            if leading_dot {
                gl.bind_vertex_array(Some(self.dot_vao));
                gl.draw_arrays_instanced(glow::TRIANGLES, 0, 6, 1);
            }

            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.strip_vao);
            gl.delete_vertex_array(self.dot_vao);
            gl.delete_buffer(self.vbo);
        }
    }
}
