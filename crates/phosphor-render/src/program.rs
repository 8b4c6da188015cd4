use glow::HasContext;

use crate::error::RenderError;
use crate::shaders;

/// Compile and link a vertex + fragment pair.
///
/// Both shader objects are released whether or not the build succeeds.
pub fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> Result<glow::Program, RenderError> {
    unsafe {
        let vert = compile_shader(gl, glow::VERTEX_SHADER, "vertex", vert_src)?;
        let frag = match compile_shader(gl, glow::FRAGMENT_SHADER, "fragment", frag_src) {
            Ok(frag) => frag,
            Err(e) => {
                gl.delete_shader(vert);
                return Err(e);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                gl.delete_shader(vert);
                gl.delete_shader(frag);
                return Err(RenderError::Allocation(e));
            }
        };
        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);

        gl.detach_shader(program, vert);
        gl.detach_shader(program, frag);
        gl.delete_shader(vert);
        gl.delete_shader(frag);

        if !linked {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(RenderError::ProgramLink(log));
        }

        bind_frame_block(gl, program);
        Ok(program)
    }
}

/// Compile a fragment shader against the shared fullscreen-quad vertex stage.
pub fn compile_fullscreen_program(gl: &glow::Context, frag_src: &str) -> Result<glow::Program, RenderError> {
    compile_program(gl, shaders::FULLSCREEN_VERTEX, frag_src)
}

pub fn uniform_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &'static str,
) -> Result<glow::UniformLocation, RenderError> {
    unsafe { gl.get_uniform_location(program, name) }.ok_or(RenderError::MissingUniform(name))
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    src: &str,
) -> Result<glow::Shader, RenderError> {
    let shader = gl.create_shader(kind).map_err(RenderError::Allocation)?;
    gl.shader_source(shader, src);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(RenderError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

/// Point the program's `FrameBlock` (if it declares one) at the shared binding.
unsafe fn bind_frame_block(gl: &glow::Context, program: glow::Program) {
    if let Some(index) = gl.get_uniform_block_index(program, "FrameBlock") {
        gl.uniform_block_binding(program, index, shaders::FRAME_BLOCK_BINDING);
    }
}
