use glow::HasContext;

use crate::error::RenderError;
use crate::settings::RenderSettings;
use crate::shaders::FRAME_BLOCK_BINDING;
use crate::targets::Size;

/// Fraction of the afterimage kept after a tick of `dt` seconds at decay
/// rate `k`.
pub fn decay_factor(dt: f32, k: f32) -> f32 {
    (1.0 - dt * k).max(0.0)
}

/// Per-tick parameters, laid out as the std140 `FrameBlock`.
///
/// Written once per tick before any pass runs; passes only read it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// rgb = trace color
    pub color: [f32; 4],
    /// x = dt, yz = viewport size, w = decay rate
    pub dt_screen: [f32; 4],
    /// x = margin, y = line width, z = grid darken
    pub style: [f32; 4],
}

impl FrameUniforms {
    pub fn new(settings: &RenderSettings, dt: f64, size: Size) -> Self {
        let [r, g, b] = settings.trace_color;
        Self {
            color: [r, g, b, 1.0],
            dt_screen: [dt as f32, size.width as f32, size.height as f32, settings.decay_rate],
            style: [settings.margin, settings.line_width, settings.graticule_darken, 0.0],
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt_screen[0]
    }

    pub fn viewport(&self) -> [f32; 2] {
        [self.dt_screen[1], self.dt_screen[2]]
    }

    pub fn decay_rate(&self) -> f32 {
        self.dt_screen[3]
    }

    pub fn margin(&self) -> f32 {
        self.style[0]
    }

    pub fn line_width(&self) -> f32 {
        self.style[1]
    }

    pub fn graticule_darken(&self) -> f32 {
        self.style[2]
    }

    /// The multiplier the persistence pass applies to the afterimage.
    pub fn decay(&self) -> f32 {
        decay_factor(self.dt(), self.decay_rate())
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(
                (self as *const Self).cast::<u8>(),
                std::mem::size_of::<Self>(),
            )
        }
    }
}

/// GPU buffer holding [`FrameUniforms`], bound at the `FrameBlock` slot.
pub struct UniformBuffer {
    ubo: glow::Buffer,
}

impl UniformBuffer {
    pub fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        unsafe {
            let ubo = gl.create_buffer().map_err(RenderError::Allocation)?;
            gl.bind_buffer(glow::UNIFORM_BUFFER, Some(ubo));
            gl.buffer_data_size(
                glow::UNIFORM_BUFFER,
                std::mem::size_of::<FrameUniforms>() as i32,
                glow::DYNAMIC_DRAW,
            );
            gl.bind_buffer(glow::UNIFORM_BUFFER, None);
            Ok(Self { ubo })
        }
    }

    /// Upload and bind for this tick's passes.
    pub fn write(&self, gl: &glow::Context, uniforms: &FrameUniforms) {
        unsafe {
            gl.bind_buffer(glow::UNIFORM_BUFFER, Some(self.ubo));
            gl.buffer_sub_data_u8_slice(glow::UNIFORM_BUFFER, 0, uniforms.as_bytes());
            gl.bind_buffer(glow::UNIFORM_BUFFER, None);
            gl.bind_buffer_base(glow::UNIFORM_BUFFER, FRAME_BLOCK_BINDING, Some(self.ubo));
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe { gl.delete_buffer(self.ubo) }
    }
}
