// ── Per-frame uniform block (shared by every pass) ──────────────────

/// Binding point of `FrameBlock`.
pub const FRAME_BLOCK_BINDING: u32 = 0;

/// Layout mirrored by [`crate::uniforms::FrameUniforms`].
macro_rules! frame_block {
    () => {
        r#"
layout(std140) uniform FrameBlock {
    vec4 u_color;       // rgb = trace color
    vec4 u_dt_screen;   // x = dt, yz = viewport size in pixels, w = decay rate
    vec4 u_style;       // x = margin, y = line width, z = grid darken
};
"#
    };
}

// ── Beam shaders ────────────────────────────────────────────────────

/// Each instance is one segment `a -> b`, expanded to a quad of
/// `line_width` pixels with square caps. The leading dot is the same quad
/// with `a == b`.
pub const BEAM_VERTEX: &str = concat!(
    "#version 330 core\n",
    frame_block!(),
    r#"
layout(location = 0) in vec2 a_start;
layout(location = 1) in vec2 a_end;

const vec2 CORNERS[6] = vec2[6](
    vec2(0.0, -1.0), vec2(0.0, 1.0), vec2(1.0, 1.0),
    vec2(0.0, -1.0), vec2(1.0, 1.0), vec2(1.0, -1.0)
);

void main() {
    vec2 corner = CORNERS[gl_VertexID];
    float scale = 1.0 - u_style.x;
    vec2 a = a_start * scale;
    vec2 b = a_end * scale;

    vec2 ndc_per_px = 2.0 / u_dt_screen.yz;
    vec2 d = (b - a) / ndc_per_px;
    float len = length(d);
    vec2 tang = len > 0.0001 ? d / len : vec2(1.0, 0.0);
    vec2 norm = vec2(-tang.y, tang.x);

    float half_width = 0.5 * u_style.y;
    vec2 offset = (tang * (corner.x * 2.0 - 1.0) + norm * corner.y) * half_width;
    gl_Position = vec4(mix(a, b, corner.x) + offset * ndc_per_px, 0.0, 1.0);
}
"#
);

pub const BEAM_FRAGMENT: &str = concat!(
    "#version 330 core\n",
    frame_block!(),
    r#"
out vec4 frag_color;

void main() {
    frag_color = vec4(u_color.rgb, 1.0);
}
"#
);

// ── Fullscreen quad shaders (shared by persistence, graticule, present) ─

pub const FULLSCREEN_VERTEX: &str = r#"#version 330 core

layout(location = 0) in vec2 a_pos;
layout(location = 1) in vec2 a_uv;

out vec2 v_uv;

void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
"#;

// ── Persistence shader ──────────────────────────────────────────────

pub const PERSISTENCE_FRAGMENT: &str = concat!(
    "#version 330 core\n",
    frame_block!(),
    r#"
in vec2 v_uv;

uniform sampler2D u_beam;
uniform sampler2D u_afterimage;

out vec4 frag_color;

// Center plus four axis neighbours two pixels out.
vec4 blur_cheap(sampler2D s, vec2 uv) {
    vec2 eps = 2.0 / u_dt_screen.yz;
    vec4 sum = texture(s, uv);
    sum += texture(s, uv + vec2(eps.x, 0.0));
    sum += texture(s, uv - vec2(eps.x, 0.0));
    sum += texture(s, uv + vec2(0.0, eps.y));
    sum += texture(s, uv - vec2(0.0, eps.y));
    return sum / 5.0;
}

void main() {
    vec4 beam = blur_cheap(u_beam, v_uv) + texture(u_beam, v_uv);
    float decay = max(0.0, 1.0 - u_dt_screen.x * u_dt_screen.w);
    vec4 after = blur_cheap(u_afterimage, v_uv) * decay;
    frag_color = max(beam * 0.5, after);
}
"#
);

// ── Graticule shader ────────────────────────────────────────────────

/// Emits a per-pixel multiplier; drawn with `DST_COLOR * SRC` blending so
/// the composite underneath is darkened, never replaced.
pub const GRATICULE_FRAGMENT: &str = concat!(
    "#version 330 core\n",
    frame_block!(),
    r#"
out vec4 frag_color;

void main() {
    vec2 size = u_dt_screen.yz;
    vec2 lim = size * 0.5 * u_style.x;
    vec2 inner = size - 2.0 * lim;
    vec2 cell = inner / 10.0;
    vec2 grid = gl_FragCoord.xy - lim;

    float m = 1.0;
    if (grid.x >= 0.0 && grid.y >= 0.0 && grid.x <= inner.x + 1.0 && grid.y <= inner.y + 1.0) {
        if (mod(grid.x, cell.x) < 1.0 || mod(grid.y, cell.y) < 1.0) {
            m = u_style.z;
        }
    }
    frag_color = vec4(m, m, m, 1.0);
}
"#
);

// ── Present shader ──────────────────────────────────────────────────

pub const PRESENT_FRAGMENT: &str = r#"#version 330 core

in vec2 v_uv;

uniform sampler2D u_composite;

out vec4 frag_color;

void main() {
    frag_color = vec4(texture(u_composite, v_uv).rgb, 1.0);
}
"#;
