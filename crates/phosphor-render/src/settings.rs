use phosphor_core::ScopeConfig;

/// Visual parameters for the scope passes, fixed for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Beam color [r, g, b]. Range: 0.0..1.0 each
    pub trace_color: [f32; 3],
    /// Clear color of the beam target.
    pub background_color: [f32; 3],
    /// Afterimage decay rate K, per second. Observed range: 4..16
    pub decay_rate: f32,
    /// Beam line and leading dot width in pixels.
    pub line_width: f32,
    pub leading_dot: bool,
    pub graticule: bool,
    /// Fraction of the NDC extent left free on each side. Range: 0.0..1.0
    pub margin: f32,
    /// Multiplier for pixels under a grid line.
    pub graticule_darken: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&ScopeConfig::default())
    }
}

impl From<&ScopeConfig> for RenderSettings {
    fn from(config: &ScopeConfig) -> Self {
        Self {
            trace_color: config.trace_color,
            background_color: config.background_color,
            decay_rate: config.decay_rate,
            line_width: config.line_width,
            leading_dot: config.leading_dot,
            graticule: config.graticule,
            margin: config.graticule_margin,
            graticule_darken: config.graticule_darken,
        }
    }
}
