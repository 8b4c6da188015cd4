use std::convert::Infallible;
use std::path::Path;

use glam::{DVec2, Vec2, Vec4};

use phosphor_core::Sample;

use crate::error::RenderError;
use crate::graticule::on_grid_line;
use crate::persistence::{blend, BLUR_OFFSET_PX};
use crate::pipeline::PassBackend;
use crate::settings::RenderSettings;
use crate::targets::{FrameTarget, FrameTargets, Size};
use crate::uniforms::FrameUniforms;

/// A floating-point RGBA image, rows bottom-up like a GL texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    size: Size,
    pixels: Vec<Vec4>,
}

impl Raster {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![Vec4::new(0.0, 0.0, 0.0, 1.0); size.pixels()],
        }
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[y as usize * self.size.width as usize + x as usize]
    }

    /// Read with clamp-to-edge addressing.
    pub fn get_clamped(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, self.size.width as i64 - 1) as u32;
        let y = y.clamp(0, self.size.height as i64 - 1) as u32;
        self.get(x, y)
    }

    fn set(&mut self, x: u32, y: u32, value: Vec4) {
        let w = self.size.width as usize;
        self.pixels[y as usize * w + x as usize] = value;
    }

    fn put(&mut self, x: i64, y: i64, value: Vec4) {
        if (0..self.size.width as i64).contains(&x) && (0..self.size.height as i64).contains(&y) {
            self.set(x as u32, y as u32, value);
        }
    }

    pub fn fill(&mut self, value: Vec4) {
        self.pixels.fill(value);
    }

    /// Brightest color channel anywhere in the image.
    pub fn peak(&self) -> f32 {
        self.pixels.iter().map(|p| p.truncate().max_element()).fold(0.0, f32::max)
    }

    pub fn copy_from(&mut self, other: &Raster) {
        self.size = other.size;
        self.pixels.clone_from(&other.pixels);
    }

    /// Center plus four neighbours `BLUR_OFFSET_PX` away, averaged.
    pub fn blur_cheap(&self, x: u32, y: u32) -> Vec4 {
        let (x, y) = (x as i64, y as i64);
        let d = BLUR_OFFSET_PX as i64;
        (self.get_clamped(x, y)
            + self.get_clamped(x + d, y)
            + self.get_clamped(x - d, y)
            + self.get_clamped(x, y + d)
            + self.get_clamped(x, y - d))
            / 5.0
    }

    /// Top-down 8-bit copy for image export.
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let (w, h) = (self.size.width, self.size.height);
        image::RgbaImage::from_fn(w, h, |x, y| {
            let p = self.get(x, h - 1 - y);
            let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            image::Rgba([c(p.x), c(p.y), c(p.z), 255])
        })
    }
}

impl FrameTarget for Raster {
    fn size(&self) -> Size {
        self.size
    }
}

/// CPU implementation of the scope passes.
///
/// Same math and constants as the shaders, rasterized with a square pen
/// instead of GPU quads. Used for headless snapshots and tests.
pub struct SoftwareBackend {
    targets: Option<FrameTargets<Raster>>,
    output: Raster,
    uniforms: Option<FrameUniforms>,
    samples: Vec<Sample>,
    background: [f32; 3],
}

impl SoftwareBackend {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            targets: None,
            output: Raster::new(Size::default()),
            uniforms: None,
            samples: Vec::new(),
            background: settings.background_color,
        }
    }

    pub fn targets(&self) -> Option<&FrameTargets<Raster>> {
        self.targets.as_ref()
    }

    /// The last presented image.
    pub fn output(&self) -> &Raster {
        &self.output
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        self.output.to_rgba8().save_with_format(path, image::ImageFormat::Png)?;
        log::info!("wrote {} snapshot to {}", self.output.size(), path.display());
        Ok(())
    }

    /// Pixel-space position of `s`, in f64 so far off-screen samples stay finite.
    fn ndc_to_pixel(s: Sample, size: Size, margin: f32) -> DVec2 {
        let p = Vec2::from(s).as_dvec2() * (1.0 - margin as f64);
        DVec2::new(
            (p.x + 1.0) * 0.5 * size.width as f64,
            (p.y + 1.0) * 0.5 * size.height as f64,
        )
    }
}

/// Liang-Barsky clip of segment `a`-`b` to the box `min`..`max`.
/// `None` when nothing of it lies inside or an endpoint is not finite.
fn clip_segment(a: DVec2, b: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let d = b - a;
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
    }
    let start = if t0 > 0.0 { a + d * t0 } else { a };
    let end = if t1 < 1.0 { a + d * t1 } else { b };
    Some((start, end))
}

fn to_pixel(p: DVec2) -> (i64, i64) {
    (p.x.floor() as i64, p.y.floor() as i64)
}

/// Stamp a `width`-pixel square centred on `(x, y)`.
fn stamp(raster: &mut Raster, x: i64, y: i64, width: f32, color: Vec4) {
    let extent = width.round().max(1.0) as i64;
    let back = (extent - 1) / 2;
    for dy in 0..extent {
        for dx in 0..extent {
            raster.put(x - back + dx, y - back + dy, color);
        }
    }
}

/// Bresenham line from `a` to `b` inclusive, stamping the pen at each step.
fn draw_segment(raster: &mut Raster, a: (i64, i64), b: (i64, i64), width: f32, color: Vec4) {
    let (mut x, mut y) = a;
    let dx = (b.0 - x).abs();
    let dy = -(b.1 - y).abs();
    let sx = if x < b.0 { 1 } else { -1 };
    let sy = if y < b.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        stamp(raster, x, y, width, color);
        if (x, y) == b {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

impl PassBackend for SoftwareBackend {
    type Error = Infallible;

    fn resize_targets(&mut self, size: Size) -> Result<(), Infallible> {
        let create = |s: Size| Ok::<_, Infallible>(Raster::new(s));
        if let Some(targets) = &mut self.targets {
            targets.resize(size, create, drop)?;
        } else {
            self.targets = Some(FrameTargets::new(size, create, drop)?);
        }
        self.output = Raster::new(size);
        Ok(())
    }

    fn write_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.uniforms = Some(*uniforms);
    }

    fn upload_signal(&mut self, samples: &[Sample]) -> Result<(), Infallible> {
        self.samples.clear();
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn beam_pass(&mut self, count: usize, leading_dot: bool) {
        let (Some(u), Some(targets)) = (self.uniforms, &mut self.targets) else {
            return;
        };
        let size = targets.size();
        let [r, g, b] = self.background;
        let color = Vec4::new(u.color[0], u.color[1], u.color[2], 1.0);
        let width = u.line_width();
        let points: Vec<DVec2> = self.samples[..count.min(self.samples.len())]
            .iter()
            .map(|&s| Self::ndc_to_pixel(s, size, u.margin()))
            .collect();

        // Anything further out than the pen cannot touch the image
        let pad = width as f64 + 1.0;
        let min = DVec2::splat(-pad);
        let max = DVec2::new(size.width as f64 + pad, size.height as f64 + pad);

        let (beam, _, _) = targets.parts_mut();
        beam.fill(Vec4::new(r, g, b, 1.0));
        for pair in points.windows(2) {
            if let Some((a, b)) = clip_segment(pair[0], pair[1], min, max) {
                draw_segment(beam, to_pixel(a), to_pixel(b), width, color);
            }
        }
        if let (true, Some(&p)) = (leading_dot, points.last()) {
            if p.is_finite() && p.cmpge(min).all() && p.cmple(max).all() {
                let (x, y) = to_pixel(p);
                stamp(beam, x, y, width, color);
            }
        }
    }

    fn persistence_pass(&mut self) {
        let (Some(u), Some(targets)) = (self.uniforms, &mut self.targets) else {
            return;
        };
        let decay = u.decay();
        let size = targets.size();
        let (beam, afterimage, composite) = targets.parts_mut();
        for y in 0..size.height {
            for x in 0..size.width {
                let out = blend(beam.blur_cheap(x, y), beam.get(x, y), afterimage.blur_cheap(x, y), decay);
                composite.set(x, y, out);
            }
        }
        afterimage.copy_from(composite);
    }

    fn graticule_pass(&mut self) {
        let (Some(u), Some(targets)) = (self.uniforms, &mut self.targets) else {
            return;
        };
        let size = targets.size();
        let darken = u.graticule_darken();
        let (_, _, composite) = targets.parts_mut();
        for y in 0..size.height {
            for x in 0..size.width {
                if on_grid_line(x, y, size, u.margin()) {
                    let p = composite.get(x, y);
                    composite.set(x, y, (p.truncate() * darken).extend(p.w));
                }
            }
        }
    }

    fn present(&mut self) {
        if let Some(targets) = &self.targets {
            self.output.copy_from(targets.composite());
        }
    }
}
