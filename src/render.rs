// Colour pass: heat + procedural detail -> HDR RGBA.
// Visual: smoke at the faint tail, red/orange/yellow body, a white-hot core that
// overshoots 1.0 for the bloom, plus sparse sparkles around the flame's rim.

use cgmath::{vec2, Vector2};
use rayon::prelude::*;

use crate::field::{EdgeMode, HeatField};
use crate::noise::{fractal_noise, mix, smoothstep, value_noise};
use crate::types::HdrImage;

pub type Rgb = [f32; 3];

/// Gradient stops, coolest first. Components above 1.0 are intentional.
#[derive(Clone, Debug)]
pub struct Palette {
    pub smoke: Rgb,
    pub dark_red: Rgb,
    pub orange: Rgb,
    pub yellow: Rgb,
    pub core: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            smoke: [0.1, 0.1, 0.12],
            dark_red: [0.8, 0.1, 0.05],
            orange: [1.5, 0.5, 0.1],
            yellow: [1.5, 1.2, 0.4],
            core: [1.5, 1.5, 1.2],
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderParams {
    pub palette: Palette,
    pub discard_below: f32,        // heat under this is fully transparent
    pub shape_scale: f32,          // fbm frequency of the flame body
    pub shape_speed: f32,          // how fast the body texture scrolls
    pub light_offset: f32,         // uv shift for the fake-lighting probe
    pub light_gain: f32,           // rectified slope -> light
    pub light_mix: f32,            // light added to every channel
    pub spark_scale: f32,          // sparkle noise frequency
    pub spark_speed: f32,          // sparkle scroll speed (faster than the body)
    pub spark_threshold: f32,      // hard cutoff; only the top few percent sparkle
    pub spark_color: Rgb,
    pub spark_gain: f32,
    pub spark_alpha: f32,          // minimum alpha where a sparkle lands
    pub edge_zone: [f32; 4],       // rise start/end, fall start/end (heat)
    pub edge: EdgeMode,            // how the field is sampled at the borders
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            discard_below: 0.001,
            shape_scale: 4.0,
            shape_speed: 1.5,
            light_offset: 0.1,
            light_gain: 4.0,
            light_mix: 0.3,
            spark_scale: 60.0,
            spark_speed: 10.0,
            spark_threshold: 0.96,
            spark_color: [2.0, 1.5, 0.5],
            spark_gain: 2.0,
            spark_alpha: 0.8,
            edge_zone: [0.02, 0.15, 0.25, 0.45],
            edge: EdgeMode::Clamp,
        }
    }
}

#[inline]
fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t)]
}

/// Rec. 709 luminance of a linear colour.
#[inline]
pub fn luminance(c: Rgb) -> f32 {
    0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2]
}

/// Five segments: smoke | smoke->red | red->orange | orange->yellow | yellow->core.
/// Alpha only fades in across the smoke segment.
pub fn gradient(volume: f32, pal: &Palette) -> (Rgb, f32) {
    if volume < 0.2 {
        (pal.smoke, smoothstep(0.0, 0.2, volume) * 0.6)
    } else if volume < 0.4 {
        (lerp_rgb(pal.smoke, pal.dark_red, (volume - 0.2) / 0.2), 1.0)
    } else if volume < 0.75 {
        (lerp_rgb(pal.dark_red, pal.orange, (volume - 0.4) / 0.35), 1.0)
    } else if volume < 0.95 {
        (lerp_rgb(pal.orange, pal.yellow, (volume - 0.75) / 0.2), 1.0)
    } else {
        // not clamped: past 1.0 the colour keeps climbing and feeds the bloom
        (lerp_rgb(pal.yellow, pal.core, (volume - 0.95) / 0.05), 1.0)
    }
}

/// Band of heat where sparkles may appear: rim of the flame, not core or tail.
#[inline]
pub fn edge_zone(heat: f32, zone: [f32; 4]) -> f32 {
    smoothstep(zone[0], zone[1], heat) * (1.0 - smoothstep(zone[2], zone[3], heat))
}

/// 0 or the edge-zone weight: hard threshold on fast-scrolling noise.
pub fn sparkle(uv: Vector2<f32>, heat: f32, time: f32, p: &RenderParams) -> f32 {
    let n = value_noise(uv * p.spark_scale - vec2(0.0, time * p.spark_speed));
    let hit = if n >= p.spark_threshold { 1.0 } else { 0.0 };
    hit * edge_zone(heat, p.edge_zone)
}

/// Colour of one pixel, or `None` where the flame is absent (discard).
pub fn shade(heat: f32, uv: Vector2<f32>, time: f32, p: &RenderParams) -> Option<[f32; 4]> {
    if heat < p.discard_below {
        return None;
    }

    let noise_uv = uv * p.shape_scale - vec2(0.0, time * p.shape_speed);
    let shape = fractal_noise(noise_uv);
    let volume = heat * (0.5 + 0.8 * shape);

    let (mut col, mut alpha) = gradient(volume, &p.palette);

    // fake lighting from the slope of the shape noise
    let slope = fractal_noise(noise_uv + vec2(p.light_offset, p.light_offset)) - shape;
    let light = (slope * p.light_gain).max(0.0) * p.light_mix;
    for c in &mut col {
        *c += light;
    }

    let s = sparkle(uv, heat, time, p);
    if s > 0.0 {
        for (c, sc) in col.iter_mut().zip(p.spark_color) {
            *c += sc * s * p.spark_gain;
        }
        alpha = alpha.max(p.spark_alpha);
    }

    Some([col[0], col[1], col[2], alpha])
}

/// uv of a display pixel centre (row 0 = top of the screen = v near 1).
#[inline]
pub fn pixel_uv(x: usize, y: usize, width: usize, height: usize) -> Vector2<f32> {
    vec2((x as f32 + 0.5) / width as f32, 1.0 - (y as f32 + 0.5) / height as f32)
}

/// Fill `out` from the field, one row per task.
pub fn render(field: &HeatField, out: &mut HdrImage, time: f32, p: &RenderParams) {
    let (w, h) = (out.width, out.height);
    if w == 0 || h == 0 {
        return;
    }
    out.pixels.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            let uv = pixel_uv(x, y, w, h);
            let heat = field.sample(uv, p.edge);
            *px = shade(heat, uv, time, p).unwrap_or([0.0; 4]);
        }
    });
}
