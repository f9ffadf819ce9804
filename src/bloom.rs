// Post-processing: brightness-threshold glow, then down to 0x00RRGGBB for the window.
// Visual: the white-hot core and sparkles bleed a soft halo into the dark around them.

use rayon::prelude::*;

use crate::error::Error;
use crate::noise::smoothstep;
use crate::render::{luminance, Rgb};
use crate::types::{FrameBuffer, HdrImage};

/// Final stage of a frame: HDR colour in, display pixels out.
pub trait PostProcess {
    fn apply(&mut self, hdr: &HdrImage, out: &mut FrameBuffer) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct BloomSettings {
    pub intensity: f32, // glow added on top; 0 turns the blur off entirely
    pub threshold: f32, // luminance where glow starts
    pub smoothing: f32, // width of the threshold knee
    pub radius: f32,    // 0..1, scaled by the shorter screen side
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self { intensity: 2.5, threshold: 0.15, smoothing: 0.025, radius: 0.85 }
    }
}

impl BloomSettings {
    /// Box radius in pixels for a given frame size.
    pub fn radius_px(&self, width: usize, height: usize) -> usize {
        let short = width.min(height) as f32;
        (self.radius * short * 0.02).round().max(1.0) as usize
    }
}

/// Linear (0..1) -> sRGB byte, quantised to 4096 steps.
/// Speeds up the final encode by replacing powf with a table lookup.
struct SrgbLut {
    table: [u8; 4096],
}

impl SrgbLut {
    fn new() -> Self {
        let mut table = [0u8; 4096];
        for (i, slot) in table.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        Self { table }
    }

    #[inline]
    fn encode(&self, l: f32) -> u32 {
        // NaN lands on 0 through the saturating cast
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.table[idx] as u32
    }

    #[inline]
    fn pack(&self, c: Rgb) -> u32 {
        (self.encode(c[0]) << 16) | (self.encode(c[1]) << 8) | self.encode(c[2])
    }
}

/// Software bloom with scratch buffers reused every frame.
pub struct Bloom {
    settings: BloomSettings,
    lut: SrgbLut,
    base: Vec<Rgb>,   // colour composited over black
    bright: Vec<Rgb>, // thresholded, then blurred in place
    tmp: Vec<Rgb>,    // horizontal pass scratch
}

impl Bloom {
    pub fn new(settings: BloomSettings) -> Self {
        Self {
            settings,
            lut: SrgbLut::new(),
            base: Vec::new(),
            bright: Vec::new(),
            tmp: Vec::new(),
        }
    }
}

impl PostProcess for Bloom {
    fn apply(&mut self, hdr: &HdrImage, out: &mut FrameBuffer) -> Result<(), Error> {
        if hdr.width != out.width || hdr.height != out.height {
            return Err(Error::Buffer(format!(
                "bloom: hdr {}x{} vs frame {}x{}",
                hdr.width, hdr.height, out.width, out.height
            )));
        }
        let (w, h) = (hdr.width, hdr.height);
        let len = w * h;
        if len == 0 {
            return Ok(());
        }
        self.base.resize(len, [0.0; 3]);
        self.bright.resize(len, [0.0; 3]);
        self.tmp.resize(len, [0.0; 3]);

        /* 1) Composite over black and keep only what crosses the threshold. */
        let s = &self.settings;
        for ((px, base), bright) in hdr.pixels.iter().zip(&mut self.base).zip(&mut self.bright) {
            let a = px[3].clamp(0.0, 1.0);
            *base = [px[0] * a, px[1] * a, px[2] * a];
            let k = smoothstep(s.threshold, s.threshold + s.smoothing, luminance(*base));
            *bright = [base[0] * k, base[1] * k, base[2] * k];
        }

        /* 2) Two box passes approximate a gaussian halo. */
        let glow = s.intensity;
        if glow > 0.0 {
            let r = s.radius_px(w, h);
            for _ in 0..2 {
                box_blur_rgb(&mut self.bright, &mut self.tmp, w, h, r);
            }
        }

        /* 3) Add glow, encode to display pixels. */
        let lut = &self.lut;
        for ((dst, base), bright) in out.pixels.iter_mut().zip(&self.base).zip(&self.bright) {
            let c = if glow > 0.0 {
                [base[0] + glow * bright[0], base[1] + glow * bright[1], base[2] + glow * bright[2]]
            } else {
                *base
            };
            *dst = lut.pack(c);
        }
        Ok(())
    }
}

/// Separable box blur, `img` -> `tmp` (rows) -> `img` (columns).
/// Edges are extended so borders don't darken.
pub fn box_blur_rgb(img: &mut [Rgb], tmp: &mut [Rgb], w: usize, h: usize, radius: usize) {
    if w == 0 || h == 0 {
        return;
    }
    let r = radius as i64;
    let win = (2 * r + 1) as f32;

    /* ---- Pass 1: Horizontal, one row per task ---- */
    tmp.par_chunks_mut(w).zip(img.par_chunks(w)).for_each(|(dst, src)| {
        slide(|i| src[i], |i, v| dst[i] = v, w, r, win);
    });

    /* ---- Pass 2: Vertical, column by column ---- */
    for x in 0..w {
        slide(|i| tmp[i * w + x], |i, v| img[i * w + x] = v, h, r, win);
    }
}

// Running-sum average along one line of `n` samples.
#[inline]
fn slide(get: impl Fn(usize) -> Rgb, mut set: impl FnMut(usize, Rgb), n: usize, r: i64, win: f32) {
    let last = n as i64 - 1;
    let at = |i: i64| get(i.clamp(0, last) as usize);

    // window [-r, r] around 0, left side extended from the edge pixel
    let mut sum = [0.0f32; 3];
    for i in -r..=r {
        let p = at(i);
        for c in 0..3 {
            sum[c] += p[c];
        }
    }

    for i in 0..n as i64 {
        set(i as usize, [sum[0] / win, sum[1] / win, sum[2] / win]);
        let add = at(i + r + 1);
        let sub = at(i - r);
        for c in 0..3 {
            sum[c] += add[c] - sub[c];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn red(px: u32) -> u32 {
        (px >> 16) & 0xFF
    }

    #[test]
    fn blur_keeps_flat_images_flat() {
        let (w, h) = (9, 7);
        let mut img = vec![[0.5, 0.25, 1.0]; w * h];
        let mut tmp = vec![[0.0; 3]; w * h];
        box_blur_rgb(&mut img, &mut tmp, w, h, 3);
        for p in &img {
            assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-5);
            assert_abs_diff_eq!(p[2], 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn blur_spreads_a_point() {
        let (w, h) = (9, 9);
        let mut img = vec![[0.0; 3]; w * h];
        img[4 * w + 4] = [9.0, 9.0, 9.0];
        let mut tmp = vec![[0.0; 3]; w * h];
        box_blur_rgb(&mut img, &mut tmp, w, h, 1);
        assert_abs_diff_eq!(img[4 * w + 4][0], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(img[3 * w + 5][0], 1.0, epsilon = 1e-5);
        assert_eq!(img[0][0], 0.0);
    }

    #[test]
    fn dim_frames_get_no_glow() {
        let mut hdr = HdrImage::new(16, 16);
        hdr.pixels[8 * 16 + 8] = [0.1, 0.1, 0.1, 1.0]; // luminance 0.1 < 0.15
        let mut with = FrameBuffer::new(16, 16);
        let mut without = FrameBuffer::new(16, 16);
        Bloom::new(BloomSettings::default()).apply(&hdr, &mut with).unwrap();
        Bloom::new(BloomSettings { intensity: 0.0, ..BloomSettings::default() })
            .apply(&hdr, &mut without)
            .unwrap();
        assert_eq!(with.pixels, without.pixels);
    }

    #[test]
    fn hot_pixels_glow_into_their_neighbours() {
        let mut hdr = HdrImage::new(64, 64);
        hdr.pixels[32 * 64 + 32] = [1.5, 1.5, 1.2, 1.0];
        let mut out = FrameBuffer::new(64, 64);
        Bloom::new(BloomSettings::default()).apply(&hdr, &mut out).unwrap();
        assert_eq!(red(out.pixels[32 * 64 + 32]), 255);
        assert!(red(out.pixels[32 * 64 + 33]) > 0);
        assert_eq!(out.pixels[0], 0);
    }

    #[test]
    fn transparent_pixels_stay_black() {
        let mut hdr = HdrImage::new(4, 4);
        hdr.pixels[5] = [1.0, 1.0, 1.0, 0.0];
        let mut out = FrameBuffer::new(4, 4);
        Bloom::new(BloomSettings { intensity: 0.0, ..BloomSettings::default() })
            .apply(&hdr, &mut out)
            .unwrap();
        assert!(out.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let hdr = HdrImage::new(4, 4);
        let mut out = FrameBuffer::new(5, 4);
        assert!(matches!(
            Bloom::new(BloomSettings::default()).apply(&hdr, &mut out),
            Err(Error::Buffer(_))
        ));
    }
}
