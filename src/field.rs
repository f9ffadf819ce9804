// Heat field storage: one square scalar grid, and the front/back pair that
// the physics pass ping-pongs between.
// Visual: never seen directly; the colour pass reads the current front.

use cgmath::Vector2;
use ndarray::Array2;

/// What a sample outside [0,1]² sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeMode {
    #[default]
    Clamp, // repeat the border texel
    Wrap,  // tile the field
}

/// Fixed-resolution square grid of heat. Indexed `[[row, col]]`,
/// row 0 at the bottom of the uv plane; texel centres sit at (i + 0.5) / n.
pub struct HeatField {
    cells: Array2<f32>,
}

impl HeatField {
    /// Zero-initialised field of side `n` (clamped to at least 1).
    pub fn new(n: usize) -> Self {
        let n = n.max(1);
        Self { cells: Array2::zeros((n, n)) }
    }

    pub fn side(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cells_mut(&mut self) -> &mut Array2<f32> {
        &mut self.cells
    }

    /// uv of the centre of cell (row, col).
    #[inline]
    pub fn cell_uv(&self, row: usize, col: usize) -> Vector2<f32> {
        let n = self.side() as f32;
        Vector2::new((col as f32 + 0.5) / n, (row as f32 + 0.5) / n)
    }

    /// Texture-style bilinear lookup at a fractional uv.
    pub fn sample(&self, uv: Vector2<f32>, edge: EdgeMode) -> f32 {
        let n = self.side();
        let x = uv.x * n as f32 - 0.5;
        let y = uv.y * n as f32 - 0.5;

        let (c0, c1, s) = texel_pair(x, n, edge);
        let (r0, r1, t) = texel_pair(y, n, edge);

        let q = &self.cells;
        let bottom = q[[r0, c0]] * (1.0 - s) + q[[r0, c1]] * s;
        let top = q[[r1, c0]] * (1.0 - s) + q[[r1, c1]] * s;
        bottom * (1.0 - t) + top * t
    }
}

#[cfg(test)]
impl HeatField {
    pub fn cells(&self) -> &Array2<f32> {
        &self.cells
    }

    pub fn fill(&mut self, value: f32) {
        self.cells.fill(value);
    }

    /// Hottest cell (0 for an empty field).
    pub fn max(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }
}

// Neighbouring texel indices around a continuous texel coordinate, plus the
// weight of the second one.
#[inline]
fn texel_pair(x: f32, n: usize, edge: EdgeMode) -> (usize, usize, f32) {
    match edge {
        EdgeMode::Clamp => {
            let x = x.max(0.0).min((n - 1) as f32);
            let i0 = x as usize;
            let i1 = (i0 + 1).min(n - 1);
            (i0, i1, x - i0 as f32)
        }
        EdgeMode::Wrap => {
            let fl = x.floor();
            let i0 = (fl as i64).rem_euclid(n as i64) as usize;
            let i1 = (i0 + 1) % n;
            (i0, i1, x - fl)
        }
    }
}

/// Exactly two fields and the index of the one currently readable ("front").
/// Visual: the flame you see is always `front()`; the next frame is drawn into the other.
pub struct FieldPair {
    buffers: [HeatField; 2],
    front: usize,
}

impl FieldPair {
    /// Both buffers allocated once, zeroed. Never resized afterwards.
    pub fn new(n: usize) -> Self {
        Self { buffers: [HeatField::new(n), HeatField::new(n)], front: 0 }
    }

    pub fn front(&self) -> &HeatField {
        &self.buffers[self.front]
    }

    /// Read-only front and writable back, borrowed disjointly so one pass
    /// can never read and write the same buffer.
    pub fn split(&mut self) -> (&HeatField, &mut HeatField) {
        let [a, b] = &mut self.buffers;
        if self.front == 0 { (&*a, b) } else { (&*b, a) }
    }

    /// Back becomes front.
    pub fn swap(&mut self) {
        self.front ^= 1;
    }
}

#[cfg(test)]
impl FieldPair {
    pub fn front_mut(&mut self) -> &mut HeatField {
        &mut self.buffers[self.front]
    }

    /// Which arena slot is currently the front (0 or 1).
    pub fn front_index(&self) -> usize {
        self.front
    }
}
