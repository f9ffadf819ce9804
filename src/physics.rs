// Physics pass: advect, cool, inject fuel. Reads the front field, writes the back.
// Visual: this is what makes the flame rise, flicker, stream behind the pointer and die out.

use cgmath::{vec2, InnerSpace, Vector2};
use ndarray::Zip;

use crate::error::Error;
use crate::field::{EdgeMode, FieldPair, HeatField};
use crate::noise::{smoothstep, value_noise};

/// Tunable constants of the heat law. Defaults reproduce the classic flame.
#[derive(Clone, Debug)]
pub struct PhysicsParams {
    pub turbulence_scale: f32, // noise frequency of the sideways flicker
    pub turbulence_speed: f32, // how fast that noise scrolls with time
    pub jitter: f32,           // max sideways drift per frame (uv)
    pub rise: f32,             // upward drift per frame (uv)
    pub hot_threshold: f32,    // above this, the fast cooling regime applies
    pub hot_decay: f32,        // multiplier for hot cells
    pub ember_decay: f32,      // multiplier for embers
    pub extinction: f32,       // subtracted every frame so embers reach zero
    pub fuel_radius: f32,      // injection disc radius (uv, aspect-corrected)
    pub fuel_strength: f32,    // heat added at the disc centre per frame
    pub wind_gain: f32,        // velocity -> advection offset (inertia only)
    pub inertia: bool,         // enable the wind term
    pub edge: EdgeMode,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            turbulence_scale: 8.0,
            turbulence_speed: 2.5,
            jitter: 0.006,
            rise: 0.005,
            hot_threshold: 0.3,
            hot_decay: 0.96,
            ember_decay: 0.99,
            extinction: 0.001,
            fuel_radius: 0.05,
            fuel_strength: 0.8,
            wind_gain: 0.15,
            inertia: false,
            edge: EdgeMode::Clamp,
        }
    }
}

/// Everything a pass needs from outside the field, captured once per frame.
#[derive(Clone, Copy, Debug)]
pub struct StepInput {
    pub pointer: Vector2<f32>,  // uv, origin bottom-left
    pub activation: f32,        // 0 = idle, 1 = emitting
    pub velocity: Vector2<f32>, // uv per frame
    pub time: f32,              // seconds since the first frame
    pub aspect: f32,            // display width / height
}

/// Two-regime decay followed by the constant extinction step. Not clamped.
#[inline]
pub fn cool(heat: f32, p: &PhysicsParams) -> f32 {
    let h = if heat > p.hot_threshold { heat * p.hot_decay } else { heat * p.ember_decay };
    h - p.extinction
}

/// Fuel falloff at `uv`: 1 at the pointer, 0 at and beyond the radius.
/// The x distance is scaled by aspect so the disc is round on screen.
#[inline]
pub fn fuel(uv: Vector2<f32>, pointer: Vector2<f32>, aspect: f32, radius: f32) -> f32 {
    let mut d = uv - pointer;
    d.x *= aspect;
    let len = d.magnitude();
    if len < radius { smoothstep(radius, 0.0, len) } else { 0.0 }
}

/// Where the cell at `uv` samples its previous heat from, relative to itself.
#[inline]
pub fn advection_offset(uv: Vector2<f32>, input: &StepInput, p: &PhysicsParams) -> Vector2<f32> {
    let n = value_noise(uv * p.turbulence_scale + vec2(0.0, input.time * p.turbulence_speed));
    let offset = vec2((n - 0.5) * p.jitter, -p.rise);
    if p.inertia { offset - input.velocity * p.wind_gain } else { offset }
}

/// New heat for one cell. Depends only on `front`, so cells are independent.
pub fn step_cell(front: &HeatField, uv: Vector2<f32>, input: &StepInput, p: &PhysicsParams) -> f32 {
    let heat = front.sample(uv + advection_offset(uv, input, p), p.edge);
    let heat = cool(heat, p);
    let inject = fuel(uv, input.pointer, input.aspect, p.fuel_radius);
    let heat = heat + inject * p.fuel_strength * input.activation;
    heat.max(0.0)
}

/// Run the pass over every cell of `back`, in parallel.
pub fn step(
    front: &HeatField,
    back: &mut HeatField,
    input: &StepInput,
    p: &PhysicsParams,
) -> Result<(), Error> {
    if front.side() != back.side() {
        return Err(Error::Buffer(format!(
            "physics: front is {0}x{0}, back is {1}x{1}",
            front.side(),
            back.side()
        )));
    }
    Zip::indexed(back.cells_mut()).par_for_each(|(row, col), out| {
        *out = step_cell(front, front.cell_uv(row, col), input, p);
    });
    Ok(())
}

/// Owns both field buffers for its whole lifetime and advances them one frame at a time.
pub struct Simulation {
    fields: FieldPair,
    params: PhysicsParams,
}

impl Simulation {
    pub fn new(resolution: usize, params: PhysicsParams) -> Self {
        Self { fields: FieldPair::new(resolution), params }
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    /// The field the colour pass should read.
    pub fn field(&self) -> &HeatField {
        self.fields.front()
    }

    /// Physics pass into the back buffer, then swap.
    pub fn advance(&mut self, input: &StepInput) -> Result<(), Error> {
        let (front, back) = self.fields.split();
        step(front, back, input, &self.params)?;
        self.fields.swap();
        Ok(())
    }
}

#[cfg(test)]
impl Simulation {
    pub fn fields(&self) -> &FieldPair {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldPair {
        &mut self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn idle_at(x: f32, y: f32, time: f32) -> StepInput {
        StepInput {
            pointer: vec2(x, y),
            activation: 0.0,
            velocity: vec2(0.0, 0.0),
            time,
            aspect: 1.0,
        }
    }

    // Frames until the scalar law `law` drops a value below 1e-3.
    fn frames_below(mut h: f32, law: impl Fn(f32) -> f32) -> usize {
        let mut n = 0;
        while h >= 1e-3 {
            h = law(h).max(0.0);
            n += 1;
        }
        n
    }

    #[test]
    fn cooling_uses_two_regimes() {
        let p = PhysicsParams::default();
        assert_abs_diff_eq!(cool(1.0, &p), 0.959, epsilon = 1e-6);
        assert_abs_diff_eq!(cool(0.3, &p), 0.296, epsilon = 1e-6);
        assert_abs_diff_eq!(cool(0.0, &p), -0.001, epsilon = 1e-6);
    }

    #[test]
    fn fuel_is_zero_outside_radius() {
        let p = vec2(0.5, 0.5);
        assert_eq!(fuel(vec2(0.5, 0.5), p, 1.0, 0.05), 1.0);
        assert_eq!(fuel(vec2(0.56, 0.5), p, 1.0, 0.05), 0.0);
        assert_eq!(fuel(vec2(0.5, 0.551), p, 1.0, 0.05), 0.0);
        // inside the radius on uv, but outside once x is stretched by aspect
        assert!(fuel(vec2(0.53, 0.5), p, 1.0, 0.05) > 0.0);
        assert_eq!(fuel(vec2(0.53, 0.5), p, 2.0, 0.05), 0.0);
    }

    #[test]
    fn injection_is_confined_to_the_disc() {
        let params = PhysicsParams::default();
        let mut sim = Simulation::new(64, params.clone());
        let input = StepInput { activation: 1.0, ..idle_at(0.5, 0.5, 0.0) };
        sim.advance(&input).unwrap();

        let field = sim.field();
        let mut lit = 0;
        for ((row, col), &h) in field.cells().indexed_iter() {
            let uv = field.cell_uv(row, col);
            if (uv - input.pointer).magnitude() >= params.fuel_radius {
                assert_eq!(h, 0.0, "cell {row},{col} outside the disc got heat");
            } else if h > 0.0 {
                lit += 1;
            }
        }
        assert!(lit > 0);
    }

    #[test]
    fn heat_never_goes_negative() {
        let mut sim = Simulation::new(32, PhysicsParams::default());
        for ((row, col), v) in sim.fields_mut().front_mut().cells_mut().indexed_iter_mut() {
            *v = ((row * 7 + col * 13) % 10) as f32 * 0.05;
        }
        for frame in 0..120 {
            let mut input = idle_at(0.3, 0.6, frame as f32 * DT);
            input.activation = if frame % 40 < 20 { 1.0 } else { 0.0 };
            sim.advance(&input).unwrap();
            assert!(sim.field().cells().iter().all(|&h| h >= 0.0));
        }
    }

    #[test]
    fn idle_field_decays_to_zero_within_the_cooling_bound() {
        let params = PhysicsParams::default();
        let bound = frames_below(1.0, |h| cool(h, &params));

        let mut sim = Simulation::new(16, params);
        sim.fields_mut().front_mut().fill(1.0);

        let mut prev = sim.field().cells().clone();
        for frame in 0..bound {
            sim.advance(&idle_at(0.5, 0.5, frame as f32 * DT)).unwrap();
            let cur = sim.field().cells();
            for (&before, &after) in prev.iter().zip(cur.iter()) {
                if before > 0.0 {
                    assert!(after < before, "frame {frame}: {after} !< {before}");
                } else {
                    assert_eq!(after, 0.0);
                }
            }
            prev = cur.clone();
        }
        assert!(sim.field().max() < 1e-3, "still {} after {bound} frames", sim.field().max());
    }

    #[test]
    fn velocity_pulls_sample_point_against_motion() {
        let params = PhysicsParams { inertia: true, ..PhysicsParams::default() };
        let uv = vec2(0.4, 0.4);
        let still = StepInput { velocity: vec2(0.0, 0.0), ..idle_at(0.8, 0.5, 1.0) };
        let moving = StepInput { velocity: vec2(0.6, 0.0), ..still };

        let shift = advection_offset(uv, &moving, &params) - advection_offset(uv, &still, &params);
        assert_abs_diff_eq!(shift.x, -0.09, epsilon = 1e-6);
        assert_abs_diff_eq!(shift.y, 0.0, epsilon = 1e-6);

        // without inertia the velocity is ignored
        let classic = PhysicsParams::default();
        let shift =
            advection_offset(uv, &moving, &classic) - advection_offset(uv, &still, &classic);
        assert_abs_diff_eq!(shift.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn buffers_alternate_every_frame() {
        let mut sim = Simulation::new(8, PhysicsParams::default());
        let input = StepInput { activation: 1.0, ..idle_at(0.5, 0.5, 0.0) };
        for _ in 0..6 {
            let written = 1 - sim.fields().front_index();
            let expected = {
                let fields = sim.fields_mut();
                let (front, _) = fields.split();
                let mut scratch = HeatField::new(front.side());
                step(front, &mut scratch, &input, &PhysicsParams::default()).unwrap();
                scratch.cells().clone()
            };
            sim.advance(&input).unwrap();
            assert_eq!(sim.fields().front_index(), written);
            assert_eq!(sim.field().cells(), &expected);
        }
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let front = HeatField::new(8);
        let mut back = HeatField::new(4);
        let input = idle_at(0.5, 0.5, 0.0);
        assert!(matches!(
            step(&front, &mut back, &input, &PhysicsParams::default()),
            Err(Error::Buffer(_))
        ));
    }

    #[test]
    fn held_fuel_reaches_equilibrium_then_burns_out() {
        let params = PhysicsParams::default();
        let mut sim = Simulation::new(128, params.clone());
        let centre = (64, 64);

        let mut history = Vec::with_capacity(200);
        for frame in 0..200 {
            let input = StepInput { activation: 1.0, ..idle_at(0.5, 0.5, frame as f32 * DT) };
            sim.advance(&input).unwrap();
            history.push(sim.field().cells()[[centre.0, centre.1]]);
        }
        let first = history[0];
        let last = history[199];
        assert!(last > first, "centre did not heat up: {first} -> {last}");
        assert!(last > 1.0);
        // the approach flattens out: late frames barely move
        let late_change = (history[199] - history[189]).abs();
        assert!(late_change < 0.1 * last, "still moving by {late_change} at {last}");

        // release: every cell is bounded by the slow regime applied to the hottest cell
        let slow = |h: f32| h * params.ember_decay - params.extinction;
        let bound = frames_below(sim.field().max(), slow);
        for frame in 0..bound {
            sim.advance(&idle_at(0.5, 0.5, (200 + frame) as f32 * DT)).unwrap();
        }
        assert!(sim.field().max() < 1e-3);
    }
}
