//! Room-acoustic simulation backend.
//!
//! The pipeline only consumes the `RoomSimulator` seam: given a source
//! position, return one impulse response per microphone. The bundled
//! `ShoeboxRoom` implements the classical image-source method for a
//! rectangular room: mirror images of the source across the walls, each
//! contributing a delayed, attenuated tap:
//!
//! - amplitude `r^b / (4π d)` for `b` wall bounces at distance `d`,
//! - delay `d / c` seconds, split across two adjacent samples so fractional
//!   delays land between sample instants instead of snapping to the grid.
//!
//! The simulator is deterministic; all run-to-run variation comes from the
//! seeded positional perturbations upstream.

use log::{debug, trace};
use rayon::prelude::*;

use crate::error::EchoError;

/// Simulation backend seam: room geometry and absorption live behind this
/// trait, the pipeline only sees impulse responses.
pub trait RoomSimulator {
    fn sample_rate(&self) -> f64;

    /// Length of the returned impulse responses in samples.
    fn rir_len(&self) -> usize;

    /// Microphone pair positions; the source ring is centered on their midpoint.
    fn mic_positions(&self) -> [[f64; 3]; 2];

    /// Simulate the impulse response from `source` to each microphone.
    fn impulse_responses(&self, source: [f64; 3]) -> Result<[Vec<f64>; 2], EchoError>;
}

/// Rectangular room simulated with the image-source method.
///
/// The default microphone pair sits off the room's y-midplane; with the mics
/// on that plane, sources mirrored across it produce identical impulse
/// responses and their directions cannot be told apart.
#[derive(Debug, Clone)]
pub struct ShoeboxRoom {
    /// Room dimensions in meters, walls at 0 and `size[axis]`.
    pub size: [f64; 3],
    pub mics: [[f64; 3]; 2],
    /// Per-bounce reflection coefficient in [0, 1).
    pub reflection: f64,
    /// Maximum total number of wall bounces per image.
    pub max_order: i64,
    pub sample_rate: f64,
    pub speed_of_sound: f64,
    pub rir_len: usize,
}

impl Default for ShoeboxRoom {
    fn default() -> Self {
        Self {
            size: [6.0, 6.0, 3.0],
            mics: [[2.9, 2.5, 1.5], [3.1, 2.5, 1.5]],
            reflection: 0.7,
            max_order: 2,
            sample_rate: 16_000.0,
            speed_of_sound: 343.0,
            rir_len: 2048,
        }
    }
}

impl ShoeboxRoom {
    pub fn new(size: [f64; 3], mics: [[f64; 3]; 2]) -> Self {
        let room = Self { size, mics, ..Self::default() };
        for mic in &room.mics {
            assert!(
                room.contains(*mic),
                "microphone {:?} outside room bounds {:?}",
                mic,
                room.size
            );
        }
        room
    }

    /// Midpoint of the microphone pair.
    pub fn array_center(&self) -> [f64; 3] {
        let [a, b] = self.mics;
        [
            0.5 * (a[0] + b[0]),
            0.5 * (a[1] + b[1]),
            0.5 * (a[2] + b[2]),
        ]
    }

    fn contains(&self, p: [f64; 3]) -> bool {
        p.iter()
            .zip(self.size.iter())
            .all(|(&c, &l)| c > 0.0 && c < l)
    }

    /// Image-source impulse response from `source` to `mic`.
    ///
    /// For each axis the image coordinates are `2 m L + s` (an even number of
    /// bounces, `2|m|`) and `2 m L - s` (`|2m - 1|` bounces); images whose
    /// total bounce count exceeds `max_order` are skipped.
    fn rir(&self, mic: [f64; 3], source: [f64; 3]) -> Vec<f64> {
        let mut rir = vec![0.0; self.rir_len];
        let order = self.max_order;

        let mut axis_images: [Vec<(f64, i64)>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for (axis, images) in axis_images.iter_mut().enumerate() {
            let l = self.size[axis];
            let s = source[axis];
            for m in -order..=order {
                let shift = 2.0 * m as f64 * l;
                images.push((shift + s, 2 * m.abs()));
                images.push((shift - s, (2 * m - 1).abs()));
            }
        }

        let mut taps = 0usize;
        for &(x, bx) in &axis_images[0] {
            if bx > order {
                continue;
            }
            for &(y, by) in &axis_images[1] {
                if bx + by > order {
                    continue;
                }
                for &(z, bz) in &axis_images[2] {
                    let bounces = bx + by + bz;
                    if bounces > order {
                        continue;
                    }

                    let dx = x - mic[0];
                    let dy = y - mic[1];
                    let dz = z - mic[2];
                    let dist = (dx * dx + dy * dy + dz * dz).sqrt().max(1e-6);

                    let amp = self.reflection.powi(bounces as i32)
                        / (4.0 * std::f64::consts::PI * dist);
                    let delay = dist / self.speed_of_sound * self.sample_rate;
                    let idx = delay.floor() as usize;
                    let frac = delay - delay.floor();

                    if idx + 1 < self.rir_len {
                        rir[idx] += amp * (1.0 - frac);
                        rir[idx + 1] += amp * frac;
                        taps += 1;
                    }
                }
            }
        }

        trace!("RIR for source {:?}: {} image taps placed", source, taps);
        rir
    }
}

impl RoomSimulator for ShoeboxRoom {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn rir_len(&self) -> usize {
        self.rir_len
    }

    fn mic_positions(&self) -> [[f64; 3]; 2] {
        self.mics
    }

    fn impulse_responses(&self, source: [f64; 3]) -> Result<[Vec<f64>; 2], EchoError> {
        if !self.contains(source) {
            return Err(EchoError::SourceOutsideRoom { position: source, bounds: self.size });
        }
        Ok([self.rir(self.mics[0], source), self.rir(self.mics[1], source)])
    }
}

/// Simulate a batch of source positions in parallel, preserving order.
pub fn simulate_batch<S: RoomSimulator + Sync>(
    sim: &S,
    positions: &[[f64; 3]],
) -> Result<Vec<[Vec<f64>; 2]>, EchoError> {
    debug!("Simulating {} source positions", positions.len());
    positions
        .par_iter()
        .map(|&p| sim.impulse_responses(p))
        .collect()
}
