//! ## trafikk-core::update
//! **Nagel–Schreckenberg update rules**
//!
//! One call advances a road by exactly one time unit. All vehicles are read
//! from the pre-step road before any of them moves:
//!
//! 1. accelerate by one, up to `v_max`
//! 2. brake to `gap - 1` so the vehicle ahead is never reached
//! 3. with probability `p`, slow down by one (not below zero)
//! 4. move forward by the final speed, wrapping around the ring
//!
//! The engine keeps no state between calls; the road is the whole state.

use crate::error::SimulationError;
use crate::random::RandomSource;
use crate::road::{mean_speed, Road, Speed, Vehicle};

/// Validated parameters of the update rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    max_speed: Speed,
    slowdown_probability: f64,
}

impl Rules {
    pub fn new(max_speed: Speed, slowdown_probability: f64) -> Result<Self, SimulationError> {
        if max_speed == 0 {
            return Err(SimulationError::config("max speed must be positive"));
        }
        if !(0.0..=1.0).contains(&slowdown_probability) {
            return Err(SimulationError::config(format!(
                "slow-down probability {slowdown_probability} outside [0, 1]"
            )));
        }
        Ok(Self {
            max_speed,
            slowdown_probability,
        })
    }

    #[inline]
    pub fn max_speed(&self) -> Speed {
        self.max_speed
    }

    #[inline]
    pub fn slowdown_probability(&self) -> f64 {
        self.slowdown_probability
    }
}

/// Result of one update: the next road and the mean speed of its vehicles.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub road: Road,
    pub mean_speed: f64,
}

/// Computes the next road from `road`, leaving the input untouched.
pub fn step<R: RandomSource + ?Sized>(
    road: &Road,
    rules: &Rules,
    rng: &mut R,
) -> Result<StepOutcome, SimulationError> {
    let mut next = road.clone();
    let mean_speed = advance(&mut next, rules, rng)?;
    Ok(StepOutcome {
        road: next,
        mean_speed,
    })
}

/// Advances `road` in place and returns the mean speed after the update.
///
/// Consumes exactly one draw from `rng` per vehicle, in ascending position
/// order. An empty road stays empty and reports a mean speed of `0.0`.
pub fn advance<R: RandomSource + ?Sized>(
    road: &mut Road,
    rules: &Rules,
    rng: &mut R,
) -> Result<f64, SimulationError> {
    let vehicles = road.vehicles();
    if vehicles.is_empty() {
        return Ok(0.0);
    }

    let moved = next_vehicles(&vehicles, road.length(), rules, rng)?;
    road.commit(&moved)?;
    Ok(mean_speed(moved.iter().map(|v| v.speed)))
}

fn next_vehicles<R: RandomSource + ?Sized>(
    vehicles: &[Vehicle],
    length: usize,
    rules: &Rules,
    rng: &mut R,
) -> Result<Vec<Vehicle>, SimulationError> {
    let count = vehicles.len();
    let mut moved = Vec::with_capacity(count);

    for (i, vehicle) in vehicles.iter().enumerate() {
        let ahead = vehicles[(i + 1) % count];
        let gap = gap(vehicle.position, ahead.position, length);

        let mut speed = vehicle.speed.saturating_add(1).min(rules.max_speed);
        // keep at least one empty cell behind the vehicle ahead
        let room = gap - 1;
        if usize::from(speed) > room {
            speed = Speed::try_from(room).unwrap_or(Speed::MAX);
        }
        if rng.chance(rules.slowdown_probability) {
            speed = speed.saturating_sub(1);
        }

        if usize::from(speed) >= gap {
            tracing::error!(
                position = vehicle.position,
                speed,
                gap,
                "vehicle would reach the vehicle ahead"
            );
            return Err(SimulationError::invariant(format!(
                "vehicle at {} with speed {} overtakes gap {}",
                vehicle.position, speed, gap
            )));
        }

        moved.push(Vehicle::new((vehicle.position + usize::from(speed)) % length, speed));
    }

    Ok(moved)
}

/// Cells from `position` forward to `ahead`. A lone vehicle sees the whole
/// ring, so its gap is the road length.
#[inline]
fn gap(position: usize, ahead: usize, length: usize) -> usize {
    match (ahead + length - position) % length {
        0 => length,
        gap => gap,
    }
}
