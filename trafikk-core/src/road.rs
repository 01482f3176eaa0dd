//! ## trafikk-core::road
//! **Circular single-lane road of cells**
//!
//! A [`Road`] is a fixed number of cells arranged in a ring: index arithmetic is
//! modulo the road length, so the last cell is adjacent to cell `0`. Each cell
//! is either empty or holds one vehicle with its current speed.
//!
//! Vehicles are not stored separately. [`Road::vehicles`] derives them from the
//! cells in ascending position order whenever they are needed.

use crate::error::SimulationError;
use crate::random::RandomSource;

/// Vehicle speed in cells per step.
pub type Speed = u16;

/// One position on the road. Negative means empty, anything else is the speed
/// of the vehicle occupying the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Cell(i32);

impl Cell {
    pub const EMPTY: Cell = Cell(-1);

    pub fn occupied(speed: Speed) -> Self {
        Cell(i32::from(speed))
    }

    #[inline]
    pub fn is_occupied(self) -> bool {
        self.0 >= 0
    }

    /// Speed of the vehicle in this cell, `None` when empty.
    #[inline]
    pub fn speed(self) -> Option<Speed> {
        Speed::try_from(self.0).ok()
    }

    /// Raw integer form: `-1` for empty, the speed otherwise.
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::EMPTY
    }
}

/// A vehicle read off the road: where it is and how fast it is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vehicle {
    pub position: usize,
    pub speed: Speed,
}

impl Vehicle {
    pub fn new(position: usize, speed: Speed) -> Self {
        Self { position, speed }
    }
}

/// Rough speed class of a vehicle relative to the speed limit, used by live
/// views to colour vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedBand {
    /// At least 70% of `v_max`.
    Fast,
    /// At least 30% of `v_max`.
    Moderate,
    Slow,
}

impl SpeedBand {
    pub fn classify(speed: Speed, v_max: Speed) -> Self {
        let speed = f64::from(speed);
        let v_max = f64::from(v_max);
        if speed >= v_max * 0.7 {
            SpeedBand::Fast
        } else if speed >= v_max * 0.3 {
            SpeedBand::Moderate
        } else {
            SpeedBand::Slow
        }
    }
}

/// Circular road. At most one vehicle per cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Road {
    cells: Vec<Cell>,
}

impl Road {
    /// Road of `length` empty cells.
    pub fn empty(length: usize) -> Result<Self, SimulationError> {
        if length == 0 {
            return Err(SimulationError::config("road length must be positive"));
        }
        Ok(Self {
            cells: vec![Cell::EMPTY; length],
        })
    }

    /// Random initial road: every cell independently holds a stopped vehicle
    /// with probability `density`. Draws exactly one value per cell, in
    /// position order.
    pub fn initialize<R: RandomSource + ?Sized>(
        length: usize,
        density: f64,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        validate_density(density)?;
        let mut road = Self::empty(length)?;
        for cell in road.cells.iter_mut() {
            if rng.chance(density) {
                *cell = Cell::occupied(0);
            }
        }
        tracing::trace!(
            length,
            density,
            vehicles = road.vehicle_count(),
            "road initialized"
        );
        Ok(road)
    }

    /// Road with the given vehicles placed on it. Fails on an out-of-range
    /// position or two vehicles sharing a cell.
    pub fn from_vehicles<I>(length: usize, vehicles: I) -> Result<Self, SimulationError>
    where
        I: IntoIterator<Item = Vehicle>,
    {
        let mut road = Self::empty(length)?;
        for vehicle in vehicles {
            if vehicle.position >= length {
                return Err(SimulationError::config(format!(
                    "vehicle position {} outside road of length {}",
                    vehicle.position, length
                )));
            }
            if road.cells[vehicle.position].is_occupied() {
                return Err(SimulationError::config(format!(
                    "two vehicles placed on cell {}",
                    vehicle.position
                )));
            }
            road.cells[vehicle.position] = Cell::occupied(vehicle.speed);
        }
        Ok(road)
    }

    /// Road built from raw cell values (`-1` empty, `>= 0` speed).
    pub fn from_raw(values: &[i32]) -> Result<Self, SimulationError> {
        let vehicles = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v >= 0)
            .map(|(position, v)| {
                Speed::try_from(*v)
                    .map(|speed| Vehicle::new(position, speed))
                    .map_err(|_| SimulationError::config(format!("speed {v} out of range")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_vehicles(values.len(), vehicles)
    }

    /// Number of cells.
    #[inline]
    pub fn length(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `position`, wrapping around the ring.
    #[inline]
    pub fn cell(&self, position: usize) -> Cell {
        self.cells[position % self.cells.len()]
    }

    pub fn vehicle_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    /// Occupied cells in ascending position order.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(position, cell)| cell.speed().map(|speed| Vehicle::new(position, speed)))
            .collect()
    }

    /// `1` where a vehicle sits, `0` elsewhere.
    pub fn occupancy_snapshot(&self) -> Vec<u8> {
        self.cells.iter().map(|c| u8::from(c.is_occupied())).collect()
    }

    /// Fraction of occupied cells.
    pub fn density(&self) -> f64 {
        self.vehicle_count() as f64 / self.length() as f64
    }

    /// Mean speed of the vehicles currently on the road, `0.0` when empty.
    pub fn mean_speed(&self) -> f64 {
        mean_speed(self.cells.iter().filter_map(|c| c.speed()))
    }

    /// Replaces every cell with `vehicles`. The caller guarantees the
    /// positions are in range; a shared cell is reported as a collision.
    pub(crate) fn commit(&mut self, vehicles: &[Vehicle]) -> Result<(), SimulationError> {
        self.cells.fill(Cell::EMPTY);
        for vehicle in vehicles {
            let cell = &mut self.cells[vehicle.position];
            if cell.is_occupied() {
                return Err(SimulationError::invariant(format!(
                    "collision on cell {}",
                    vehicle.position
                )));
            }
            *cell = Cell::occupied(vehicle.speed);
        }
        Ok(())
    }
}

pub(crate) fn validate_density(density: f64) -> Result<(), SimulationError> {
    if !(0.0..=1.0).contains(&density) {
        return Err(SimulationError::config(format!(
            "density {density} outside [0, 1]"
        )));
    }
    Ok(())
}

pub(crate) fn mean_speed<I: Iterator<Item = Speed>>(speeds: I) -> f64 {
    let (sum, count) = speeds.fold((0u64, 0u64), |(sum, count), s| {
        (sum + u64::from(s), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
