// trafikk-simulator/src/lib.rs

/*!
# Trafikk Simulator

Drives the Nagel–Schreckenberg update rules over a run and aggregates what
consumers need from it.

## Key Components:
- **Trace mode:** records the occupancy of every step into a [`SpaceTime`]
  matrix, the input of a space-time diagram.
- **Flow mode:** discards a transient, then averages `density × mean speed`
  over the remaining steps.
- **Sweep:** runs a grid of (density, slow-down probability) points in
  parallel, each with its own road and random source.

Every update is checked for vehicle conservation; a violation aborts the run.
*/

use tracing::{debug, error, info, instrument};

use trafikk_core::prelude::*;

pub mod error;
pub mod sweep;
pub mod trace;

pub use error::DriverError;
pub use sweep::{FlowCurve, FlowPoint, Sweep, SweepResult};
pub use trace::SpaceTime;

/// Owns the road, run parameters and random source of a single run.
pub struct Simulator<R: RandomSource = SeededSource> {
    config: SimulationConfig,
    road: Road,
    rng: R,
    vehicles: usize,
    step: usize,
}

impl Simulator<SeededSource> {
    /// Simulator with a fresh random road drawn from `seed`.
    pub fn seeded(config: SimulationConfig, seed: u64) -> Result<Self, DriverError> {
        Self::new(config, SeededSource::new(seed))
    }
}

impl<R: RandomSource> Simulator<R> {
    /// Creates a new simulator, drawing the initial road from `rng`.
    pub fn new(config: SimulationConfig, mut rng: R) -> Result<Self, DriverError> {
        let road = Road::initialize(config.length(), config.density(), &mut rng)?;
        Self::with_road(config, road, rng)
    }

    /// Creates a simulator starting from an existing road.
    pub fn with_road(config: SimulationConfig, road: Road, rng: R) -> Result<Self, DriverError> {
        if road.length() != config.length() {
            return Err(DriverError::RoadLength {
                expected: config.length(),
                actual: road.length(),
            });
        }
        let max_speed = config.max_speed();
        if let Some(vehicle) = road.vehicles().into_iter().find(|v| v.speed > max_speed) {
            return Err(SimulationError::Configuration(format!(
                "vehicle at {} has speed {} above max speed {}",
                vehicle.position, vehicle.speed, max_speed
            ))
            .into());
        }
        Ok(Self {
            vehicles: road.vehicle_count(),
            config,
            road,
            rng,
            step: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn road(&self) -> &Road {
        &self.road
    }

    /// Updates performed since creation or the last reset.
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Draws a new initial road from the run's random source.
    pub fn reset(&mut self) -> Result<(), DriverError> {
        self.road = Road::initialize(self.config.length(), self.config.density(), &mut self.rng)?;
        self.vehicles = self.road.vehicle_count();
        self.step = 0;
        Ok(())
    }

    /// Performs one update and returns the mean speed after it.
    pub fn advance(&mut self) -> Result<f64, DriverError> {
        let mean_speed = advance(&mut self.road, self.config.rules(), &mut self.rng)?;
        self.step += 1;

        let vehicles = self.road.vehicle_count();
        if vehicles != self.vehicles {
            error!(
                step = self.step,
                before = self.vehicles,
                after = vehicles,
                "vehicle count changed"
            );
            return Err(SimulationError::InvariantViolation(format!(
                "vehicle count changed from {} to {} at step {}",
                self.vehicles, vehicles, self.step
            ))
            .into());
        }

        tracing::trace!(step = self.step, mean_speed, "road advanced");
        Ok(mean_speed)
    }

    /// Records `steps` rows of occupancy: the current road, then the road
    /// after each of `steps - 1` updates.
    #[instrument(level = "info", name = "trace", skip(self), fields(length = self.config.length()))]
    pub fn trace(&mut self) -> Result<SpaceTime, DriverError> {
        let steps = self.config.steps();
        let mut trace = SpaceTime::with_capacity(self.config.length(), steps);
        trace.push(self.road.occupancy_snapshot());
        for _ in 1..steps {
            self.advance()?;
            trace.push(self.road.occupancy_snapshot());
        }
        info!(rows = trace.steps(), vehicles = self.vehicles, "trace complete");
        Ok(trace)
    }

    /// Runs the configured number of updates and returns the mean flow over
    /// the updates at or after the transient.
    #[instrument(
        level = "info",
        name = "measure_flow",
        skip(self),
        fields(density = self.config.density(), p = self.config.slowdown_probability())
    )]
    pub fn measure_flow(&mut self) -> Result<f64, DriverError> {
        let density = self.config.density();
        let transient = self.config.transient();
        let mut total = 0.0;
        for t in 0..self.config.steps() {
            let mean_speed = self.advance()?;
            if t >= transient {
                total += density * mean_speed;
            }
        }
        let flow = total / self.config.sampled_steps() as f64;
        debug!(flow, vehicles = self.vehicles, "flow measured");
        Ok(flow)
    }
}

/// Trace-mode run from a seeded random road.
pub fn run_trace(config: SimulationConfig, seed: u64) -> Result<SpaceTime, DriverError> {
    Simulator::seeded(config, seed)?.trace()
}

/// Flow-mode run from a seeded random road.
pub fn run_flow(config: SimulationConfig, seed: u64) -> Result<f64, DriverError> {
    Simulator::seeded(config, seed)?.measure_flow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn config(length: usize, density: f64, p: f64, steps: usize, transient: usize) -> SimulationConfig {
        SimulationConfig::new(length, density, 5, p, steps, transient).unwrap()
    }

    #[test]
    fn test_trace_shape() {
        let trace = run_trace(config(200, 0.2, 0.3, 300, 0), 42).unwrap();
        assert_eq!(trace.steps(), 300);
        assert_eq!(trace.length(), 200);
        assert!(trace.rows().iter().all(|row| row.len() == 200));
    }

    #[test]
    fn test_trace_row_zero_is_initial_road() {
        let mut simulator = Simulator::seeded(config(50, 0.3, 0.3, 10, 0), 7).unwrap();
        let initial = simulator.road().occupancy_snapshot();
        let trace = simulator.trace().unwrap();
        assert_eq!(trace.row(0), Some(initial.as_slice()));
        assert_eq!(simulator.step_count(), 9);
        assert_eq!(trace.row(9), Some(simulator.road().occupancy_snapshot().as_slice()));
    }

    #[test]
    fn test_single_row_trace_performs_no_update() {
        let mut simulator = Simulator::seeded(config(20, 0.5, 0.3, 1, 0), 1).unwrap();
        let trace = simulator.trace().unwrap();
        assert_eq!(trace.steps(), 1);
        assert_eq!(simulator.step_count(), 0);
    }

    #[test]
    fn test_trace_conserves_vehicles() {
        let trace = run_trace(config(150, 0.35, 0.5, 200, 0), 3).unwrap();
        let counts = trace.vehicle_counts();
        assert!(counts.iter().all(|&c| c == counts[0]));
    }

    #[test]
    fn test_deterministic_replay() {
        let a = run_trace(config(100, 0.25, 0.3, 120, 0), 1234).unwrap();
        let b = run_trace(config(100, 0.25, 0.3, 120, 0), 1234).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.checksum(), b.checksum());

        let c = run_trace(config(100, 0.25, 0.3, 120, 0), 1235).unwrap();
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_single_vehicle_trace() {
        let road = Road::from_vehicles(100, [Vehicle::new(0, 0)]).unwrap();
        let mut simulator =
            Simulator::with_road(config(100, 0.01, 0.0, 8, 0), road, SeededSource::new(0)).unwrap();
        let trace = simulator.trace().unwrap();
        // positions 0, 1, 3, 6, 10, 15, 20, 25
        let positions: Vec<usize> = trace
            .rows()
            .iter()
            .map(|row| row.iter().position(|&c| c == 1).unwrap())
            .collect();
        assert_eq!(positions, vec![0, 1, 3, 6, 10, 15, 20, 25]);
    }

    #[test]
    fn test_flow_single_sampled_step() {
        // One vehicle starting at rest: only the last of four updates is
        // sampled, when the vehicle runs at speed 4.
        let road = Road::from_vehicles(100, [Vehicle::new(0, 0)]).unwrap();
        let mut simulator =
            Simulator::with_road(config(100, 0.5, 0.0, 4, 3), road, SeededSource::new(0)).unwrap();
        let flow = simulator.measure_flow().unwrap();
        assert_eq!(flow, 0.5 * 4.0);
        assert_eq!(simulator.step_count(), 4);
    }

    #[test]
    fn test_flow_averages_sampled_steps() {
        // speeds 1, 2, 3, 4, 5, 5 with the first two discarded
        let road = Road::from_vehicles(100, [Vehicle::new(0, 0)]).unwrap();
        let mut simulator =
            Simulator::with_road(config(100, 0.1, 0.0, 6, 2), road, SeededSource::new(0)).unwrap();
        let flow = simulator.measure_flow().unwrap();
        let expected = 0.1 * (3.0 + 4.0 + 5.0 + 5.0) / 4.0;
        assert!((flow - expected).abs() < 1e-12);
    }

    #[test]
    fn test_flow_of_gridlock_is_zero() {
        let road = Road::from_raw(&[0; 30]).unwrap();
        let mut simulator =
            Simulator::with_road(config(30, 1.0, 0.0, 20, 5), road, SeededSource::new(0)).unwrap();
        assert_eq!(simulator.measure_flow().unwrap(), 0.0);
    }

    #[test]
    fn test_flow_of_empty_road_is_zero() {
        assert_eq!(run_flow(config(80, 0.0, 0.3, 50, 10), 9).unwrap(), 0.0);
    }

    #[test]
    fn test_free_flow_without_noise() {
        // Sparse traffic without slow-downs settles at v_max, so the flow
        // approaches density × v_max.
        let flow = run_flow(config(1_000, 0.05, 0.0, 400, 200), 5).unwrap();
        assert!(flow > 0.05 * 4.5, "flow {flow}");
        assert!(flow <= 0.05 * 5.0 + 1e-9, "flow {flow}");
    }

    #[test]
    fn test_road_length_mismatch() {
        let road = Road::empty(10).unwrap();
        assert!(matches!(
            Simulator::with_road(config(20, 0.2, 0.3, 10, 0), road, SeededSource::new(0)),
            Err(DriverError::RoadLength { expected: 20, actual: 10 })
        ));
    }

    #[test]
    fn test_road_above_max_speed_rejected() {
        let road = Road::from_vehicles(40, [Vehicle::new(0, 9)]).unwrap();
        let config = SimulationConfig::new(40, 0.1, 3, 0.0, 3, 0).unwrap();
        assert!(matches!(
            Simulator::with_road(config, road, SeededSource::new(0)),
            Err(DriverError::Simulation(SimulationError::Configuration(_)))
        ));

        let at_limit = Road::from_vehicles(40, [Vehicle::new(0, 3)]).unwrap();
        assert!(Simulator::with_road(config, at_limit, SeededSource::new(0)).is_ok());
    }

    #[test]
    fn test_reset_draws_new_road() {
        let mut simulator = Simulator::seeded(config(500, 0.3, 0.3, 10, 0), 77).unwrap();
        let first = simulator.road().clone();
        simulator.advance().unwrap();
        simulator.reset().unwrap();
        assert_eq!(simulator.step_count(), 0);
        assert_ne!(simulator.road(), &first);
    }

    #[traced_test]
    #[test]
    fn test_trace_logs_completion() {
        run_trace(config(30, 0.2, 0.3, 5, 0), 2).unwrap();
        assert!(logs_contain("trace complete"));
    }
}
