//! Parameter sweep over density and slow-down probability.
//!
//! Every grid point is an independent flow-mode run with its own road and its
//! own random source seeded from the sweep seed and the point's index. Runs
//! share nothing, so they are spread over a pool of scoped worker threads and
//! the result does not depend on the number of workers.

use crossbeam::channel;
use serde::Serialize;
use tracing::{debug, info, instrument};

use trafikk_core::SimulationConfig;

use crate::error::DriverError;
use crate::Simulator;

/// Mean flow measured at one (density, probability) point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowPoint {
    pub density: f64,
    pub probability: f64,
    pub flow: f64,
}

/// Flow against density for one slow-down probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowCurve {
    pub probability: f64,
    pub densities: Vec<f64>,
    pub flows: Vec<f64>,
}

/// Sweep output, ordered by probability, then density.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub points: Vec<FlowPoint>,
}

impl SweepResult {
    /// One curve per probability, in sweep order.
    pub fn curves(&self) -> Vec<FlowCurve> {
        let mut curves: Vec<FlowCurve> = Vec::new();
        for point in &self.points {
            match curves.last_mut() {
                Some(curve) if curve.probability == point.probability => {
                    curve.densities.push(point.density);
                    curve.flows.push(point.flow);
                }
                _ => curves.push(FlowCurve {
                    probability: point.probability,
                    densities: vec![point.density],
                    flows: vec![point.flow],
                }),
            }
        }
        curves
    }

    pub fn flow_at(&self, density: f64, probability: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.density == density && p.probability == probability)
            .map(|p| p.flow)
    }
}

/// A validated grid of flow-mode runs.
#[derive(Debug, Clone)]
pub struct Sweep {
    runs: Vec<SimulationConfig>,
    seed: u64,
    workers: usize,
}

impl Sweep {
    /// Builds the grid from `base`, replacing its density and probability at
    /// every point. Every point is validated before anything runs.
    pub fn new(
        base: &SimulationConfig,
        densities: &[f64],
        probabilities: &[f64],
        seed: u64,
    ) -> Result<Self, DriverError> {
        let runs = probabilities
            .iter()
            .flat_map(|&p| densities.iter().map(move |&d| base.with_point(d, p)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            runs,
            seed,
            workers: num_cpus::get(),
        })
    }

    /// Caps the worker pool. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Seed of the run at `index`.
    pub fn point_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }

    #[instrument(level = "info", name = "sweep", skip(self), fields(points = self.runs.len(), workers = self.workers))]
    pub fn run(&self) -> Result<SweepResult, DriverError> {
        let (job_tx, job_rx) = channel::unbounded::<usize>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, Result<f64, DriverError>)>();
        for index in 0..self.runs.len() {
            // receiver is alive until the scope below ends
            let _ = job_tx.send(index);
        }
        drop(job_tx);

        let workers = self.workers.min(self.runs.len()).max(1);
        crossbeam::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for index in job_rx.iter() {
                        let config = self.runs[index];
                        let flow = Simulator::seeded(config, self.point_seed(index))
                            .and_then(|mut simulator| simulator.measure_flow());
                        if let Ok(flow) = flow {
                            debug!(
                                density = config.density(),
                                p = config.slowdown_probability(),
                                flow,
                                "sweep point measured"
                            );
                        }
                        if result_tx.send((index, flow)).is_err() {
                            break;
                        }
                    }
                });
            }
        })
        .map_err(|_| DriverError::Worker("a sweep worker panicked".into()))?;
        drop(result_tx);

        let mut flows: Vec<Option<Result<f64, DriverError>>> =
            (0..self.runs.len()).map(|_| None).collect();
        for (index, flow) in result_rx.iter() {
            flows[index] = Some(flow);
        }

        let mut points = Vec::with_capacity(self.runs.len());
        for (config, flow) in self.runs.iter().zip(flows) {
            let flow = flow.ok_or_else(|| DriverError::Worker("sweep point was not run".into()))??;
            points.push(FlowPoint {
                density: config.density(),
                probability: config.slowdown_probability(),
                flow,
            });
        }

        info!(points = points.len(), "sweep complete");
        Ok(SweepResult { points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimulationConfig {
        SimulationConfig::new(100, 0.2, 5, 0.3, 120, 60).unwrap()
    }

    #[test]
    fn test_grid_order() {
        let sweep = Sweep::new(&base(), &[0.1, 0.3], &[0.0, 0.5], 1).unwrap();
        assert_eq!(sweep.len(), 4);
        let result = sweep.with_workers(2).run().unwrap();
        let grid: Vec<(f64, f64)> = result
            .points
            .iter()
            .map(|p| (p.probability, p.density))
            .collect();
        assert_eq!(grid, vec![(0.0, 0.1), (0.0, 0.3), (0.5, 0.1), (0.5, 0.3)]);
    }

    #[test]
    fn test_invalid_point_rejected_before_running() {
        assert!(matches!(
            Sweep::new(&base(), &[0.1, 1.5], &[0.2], 1),
            Err(DriverError::Simulation(_))
        ));
        assert!(Sweep::new(&base(), &[0.1], &[-0.2], 1).is_err());
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let densities = [0.05, 0.15, 0.3, 0.5];
        let probabilities = [0.0, 0.25];
        let single = Sweep::new(&base(), &densities, &probabilities, 9)
            .unwrap()
            .with_workers(1)
            .run()
            .unwrap();
        let many = Sweep::new(&base(), &densities, &probabilities, 9)
            .unwrap()
            .with_workers(8)
            .run()
            .unwrap();
        assert_eq!(single, many);
    }

    #[test]
    fn test_point_matches_standalone_run() {
        let sweep = Sweep::new(&base(), &[0.1, 0.2], &[0.3], 40).unwrap();
        let result = sweep.run().unwrap();
        let standalone = crate::run_flow(base().with_point(0.2, 0.3).unwrap(), sweep.point_seed(1)).unwrap();
        assert_eq!(result.flow_at(0.2, 0.3), Some(standalone));
    }

    #[test]
    fn test_curves() {
        let result = Sweep::new(&base(), &[0.1, 0.2, 0.3], &[0.0, 0.4], 3)
            .unwrap()
            .run()
            .unwrap();
        let curves = result.curves();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].probability, 0.0);
        assert_eq!(curves[1].densities, vec![0.1, 0.2, 0.3]);
        assert_eq!(curves[1].flows.len(), 3);
    }

    #[test]
    fn test_empty_grid() {
        let result = Sweep::new(&base(), &[], &[0.3], 1).unwrap().run().unwrap();
        assert!(result.points.is_empty());
    }

    #[test]
    fn test_serializes_as_yaml() {
        let result = SweepResult {
            points: vec![FlowPoint {
                density: 0.1,
                probability: 0.2,
                flow: 0.45,
            }],
        };
        let yaml = serde_yaml::to_string(&result.curves()).unwrap();
        assert!(yaml.contains("probability: 0.2"));
        assert!(yaml.contains("- 0.45"));
    }
}
