//! Time integration of concentrations towards chemical equilibrium.
//!
//! The integrator solves `dx/dt = νᵀ·w(x)` for a fixed set of rate coefficients and records
//! when equilibrium is reached:
//! - reaction j is at equilibrium once `|wb_j - wf_j|` drops below the species threshold,
//! - the system is at equilibrium once `‖wb - wf‖` drops below the system threshold.
//!
//! The first crossing time of each test is kept ("critical time"); until then the time holds
//! [`NOT_CONVERGED`]. Bookkeeping happens on every accepted solver step after the initial
//! state, through the [`EquilibriumTracker`] accumulator. Once any concentration reaches
//! zero, production stops and bookkeeping is skipped.
//!
//! The integration itself is done by the Dormand-Prince solver of the `ode_solvers` crate,
//! run once per interval of the time grid so that every grid time is hit exactly. The rate
//! model is handed to it through a thin [`System`] adapter: `system` evaluates the production
//! rates, `solout` receives every accepted step and folds the tracker.
//!
//! # Examples
//! ```
//! use KinEq::Kinetics::elementary_kinetics::{ElementaryReactions, ReactionKind, Stoichiometry};
//! use KinEq::ReactorsIVP::equilibrium_integrator::EquilibriumIntegrator;
//! use KinEq::settings::EngineConfig;
//! use nalgebra::DVector;
//! // A <=> B
//! let stoichiometry = Stoichiometry::from_rows(&[vec![1.0, 0.0]], &[vec![0.0, 1.0]]).unwrap();
//! let kinetics = ReactionKind::new(DVector::from_vec(vec![1.0]), Some(DVector::from_vec(vec![1.0])));
//! let reactions = ElementaryReactions::new(kinetics, stoichiometry).unwrap();
//! let integrator = EquilibriumIntegrator::new(reactions, EngineConfig::default());
//! let grid: Vec<f64> = (0..=20).map(|i| i as f64).collect();
//! let solution = integrator.solve(&DVector::from_vec(vec![1.0, 0.5]), &grid).unwrap();
//! assert!(solution.system_converged());
//! ```
use crate::Kinetics::elementary_kinetics::{ElementaryReactions, ProgressRates};
use crate::Kinetics::kinetics_errors::KineticsError;
use crate::Kinetics::reaction_system::TemperaturePoint;
use crate::settings::EngineConfig;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use ode_solvers::dopri5::Dopri5;
use ode_solvers::dop_shared::Stats;
use ode_solvers::System;
use serde::Serialize;
use std::cell::RefCell;

/// critical time of a test that has not been passed yet
pub const NOT_CONVERGED: f64 = -100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EquilibriumState {
    Running,
    /// indices of the reactions at equilibrium, the system as a whole is not
    ReactionsConverged(Vec<usize>),
    SystemConverged,
}

/// Write-once record of critical times, folded over accepted steps.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumTracker {
    pub species_threshold: f64,
    pub system_threshold: f64,
    pub per_reaction_critical_t: Vec<f64>,
    pub system_critical_t: f64,
}

impl EquilibriumTracker {
    pub fn new(n_reactions: usize, species_threshold: f64, system_threshold: f64) -> Self {
        Self {
            species_threshold,
            system_threshold,
            per_reaction_critical_t: vec![NOT_CONVERGED; n_reactions],
            system_critical_t: NOT_CONVERGED,
        }
    }

    /// tracker after observing the progress rates at time t; set times are never overwritten
    pub fn observe(mut self, t: f64, progress: &ProgressRates) -> Self {
        for (j, imbalance) in progress.imbalance().iter().enumerate() {
            if let Some(critical_t) = self.per_reaction_critical_t.get_mut(j) {
                if *imbalance < self.species_threshold && *critical_t == NOT_CONVERGED {
                    *critical_t = t;
                    info!("reaction {} reached equilibrium at t = {}", j, t);
                }
            }
        }
        if self.system_critical_t == NOT_CONVERGED
            && progress.imbalance_norm() < self.system_threshold
        {
            self.system_critical_t = t;
            info!("system reached equilibrium at t = {}", t);
        }
        self
    }

    pub fn state(&self) -> EquilibriumState {
        if self.system_critical_t != NOT_CONVERGED {
            return EquilibriumState::SystemConverged;
        }
        let converged: Vec<usize> = self
            .per_reaction_critical_t
            .iter()
            .enumerate()
            .filter(|(_, t)| **t != NOT_CONVERGED)
            .map(|(j, _)| j)
            .collect();
        if converged.is_empty() {
            EquilibriumState::Running
        } else {
            EquilibriumState::ReactionsConverged(converged)
        }
    }
}

/// work done by the ODE solver, summed over the grid intervals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub rhs_evaluations: usize,
}

impl SolverStats {
    fn add(&mut self, stats: &Stats) {
        self.accepted += stats.accepted_steps as usize;
        self.rejected += stats.rejected_steps as usize;
        self.rhs_evaluations += stats.num_eval as usize;
    }
}

/// trajectory and critical times of one integration run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquilibriumSolution {
    pub times: Vec<f64>,
    /// rows are time points, columns are species
    pub trajectory: DMatrix<f64>,
    pub per_reaction_critical_t: Vec<f64>,
    pub system_critical_t: f64,
    #[serde(skip)]
    pub stats: SolverStats,
}

impl EquilibriumSolution {
    pub fn system_converged(&self) -> bool {
        self.system_critical_t != NOT_CONVERGED
    }

    pub fn reaction_converged(&self, j: usize) -> bool {
        self.per_reaction_critical_t
            .get(j)
            .is_some_and(|t| *t != NOT_CONVERGED)
    }

    /// concentrations at the last integrated time
    pub fn final_state(&self) -> DVector<f64> {
        let last = self.trajectory.nrows().saturating_sub(1);
        self.trajectory.row(last).transpose()
    }

    pub fn state(&self) -> EquilibriumState {
        EquilibriumTracker {
            species_threshold: 0.0,
            system_threshold: 0.0,
            per_reaction_critical_t: self.per_reaction_critical_t.clone(),
            system_critical_t: self.system_critical_t,
        }
        .state()
    }
}

/// net production rates with the stop rule: zero once any concentration is <= 0
fn stopped_rates(
    reactions: &ElementaryReactions,
    x: &DVector<f64>,
) -> Result<DVector<f64>, KineticsError> {
    if stopped(x) {
        return Ok(DVector::zeros(x.len()));
    }
    reactions.reaction_rates(x)
}

fn stopped(x: &DVector<f64>) -> bool {
    x.iter().any(|value| *value <= 0.0)
}

/// production-rate function handed to the ODE solver, with the tracker as accumulator
struct EquilibriumOde<'a> {
    reactions: &'a ElementaryReactions,
    tracker: Option<EquilibriumTracker>,
    /// start of the grid interval being integrated; states at it were already observed
    t_start: f64,
    /// state after the last accepted step
    last_step: Option<DVector<f64>>,
    /// first error of the rate model; the solver cannot carry it
    failure: RefCell<Option<KineticsError>>,
}

impl<'a> EquilibriumOde<'a> {
    fn new(reactions: &'a ElementaryReactions, tracker: EquilibriumTracker) -> Self {
        Self {
            reactions,
            tracker: Some(tracker),
            t_start: f64::NEG_INFINITY,
            last_step: None,
            failure: RefCell::new(None),
        }
    }

    fn record_failure(&self, error: KineticsError) {
        let mut failure = self.failure.borrow_mut();
        if failure.is_none() {
            *failure = Some(error);
        }
    }

    fn take_failure(&self) -> Option<KineticsError> {
        self.failure.borrow_mut().take()
    }

    fn start_interval(&mut self, t_start: f64) {
        self.t_start = t_start;
        self.last_step = None;
    }
}

impl System<f64, DVector<f64>> for &mut EquilibriumOde<'_> {
    fn system(&self, _t: f64, x: &DVector<f64>, dx: &mut DVector<f64>) {
        match stopped_rates(self.reactions, x) {
            Ok(rates) => dx.copy_from(&rates),
            Err(e) => {
                dx.fill(0.0);
                self.record_failure(e);
            }
        }
    }

    fn solout(&mut self, t: f64, x: &DVector<f64>, _dx: &DVector<f64>) -> bool {
        if self.failure.borrow().is_some() {
            return true;
        }
        if t <= self.t_start {
            return false;
        }
        self.last_step = Some(x.clone());
        if stopped(x) {
            return false;
        }
        match self.reactions.progress_rates(x) {
            Ok(progress) => {
                self.tracker = self.tracker.take().map(|tracker| tracker.observe(t, &progress));
                false
            }
            Err(e) => {
                self.record_failure(e);
                true
            }
        }
    }
}

/// integrates one reaction system at fixed temperature
#[derive(Debug, Clone)]
pub struct EquilibriumIntegrator {
    pub reactions: ElementaryReactions,
    pub config: EngineConfig,
}

impl EquilibriumIntegrator {
    pub fn new(reactions: ElementaryReactions, config: EngineConfig) -> Self {
        Self { reactions, config }
    }

    /// integrator over the rate model of a temperature point
    pub fn from_temperature_point(
        point: &TemperaturePoint,
        config: EngineConfig,
    ) -> Result<Self, KineticsError> {
        Ok(Self::new(point.elementary_reactions()?, config))
    }

    /// net production rates with the stop rule: zero once any concentration is <= 0
    pub fn production_rates(&self, x: &DVector<f64>) -> Result<DVector<f64>, KineticsError> {
        self.check_state(x)?;
        stopped_rates(&self.reactions, x)
    }

    fn check_state(&self, x: &DVector<f64>) -> Result<(), KineticsError> {
        if x.len() != self.reactions.n_species() {
            return Err(KineticsError::dimensions(
                "initial concentrations",
                self.reactions.n_species(),
                x.len(),
            ));
        }
        if let Some(bad) = x.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(KineticsError::invalid(
                "x",
                *bad,
                "concentrations cannot be negative",
            ));
        }
        Ok(())
    }

    /// grid points up to `max_time`
    fn truncated_grid<'g>(&self, time_grid: &'g [f64]) -> Result<&'g [f64], KineticsError> {
        if let Some(bad) = time_grid.iter().find(|t| !t.is_finite()) {
            return Err(KineticsError::invalid("time grid", *bad, "grid times must be finite"));
        }
        if let Some(pair) = time_grid.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(KineticsError::invalid(
                "time grid",
                pair[1],
                "grid times must be strictly increasing",
            ));
        }
        let kept = time_grid
            .iter()
            .take_while(|t| **t <= self.config.max_time)
            .count();
        if kept == 0 {
            let first = time_grid.first().copied().unwrap_or(f64::NAN);
            return Err(KineticsError::invalid(
                "time grid",
                first,
                "no grid point at or before max_time",
            ));
        }
        if kept < time_grid.len() {
            warn!(
                "time grid truncated at max_time = {}: {} of {} points are integrated",
                self.config.max_time,
                kept,
                time_grid.len()
            );
        }
        Ok(&time_grid[..kept])
    }

    /// Integrates `initial_x` over `time_grid`.
    ///
    /// Not reaching equilibrium is not an error: the critical times stay [`NOT_CONVERGED`].
    pub fn solve(
        &self,
        initial_x: &DVector<f64>,
        time_grid: &[f64],
    ) -> Result<EquilibriumSolution, KineticsError> {
        self.check_state(initial_x)?;
        let grid = self.truncated_grid(time_grid)?;
        info!(
            "integrating {} reactions over {} species from t = {} to t = {}",
            self.reactions.len(),
            self.reactions.n_species(),
            grid[0],
            grid[grid.len() - 1]
        );
        let tracker = EquilibriumTracker::new(
            self.reactions.len(),
            self.config.species_equilibrium_threshold,
            self.config.system_equilibrium_threshold,
        );
        let mut ode = EquilibriumOde::new(&self.reactions, tracker);
        let mut trajectory = DMatrix::zeros(grid.len(), initial_x.len());
        trajectory.set_row(0, &initial_x.transpose());
        let mut x = initial_x.clone();
        let mut stats = SolverStats::default();
        for (i, interval) in grid.windows(2).enumerate() {
            let (t_start, t_end) = (interval[0], interval[1]);
            ode.start_interval(t_start);
            let (result, dense_end) = {
                let mut stepper = Dopri5::new(
                    &mut ode,
                    t_start,
                    t_end,
                    t_end - t_start,
                    x.clone(),
                    self.config.solver.rtol,
                    self.config.solver.atol,
                );
                let result = stepper.integrate();
                (result, stepper.y_out().last().cloned())
            };
            if let Some(e) = ode.take_failure() {
                return Err(e);
            }
            let interval_stats = result.map_err(|e| KineticsError::IntegrationFailure {
                t: t_start,
                reason: e.to_string(),
            })?;
            stats.add(&interval_stats);
            x = ode
                .last_step
                .take()
                .or(dense_end)
                .ok_or_else(|| KineticsError::IntegrationFailure {
                    t: t_start,
                    reason: "solver returned no state".to_string(),
                })?;
            debug!("t = {}: {} accepted steps so far", t_end, stats.accepted);
            trajectory.set_row(i + 1, &x.transpose());
        }
        let tracker = ode.tracker.ok_or_else(|| KineticsError::IntegrationFailure {
            t: grid[grid.len() - 1],
            reason: "equilibrium tracker lost".to_string(),
        })?;
        if tracker.system_critical_t == NOT_CONVERGED {
            info!("system did not reach equilibrium by t = {}", grid[grid.len() - 1]);
        }
        info!(
            "integration finished: {} accepted and {} rejected steps, {} rate evaluations",
            stats.accepted, stats.rejected, stats.rhs_evaluations
        );
        Ok(EquilibriumSolution {
            times: grid.to_vec(),
            trajectory,
            per_reaction_critical_t: tracker.per_reaction_critical_t,
            system_critical_t: tracker.system_critical_t,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::elementary_kinetics::{ReactionKind, Stoichiometry};
    use approx::assert_relative_eq;

    /// A <=> B with kf = kb = 1
    fn isomerization() -> ElementaryReactions {
        let stoichiometry = Stoichiometry::from_rows(&[vec![1.0, 0.0]], &[vec![0.0, 1.0]]).unwrap();
        let kinetics = ReactionKind::new(
            DVector::from_vec(vec![1.0]),
            Some(DVector::from_vec(vec![1.0])),
        );
        ElementaryReactions::new(kinetics, stoichiometry).unwrap()
    }

    fn grid(end: usize) -> Vec<f64> {
        (0..=end).map(|i| i as f64).collect()
    }

    fn progress(forward: Vec<f64>, backward: Vec<f64>) -> ProgressRates {
        let forward = DVector::from_vec(forward);
        let backward = DVector::from_vec(backward);
        let net = &forward - &backward;
        ProgressRates {
            forward,
            backward,
            net,
        }
    }

    #[test]
    fn test_tracker_is_write_once() {
        let tracker = EquilibriumTracker::new(2, 1e-5, 1e-2);
        assert_eq!(tracker.state(), EquilibriumState::Running);
        let tracker = tracker.observe(1.0, &progress(vec![1.0, 1.0], vec![1.0, 2.0]));
        assert_eq!(tracker.per_reaction_critical_t, vec![1.0, NOT_CONVERGED]);
        assert_eq!(tracker.system_critical_t, NOT_CONVERGED);
        assert_eq!(tracker.state(), EquilibriumState::ReactionsConverged(vec![0]));

        let tracker = tracker.observe(2.0, &progress(vec![1.0, 1.0], vec![3.0, 1.0]));
        assert_eq!(tracker.per_reaction_critical_t, vec![1.0, 2.0]);
        let tracker = tracker.observe(3.0, &progress(vec![1.0, 1.0], vec![1.0, 1.0]));
        assert_eq!(tracker.per_reaction_critical_t, vec![1.0, 2.0]);
        assert_eq!(tracker.system_critical_t, 3.0);
        let tracker = tracker.observe(4.0, &progress(vec![1.0, 1.0], vec![1.0, 1.0]));
        assert_eq!(tracker.system_critical_t, 3.0);
        assert_eq!(tracker.state(), EquilibriumState::SystemConverged);
    }

    #[test]
    fn test_reaches_equilibrium() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        let solution = integrator
            .solve(&DVector::from_vec(vec![1.0, 0.5]), &grid(20))
            .unwrap();
        assert_eq!(solution.times, grid(20));
        assert_eq!(solution.trajectory.nrows(), 21);
        let x = solution.final_state();
        assert_relative_eq!(x[0], 0.75, max_relative = 1e-4);
        assert_relative_eq!(x[1], 0.75, max_relative = 1e-4);
        // |wf - wb| = 0.5*exp(-2t)
        assert!(solution.system_converged());
        assert!(solution.system_critical_t >= 0.5 * 50.0f64.ln() - 0.05);
        assert!(solution.system_critical_t <= 0.5 * 50.0f64.ln() + 1.0);
        assert!(solution.reaction_converged(0));
        assert!(solution.per_reaction_critical_t[0] >= 0.5 * 5e4f64.ln() - 0.05);
        assert!(solution.per_reaction_critical_t[0] <= 0.5 * 5e4f64.ln() + 1.0);
        assert_eq!(solution.state(), EquilibriumState::SystemConverged);
    }

    #[test]
    fn test_not_converged_keeps_sentinel() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        let solution = integrator
            .solve(&DVector::from_vec(vec![1.0, 0.5]), &[0.0, 0.5, 1.0])
            .unwrap();
        assert_eq!(solution.system_critical_t, NOT_CONVERGED);
        assert_eq!(solution.per_reaction_critical_t, vec![NOT_CONVERGED]);
        assert!(!solution.system_converged());
        assert!(!solution.reaction_converged(0));
        assert!(!solution.reaction_converged(5));
        assert_eq!(solution.state(), EquilibriumState::Running);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        let x0 = DVector::from_vec(vec![1.0, 0.5]);
        let first = integrator.solve(&x0, &grid(10)).unwrap();
        let second = integrator.solve(&x0, &grid(10)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_concentration_stops_reactions() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        let x0 = DVector::from_vec(vec![1.0, 0.0]);
        assert_eq!(integrator.production_rates(&x0).unwrap(), DVector::zeros(2));
        let solution = integrator.solve(&x0, &grid(5)).unwrap();
        for i in 0..solution.trajectory.nrows() {
            assert_eq!(solution.trajectory.row(i).transpose(), x0);
        }
        assert_eq!(solution.system_critical_t, NOT_CONVERGED);
    }

    #[test]
    fn test_max_time_truncates_grid() {
        let config = EngineConfig {
            max_time: 2.5,
            ..EngineConfig::default()
        };
        let integrator = EquilibriumIntegrator::new(isomerization(), config);
        let solution = integrator
            .solve(&DVector::from_vec(vec![1.0, 0.5]), &grid(10))
            .unwrap();
        assert_eq!(solution.times, vec![0.0, 1.0, 2.0]);

        let late: Vec<f64> = vec![3.0, 4.0];
        assert!(matches!(
            integrator.solve(&DVector::from_vec(vec![1.0, 0.5]), &late),
            Err(KineticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_second_order_decay() {
        // 2A => B with k = 1: A = 1/(1 + 2t)
        let stoichiometry = Stoichiometry::from_rows(&[vec![2.0, 0.0]], &[vec![0.0, 1.0]]).unwrap();
        let kinetics = ReactionKind::new(DVector::from_vec(vec![1.0]), None);
        let reactions = ElementaryReactions::new(kinetics, stoichiometry).unwrap();
        let integrator = EquilibriumIntegrator::new(reactions, EngineConfig::default());
        let times = vec![0.0, 0.5, 1.0, 2.5, 5.0];
        let solution = integrator
            .solve(&DVector::from_vec(vec![1.0, 1e-3]), &times)
            .unwrap();
        for (i, t) in times.iter().enumerate() {
            let a = 1.0 / (1.0 + 2.0 * t);
            assert_relative_eq!(solution.trajectory[(i, 0)], a, max_relative = 1e-4);
            assert_relative_eq!(
                solution.trajectory[(i, 1)],
                1e-3 + (1.0 - a) / 2.0,
                max_relative = 1e-4
            );
        }
        assert!(solution.stats.accepted > 0);
        assert!(solution.stats.rhs_evaluations >= solution.stats.accepted);
    }

    #[test]
    fn test_single_point_grid() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        let x0 = DVector::from_vec(vec![1.0, 0.5]);
        let solution = integrator.solve(&x0, &[0.0]).unwrap();
        assert_eq!(solution.times, vec![0.0]);
        assert_eq!(solution.final_state(), x0);
        assert_eq!(solution.stats, SolverStats::default());
        assert_eq!(solution.state(), EquilibriumState::Running);
    }

    #[test]
    fn test_invalid_time_grid() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        let x0 = DVector::from_vec(vec![1.0, 0.5]);
        for grid in [vec![0.0, 1.0, 1.0], vec![0.0, 2.0, 1.0], vec![0.0, f64::NAN], vec![]] {
            assert!(matches!(
                integrator.solve(&x0, &grid),
                Err(KineticsError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_rate_model_error_is_reported() {
        // kf = 0 is rejected by the rate model on the first evaluation
        let stoichiometry = Stoichiometry::from_rows(&[vec![1.0, 0.0]], &[vec![0.0, 1.0]]).unwrap();
        let kinetics = ReactionKind::new(DVector::from_vec(vec![0.0]), None);
        let reactions = ElementaryReactions::new(kinetics, stoichiometry).unwrap();
        let integrator = EquilibriumIntegrator::new(reactions, EngineConfig::default());
        assert!(matches!(
            integrator.solve(&DVector::from_vec(vec![1.0, 0.5]), &grid(2)),
            Err(KineticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_initial_state() {
        let integrator = EquilibriumIntegrator::new(isomerization(), EngineConfig::default());
        assert!(matches!(
            integrator.solve(&DVector::from_vec(vec![1.0]), &grid(2)),
            Err(KineticsError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            integrator.solve(&DVector::from_vec(vec![1.0, -0.5]), &grid(2)),
            Err(KineticsError::InvalidParameter { .. })
        ));
    }
}
