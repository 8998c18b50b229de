use crate::Kinetics::elementary_kinetics::{ElementaryReactions, ReactionKind, Stoichiometry};
use crate::Kinetics::rate_coefficients::{
    ArrheniusCoefficient, ConstantCoefficient, ModifiedArrheniusCoefficient, RateCoefficient,
    RateConstant,
};
use crate::Kinetics::reaction_system::{
    ReactionRecord, ReactionSystem, temperature_points, temperature_points_par,
};
use crate::ReactorsIVP::equilibrium_integrator::EquilibriumIntegrator;
use crate::Thermodynamics::thermo_store::NASA7Library;
use crate::Utils::summary::{
    critical_times_table, print_reaction_rates, reaction_rates_table, temperature_point_table,
};
use crate::settings::EngineConfig;
use log::error;
use nalgebra::DVector;
use std::error::Error;

const HYDROGEN_MECHANISM: &str = include_str!("../../data/hydrogen_mechanism.json");
const HYDROGEN_THERMO: &str = include_str!("../../data/nasa7_hydrogen.json");

/// species order of the hydrogen mechanism
pub fn hydrogen_species() -> Vec<String> {
    ["H", "O", "OH", "H2", "H2O", "O2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn hydrogen_mechanism() -> Result<Vec<ReactionRecord>, serde_json::Error> {
    serde_json::from_str(HYDROGEN_MECHANISM)
}

pub fn hydrogen_thermo() -> Result<NASA7Library, Box<dyn Error>> {
    Ok(NASA7Library::from_json_str(HYDROGEN_THERMO)?)
}

pub fn equilibrium_examples(task: usize) {
    let result = match task {
        0 => rate_coefficients_example(),
        1 => irreversible_example(),
        2 => reversible_pipeline_example(),
        3 => equilibrium_integration_example(),
        _ => Err(format!("no example with number {}", task).into()),
    };
    if let Err(e) = result {
        error!("example {} failed: {}", task, e);
    }
}

/// the three rate-coefficient models over a range of temperatures
fn rate_coefficients_example() -> Result<(), Box<dyn Error>> {
    let models: Vec<(&str, RateCoefficient)> = vec![
        ("constant", ConstantCoefficient::new(1e3).into()),
        ("Arrhenius", ArrheniusCoefficient::new(3.52e10, 7.4e4).into()),
        (
            "modified Arrhenius",
            ModifiedArrheniusCoefficient::new(5.06e-2, 2.7, 2.63e4).into(),
        ),
    ];
    for T in [750.0, 1500.0, 2500.0] {
        println!("------At Temperature {} K------", T);
        for (name, model) in models.iter() {
            println!("    {}: {:e}", name, model.compute(T)?);
        }
    }
    Ok(())
}

/// progress and production rates of an irreversible system given by matrices
fn irreversible_example() -> Result<(), Box<dyn Error>> {
    let stoichiometry = Stoichiometry::from_rows(
        &[vec![1.0, 2.0, 0.0], vec![2.0, 0.0, 2.0]],
        &[vec![0.0, 0.0, 2.0], vec![0.0, 1.0, 1.0]],
    )?;
    let kinetics = ReactionKind::new(DVector::from_vec(vec![10.0, 10.0]), None);
    let reactions = ElementaryReactions::new(kinetics, stoichiometry)?;
    let x = DVector::from_vec(vec![1.0, 2.0, 1.0]);
    let progress = reactions.progress_rates(&x)?;
    println!("The progress rates: {:?}", progress.net.as_slice());
    let rates = reactions.production_rates(&progress)?;
    println!("The reaction rates: {:?}", rates.as_slice());

    // the same mechanism read as records, irreversible at every temperature
    let mut records = hydrogen_mechanism()?;
    for record in records.iter_mut() {
        record.reversible = false;
    }
    let x = DVector::from_vec(vec![2.0, 1.0, 0.5, 1.0, 1.0, 1.0]);
    for T in [750.0, 1500.0, 2500.0] {
        let system = ReactionSystem::assemble(&hydrogen_species(), &records, T)?;
        let point = system.with_thermodynamics(&hydrogen_thermo()?, &EngineConfig::default())?;
        println!("At T = {}:", T);
        temperature_point_table(&point).printstd();
        println!("The reaction rates: {:?}", point.reaction_rates(&x)?.as_slice());
    }
    Ok(())
}

/// reversible mechanism over temperatures partly outside the thermodynamic data
fn reversible_pipeline_example() -> Result<(), Box<dyn Error>> {
    let temperatures = [100.0, 750.0, 1500.0, 2500.0, 5000.0];
    let x = DVector::from_vec(vec![2.0, 1.0, 0.5, 1.0, 1.0, 0.5]);
    let records = hydrogen_mechanism()?;
    let library = hydrogen_thermo()?;
    let config = EngineConfig::default();
    let points = temperature_points(&hydrogen_species(), &records, &temperatures, &library, &config)?;
    print_reaction_rates(&points, &x)?;

    let many: Vec<f64> = (0..64).map(|i| 300.0 + 50.0 * i as f64).collect();
    let points = temperature_points_par(&hydrogen_species(), &records, &many, &library, &config)?;
    let defined = points
        .iter()
        .filter(|p| p.backward_k.as_vector().is_some())
        .count();
    println!(
        "{} of {} temperature points have backward rate coefficients",
        defined,
        points.len()
    );
    reaction_rates_table(&points[..4], &x)?.printstd();
    Ok(())
}

/// time evolution of the reversible mechanism towards equilibrium at 1500 K
fn equilibrium_integration_example() -> Result<(), Box<dyn Error>> {
    let records = hydrogen_mechanism()?;
    let library = hydrogen_thermo()?;
    let config = EngineConfig::default();
    let point = ReactionSystem::assemble(&hydrogen_species(), &records, 1500.0)?
        .with_thermodynamics(&library, &config)?;
    let integrator = EquilibriumIntegrator::from_temperature_point(&point, config)?;
    let x0 = DVector::from_vec(vec![2e-3, 1e-3, 5e-4, 1e-3, 1e-3, 5e-4]);
    let time_grid: Vec<f64> = (0..=50).map(|i| 1e-6 * i as f64).collect();
    let solution = integrator.solve(&x0, &time_grid)?;
    println!("final state: {:?}", solution.final_state().as_slice());
    critical_times_table(&solution, &point.system.equations).printstd();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::reaction_system::BackwardCoefficients;

    #[test]
    fn test_bundled_data() {
        let records = hydrogen_mechanism().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].equation(), "H + O2 [=] O + OH");
        let library = hydrogen_thermo().unwrap();
        assert_eq!(library.len(), 6);
        let points = temperature_points(
            &hydrogen_species(),
            &records,
            &[100.0, 750.0, 1500.0, 2500.0, 5000.0],
            &library,
            &EngineConfig::default(),
        )
        .unwrap();
        let defined: Vec<bool> = points
            .iter()
            .map(|p| matches!(p.backward_k, BackwardCoefficients::Defined(_)))
            .collect();
        assert_eq!(defined, vec![false, true, true, true, false]);
        for point in points[1..4].iter() {
            let kb = point.backward_k.as_vector().unwrap();
            assert!(kb.iter().all(|k| k.is_finite() && *k > 0.0));
        }
    }

    #[test]
    fn test_examples_run() {
        for task in 0..3 {
            equilibrium_examples(task);
        }
        // unknown numbers are logged, not run
        equilibrium_examples(99);
    }
}
