/// errors of the rate/equilibrium engine; `SpeciesTemperatureOutOfRange` is the only one the
/// temperature pipeline recovers from
pub mod kinetics_errors;
/// Rate coefficients of elementary reactions: constant, Arrhenius `k = A*exp(-E/(R*T))` and
/// modified Arrhenius `k = A*T^b*exp(-E/(R*T))`, gathered in one closed enum.
/// # Examples
/// ```
/// use KinEq::Kinetics::rate_coefficients::{ModifiedArrheniusCoefficient, RateCoefficient, RateConstant};
/// let k: RateCoefficient = ModifiedArrheniusCoefficient::new(2.0, -0.5, 3.0).into();
/// assert!((k.compute(100.0).unwrap() - 0.19927962618542916).abs() < 1e-12);
/// ```
pub mod rate_coefficients;
/// Progress rates and net production rates of systems of elementary reactions.
/// The module takes as input forward (and, for reversible systems, backward) rate coefficients,
/// concentrations and the matrices of stoichiometric coefficients of reactants and products and
/// produces:
/// 1) forward, backward and net progress rates of each reaction
/// 2) net production rate of each species
/// # Examples
/// ```
/// use KinEq::Kinetics::elementary_kinetics::{ElementaryReactions, ReactionKind, Stoichiometry};
/// use nalgebra::DVector;
/// let stoichiometry = Stoichiometry::from_rows(
///     &[vec![1.0, 2.0, 0.0], vec![2.0, 0.0, 2.0]],
///     &[vec![0.0, 0.0, 2.0], vec![0.0, 1.0, 1.0]],
/// ).unwrap();
/// let kinetics = ReactionKind::new(DVector::from_vec(vec![10.0, 10.0]), None);
/// let reactions = ElementaryReactions::new(kinetics, stoichiometry).unwrap();
/// let x = DVector::from_vec(vec![1.0, 2.0, 1.0]);
/// let progress = reactions.progress_rates(&x).unwrap();
/// assert_eq!(progress.net.as_slice(), &[40.0, 10.0]);
/// let rates = reactions.production_rates(&progress).unwrap();
/// assert_eq!(rates.as_slice(), &[-60.0, -70.0, 70.0]);
/// ```
pub mod elementary_kinetics;
/// reaction records, assembly of a reaction system at a temperature and the pipeline over a
/// list of temperatures (sequential and rayon-parallel)
pub mod reaction_system;
