/// source of NASA7 polynomial coefficients: the `ThermoCoefficientStore` trait and an in-memory
/// library loadable from JSON
pub mod thermo_store;
/// Equilibrium constants and backward rate coefficients of elementary reactions.
/// The module takes as input the species list, temperature, forward rate coefficients, reversibility
/// flags and stoichiometry and produces:
/// 1) dimensionless enthalpy H/RT and entropy S/R of every species from NASA7 polynomials
/// 2) equilibrium constant Ke of every reaction
/// 3) backward rate coefficients kb = kf/Ke of reversible reactions (0 for irreversible ones)
pub mod equilibrium_constants;
