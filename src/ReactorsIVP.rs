/// integration of concentrations at fixed temperature with detection of chemical equilibrium
/// of every reaction and of the whole system
pub mod equilibrium_integrator;
