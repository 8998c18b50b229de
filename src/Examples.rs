/// runnable demonstrations of the rate/equilibrium engine
pub mod equilibrium_examples;
