/// text tables of production rates, rate coefficients and critical times
pub mod summary;
