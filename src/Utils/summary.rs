//! Text tables of temperature points and integration results.
use crate::Kinetics::kinetics_errors::KineticsError;
use crate::Kinetics::reaction_system::{BackwardCoefficients, TemperaturePoint};
use crate::ReactorsIVP::equilibrium_integrator::{EquilibriumSolution, NOT_CONVERGED};
use nalgebra::DVector;
use prettytable::{Cell, Row, Table, row};

const NOT_DEFINED: &str = "not defined";

/// Net production rate of every species (rows) at every temperature point (columns).
///
/// A point whose backward coefficients are not defined gets "not defined" cells; any other
/// error is returned.
pub fn reaction_rates_table(
    points: &[TemperaturePoint],
    x: &DVector<f64>,
) -> Result<Table, KineticsError> {
    let mut table = Table::new();
    let Some(first) = points.first() else {
        return Ok(table);
    };
    let mut header = vec![Cell::new("species")];
    header.extend(points.iter().map(|p| Cell::new(&format!("T = {} K", p.T()))));
    table.add_row(Row::new(header));

    let mut columns: Vec<Option<DVector<f64>>> = Vec::with_capacity(points.len());
    for point in points {
        match point.reaction_rates(x) {
            Ok(rates) => columns.push(Some(rates)),
            Err(e) if e.is_recoverable() => columns.push(None),
            Err(e) => return Err(e),
        }
    }
    for (i, species) in first.system.species.iter().enumerate() {
        let mut cells = vec![Cell::new(species)];
        for column in columns.iter() {
            let text = match column {
                Some(rates) => format!("{:.6e}", rates[i]),
                None => NOT_DEFINED.to_string(),
            };
            cells.push(Cell::new(&text));
        }
        table.add_row(Row::new(cells));
    }
    Ok(table)
}

/// Reactions of one temperature point with their rate coefficients.
pub fn temperature_point_table(point: &TemperaturePoint) -> Table {
    let mut table = Table::new();
    table.add_row(row!["reaction", "kf", "kb", "reversible"]);
    for (j, equation) in point.system.equations.iter().enumerate() {
        let kb = match &point.backward_k {
            BackwardCoefficients::Defined(kb) => format!("{:.6e}", kb[j]),
            BackwardCoefficients::NotDefined { .. } => NOT_DEFINED.to_string(),
        };
        table.add_row(row![
            equation,
            format!("{:.6e}", point.system.forward_k[j]),
            kb,
            point.system.reversibility[j]
        ]);
    }
    table
}

fn critical_time_text(t: f64) -> String {
    if t == NOT_CONVERGED {
        "not reached".to_string()
    } else {
        format!("{:.4e}", t)
    }
}

/// Critical time of every reaction and of the whole system.
pub fn critical_times_table(solution: &EquilibriumSolution, equations: &[String]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["reaction", "critical time"]);
    for (j, t) in solution.per_reaction_critical_t.iter().enumerate() {
        let name = equations
            .get(j)
            .cloned()
            .unwrap_or_else(|| format!("reaction {}", j));
        table.add_row(row![name, critical_time_text(*t)]);
    }
    table.add_row(row!["system", critical_time_text(solution.system_critical_t)]);
    table
}

pub fn print_reaction_rates(points: &[TemperaturePoint], x: &DVector<f64>) -> Result<(), KineticsError> {
    reaction_rates_table(points, x)?.printstd();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::elementary_kinetics::Stoichiometry;
    use crate::Kinetics::reaction_system::ReactionSystem;
    use crate::ReactorsIVP::equilibrium_integrator::SolverStats;
    use nalgebra::DMatrix;

    fn point(T: f64, backward_k: BackwardCoefficients, reversible: bool) -> TemperaturePoint {
        let stoichiometry = Stoichiometry::from_rows(&[vec![1.0, 0.0]], &[vec![0.0, 1.0]]).unwrap();
        TemperaturePoint {
            system: ReactionSystem {
                species: vec!["A".to_string(), "B".to_string()],
                equations: vec!["A [=] B".to_string()],
                stoichiometry,
                forward_k: DVector::from_vec(vec![2.0]),
                reversibility: vec![reversible],
                T,
            },
            backward_k,
        }
    }

    #[test]
    fn test_reaction_rates_table() {
        let points = vec![
            point(
                100.0,
                BackwardCoefficients::NotDefined {
                    species: "A".to_string(),
                    regime: "low".to_string(),
                },
                true,
            ),
            point(500.0, BackwardCoefficients::Defined(DVector::from_vec(vec![1.0])), true),
        ];
        let table = reaction_rates_table(&points, &DVector::from_vec(vec![1.0, 1.0])).unwrap();
        assert_eq!(table.len(), 3);
        let text = table.to_string();
        assert!(text.contains("T = 100 K"));
        assert!(text.contains(NOT_DEFINED));
        assert!(text.contains("-1.000000e0"));

        let wrong_x = DVector::from_vec(vec![1.0]);
        assert!(reaction_rates_table(&points[1..], &wrong_x).is_err());
        assert_eq!(reaction_rates_table(&[], &wrong_x).unwrap().len(), 0);
    }

    #[test]
    fn test_temperature_point_table() {
        let table = temperature_point_table(&point(
            500.0,
            BackwardCoefficients::Defined(DVector::from_vec(vec![0.5])),
            true,
        ));
        let text = table.to_string();
        assert!(text.contains("A [=] B"));
        assert!(text.contains("5.000000e-1"));
        assert!(text.contains("true"));
    }

    #[test]
    fn test_critical_times_table() {
        let solution = EquilibriumSolution {
            times: vec![0.0, 1.0],
            trajectory: DMatrix::zeros(2, 2),
            per_reaction_critical_t: vec![0.5, NOT_CONVERGED],
            system_critical_t: NOT_CONVERGED,
            stats: SolverStats::default(),
        };
        let table = critical_times_table(&solution, &["A [=] B".to_string()]);
        assert_eq!(table.len(), 4);
        let text = table.to_string();
        assert!(text.contains("5.0000e-1"));
        assert!(text.contains("reaction 1"));
        assert!(text.contains("not reached"));
    }
}
