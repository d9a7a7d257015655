//! Discretized state and action spaces
//!
//! The state space is the Cartesian product of every controllable variable's
//! feasible values; the action space is the Cartesian product of each
//! variable's `[-step, 0, +step]`. Rows are ordered with the first variable
//! most significant, so the last column varies fastest.
//!
//! Variables are never merged by name: a repeated variable contributes its own
//! column and multiplies the number of rows.

use ndarray::Array2;

use simrl_core::{DiscreteVariable, Result, SimError};

/// Largest number of controllable variables a space may be built from.
pub const MAX_VARIABLES: usize = 4;

/// Largest number of rows the state table may have.
pub const MAX_STATES: usize = 1_000_000;

/// Number of per-variable step actions.
pub const ACTIONS_PER_VARIABLE: usize = 3;

/// Fail when `v_i` is larger than the enumeration supports: more than
/// [`MAX_VARIABLES`] variables, or more than [`MAX_STATES`] combinations.
pub fn check_dimensions(v_i: &[DiscreteVariable]) -> Result<()> {
    if v_i.len() > MAX_VARIABLES {
        return Err(SimError::TooManyVariables {
            count: v_i.len(),
            max: MAX_VARIABLES,
        });
    }
    match state_count(v_i) {
        Some(states) if states <= MAX_STATES => Ok(()),
        _ => Err(SimError::SpaceTooLarge { max: MAX_STATES }),
    }
}

/// Number of rows of the state table, `None` when it overflows `usize`.
pub fn state_count(v_i: &[DiscreteVariable]) -> Option<usize> {
    v_i.iter()
        .try_fold(1usize, |rows, var| rows.checked_mul(var.value_count()))
}

/// Number of rows of the action table, `None` when it overflows `usize`.
pub fn action_count(v_i: &[DiscreteVariable]) -> Option<usize> {
    ACTIONS_PER_VARIABLE.checked_pow(u32::try_from(v_i.len()).ok()?)
}

/// Fill a `(product of radices) x columns.len()` table with the Cartesian
/// product of `columns`, first column most significant.
fn cartesian(columns: &[Vec<i64>]) -> Array2<i64> {
    let rows: usize = columns.iter().map(Vec::len).product();
    Array2::from_shape_fn((rows, columns.len()), |(row, col)| {
        let stride: usize = columns[col + 1..].iter().map(Vec::len).product();
        let column = &columns[col];
        column[(row / stride) % column.len()]
    })
}

/// Enumerate the state table `S`.
pub fn enumerate_states(v_i: &[DiscreteVariable]) -> Result<Array2<i64>> {
    check_dimensions(v_i)?;
    let columns: Vec<Vec<i64>> = v_i.iter().map(|v| v.values().collect()).collect();
    Ok(cartesian(&columns))
}

/// Enumerate the action table `A`.
pub fn enumerate_actions(v_i: &[DiscreteVariable]) -> Result<Array2<i64>> {
    check_dimensions(v_i)?;
    let columns: Vec<Vec<i64>> = v_i.iter().map(|v| v.deltas().to_vec()).collect();
    Ok(cartesian(&columns))
}

/// Row of `S` holding `setting`, or `None` when the setting is off the lattice.
pub fn state_index(v_i: &[DiscreteVariable], setting: &[i64]) -> Option<usize> {
    if setting.len() != v_i.len() {
        return None;
    }
    v_i.iter()
        .zip(setting)
        .try_fold(0usize, |index, (var, &value)| {
            var.position(value)
                .map(|k| index * var.value_count() + k)
        })
}

/// Apply one row of `A` to `current`, keeping a variable where it is when its
/// delta would leave `[lower_limit, upper_limit]`.
///
/// Returns the new setting and the number of rejected per-variable moves.
pub fn apply_action(
    v_i: &[DiscreteVariable],
    current: &[i64],
    deltas: &[i64],
) -> (Vec<i64>, usize) {
    let mut rejected = 0;
    let setting: Vec<i64> = v_i
        .iter()
        .zip(current.iter().zip(deltas))
        .map(|(var, (&value, &delta))| {
            let proposed = value + delta;
            if var.contains(proposed) {
                proposed
            } else {
                rejected += 1;
                value
            }
        })
        .collect();
    (setting, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espera() -> DiscreteVariable {
        DiscreteVariable::new("Espera", 60, 300, 10, "Models.Modelo.espera").unwrap()
    }

    fn stock() -> DiscreteVariable {
        DiscreteVariable::new("Stock", 10, 50, 10, "Models.Modelo.stock").unwrap()
    }

    #[test]
    fn test_counts() {
        assert_eq!(state_count(&[espera()]), Some(25));
        assert_eq!(action_count(&[espera()]), Some(3));
        assert_eq!(state_count(&[espera(), stock()]), Some(125));
        assert_eq!(action_count(&[espera(), stock()]), Some(9));
        assert_eq!(state_count(&[]), Some(1));
        assert_eq!(action_count(&[]), Some(1));
    }

    #[test]
    fn test_counts_overflow_to_none() {
        let wide = DiscreteVariable::new("Wide", 0, 100_000, 1, "p").unwrap();
        assert_eq!(state_count(&vec![wide.clone(); 4]), None);
        assert_eq!(action_count(&vec![wide; 50]), None);
    }

    #[test]
    fn test_oversized_space_rejected() {
        let wide = DiscreteVariable::new("Wide", 0, 100_000, 1, "p").unwrap();
        let v_i = vec![wide; 4];
        assert!(matches!(
            check_dimensions(&v_i),
            Err(SimError::SpaceTooLarge { max: MAX_STATES })
        ));
        assert!(matches!(
            enumerate_states(&v_i),
            Err(SimError::SpaceTooLarge { .. })
        ));

        // Fits in usize but not in memory
        let hundred = DiscreteVariable::new("Hundred", 0, 99, 1, "p").unwrap();
        assert!(matches!(
            check_dimensions(&vec![hundred; 4]),
            Err(SimError::SpaceTooLarge { .. })
        ));

        // Exactly at the limit
        let thousand = DiscreteVariable::new("Thousand", 0, 999, 1, "p").unwrap();
        assert!(check_dimensions(&[thousand.clone(), thousand]).is_ok());
    }

    #[test]
    fn test_enumerate_states_order() {
        let s = enumerate_states(&[espera(), stock()]).unwrap();
        assert_eq!(s.dim(), (125, 2));
        assert_eq!(s.row(0).to_vec(), vec![60, 10]);
        assert_eq!(s.row(1).to_vec(), vec![60, 20]);
        assert_eq!(s.row(5).to_vec(), vec![70, 10]);
        assert_eq!(s.row(124).to_vec(), vec![300, 50]);
    }

    #[test]
    fn test_enumerate_actions_order() {
        let a = enumerate_actions(&[espera(), stock()]).unwrap();
        assert_eq!(a.dim(), (9, 2));
        assert_eq!(a.row(0).to_vec(), vec![-10, -10]);
        assert_eq!(a.row(4).to_vec(), vec![0, 0]);
        assert_eq!(a.row(8).to_vec(), vec![10, 10]);
    }

    #[test]
    fn test_too_many_variables() {
        let v_i = vec![espera(), stock(), espera(), stock(), espera()];
        assert!(matches!(
            enumerate_states(&v_i),
            Err(SimError::TooManyVariables { count: 5, max: 4 })
        ));
        assert!(enumerate_actions(&v_i).is_err());
    }

    #[test]
    fn test_state_index_matches_enumeration() {
        let v_i = vec![espera(), stock()];
        let s = enumerate_states(&v_i).unwrap();
        for (row, setting) in s.rows().into_iter().enumerate() {
            assert_eq!(state_index(&v_i, &setting.to_vec()), Some(row));
        }
        assert_eq!(state_index(&v_i, &[65, 10]), None);
        assert_eq!(state_index(&v_i, &[60]), None);
    }

    #[test]
    fn test_apply_action_rejects_out_of_range() {
        let v_i = vec![espera(), stock()];
        let (setting, rejected) = apply_action(&v_i, &[60, 30], &[-10, 10]);
        assert_eq!(setting, vec![60, 40]);
        assert_eq!(rejected, 1);

        let (setting, rejected) = apply_action(&v_i, &[300, 50], &[10, 10]);
        assert_eq!(setting, vec![300, 50]);
        assert_eq!(rejected, 2);

        let (setting, rejected) = apply_action(&v_i, &[100, 20], &[10, 0]);
        assert_eq!(setting, vec![110, 20]);
        assert_eq!(rejected, 0);
    }
}
