//! Operator reaction-time model.
//!
//! Four multiplicative factors, each built from a clamped input:
//!
//! ```text
//! fatigue  = 1 + 0.6  * clamp(fatigue, 0, 1)
//! shift    = 1 + 0.15 * clamp((shift_hours - 8) / 4, -1, 1)
//! training = 1 - 0.4  * clamp(training, 0, 1)
//! staff    = 1 - 0.05 * max(0, staff_on_shift - 3)
//! ```
//!
//! The product is clamped to [`MIN_MULTIPLIER`, `MAX_MULTIPLIER`].

use crate::components::HumanFactors;
use crate::registry::Registry;

pub const MIN_MULTIPLIER: f64 = 0.5;
pub const MAX_MULTIPLIER: f64 = 2.0;

/// Staffing level at which the staff factor is neutral.
const BASELINE_STAFF: u32 = 3;

/// Pure computation of the reaction multiplier for one crew.
pub fn reaction_multiplier(hf: &HumanFactors) -> f64 {
    let fatigue_factor = 1.0 + 0.6 * hf.fatigue.clamp(0.0, 1.0);
    let shift_factor = 1.0 + 0.15 * ((hf.shift_hours - 8.0) / 4.0).clamp(-1.0, 1.0);
    let training_factor = 1.0 - 0.4 * hf.training.clamp(0.0, 1.0);
    let extra_staff = hf.staff_on_shift.saturating_sub(BASELINE_STAFF);
    let staff_factor = 1.0 - 0.05 * f64::from(extra_staff);

    (fatigue_factor * shift_factor * training_factor * staff_factor)
        .clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
}

/// Refreshes the derived multiplier on every crew entity.
pub fn run(reg: &mut Registry) {
    for (_, hf) in reg.human_factors.iter_mut() {
        hf.reaction_multiplier = reaction_multiplier(hf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn crew(training: f64, fatigue: f64, shift_hours: f64, staff_on_shift: u32) -> HumanFactors {
        HumanFactors {
            training,
            fatigue,
            shift_hours,
            staff_on_shift,
            reaction_multiplier: 1.0,
        }
    }

    #[test]
    fn test_fully_trained_rested_crew() {
        let mut reg = Registry::new();
        let e = reg.spawn(crew(1.0, 0.0, 8.0, 3));

        run(&mut reg);

        assert_relative_eq!(
            reg.get::<HumanFactors>(e).unwrap().reaction_multiplier,
            0.6,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_neutral_crew_is_unity() {
        assert_relative_eq!(reaction_multiplier(&crew(0.0, 0.0, 8.0, 3)), 1.0);
    }

    #[test]
    fn test_worst_case_crew() {
        // 1.6 * 1.15 * 1.0 * 1.0 = 1.84
        assert_relative_eq!(
            reaction_multiplier(&crew(0.0, 1.0, 16.0, 0)),
            1.84,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_inputs_clamped_before_combining() {
        let wild = crew(-5.0, 9.0, 100.0, 1);
        let sane = crew(0.0, 1.0, 12.0, 1);
        assert_relative_eq!(reaction_multiplier(&wild), reaction_multiplier(&sane));
    }

    #[test]
    fn test_large_staff_hits_floor() {
        // 0.6 * (1 - 0.05 * 20) = 0 before the final clamp
        assert_eq!(reaction_multiplier(&crew(1.0, 0.0, 8.0, 23)), MIN_MULTIPLIER);
    }

    #[test]
    fn test_short_shift_speeds_response() {
        // (4 - 8) / 4 = -1 -> 0.85
        assert_relative_eq!(
            reaction_multiplier(&crew(0.0, 0.0, 4.0, 3)),
            0.85,
            epsilon = 1e-12
        );
    }
}
