//! Gait phase schedule for legged locomotion.
//!
//! Answers "is leg `j` in stance at time `t`?" as a pure function of time.
//! Each gait is defined by:
//! - Phase offsets per leg (when in the cycle each foot lifts)
//! - Per-leg stance fractions (share of the cycle spent on the ground)
//! - The gait period (total cycle time)
//!
//! Query times are quantized to the discretization grid before the modulo so
//! floating-point drift cannot flip the stance classification right at a
//! knot boundary.

use strider_core::MotionParams;

/// Phase of a leg within the gait cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GaitPhase {
    /// Leg is on the ground and bears load.
    Stance,
    /// Leg is airborne, moving toward its next placement.
    Swing,
}

/// Stateless gait phase schedule.
///
/// Holds only the timing constants of one gait style; every query is a pure
/// function of the supplied time, so concurrent queries for different legs
/// and times are safe.
#[derive(Clone, Debug)]
pub struct GaitSchedule {
    period: f64,
    dt: f64,
    stance_fraction: Vec<f64>,
    phase_offset: Vec<f64>,
}

impl GaitSchedule {
    /// Build the schedule from a validated motion-parameter record.
    #[must_use]
    pub fn new(params: &MotionParams) -> Self {
        Self {
            period: params.gait_period,
            dt: params.gait_dt,
            stance_fraction: params.stance_fraction.clone(),
            phase_offset: params.phase_offset.clone(),
        }
    }

    /// Number of legs covered by this schedule.
    #[must_use]
    pub fn n_legs(&self) -> usize {
        self.stance_fraction.len()
    }

    /// Gait cycle period in seconds.
    #[must_use]
    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Snap a query time onto the discretization grid.
    fn quantize(&self, t: f64) -> f64 {
        (t / self.dt).round() * self.dt
    }

    /// Continuous phase fraction of a leg's cycle at time `t`, in [0, 1).
    ///
    /// The leg's phase offset is applied before the modulo.
    #[must_use]
    pub fn phase_fraction(&self, t: f64, leg: usize) -> f64 {
        let leg_time = self.quantize(t) + self.phase_offset[leg] * self.period;
        let fraction = (leg_time.rem_euclid(self.period)) / self.period;
        // rem_euclid can land exactly on `period` through rounding.
        if fraction >= 1.0 {
            0.0
        } else {
            fraction
        }
    }

    /// Stance/swing classification of a leg at time `t`.
    ///
    /// A leg with stance fraction 1.0 is in stance for every `t` (the
    /// "stand still" gait).
    #[must_use]
    pub fn phase(&self, t: f64, leg: usize) -> GaitPhase {
        if self.stance_fraction[leg] >= 1.0 {
            return GaitPhase::Stance;
        }
        if self.phase_fraction(t, leg) < self.stance_fraction[leg] {
            GaitPhase::Stance
        } else {
            GaitPhase::Swing
        }
    }

    /// Swing progress of a leg at time `t`, normalized to [0, 1].
    ///
    /// Returns 0.0 while the leg is in stance; used for swing-height shaping.
    #[must_use]
    pub fn swing_fraction(&self, t: f64, leg: usize) -> f64 {
        let stance = self.stance_fraction[leg];
        if stance >= 1.0 {
            return 0.0;
        }
        let fraction = self.phase_fraction(t, leg);
        if fraction < stance {
            0.0
        } else {
            (fraction - stance) / (1.0 - stance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strider_core::MotionParams;

    fn trot() -> GaitSchedule {
        GaitSchedule::new(&MotionParams::trot(12))
    }

    #[test]
    fn periodic_in_gait_period() {
        let sched = trot();
        for leg in 0..4 {
            for k in 0..40 {
                let t = f64::from(k) * 0.05;
                assert_eq!(
                    sched.phase(t, leg),
                    sched.phase(t + sched.period(), leg),
                    "phase must repeat after one period (t={t}, leg={leg})"
                );
            }
        }
    }

    #[test]
    fn full_stance_fraction_always_stance() {
        let sched = GaitSchedule::new(&MotionParams::stand(12));
        for leg in 0..4 {
            for k in 0..100 {
                let t = f64::from(k) * 0.013;
                assert_eq!(sched.phase(t, leg), GaitPhase::Stance);
            }
        }
    }

    #[test]
    fn trot_diagonal_pairs_share_phase() {
        let sched = trot();
        // Legs ordered FL, FR, HL, HR; diagonals are (FL, HR) and (FR, HL).
        for k in 0..32 {
            let t = f64::from(k) * 0.05;
            assert_eq!(sched.phase(t, 0), sched.phase(t, 3));
            assert_eq!(sched.phase(t, 1), sched.phase(t, 2));
        }
    }

    #[test]
    fn trot_pairs_alternate() {
        let sched = trot();
        // With stance fraction 0.65 the diagonal pairs overlap early in the
        // cycle. Probe a time where they must differ: fraction 0.75 for FL
        // is swing while FR sits at 0.25 (stance).
        let t = 0.75 * 0.4;
        assert_eq!(sched.phase(t, 0), GaitPhase::Swing);
        assert_eq!(sched.phase(t, 1), GaitPhase::Stance);
    }

    #[test]
    fn phase_fraction_range() {
        let sched = trot();
        for leg in 0..4 {
            for k in 0..200 {
                let f = sched.phase_fraction(f64::from(k) * 0.031, leg);
                assert!((0.0..1.0).contains(&f), "fraction {f} out of range");
            }
        }
    }

    #[test]
    fn quantization_stabilizes_knot_boundaries() {
        let sched = trot();
        // 0.1999999999 rounds onto the 0.2 knot; both queries must agree.
        assert_eq!(sched.phase(0.199_999_999_9, 0), sched.phase(0.2, 0));
        assert_relative_eq!(
            sched.phase_fraction(0.199_999_999_9, 0),
            sched.phase_fraction(0.2, 0)
        );
    }

    #[test]
    fn swing_fraction_zero_in_stance() {
        let sched = trot();
        // FL is in stance at phase 0.
        assert_relative_eq!(sched.swing_fraction(0.0, 0), 0.0);
    }

    #[test]
    fn swing_fraction_spans_swing_window() {
        let sched = trot();
        // FL stance ends at fraction 0.65; probe the middle of the swing
        // window at fraction 0.825 -> swing fraction 0.5.
        let t = 0.825 * 0.4;
        let f = sched.swing_fraction(t, 0);
        assert_relative_eq!(f, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn negative_time_wraps() {
        let sched = trot();
        // One period earlier must classify identically.
        assert_eq!(sched.phase(-0.4 + 0.1, 0), sched.phase(0.1, 0));
    }
}
