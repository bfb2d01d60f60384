//! Fine-rate resampling of the coarse optimizer output.
//!
//! The torque-level joint controller runs far above the planning knot rate;
//! [`resample`] expands each pair of consecutive coarse knots into
//! `round(coarse_dt / fine_dt)` linearly interpolated samples. Linear
//! interpolation is a deliberate simplification: downstream torque tracking
//! is expected to be robust to first-order references, and no attempt is
//! made at a physically exact reconstruction.

use nalgebra::{DVector, Vector3, Vector6};

use strider_core::{ConfigError, RobotState, StreamError};

use crate::optimizer::OptimizedTrajectory;

/// One fine-rate sample consumed by the torque controller.
#[derive(Clone, Debug)]
pub struct StreamSample {
    /// Interpolated generalized position/velocity reference.
    pub state: RobotState,
    /// Interpolated feed-forward effort.
    pub effort: DVector<f64>,
    /// Interpolated per-leg contact forces.
    pub forces: Vec<Vector3<f64>>,
    /// Interpolated center of mass.
    pub com: Vector3<f64>,
    /// Interpolated mass-normalized momentum.
    pub momentum: Vector6<f64>,
    /// Stance flags of the knot interval this sample falls in.
    pub stance: Vec<bool>,
}

/// Fine-rate stream for one planning cycle.
///
/// An immutable value: the planner builds a complete new stream and the
/// consumer's reference is swapped, never mutated in place.
#[derive(Clone, Debug)]
pub struct InterpolatedStream {
    samples: Vec<StreamSample>,
    fine_dt: f64,
}

impl InterpolatedStream {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the stream holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample spacing in seconds.
    #[must_use]
    pub const fn fine_dt(&self) -> f64 {
        self.fine_dt
    }

    /// Sample at `index`, if it exists.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StreamSample> {
        self.samples.get(index)
    }

    /// Cursor for index-by-index consumption.
    #[must_use]
    pub const fn cursor(&self) -> StreamCursor<'_> {
        StreamCursor {
            stream: self,
            index: 0,
        }
    }
}

/// Index-by-index consumer over an [`InterpolatedStream`].
///
/// Running past the last sample is a configuration fault (the planning
/// clock and control rate must be chosen so the next cycle always lands
/// first) and surfaces as [`StreamError::Exhausted`].
#[derive(Clone, Debug)]
pub struct StreamCursor<'a> {
    stream: &'a InterpolatedStream,
    index: usize,
}

impl<'a> StreamCursor<'a> {
    /// The next sample, advancing the cursor.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&'a StreamSample, StreamError> {
        let sample = self.stream.get(self.index).ok_or(StreamError::Exhausted {
            index: self.index,
            len: self.stream.len(),
        })?;
        self.index += 1;
        Ok(sample)
    }

    /// Skip `n` samples (lag compensation by the owning control loop).
    pub fn advance(&mut self, n: usize) {
        self.index = (self.index + n).min(self.stream.len());
    }

    /// Current cursor position.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Samples left before exhaustion.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stream.len() - self.index
    }
}

/// Resample a coarse trajectory to the fine control rate.
///
/// Produces exactly `(knots - 1) * ratio` samples with
/// `ratio = round(coarse_dt / fine_dt)`; sample `i * ratio + k` lies at
/// fraction `k / ratio` between knots `i` and `i + 1`, so the first sample
/// equals the first knot and nothing past the last knot pair is ever read.
/// With `fine_dt == coarse_dt` the samples are the knot values themselves.
pub fn resample(
    trajectory: &OptimizedTrajectory,
    coarse_dt: f64,
    fine_dt: f64,
) -> Result<InterpolatedStream, ConfigError> {
    if coarse_dt <= 0.0 || fine_dt <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "fine_dt",
            message: format!("timesteps must be > 0 (coarse {coarse_dt}, fine {fine_dt})"),
        });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ratio = (coarse_dt / fine_dt).round() as usize;
    if ratio == 0 {
        return Err(ConfigError::InvalidValue {
            field: "fine_dt",
            message: format!("fine_dt {fine_dt} exceeds coarse_dt {coarse_dt}"),
        });
    }

    let knots = trajectory.n_knots();
    let mut samples = Vec::with_capacity(knots.saturating_sub(1) * ratio);

    for i in 0..knots.saturating_sub(1) {
        for k in 0..ratio {
            #[allow(clippy::cast_precision_loss)]
            let alpha = k as f64 / ratio as f64;
            samples.push(lerp_sample(trajectory, i, alpha));
        }
    }

    Ok(InterpolatedStream { samples, fine_dt })
}

/// Linear interpolation between knots `i` and `i + 1` at fraction `alpha`.
fn lerp_sample(trajectory: &OptimizedTrajectory, i: usize, alpha: f64) -> StreamSample {
    let (s0, s1) = (&trajectory.states[i], &trajectory.states[i + 1]);
    let state = RobotState::new(
        lerp_vec(&s0.q, &s1.q, alpha),
        lerp_vec(&s0.v, &s1.v, alpha),
    );

    let effort = lerp_vec(&trajectory.efforts[i], &trajectory.efforts[i + 1], alpha);

    let forces = trajectory.forces[i]
        .iter()
        .zip(hold_last(&trajectory.forces, i + 1).iter())
        .map(|(f0, f1)| f0 + (f1 - f0) * alpha)
        .collect();

    let com = trajectory.com[i] + (trajectory.com[i + 1] - trajectory.com[i]) * alpha;
    let momentum =
        trajectory.momentum[i] + (trajectory.momentum[i + 1] - trajectory.momentum[i]) * alpha;

    StreamSample {
        state,
        effort,
        forces,
        com,
        momentum,
        stance: hold_last(&trajectory.stance, i).clone(),
    }
}

fn lerp_vec(a: &DVector<f64>, b: &DVector<f64>, alpha: f64) -> DVector<f64> {
    a + (b - a) * alpha
}

/// Per-interval sequences (forces, stance) can be one entry shorter than the
/// state knots; hold the last entry through the final interval.
fn hold_last<T>(knots: &[T], i: usize) -> &T {
    &knots[i.min(knots.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[allow(clippy::cast_precision_loss)]
    fn line_trajectory(knots: usize, n_legs: usize) -> OptimizedTrajectory {
        let states = (0..knots)
            .map(|i| {
                RobotState::new(
                    DVector::from_element(5, i as f64),
                    DVector::from_element(4, i as f64 * 2.0),
                )
            })
            .collect();
        let efforts = (0..knots)
            .map(|i| DVector::from_element(4, i as f64 * 10.0))
            .collect();
        let forces = (0..knots)
            .map(|i| vec![Vector3::new(i as f64, 0.0, 22.0); n_legs])
            .collect();
        let com = (0..knots)
            .map(|i| Vector3::new(i as f64 * 0.01, 0.0, 0.3))
            .collect();
        let momentum = (0..knots).map(|_| Vector6::zeros()).collect();
        let stance = (0..knots).map(|i| vec![i % 2 == 0; n_legs]).collect();

        OptimizedTrajectory {
            states,
            efforts,
            forces,
            com,
            momentum,
            stance,
            solve_time_us: 0,
        }
    }

    #[test]
    fn sample_count_is_intervals_times_ratio() {
        let traj = line_trajectory(6, 4);
        let stream = resample(&traj, 0.05, 0.001).unwrap();
        assert_eq!(stream.len(), (6 - 1) * 50);
    }

    #[test]
    fn first_sample_equals_first_knot() {
        let traj = line_trajectory(6, 4);
        let stream = resample(&traj, 0.05, 0.001).unwrap();
        let first = stream.get(0).unwrap();
        assert_relative_eq!(first.state.q[0], 0.0);
        assert_relative_eq!(first.effort[0], 0.0);
        assert_relative_eq!(first.com.x, 0.0);
    }

    #[test]
    fn ratio_one_reproduces_knots() {
        let traj = line_trajectory(6, 4);
        let stream = resample(&traj, 0.05, 0.05).unwrap();
        assert_eq!(stream.len(), 5);
        for (i, sample) in (0..stream.len()).map(|i| (i, stream.get(i).unwrap())) {
            #[allow(clippy::cast_precision_loss)]
            let expected = i as f64;
            assert_relative_eq!(sample.state.q[0], expected);
            assert_relative_eq!(sample.effort[0], expected * 10.0);
        }
    }

    #[test]
    fn no_sample_reads_past_last_knot() {
        let traj = line_trajectory(4, 2);
        let stream = resample(&traj, 0.05, 0.01).unwrap();
        let last = stream.get(stream.len() - 1).unwrap();
        // Last sample is at fraction (ratio-1)/ratio of the final interval.
        assert!(last.state.q[0] < 3.0);
        assert_relative_eq!(last.state.q[0], 2.0 + 4.0 / 5.0);
    }

    #[test]
    fn interpolation_is_linear_between_knots() {
        let traj = line_trajectory(3, 2);
        let stream = resample(&traj, 0.05, 0.025).unwrap();
        // ratio 2: samples at fractions 0, 0.5 of each interval.
        let mid = stream.get(1).unwrap();
        assert_relative_eq!(mid.state.q[0], 0.5);
        assert_relative_eq!(mid.state.v[0], 1.0);
        assert_relative_eq!(mid.effort[0], 5.0);
        assert_relative_eq!(mid.forces[0].x, 0.5);
        assert_relative_eq!(mid.com.x, 0.005);
    }

    #[test]
    fn stance_flags_held_per_interval() {
        let traj = line_trajectory(3, 2);
        let stream = resample(&traj, 0.05, 0.025).unwrap();
        assert_eq!(stream.get(0).unwrap().stance, vec![true, true]);
        assert_eq!(stream.get(1).unwrap().stance, vec![true, true]);
        assert_eq!(stream.get(2).unwrap().stance, vec![false, false]);
    }

    #[test]
    fn invalid_timesteps_rejected() {
        let traj = line_trajectory(3, 2);
        assert!(resample(&traj, 0.0, 0.001).is_err());
        assert!(resample(&traj, 0.05, -0.001).is_err());
        // fine_dt far above coarse_dt rounds the ratio to zero.
        assert!(resample(&traj, 0.01, 0.05).is_err());
    }

    #[test]
    fn cursor_consumes_in_order_and_exhausts() {
        let traj = line_trajectory(3, 2);
        let stream = resample(&traj, 0.05, 0.05).unwrap();
        let mut cursor = stream.cursor();
        assert_eq!(cursor.remaining(), 2);
        assert_relative_eq!(cursor.next().unwrap().state.q[0], 0.0);
        assert_relative_eq!(cursor.next().unwrap().state.q[0], 1.0);
        assert_eq!(
            cursor.next().unwrap_err(),
            strider_core::StreamError::Exhausted { index: 2, len: 2 }
        );
    }

    #[test]
    fn cursor_advance_skips_lag_prefix() {
        let traj = line_trajectory(6, 2);
        let stream = resample(&traj, 0.05, 0.05).unwrap();
        let mut cursor = stream.cursor();
        cursor.advance(3);
        assert_eq!(cursor.index(), 3);
        assert_relative_eq!(cursor.next().unwrap().state.q[0], 3.0);
    }
}
