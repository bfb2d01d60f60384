//! Rolling-horizon contact plan.
//!
//! For every discretized instant of the horizon and every leg, records
//! whether the foot is planned to be on the ground and where. Stance targets
//! are frozen per stance run: once a foot is committed to the ground the plan
//! must not relocate it mid-stance.

use log::warn;
use nalgebra::{Vector2, Vector3};

use strider_core::{DynamicsModel, MotionParams, RobotState};

use crate::gait::{GaitPhase, GaitSchedule};

/// Contact patch radius assumed for every foot, in meters.
pub const FOOT_RADIUS: f64 = 0.018;

/// Lateral widening applied to the hip-derived placement offsets, in meters.
/// Pushes stance targets outward to keep the heuristic placement law away
/// from kinematically infeasible crossed-leg configurations.
const LATERAL_WIDENING: f64 = 0.04;

/// One leg at one horizon step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
    /// Whether the leg is planned to be on the ground at this step.
    pub in_contact: bool,
    /// Stance target while in contact; the current foot position as a
    /// neutral placeholder while in swing (the swing trajectory itself is
    /// produced by the kinematics solver, not by the plan).
    pub position: Vector3<f64>,
    /// Contact patch radius.
    pub radius: f64,
}

/// Discretized contact schedule over the horizon.
///
/// Rebuilt from the measured state every re-plan cycle and consumed
/// immediately; never persisted across cycles.
#[derive(Clone, Debug)]
pub struct ContactPlan {
    steps: Vec<Vec<ContactPoint>>,
}

impl ContactPlan {
    /// Number of horizon steps.
    #[must_use]
    pub fn n_steps(&self) -> usize {
        self.steps.len()
    }

    /// Number of legs per step.
    #[must_use]
    pub fn n_legs(&self) -> usize {
        self.steps.first().map_or(0, Vec::len)
    }

    /// Entry for `leg` at horizon step `step`.
    #[must_use]
    pub fn get(&self, step: usize, leg: usize) -> &ContactPoint {
        &self.steps[step][leg]
    }

    /// All per-leg entries at one horizon step.
    #[must_use]
    pub fn step(&self, step: usize) -> &[ContactPoint] {
        &self.steps[step]
    }

    /// Iterate over horizon steps.
    pub fn iter(&self) -> impl Iterator<Item = &[ContactPoint]> {
        self.steps.iter().map(Vec::as_slice)
    }

    /// Stance flags of one horizon step.
    #[must_use]
    pub fn stance_flags(&self, step: usize) -> Vec<bool> {
        self.steps[step].iter().map(|c| c.in_contact).collect()
    }
}

/// Builds a [`ContactPlan`] from the gait schedule and the measured state.
#[derive(Clone, Debug)]
pub struct ContactPlanBuilder {
    schedule: GaitSchedule,
    horizon_steps: usize,
    gait_dt: f64,
    /// Per-leg XY placement bias, derived once from the hip-to-CoM vectors
    /// at the nominal stance pose.
    offsets: Vec<Vector2<f64>>,
}

impl ContactPlanBuilder {
    /// Create a builder for one gait style.
    ///
    /// `nominal_state` is the stance pose used to derive the per-leg
    /// placement offsets; it is read once here and never stored.
    #[must_use]
    pub fn new(
        params: &MotionParams,
        model: &dyn DynamicsModel,
        nominal_state: &RobotState,
    ) -> Self {
        let com = model.com_position(nominal_state);
        let offsets = model
            .hip_positions(nominal_state)
            .iter()
            .map(|hip| {
                let mut offset = Vector2::new(round_mm(hip.x - com.x), round_mm(hip.y - com.y));
                // Widen laterally, away from the body centerline.
                offset.y += LATERAL_WIDENING * offset.y.signum();
                offset
            })
            .collect();

        Self {
            schedule: GaitSchedule::new(params),
            horizon_steps: params.horizon_steps(),
            gait_dt: params.gait_dt,
            offsets,
        }
    }

    /// Build the contact plan for the horizon starting at time `t`.
    ///
    /// Stance runs already active at plan start freeze the measured foot
    /// contact point; stance runs that begin inside the horizon freeze the
    /// heuristic placement (CoM projected at the desired velocity, plus the
    /// leg's placement offset) computed at the step the run begins.
    #[must_use]
    pub fn build(
        &self,
        model: &dyn DynamicsModel,
        state: &RobotState,
        t: f64,
        desired_velocity: &Vector3<f64>,
    ) -> ContactPlan {
        let n_legs = self.schedule.n_legs();
        let feet = model.foot_positions(state);
        let com = model.com_position(state);

        let mut steps = Vec::with_capacity(self.horizon_steps);
        let mut frozen: Vec<Option<Vector3<f64>>> = vec![None; n_legs];
        let mut ever_stance = vec![false; n_legs];

        for i in 0..self.horizon_steps {
            #[allow(clippy::cast_precision_loss)]
            let dt_ahead = i as f64 * self.gait_dt;
            let ft = t + dt_ahead;

            let mut step = Vec::with_capacity(n_legs);
            for leg in 0..n_legs {
                let point = if self.schedule.phase(ft, leg) == GaitPhase::Stance {
                    ever_stance[leg] = true;
                    let target = *frozen[leg].get_or_insert_with(|| {
                        if i == 0 {
                            // Run already active: keep the measured contact.
                            round_position(&feet[leg])
                        } else {
                            self.placement(&com, desired_velocity, dt_ahead, leg, feet[leg].z)
                        }
                    });
                    ContactPoint {
                        in_contact: true,
                        position: target,
                        radius: FOOT_RADIUS,
                    }
                } else {
                    frozen[leg] = None;
                    ContactPoint {
                        in_contact: false,
                        position: round_position(&feet[leg]),
                        radius: FOOT_RADIUS,
                    }
                };
                step.push(point);
            }
            steps.push(step);
        }

        for (leg, reached) in ever_stance.iter().enumerate() {
            if !reached {
                // Legitimate degenerate column: the kinematics solver treats
                // the leg as unconstrained motion.
                warn!("leg {leg} never reaches stance within the {}-step horizon", self.horizon_steps);
            }
        }

        ContactPlan { steps }
    }

    /// Heuristic foot placement for a stance run beginning `dt_ahead`
    /// seconds into the horizon.
    fn placement(
        &self,
        com: &Vector3<f64>,
        desired_velocity: &Vector3<f64>,
        dt_ahead: f64,
        leg: usize,
        ground_z: f64,
    ) -> Vector3<f64> {
        let offset = &self.offsets[leg];
        round_position(&Vector3::new(
            com.x + desired_velocity.x * dt_ahead + offset.x,
            com.y + desired_velocity.y * dt_ahead + offset.y,
            ground_z,
        ))
    }

    /// Per-leg XY placement offsets (hip-to-CoM plus lateral widening).
    #[must_use]
    pub fn offsets(&self) -> &[Vector2<f64>] {
        &self.offsets
    }
}

/// Round to millimeters; keeps plan targets stable across re-plans when the
/// measured state only jitters below sensor resolution.
fn round_mm(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn round_position(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(round_mm(p.x), round_mm(p.y), round_mm(p.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DVector, UnitQuaternion};
    use strider_core::{CentroidalState, MotionParams};

    /// Minimal fixed-geometry model: feet and hips at constant world
    /// positions, CoM at the base position.
    struct FixedModel {
        feet: Vec<Vector3<f64>>,
        hips: Vec<Vector3<f64>>,
    }

    impl FixedModel {
        fn quadruped() -> Self {
            Self {
                feet: vec![
                    Vector3::new(0.15, 0.08, 0.0),
                    Vector3::new(0.15, -0.08, 0.0),
                    Vector3::new(-0.15, 0.08, 0.0),
                    Vector3::new(-0.15, -0.08, 0.0),
                ],
                hips: vec![
                    Vector3::new(0.15, 0.08, 0.3),
                    Vector3::new(0.15, -0.08, 0.3),
                    Vector3::new(-0.15, 0.08, 0.3),
                    Vector3::new(-0.15, -0.08, 0.3),
                ],
            }
        }
    }

    impl DynamicsModel for FixedModel {
        fn total_mass(&self) -> f64 {
            9.0
        }
        fn n_legs(&self) -> usize {
            self.feet.len()
        }
        fn nv(&self) -> usize {
            18
        }
        fn com_position(&self, state: &RobotState) -> Vector3<f64> {
            Vector3::new(state.q[0], state.q[1], state.q[2])
        }
        fn centroidal_state(&self, state: &RobotState) -> CentroidalState {
            CentroidalState {
                com: self.com_position(state),
                lin_momentum: Vector3::zeros(),
                ang_momentum: Vector3::zeros(),
            }
        }
        fn base_orientation(&self, _state: &RobotState) -> UnitQuaternion<f64> {
            UnitQuaternion::identity()
        }
        fn foot_positions(&self, _state: &RobotState) -> Vec<Vector3<f64>> {
            self.feet.clone()
        }
        fn hip_positions(&self, _state: &RobotState) -> Vec<Vector3<f64>> {
            self.hips.clone()
        }
    }

    fn standing_state() -> RobotState {
        let mut q = DVector::zeros(19);
        q[2] = 0.3;
        q[6] = 1.0; // identity quaternion (xyzw)
        RobotState::new(q, DVector::zeros(18))
    }

    #[test]
    fn plan_dimensions_match_horizon() {
        let params = MotionParams::trot(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());
        let plan = builder.build(&model, &standing_state(), 0.0, &Vector3::new(0.3, 0.0, 0.0));

        assert_eq!(plan.n_steps(), params.horizon_steps());
        assert_eq!(plan.n_legs(), 4);
    }

    #[test]
    fn stance_runs_share_one_frozen_target() {
        let params = MotionParams::trot(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());
        let plan = builder.build(&model, &standing_state(), 0.0, &Vector3::new(0.3, 0.0, 0.0));

        for leg in 0..plan.n_legs() {
            let mut run_target: Option<Vector3<f64>> = None;
            for step in 0..plan.n_steps() {
                let point = plan.get(step, leg);
                if point.in_contact {
                    match run_target {
                        Some(target) => assert_relative_eq!(
                            (point.position - target).norm(),
                            0.0,
                            epsilon = 1e-12
                        ),
                        None => run_target = Some(point.position),
                    }
                } else {
                    run_target = None;
                }
            }
        }
    }

    #[test]
    fn active_stance_run_uses_measured_foot() {
        let params = MotionParams::trot(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());
        let plan = builder.build(&model, &standing_state(), 0.0, &Vector3::new(0.3, 0.0, 0.0));

        // FL (leg 0) is in stance at t=0: its target must be the measured
        // foot position, not a velocity-projected placement.
        let point = plan.get(0, 0);
        assert!(point.in_contact);
        assert_relative_eq!((point.position - model.feet[0]).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn future_stance_run_uses_projected_placement() {
        let params = MotionParams::trot(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());
        let v_des = Vector3::new(0.3, 0.0, 0.0);
        let plan = builder.build(&model, &standing_state(), 0.0, &v_des);

        // FL leaves stance at fraction 0.65 and re-enters at the next cycle
        // start (step 8 of the 0.05 s grid with period 0.4). Find the first
        // future touchdown and check it against the placement law.
        let mut prev_contact = true;
        for step in 1..plan.n_steps() {
            let point = plan.get(step, 0);
            if point.in_contact && !prev_contact {
                #[allow(clippy::cast_precision_loss)]
                let dt_ahead = step as f64 * params.gait_dt;
                let expected_x = 0.0 + v_des.x * dt_ahead + builder.offsets()[0].x;
                assert_relative_eq!(point.position.x, expected_x, epsilon = 1e-3);
                // Lateral widening pushes the left-side target outward.
                assert!(point.position.y > model.feet[0].y);
                return;
            }
            prev_contact = point.in_contact;
        }
        panic!("trot horizon of two periods must contain a future touchdown");
    }

    #[test]
    fn swing_entries_hold_current_position() {
        let params = MotionParams::trot(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());
        let plan = builder.build(&model, &standing_state(), 0.0, &Vector3::zeros());

        for step in 0..plan.n_steps() {
            for leg in 0..plan.n_legs() {
                let point = plan.get(step, leg);
                if !point.in_contact {
                    assert_relative_eq!(
                        (point.position - model.feet[leg]).norm(),
                        0.0,
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn stand_gait_freezes_initial_feet_everywhere() {
        let params = MotionParams::stand(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());
        let plan = builder.build(&model, &standing_state(), 0.0, &Vector3::zeros());

        for step in 0..plan.n_steps() {
            for leg in 0..plan.n_legs() {
                let point = plan.get(step, leg);
                assert!(point.in_contact, "stand gait keeps every leg planted");
                assert_relative_eq!(
                    (point.position - model.feet[leg]).norm(),
                    0.0,
                    epsilon = 1e-12
                );
                assert_relative_eq!(point.radius, FOOT_RADIUS);
            }
        }
    }

    #[test]
    fn offsets_widen_away_from_centerline() {
        let params = MotionParams::trot(12);
        let model = FixedModel::quadruped();
        let builder = ContactPlanBuilder::new(&params, &model, &standing_state());

        // Left legs (positive hip y) get pushed further left, right legs
        // further right.
        assert_relative_eq!(builder.offsets()[0].y, 0.08 + 0.04, epsilon = 1e-12);
        assert_relative_eq!(builder.offsets()[1].y, -0.08 - 0.04, epsilon = 1e-12);
        assert_relative_eq!(builder.offsets()[2].x, -0.15, epsilon = 1e-12);
    }
}
