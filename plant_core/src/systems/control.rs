//! Closed-loop level control.

use crate::registry::Registry;

/// Updates every PID: integrates the error and writes a clamped output.
///
/// The integral is unbounded (no anti-windup). The derivative slot is kept
/// for `kd` but currently contributes nothing.
pub fn run(reg: &mut Registry, dt: f64) {
    for (_, pid) in reg.pids.iter_mut() {
        let error = pid.setpoint - pid.measured;
        pid.integral += error * dt;
        let derivative = 0.0;
        pid.output = (pid.kp * error + pid.ki * pid.integral + pid.kd * derivative).clamp(0.0, 1.0);
    }
}
