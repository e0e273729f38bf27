//! Rate-limited valve travel.

use crate::registry::{join, Registry};

/// Moves each PID-driven valve toward the controller output.
///
/// Travel per tick is bounded by `speed * dt` however large the commanded
/// jump is.
pub fn run(reg: &mut Registry, dt: f64) {
    for (_, valve, pid) in join(reg.valves.iter_mut(), reg.pids.iter()) {
        valve.command = pid.output;
        let max_step = (valve.speed * dt).max(0.0);
        let step = (valve.command - valve.position).clamp(-max_step, max_step);
        valve.position = (valve.position + step).clamp(0.0, 1.0);
    }
}
