//! Pump flow and tank level integration.

use crate::registry::Registry;

/// Added to the line resistance so a zero `k` cannot divide by zero.
pub const RESISTANCE_EPSILON: f64 = 1e-3;

/// Floor for tank area.
const MIN_TANK_AREA: f64 = 1e-6;

/// Computes pump flow and integrates any tank on the same entity.
///
/// A missing valve counts as fully open and a missing pipe as unit
/// resistance. The tank has no outlet model yet, so outflow is always zero.
/// The freshly integrated level is written into the entity's PID, which the
/// control pass consumes on the *next* tick.
pub fn run(reg: &mut Registry, dt: f64) {
    let Registry {
        pumps,
        valves,
        pipes,
        tanks,
        pids,
        ..
    } = reg;

    for (entity, pump) in pumps.iter_mut() {
        let pressure = if pump.running { pump.nominal_dp } else { 0.0 };
        let opening = valves.get(entity).map_or(1.0, |valve| valve.position);
        let resistance = pipes.get(entity).map_or(1.0, |pipe| pipe.resistance);
        pump.flow = opening * pressure / (resistance + RESISTANCE_EPSILON);

        let Some(tank) = tanks.get_mut(entity) else {
            continue;
        };
        tank.inflow = pump.flow;
        tank.outflow = 0.0;
        let area = tank.area.max(MIN_TANK_AREA);
        tank.level = (tank.level + (tank.inflow - tank.outflow) / area * dt).clamp(0.0, 1.0);

        if let Some(pid) = pids.get_mut(entity) {
            pid.measured = tank.level;
        }
    }
}
