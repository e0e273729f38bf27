//! Threshold alarms on tank level.

use crate::registry::{join, Registry};

/// Recomputes `hi`/`lo` from the current level and latches them.
///
/// `hi` and `lo` are instantaneous and may flicker. `latched` only ever goes
/// from false to true here; clearing it is the response pass's job.
pub fn run(reg: &mut Registry) {
    for (_, alarm, tank) in join(reg.alarms.iter_mut(), reg.tanks.iter()) {
        alarm.hi = tank.level > alarm.hi_threshold;
        alarm.lo = tank.level < alarm.lo_threshold;
        alarm.latched = alarm.latched || alarm.hi || alarm.lo;
    }
}
