//! Alarm response lifecycle.
//!
//! Each entity carrying both [`Alarmable`] and [`AlarmResponse`] walks
//!
//! ```text
//!   Idle ──(hi|lo)──► Unacknowledged ──ack_timer<=0──► Repairing
//!    ▲                      │                              │
//!    │          auto-cancel (blip cleared before ack)      │
//!    └──────────────────────┴────────repair_timer<=0───────┘
//! ```
//!
//! Timers are seeded from the nominal targets scaled by the site reaction
//! multiplier (1.0 without a `HumanFactors` entity). The site `SiteKpi`
//! counters are updated when present and silently skipped otherwise.
//! Nothing persists between ticks except the component fields.

use crate::components::{AlarmResponse, Alarmable, SiteKpi};
use crate::entity::Entity;
use crate::registry::{join, Registry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What an auto-cancelled alarm does to `alarms_raised`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoCancelPolicy {
    /// The raise still counts; only `alarms_active` is decremented.
    #[default]
    KeepRaised,
    /// The raise is retracted: `alarms_raised` is decremented too.
    RetractRaised,
}

/// Advances every alarm response by one tick.
pub fn run(reg: &mut Registry, dt: f64, policy: AutoCancelPolicy) {
    let Registry {
        alarms,
        responses,
        human_factors,
        site_kpis,
        ..
    } = reg;

    let multiplier = human_factors
        .first()
        .map_or(1.0, |(_, hf)| hf.reaction_multiplier);
    let mut kpi = site_kpis.iter_mut().next().map(|(_, kpi)| kpi);

    for (entity, alarm, response) in join(alarms.iter_mut(), responses.iter_mut()) {
        step(entity, alarm, response, kpi.as_deref_mut(), multiplier, dt, policy);
    }
}

fn step(
    entity: Entity,
    alarm: &mut Alarmable,
    response: &mut AlarmResponse,
    mut kpi: Option<&mut SiteKpi>,
    multiplier: f64,
    dt: f64,
    policy: AutoCancelPolicy,
) {
    if !response.active && alarm.condition() {
        response.active = true;
        response.acknowledged = false;
        response.ack_timer = response.ack_target * multiplier;
        response.repair_timer = response.repair_target * multiplier;
        if let Some(kpi) = kpi.as_deref_mut() {
            kpi.alarms_raised += 1;
            kpi.alarms_active += 1;
        }
        debug!(
            "alarm {} raised (hi={}, lo={}, ack in {:.2}s)",
            entity, alarm.hi, alarm.lo, response.ack_timer
        );
    }

    let blip_cleared = !alarm.condition() && !alarm.latched;
    if response.active && !response.acknowledged && blip_cleared && response.ack_timer > 0.0 {
        response.active = false;
        if let Some(kpi) = kpi {
            kpi.alarms_active = kpi.alarms_active.saturating_sub(1);
            if policy == AutoCancelPolicy::RetractRaised {
                kpi.alarms_raised = kpi.alarms_raised.saturating_sub(1);
            }
        }
        debug!("alarm {} auto-cancelled before acknowledgment", entity);
        return;
    }

    if !response.active {
        return;
    }

    if let Some(kpi) = kpi.as_deref_mut() {
        kpi.downtime_seconds += dt;
    }

    if !response.acknowledged {
        response.ack_timer -= dt;
        if response.ack_timer <= 0.0 {
            response.acknowledged = true;
            debug!("alarm {} acknowledged", entity);
        }
    } else {
        response.repair_timer -= dt;
        if response.repair_timer <= 0.0 {
            alarm.latched = false;
            response.active = false;
            response.acknowledged = false;
            if let Some(kpi) = kpi {
                kpi.alarms_active = kpi.alarms_active.saturating_sub(1);
            }
            debug!("alarm {} repaired", entity);
        }
    }
}
