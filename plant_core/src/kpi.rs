//! Site KPI summary.
//!
//! A read-only digest of the [`SiteKpi`] singleton for reporting. The
//! counters themselves are owned by the registry and updated only by the
//! response pass.

use crate::components::SiteKpi;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};

/// Point-in-time KPI digest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub alarms_raised: u64,
    pub alarms_active: u64,
    pub downtime_seconds: f64,
    /// Fraction of elapsed time with no alarm being worked, in [0, 1]
    pub availability: f64,
}

impl KpiSummary {
    /// Builds a summary from the counters and the simulated time elapsed.
    ///
    /// Downtime accrues once per active alarm, so with overlapping alarms it
    /// can exceed elapsed time; availability is clamped at 0.
    pub fn from_site(kpi: &SiteKpi, elapsed_secs: f64) -> Self {
        let availability = if elapsed_secs > 0.0 {
            (1.0 - kpi.downtime_seconds / elapsed_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            alarms_raised: kpi.alarms_raised,
            alarms_active: kpi.alarms_active,
            downtime_seconds: kpi.downtime_seconds,
            availability,
        }
    }

    /// Summary of the registry's site KPI entity, if there is one.
    pub fn from_registry(reg: &Registry, elapsed_secs: f64) -> Option<Self> {
        let site = reg.unique::<SiteKpi>()?;
        reg.get::<SiteKpi>(site)
            .map(|kpi| Self::from_site(kpi, elapsed_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_from_downtime() {
        let kpi = SiteKpi {
            alarms_raised: 2,
            alarms_active: 1,
            downtime_seconds: 25.0,
        };
        let summary = KpiSummary::from_site(&kpi, 100.0);
        assert_eq!(summary.alarms_raised, 2);
        assert_eq!(summary.alarms_active, 1);
        assert!((summary.availability - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_availability_at_time_zero() {
        let summary = KpiSummary::from_site(&SiteKpi::default(), 0.0);
        assert_eq!(summary.availability, 1.0);
    }

    #[test]
    fn test_overlapping_downtime_clamped() {
        let kpi = SiteKpi {
            downtime_seconds: 300.0,
            ..SiteKpi::default()
        };
        assert_eq!(KpiSummary::from_site(&kpi, 100.0).availability, 0.0);
    }

    #[test]
    fn test_from_registry_without_site() {
        let reg = Registry::new();
        assert!(KpiSummary::from_registry(&reg, 1.0).is_none());
    }
}
