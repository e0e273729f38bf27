//! First-order lag model of a valve-modulated heat exchanger.

use crate::registry::{join, Registry};

/// Floor applied to the flow rate and to the effective time constant.
pub const MIN_TAU: f64 = 0.1;

/// Moves each powered exchanger's outlet toward `inlet * valve_position`.
///
/// The effective time constant shrinks with flow rate. `alpha` is clamped
/// to 1, so a large `dt` lands exactly on the target instead of overshooting.
pub fn run(reg: &mut Registry, dt: f64) {
    for (_, hx, valve) in join(reg.heat_exchangers.iter_mut(), reg.valves.iter()) {
        if !hx.powered {
            continue;
        }
        let target = hx.inlet_stream * valve.position.clamp(0.0, 1.0);
        let tau = (hx.time_constant / hx.flow_rate.max(MIN_TAU)).max(MIN_TAU);
        let alpha = (dt / tau).clamp(0.0, 1.0);
        hx.outlet_stream += alpha * (target - hx.outlet_stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{HeatExchanger, ValveActuator};
    use approx::assert_relative_eq;

    fn exchanger(reg: &mut Registry, hx: HeatExchanger, position: f64) -> crate::Entity {
        let e = reg.spawn(hx);
        reg.insert(e, ValveActuator { position, ..ValveActuator::default() })
            .unwrap();
        e
    }

    #[test]
    fn test_lag_step() {
        let mut reg = Registry::new();
        let e = exchanger(
            &mut reg,
            HeatExchanger {
                inlet_stream: 2.0,
                outlet_stream: 0.0,
                flow_rate: 1.0,
                time_constant: 5.0,
                ..HeatExchanger::default()
            },
            0.5,
        );

        run(&mut reg, 0.5);

        // target 1.0, tau 5.0, alpha 0.1
        assert_relative_eq!(
            reg.get::<HeatExchanger>(e).unwrap().outlet_stream,
            0.1,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_large_dt_does_not_overshoot() {
        let mut reg = Registry::new();
        let e = exchanger(
            &mut reg,
            HeatExchanger {
                inlet_stream: 1.0,
                outlet_stream: 0.0,
                time_constant: 1.0,
                ..HeatExchanger::default()
            },
            0.8,
        );

        run(&mut reg, 100.0);

        assert_relative_eq!(
            reg.get::<HeatExchanger>(e).unwrap().outlet_stream,
            0.8,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_flow_and_tau_guarded() {
        let mut reg = Registry::new();
        let e = exchanger(
            &mut reg,
            HeatExchanger {
                inlet_stream: 1.0,
                outlet_stream: 0.0,
                flow_rate: 0.0,
                time_constant: 0.0,
                ..HeatExchanger::default()
            },
            1.0,
        );

        run(&mut reg, 0.02);

        // tau floored at 0.1 -> alpha 0.2
        let outlet = reg.get::<HeatExchanger>(e).unwrap().outlet_stream;
        assert!(outlet.is_finite());
        assert_relative_eq!(outlet, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_unpowered_skipped() {
        let mut reg = Registry::new();
        let e = exchanger(
            &mut reg,
            HeatExchanger {
                powered: false,
                outlet_stream: 0.25,
                ..HeatExchanger::default()
            },
            1.0,
        );

        run(&mut reg, 1.0);

        assert_eq!(reg.get::<HeatExchanger>(e).unwrap().outlet_stream, 0.25);
    }

    #[test]
    fn test_exchanger_without_valve_skipped() {
        let mut reg = Registry::new();
        let e = reg.spawn(HeatExchanger {
            outlet_stream: 0.0,
            ..HeatExchanger::default()
        });

        run(&mut reg, 1.0);

        assert_eq!(reg.get::<HeatExchanger>(e).unwrap().outlet_stream, 0.0);
    }
}
