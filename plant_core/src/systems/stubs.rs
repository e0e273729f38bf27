//! Declared extension points.
//!
//! These passes hold their slot in the pipeline but do not touch the store
//! yet. They must stay safe to call on any registry state.

use crate::registry::Registry;

pub fn utility_balance(_reg: &mut Registry, _dt: f64) {}

pub fn boiler(_reg: &mut Registry, _dt: f64) {}

pub fn refrigeration(_reg: &mut Registry, _dt: f64) {}

pub fn analytics(_reg: &mut Registry, _dt: f64) {}
