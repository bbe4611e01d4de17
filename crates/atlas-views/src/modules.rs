//! Co-activation modules of a layer.

use std::collections::HashMap;

use serde::Serialize;

use atlas_common::artifacts::{FeatureRecord, Module};

/// Modules of `layer`, largest first. Equal sizes keep file order.
pub fn layer_modules(modules: &[Module], layer: u32) -> Vec<&Module> {
    let mut found: Vec<&Module> = modules.iter().filter(|m| m.layer == layer).collect();
    found.sort_by(|a, b| b.size.cmp(&a.size));
    found
}

pub fn find_module(modules: &[Module], layer: u32, id: i32) -> Option<&Module> {
    modules.iter().find(|m| m.layer == layer && m.id == id)
}

#[derive(Debug, Serialize)]
pub struct ModuleDetail<'a> {
    pub module: &'a Module,
    /// Member records in module order
    pub members: Vec<&'a FeatureRecord>,
    /// Member ids with no feature record
    pub missing: Vec<u32>,
}

pub fn module_detail<'a>(
    modules: &'a [Module],
    layer: u32,
    id: i32,
    features: &'a [FeatureRecord],
) -> Option<ModuleDetail<'a>> {
    let module = find_module(modules, layer, id)?;
    let by_id: HashMap<u32, &FeatureRecord> = features.iter().map(|f| (f.id, f)).collect();

    let mut members = Vec::with_capacity(module.features.len());
    let mut missing = Vec::new();
    for fid in &module.features {
        match by_id.get(fid) {
            Some(record) => members.push(*record),
            None => missing.push(*fid),
        }
    }

    Some(ModuleDetail { module, members, missing })
}
