//! Inventory-anchored join of the metric sheets

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{
    CpuMetricRecord, CpuUsage, InventoryRecord, JoinedVm, MemoryMetricRecord, MemoryUsage,
};

/// Left outer join `inventory ⟕ cpu ⟕ memory` on the join key.
///
/// Output order and cardinality follow `inventory`. Inventory rows without a
/// metric row keep `None` for that facet; metric rows without an inventory
/// row are dropped. When a metric sheet repeats a key the first row wins.
pub fn join(
    inventory: &[InventoryRecord],
    cpu: &[CpuMetricRecord],
    memory: &[MemoryMetricRecord],
) -> Vec<JoinedVm> {
    let cpu_by_key = index_by_key(cpu, |r| r.join_key.as_str());
    let memory_by_key = index_by_key(memory, |r| r.join_key.as_str());

    let joined: Vec<JoinedVm> = inventory
        .iter()
        .map(|vm| JoinedVm {
            name: vm.name.clone(),
            join_key: vm.join_key.clone(),
            power_state: vm.power_state.clone(),
            cluster: vm.cluster.clone(),
            cpu: cpu_by_key.get(vm.join_key.as_str()).map(|r| CpuUsage {
                provisioned_vcpus: r.provisioned_vcpus,
                utilization_pct: r.utilization_pct,
            }),
            memory: memory_by_key.get(vm.join_key.as_str()).map(|r| MemoryUsage {
                provisioned_gib: r.provisioned_gib,
                utilization_pct: r.utilization_pct,
            }),
        })
        .collect();

    let inventory_keys: HashSet<&str> = inventory.iter().map(|r| r.join_key.as_str()).collect();
    let orphan_cpu = cpu_by_key.keys().filter(|k| !inventory_keys.contains(*k)).count();
    let orphan_memory = memory_by_key
        .keys()
        .filter(|k| !inventory_keys.contains(*k))
        .count();
    debug!(
        vms = joined.len(),
        cpu_matched = joined.iter().filter(|vm| vm.cpu.is_some()).count(),
        memory_matched = joined.iter().filter(|vm| vm.memory.is_some()).count(),
        orphan_cpu,
        orphan_memory,
        "Joined metric sheets onto inventory"
    );

    joined
}

fn index_by_key<'a, T>(records: &'a [T], key: impl Fn(&T) -> &str) -> HashMap<&'a str, &'a T> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.entry(key(record)).or_insert(record);
    }
    index
}
