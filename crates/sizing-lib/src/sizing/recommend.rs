//! Buffered and clamped capacity recommendations
//!
//! One function covers both resource families; the [`Capacity`] variant picks
//! the clamp policy. CPU is integral, so the result is rounded up and kept
//! between 1 vCPU and the provisioned count. Memory is continuous: a VM that
//! is already provisioned below 1 GiB keeps its exact size instead of being
//! raised to the 1 GiB floor.

use serde::{Deserialize, Serialize};

use crate::models::{JoinedVm, StatisticSet, VmRecord};

/// Multiplier applied to observed utilization before clamping (20% headroom)
pub const HEADROOM_FACTOR: f64 = 1.2;

/// Smallest recommendation for a VM provisioned with at least this much
pub const CPU_FLOOR_VCPUS: u32 = 1;
pub const MEMORY_FLOOR_GIB: f64 = 1.0;

/// Provisioned or recommended capacity of one resource family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum Capacity {
    Vcpus(u32),
    Gib(f64),
}

impl Capacity {
    pub fn as_f64(self) -> f64 {
        match self {
            Capacity::Vcpus(v) => v as f64,
            Capacity::Gib(g) => g,
        }
    }
}

/// Recommended capacity for `provisioned` at utilization `pct` (0-100).
///
/// Without a sample (`None` or NaN) the provisioned capacity is returned
/// unchanged. The result never exceeds `provisioned`.
pub fn recommend(provisioned: Capacity, pct: Option<f64>) -> Capacity {
    let Some(pct) = pct.filter(|p| !p.is_nan()) else {
        return provisioned;
    };
    let raw = provisioned.as_f64() * (pct / 100.0) * HEADROOM_FACTOR;

    match provisioned {
        Capacity::Vcpus(vcpus) => {
            let rounded = raw.ceil();
            if rounded >= vcpus as f64 {
                Capacity::Vcpus(vcpus)
            } else {
                Capacity::Vcpus((rounded as u32).max(CPU_FLOOR_VCPUS).min(vcpus))
            }
        }
        Capacity::Gib(gib) => {
            let value = if raw < MEMORY_FLOOR_GIB {
                if gib < MEMORY_FLOOR_GIB {
                    gib
                } else {
                    MEMORY_FLOOR_GIB
                }
            } else if raw >= gib {
                gib
            } else {
                raw.ceil().min(gib)
            };
            Capacity::Gib(value)
        }
    }
}

/// Derive every per-statistic recommendation for one joined VM.
///
/// A facet without metrics counts as zero provisioned capacity.
pub fn recommend_vm(vm: JoinedVm) -> VmRecord {
    let has_cpu_metrics = vm.cpu.is_some();
    let has_memory_metrics = vm.memory.is_some();
    let cpu = vm.cpu.unwrap_or_default();
    let memory = vm.memory.unwrap_or_default();

    let cpu_recommended = StatisticSet::from_fn(|statistic| {
        let pct = cpu.utilization_pct.get(statistic);
        match recommend(Capacity::Vcpus(cpu.provisioned_vcpus), pct) {
            Capacity::Vcpus(v) => v,
            other => other.as_f64() as u32,
        }
    });
    let memory_recommended = StatisticSet::from_fn(|statistic| {
        let pct = memory.utilization_pct.get(statistic);
        recommend(Capacity::Gib(memory.provisioned_gib), pct).as_f64()
    });

    VmRecord {
        name: vm.name,
        join_key: vm.join_key,
        power_state: vm.power_state,
        cluster: vm.cluster,
        provisioned_vcpus: cpu.provisioned_vcpus,
        cpu_pct: cpu.utilization_pct,
        cpu_recommended,
        provisioned_memory_gib: memory.provisioned_gib,
        memory_pct: memory.utilization_pct,
        memory_recommended,
        has_cpu_metrics,
        has_memory_metrics,
    }
}

/// Apply [`recommend_vm`] to every joined VM, keeping order
pub fn recommend_all(vms: Vec<JoinedVm>) -> Vec<VmRecord> {
    vms.into_iter().map(recommend_vm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuUsage, MemoryUsage, Statistic};

    fn vcpus(provisioned: u32, pct: Option<f64>) -> u32 {
        match recommend(Capacity::Vcpus(provisioned), pct) {
            Capacity::Vcpus(v) => v,
            other => panic!("CPU recommendation returned {:?}", other),
        }
    }

    fn gib(provisioned: f64, pct: Option<f64>) -> f64 {
        match recommend(Capacity::Gib(provisioned), pct) {
            Capacity::Gib(g) => g,
            other => panic!("memory recommendation returned {:?}", other),
        }
    }

    #[test]
    fn test_cpu_rounds_up_buffered_usage() {
        // 8 * 0.40 * 1.2 = 3.84
        assert_eq!(vcpus(8, Some(40.0)), 4);
        // 16 * 0.25 * 1.2 = 4.8
        assert_eq!(vcpus(16, Some(25.0)), 5);
    }

    #[test]
    fn test_cpu_floor_and_cap() {
        assert_eq!(vcpus(8, Some(0.0)), 1);
        assert_eq!(vcpus(8, Some(1.0)), 1);
        assert_eq!(vcpus(4, Some(95.0)), 4);
        assert_eq!(vcpus(4, Some(250.0)), 4);
        assert_eq!(vcpus(0, Some(50.0)), 0);
    }

    #[test]
    fn test_cpu_exact_provisioned_boundary() {
        // buffered usage lands on the provisioned count
        assert_eq!(vcpus(6, Some(100.0 / 1.2)), 6);
    }

    #[test]
    fn test_missing_pct_keeps_provisioned() {
        assert_eq!(vcpus(4, None), 4);
        assert_eq!(vcpus(4, Some(f64::NAN)), 4);
        assert_eq!(gib(12.5, None), 12.5);
        assert_eq!(gib(0.25, Some(f64::NAN)), 0.25);
    }

    #[test]
    fn test_memory_small_vm_keeps_exact_size() {
        // 0.5 * 0.9 * 1.2 = 0.54 < 1 and provisioned < 1
        assert_eq!(gib(0.5, Some(90.0)), 0.5);
    }

    #[test]
    fn test_memory_floor_at_one_gib() {
        // 4 * 0.1 * 1.2 = 0.48
        assert_eq!(gib(4.0, Some(10.0)), 1.0);
    }

    #[test]
    fn test_memory_rounds_up_and_caps() {
        // 16 * 0.5 * 1.2 = 9.6
        assert_eq!(gib(16.0, Some(50.0)), 10.0);
        assert_eq!(gib(16.0, Some(90.0)), 16.0);
        // ceil(3.5) would exceed a fractional provisioned size
        assert_eq!(gib(3.75, Some(3.5 / 3.75 / 1.2 * 100.0)), 3.75);
    }

    #[test]
    fn test_recommend_vm_without_metrics() {
        let record = recommend_vm(JoinedVm {
            name: "legacy02".to_string(),
            join_key: "vm-200".to_string(),
            power_state: "poweredOff".to_string(),
            cluster: "prod".to_string(),
            cpu: Some(CpuUsage {
                provisioned_vcpus: 4,
                utilization_pct: StatisticSet::splat(None),
            }),
            memory: None,
        });

        assert_eq!(record.cpu_recommended, StatisticSet::splat(4));
        assert_eq!(record.memory_recommended, StatisticSet::splat(0.0));
        assert!(record.has_cpu_metrics);
        assert!(!record.has_memory_metrics);
    }

    #[test]
    fn test_recommend_vm_per_statistic() {
        let record = recommend_vm(JoinedVm {
            name: "db01".to_string(),
            join_key: "vm-101".to_string(),
            power_state: "poweredOn".to_string(),
            cluster: "prod".to_string(),
            cpu: Some(CpuUsage {
                provisioned_vcpus: 8,
                utilization_pct: StatisticSet {
                    peak: Some(90.0),
                    average: Some(20.0),
                    median: None,
                    p95: Some(40.0),
                },
            }),
            memory: Some(MemoryUsage {
                provisioned_gib: 32.0,
                utilization_pct: StatisticSet {
                    peak: Some(75.0),
                    average: Some(25.0),
                    median: Some(2.0),
                    p95: Some(50.0),
                },
            }),
        });

        assert_eq!(record.cpu_recommended.get(Statistic::Peak), 8);
        assert_eq!(record.cpu_recommended.get(Statistic::Average), 2);
        assert_eq!(record.cpu_recommended.get(Statistic::Median), 8);
        assert_eq!(record.cpu_recommended.get(Statistic::Percentile95), 4);
        assert_eq!(record.memory_recommended.get(Statistic::Peak), 29.0);
        assert_eq!(record.memory_recommended.get(Statistic::Average), 10.0);
        assert_eq!(record.memory_recommended.get(Statistic::Median), 1.0);
        assert_eq!(record.memory_recommended.get(Statistic::Percentile95), 20.0);
    }
}
