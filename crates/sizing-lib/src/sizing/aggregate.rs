//! Cluster-wide totals and savings

use serde::{Deserialize, Serialize};

use crate::models::{ResourceKind, Statistic, VmRecord};

/// Row labels of an overview, in order
pub const OVERVIEW_LABELS: [&str; 5] = [
    "Provisioned",
    "Peak",
    "Average",
    "Median",
    "95th Percentile",
];

/// One `(label, total)` pair of an overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub label: String,
    /// `None` for the provisioned row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<Statistic>,
    pub total: f64,
}

/// Provisioned and per-statistic recommended totals for one resource family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewAggregate {
    pub resource: ResourceKind,
    pub unit: String,
    pub rows: Vec<OverviewRow>,
}

impl OverviewAggregate {
    fn from_totals(resource: ResourceKind, totals: [f64; 5]) -> Self {
        let statistics = [None]
            .into_iter()
            .chain(Statistic::ALL.into_iter().map(Some));
        let rows = OVERVIEW_LABELS
            .iter()
            .zip(statistics)
            .zip(totals)
            .map(|((label, statistic), total)| OverviewRow {
                label: label.to_string(),
                statistic,
                total,
            })
            .collect();

        Self {
            resource,
            unit: resource.unit().to_string(),
            rows,
        }
    }

    /// Totals in label order
    pub fn totals(&self) -> [f64; 5] {
        let mut totals = [0.0; 5];
        for (slot, row) in totals.iter_mut().zip(&self.rows) {
            *slot = row.total;
        }
        totals
    }

    pub fn provisioned(&self) -> f64 {
        self.totals()[0]
    }

    pub fn recommended(&self, statistic: Statistic) -> f64 {
        self.rows
            .iter()
            .find(|row| row.statistic == Some(statistic))
            .map(|row| row.total)
            .unwrap_or(0.0)
    }

    /// Provisioned minus recommended; negative values are kept
    pub fn savings(&self, statistic: Statistic) -> f64 {
        self.provisioned() - self.recommended(statistic)
    }
}

/// Sum provisioned and recommended capacity over `records`.
///
/// CPU totals are summed as integers so they stay exact.
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a VmRecord>,
    resource: ResourceKind,
) -> OverviewAggregate {
    let totals = match resource {
        ResourceKind::Cpu => {
            let mut sums = [0u64; 5];
            for record in records {
                sums[0] += u64::from(record.provisioned_vcpus);
                for (slot, (_, value)) in sums[1..].iter_mut().zip(record.cpu_recommended.iter()) {
                    *slot += u64::from(value);
                }
            }
            sums.map(|sum| sum as f64)
        }
        ResourceKind::Memory => {
            let mut sums = [0.0f64; 5];
            for record in records {
                sums[0] += record.provisioned_memory_gib;
                for (slot, (_, value)) in sums[1..].iter_mut().zip(record.memory_recommended.iter())
                {
                    *slot += value;
                }
            }
            sums
        }
    };

    OverviewAggregate::from_totals(resource, totals)
}

/// Savings of both families for one statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub statistic: Statistic,
    /// vCPUs that could be reclaimed; negative if recommendations exceed provisioning
    pub cpu_vcpus: i64,
    pub memory_gib: f64,
    /// Savings as a percentage of provisioned capacity, 0 when nothing is provisioned
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl SavingsSummary {
    pub fn from_overviews(
        cpu: &OverviewAggregate,
        memory: &OverviewAggregate,
        statistic: Statistic,
    ) -> Self {
        Self {
            statistic,
            cpu_vcpus: cpu.savings(statistic) as i64,
            memory_gib: memory.savings(statistic),
            cpu_percent: percent_of(cpu.savings(statistic), cpu.provisioned()),
            memory_percent: percent_of(memory.savings(statistic), memory.provisioned()),
        }
    }
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
