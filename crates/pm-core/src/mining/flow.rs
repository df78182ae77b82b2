//! Flow variant discovery.

use super::{FlowKey, Trace};
use serde::Serialize;
use std::collections::HashMap;

/// A distinct activity sequence and how many cases followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowVariant {
    pub activities: FlowKey,
    pub count: usize,
}

/// Count traces per activity sequence.
///
/// Sorted by count descending; equal counts keep the order in which the
/// variant was first seen. Counts sum to the number of traces.
pub fn discover_flows(traces: &[Trace]) -> Vec<FlowVariant> {
    let mut index: HashMap<FlowKey, usize> = HashMap::new();
    let mut variants: Vec<FlowVariant> = Vec::new();

    for trace in traces {
        let key = trace.flow_key();
        match index.get(&key) {
            Some(&i) => variants[i].count += 1,
            None => {
                index.insert(key.clone(), variants.len());
                variants.push(FlowVariant {
                    activities: key,
                    count: 1,
                });
            }
        }
    }

    variants.sort_by(|a, b| b.count.cmp(&a.count));
    variants
}
