//! Reconciles a persisted step order with the current pipeline definition
//!
//! Both orders contribute "a runs before b" edges for each adjacent pair;
//! the merged order is a topological sort of the union. Steps that only
//! exist in the persisted order are dropped before any edge is built, so a
//! renamed or removed step never comes back.

use crate::core::pipeline::{Pipeline, PipelineFile};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Merge a persisted pipeline into the freshly computed default.
///
/// Step payloads always come from `default`; only `sha` is carried over
/// from the persisted record with the same name.
pub fn merge(previous: &PipelineFile, default: Pipeline) -> Pipeline {
    let default_names = default.step_names();
    let order = merged_order(&previous.step_names(), &default_names);

    let previous_shas: HashMap<&str, &str> = previous
        .steps
        .iter()
        .map(|s| (s.name.as_str(), s.sha.as_str()))
        .collect();

    let Pipeline { metadata, steps } = default;
    let mut by_name: HashMap<String, _> = steps.into_iter().map(|s| (s.name.clone(), s)).collect();

    let steps = order
        .iter()
        .filter_map(|name| by_name.remove(name))
        .map(|mut step| {
            step.sha = previous_shas
                .get(step.name.as_str())
                .map(|sha| sha.to_string())
                .unwrap_or_default();
            step
        })
        .collect();

    Pipeline { metadata, steps }
}

/// Compute the merged step order from two name sequences.
///
/// The result is always a permutation of `default`. When several steps are
/// ready at once the one appearing earliest in `default` wins. If the two
/// orders contradict each other the default order is returned unchanged.
pub fn merged_order(previous: &[String], default: &[String]) -> Vec<String> {
    let priority: HashMap<&str, usize> = default
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut seen = HashSet::new();
    let previous: Vec<&str> = previous
        .iter()
        .map(String::as_str)
        .filter(|name| priority.contains_key(name) && seen.insert(*name))
        .collect();

    debug!(
        "Merging {} persisted steps into {} default steps",
        previous.len(),
        default.len()
    );

    let mut edges: HashMap<usize, HashSet<usize>> = HashMap::new();
    let mut in_degree = vec![0usize; default.len()];

    let default_pairs = (1..default.len()).map(|i| (i - 1, i));
    let previous_pairs = previous
        .windows(2)
        .map(|pair| (priority[pair[0]], priority[pair[1]]));

    for (from, to) in default_pairs.chain(previous_pairs) {
        if from != to && edges.entry(from).or_default().insert(to) {
            in_degree[to] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..default.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(default.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        if let Some(targets) = edges.get(&next) {
            for &to in targets {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.insert(to);
                }
            }
        }
    }

    if order.len() != default.len() {
        warn!("Persisted step order conflicts with the current definition, using the default order");
        return default.to_vec();
    }

    order.into_iter().map(|i| default[i].clone()).collect()
}
