//! Path enumeration over the step graph.
use petgraph::graph::NodeIndex;

use crate::sim::step_graph::StepGraph;

pub type StepPath = Vec<NodeIndex>;

/// Budgets for the path walk. Maximal simple paths are finite on a finite
/// graph but exponential in the worst case; both limits are safety margins,
/// not correctness requirements.
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub max_paths: usize,
    pub max_len: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_paths: 4096,
            max_len: 256,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathSet {
    pub paths: Vec<StepPath>,
    pub truncated: bool,
}

/// Enumerates every maximal simple path from each root of the step graph.
///
/// A path grows until it reaches a node with no successor off the path:
/// either a terminal marking, or the closure of a cycle. The second case is
/// what lets a looping route branch show up as evidence: its path exists
/// but never visits a terminal.
pub fn all_paths(graph: &StepGraph, config: &PathConfig) -> PathSet {
    let mut set = PathSet::default();
    for root in graph.roots() {
        if set.paths.len() >= config.max_paths {
            set.truncated = true;
            break;
        }
        let mut path = vec![root];
        extend(graph, config, &mut path, &mut set);
    }
    if set.truncated {
        log::warn!(
            "path enumeration truncated at {} paths (limits: {} paths, length {})",
            set.paths.len(),
            config.max_paths,
            config.max_len
        );
    }
    set
}

fn extend(graph: &StepGraph, config: &PathConfig, path: &mut StepPath, set: &mut PathSet) {
    if path.len() >= config.max_len {
        set.truncated = true;
        set.paths.push(path.clone());
        return;
    }
    let Some(&current) = path.last() else {
        return;
    };
    let mut extended = false;
    for next in graph.successors(current).collect::<Vec<_>>() {
        if path.contains(&next) {
            continue;
        }
        extended = true;
        // A pending branch with the budget already spent is a real cut.
        if set.paths.len() >= config.max_paths {
            set.truncated = true;
            return;
        }
        path.push(next);
        extend(graph, config, path, set);
        path.pop();
    }
    if !extended {
        set.paths.push(path.clone());
    }
}
