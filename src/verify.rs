//! End-to-end verification: net → step graph → paths → verdict.
use std::fmt;

use crate::ctl::{CtlEvaluator, Formula};
use crate::net::PetriNet;
use crate::sim::{PathConfig, SimConfig, StepGraph, StepStats, all_paths};

#[derive(Debug, Clone, Default)]
pub struct VerifyConfig {
    pub sim: SimConfig,
    pub paths: PathConfig,
}

/// Outcome of checking one property against one route net: the boolean
/// verdict plus the diagnostic text a reporting layer can surface verbatim.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub holds: bool,
    pub formula: String,
    pub stats: StepStats,
    pub path_count: usize,
    pub truncated: bool,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property {} {} ({} markings, {} paths",
            self.formula,
            if self.holds { "holds" } else { "fails" },
            self.stats.markings,
            self.path_count
        )?;
        if self.truncated {
            write!(f, ", exploration truncated")?;
        }
        write!(f, ")")
    }
}

/// Builds the step graph and path set for `net` and evaluates `formula` at
/// the initial marking. Truncated exploration still produces a verdict; the
/// flag tells the caller how much weight it carries.
pub fn verify(net: &PetriNet, formula: &Formula, config: &VerifyConfig) -> Verdict {
    net.log_diagnostics();

    let graph = StepGraph::build(net, &config.sim);
    let paths = all_paths(&graph, &config.paths);
    let evaluator = CtlEvaluator::new(&graph, &paths);
    let holds = evaluator.evaluate(formula, Some(graph.initial));

    let verdict = Verdict {
        holds,
        formula: formula.to_string(),
        stats: graph.stats(),
        path_count: paths.paths.len(),
        truncated: graph.truncated || paths.truncated,
    };
    log::info!("net {:?}: {}", net.id(), verdict);
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctl::{NodeExpression, StateFormula};
    use crate::testutil::{branch_and_loop_net, linear_route_net};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn delivery_reaches_sink(net: &crate::net::PetriNet) -> Formula {
        Formula::State(StateFormula::forall_until(
            StateFormula::tt(),
            StateFormula::atom(NodeExpression::only_place_marked(
                "sink",
                net.node_id("sink").unwrap(),
            )),
        ))
    }

    #[test]
    fn linear_route_delivers_every_token() {
        init_logging();
        let net = linear_route_net();
        let verdict = verify(&net, &delivery_reaches_sink(&net), &VerifyConfig::default());

        assert!(verdict.holds);
        assert!(!verdict.truncated);
        assert_eq!(verdict.stats.markings, 3);
        assert_eq!(verdict.path_count, 1);
        assert!(verdict.to_string().contains("holds"));
    }

    #[test]
    fn dead_end_branch_breaks_delivery() {
        init_logging();
        let mut net = linear_route_net();
        let source = net.node_id("source").unwrap();
        let stranded = net.add_place("stranded", 0).unwrap();
        let detour = net.add_transition("detour", None).unwrap();
        net.add_arc(source, detour).unwrap();
        net.add_arc(detour, stranded).unwrap();

        let verdict = verify(&net, &delivery_reaches_sink(&net), &VerifyConfig::default());
        assert!(!verdict.holds);
        assert!(verdict.to_string().contains("fails"));
    }

    #[test]
    fn looping_branch_still_offers_a_witness() {
        init_logging();
        let net = branch_and_loop_net();
        let witness = Formula::State(StateFormula::exist_until(
            StateFormula::tt(),
            StateFormula::atom(NodeExpression::place_marked(
                "end",
                net.node_id("end").unwrap(),
            )),
        ));

        let verdict = verify(&net, &witness, &VerifyConfig::default());
        assert!(verdict.holds);
        assert_eq!(verdict.formula, "E(T U marked(end))");
    }

    #[test]
    fn truncation_is_surfaced_in_the_verdict() {
        init_logging();
        let mut net = crate::net::PetriNet::new("pump");
        let p = net.add_place("p", 0).unwrap();
        let pump = net.add_transition("pump", None).unwrap();
        net.add_arc(pump, p).unwrap();

        let config = VerifyConfig {
            sim: SimConfig {
                state_limit: Some(3),
            },
            paths: PathConfig::default(),
        };
        let verdict = verify(
            &net,
            &Formula::State(StateFormula::tt()),
            &config,
        );
        assert!(verdict.truncated);
        assert!(verdict.to_string().contains("truncated"));
    }
}
