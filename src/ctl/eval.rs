//! Pure recursive evaluation of formulas against a step graph and its paths.
use petgraph::graph::NodeIndex;

use crate::ctl::formula::{Ctl, Formula, Proposition, StateFormula, TransitionFormula};
use crate::net::NodeKind;
use crate::sim::paths::{PathSet, StepPath};
use crate::sim::step_graph::{StepGraph, StepNode};

/// Everything an evaluation can see: the built step graph and the candidate
/// paths. Both are read-only; independent evaluations may share one context
/// across threads.
pub struct EvalCx<'a> {
    graph: &'a StepGraph,
    paths: &'a [StepPath],
}

impl<'a> EvalCx<'a> {
    pub fn new(graph: &'a StepGraph, paths: &'a [StepPath]) -> Self {
        Self { graph, paths }
    }

    fn node(&self, at: Option<NodeIndex>) -> Option<&StepNode> {
        at.and_then(|ix| self.graph.node(ix))
    }

    fn adjacent(&self, at: Option<NodeIndex>) -> impl Iterator<Item = NodeIndex> + '_ {
        at.into_iter().flat_map(|ix| self.graph.successors(ix))
    }

    /// Successors of `at` as realized in the supplied paths: for each path
    /// containing the node, the entry right after it.
    fn path_successors(&self, at: Option<NodeIndex>) -> impl Iterator<Item = NodeIndex> + '_ {
        self.paths.iter().flat_map(move |path| {
            at.and_then(|ix| path.iter().position(|&n| n == ix))
                .and_then(|i| path.get(i + 1))
                .copied()
        })
    }

    /// For each path containing `at`, the suffix starting at its occurrence.
    fn suffixes(&self, at: Option<NodeIndex>) -> impl Iterator<Item = &'a [NodeIndex]> + '_ {
        self.paths.iter().filter_map(move |path| {
            let ix = at?;
            let pos = path.iter().position(|&n| n == ix)?;
            Some(&path[pos..])
        })
    }
}

/// The shared evaluation contract of both formula families.
pub trait Evaluate {
    /// `at` is the node under evaluation; `None` models an absent node and
    /// makes every node-inspecting operator false (or vacuously true for the
    /// universal ones) instead of failing.
    fn evaluate(&self, cx: &EvalCx<'_>, at: Option<NodeIndex>) -> bool;
}

impl Evaluate for StateFormula {
    fn evaluate(&self, cx: &EvalCx<'_>, at: Option<NodeIndex>) -> bool {
        self.0.eval(cx, at)
    }
}

impl Evaluate for TransitionFormula {
    fn evaluate(&self, cx: &EvalCx<'_>, at: Option<NodeIndex>) -> bool {
        self.0.eval(cx, at)
    }
}

impl<A: Proposition, M: Evaluate> Ctl<A, M> {
    fn eval(&self, cx: &EvalCx<'_>, at: Option<NodeIndex>) -> bool {
        match self {
            Ctl::True => true,
            Ctl::False => false,
            Ctl::Not(inner) => !inner.eval(cx, at),
            Ctl::And(a, b) => a.eval(cx, at) && b.eval(cx, at),
            Ctl::Or(a, b) => a.eval(cx, at) || b.eval(cx, at),
            Ctl::Guard(inner) => cx.node(at).is_some() && inner.eval(cx, at),
            Ctl::Atom(atom) => cx.node(at).is_some_and(|node| atom.holds(node)),
            Ctl::Modal(inner) => cx.adjacent(at).any(|s| inner.evaluate(cx, Some(s))),
            Ctl::ExistModal(inner) => cx.path_successors(at).any(|s| inner.evaluate(cx, Some(s))),
            Ctl::ForallModal(inner) => cx.path_successors(at).all(|s| inner.evaluate(cx, Some(s))),
            Ctl::ExistNext(inner) => cx.path_successors(at).any(|s| inner.eval(cx, Some(s))),
            Ctl::ForallNext(inner) => cx.path_successors(at).all(|s| inner.eval(cx, Some(s))),
            Ctl::ExistUntil(hold, until) => {
                cx.suffixes(at).any(|sfx| until_holds(hold, until, cx, sfx))
            }
            Ctl::ForallUntil(hold, until) => {
                cx.suffixes(at).all(|sfx| until_holds(hold, until, cx, sfx))
            }
        }
    }
}

/// `hold U until` along one path suffix: some position satisfies `until`
/// with `hold` at every position before it.
fn until_holds<A: Proposition, M: Evaluate>(
    hold: &Ctl<A, M>,
    until: &Ctl<A, M>,
    cx: &EvalCx<'_>,
    suffix: &[NodeIndex],
) -> bool {
    for &node in suffix {
        if until.eval(cx, Some(node)) {
            return true;
        }
        if !hold.eval(cx, Some(node)) {
            return false;
        }
    }
    false
}

/// Single dispatch point tying a formula to the node kind it applies to.
///
/// A state formula against a transition-kind node (or the reverse) is
/// `false`; so is any formula whose node index is stale. Evaluation never
/// panics; callers cannot rely on mismatch detection.
pub struct CtlEvaluator<'a> {
    cx: EvalCx<'a>,
}

impl<'a> CtlEvaluator<'a> {
    pub fn new(graph: &'a StepGraph, paths: &'a PathSet) -> Self {
        Self {
            cx: EvalCx::new(graph, &paths.paths),
        }
    }

    pub fn evaluate(&self, formula: &Formula, at: Option<NodeIndex>) -> bool {
        match formula {
            Formula::State(f) => self.eval_state(f, at),
            Formula::Transition(f) => self.eval_transition(f, at),
        }
    }

    pub fn eval_state(&self, formula: &StateFormula, at: Option<NodeIndex>) -> bool {
        match self.kind_of(at) {
            Resolved::Kind(NodeKind::Place) | Resolved::Absent => {
                formula.evaluate(&self.cx, self.normalize(at))
            }
            Resolved::Kind(NodeKind::Transition) => false,
        }
    }

    pub fn eval_transition(&self, formula: &TransitionFormula, at: Option<NodeIndex>) -> bool {
        match self.kind_of(at) {
            Resolved::Kind(NodeKind::Transition) | Resolved::Absent => {
                formula.evaluate(&self.cx, self.normalize(at))
            }
            Resolved::Kind(NodeKind::Place) => false,
        }
    }

    fn kind_of(&self, at: Option<NodeIndex>) -> Resolved {
        match self.cx.node(at) {
            Some(node) => Resolved::Kind(node.kind()),
            None => Resolved::Absent,
        }
    }

    fn normalize(&self, at: Option<NodeIndex>) -> Option<NodeIndex> {
        at.filter(|&ix| self.cx.graph.node(ix).is_some())
    }
}

enum Resolved {
    Kind(NodeKind),
    Absent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctl::formula::{ArcExpression, NodeExpression};
    use crate::net::PetriNet;
    use crate::sim::paths::{PathConfig, all_paths};
    use crate::sim::step_graph::{SimConfig, StepGraph};
    use crate::testutil::{branch_and_loop_net, linear_route_net};

    fn explore(net: &PetriNet) -> (StepGraph, PathSet) {
        let graph = StepGraph::build(net, &SimConfig::default());
        let paths = all_paths(&graph, &PathConfig::default());
        (graph, paths)
    }

    fn firing_ix(graph: &StepGraph, name: &str) -> NodeIndex {
        graph
            .graph
            .node_indices()
            .find(|&ix| graph.graph[ix].as_firing().is_some_and(|f| f.name == name))
            .unwrap()
    }

    fn reached_end(net: &PetriNet) -> StateFormula {
        StateFormula::atom(NodeExpression::place_marked(
            "end",
            net.node_id("end").unwrap(),
        ))
    }

    #[test]
    fn constants_ignore_node_and_paths() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let empty = PathSet::default();

        for paths in [&paths, &empty] {
            let cx = EvalCx::new(&graph, &paths.paths);
            for at in [Some(graph.initial), Some(NodeIndex::new(9999)), None] {
                assert!(StateFormula::tt().evaluate(&cx, at));
                assert!(!StateFormula::ff().evaluate(&cx, at));
                assert!(TransitionFormula::tt().evaluate(&cx, at));
                assert!(!TransitionFormula::ff().evaluate(&cx, at));
            }
        }
    }

    #[test]
    fn truth_tables_hold_in_both_kind_contexts() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);
        let place = Some(graph.initial);
        let transition = Some(firing_ix(&graph, "to_mid"));

        let sf = |b: bool| if b { StateFormula::tt() } else { StateFormula::ff() };
        let tf = |b: bool| {
            if b {
                TransitionFormula::tt()
            } else {
                TransitionFormula::ff()
            }
        };

        for a in [true, false] {
            assert_eq!(sf(a).not().evaluate(&cx, place), !a);
            assert_eq!(tf(a).not().evaluate(&cx, transition), !a);
            for b in [true, false] {
                assert_eq!(sf(a).and(sf(b)).evaluate(&cx, place), a && b);
                assert_eq!(sf(a).or(sf(b)).evaluate(&cx, place), a || b);
                assert_eq!(tf(a).and(tf(b)).evaluate(&cx, transition), a && b);
                assert_eq!(tf(a).or(tf(b)).evaluate(&cx, transition), a || b);
            }
        }
    }

    #[test]
    fn dispatcher_degrades_kind_mismatches_to_false() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);
        let marking = Some(graph.initial);
        let firing = Some(firing_ix(&graph, "to_mid"));

        assert!(evaluator.evaluate(&Formula::State(StateFormula::tt()), marking));
        assert!(!evaluator.evaluate(&Formula::State(StateFormula::tt()), firing));
        assert!(evaluator.evaluate(&Formula::Transition(TransitionFormula::tt()), firing));
        assert!(!evaluator.evaluate(&Formula::Transition(TransitionFormula::tt()), marking));
    }

    #[test]
    fn dispatcher_never_panics_on_stale_indices() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);
        let stale = Some(NodeIndex::new(10_000));

        // Constants still ignore the node; anything node-bound is false.
        assert!(evaluator.evaluate(&Formula::State(StateFormula::tt()), stale));
        assert!(!evaluator.evaluate(&Formula::State(reached_end(&net)), stale));
        assert!(!evaluator.evaluate(
            &Formula::State(StateFormula::modal(TransitionFormula::tt())),
            stale
        ));
    }

    #[test]
    fn guard_is_the_null_filter() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);

        // Without the guard, negation over an absent node inverts freely.
        let inverted = reached_end(&net).not();
        assert!(inverted.evaluate(&cx, None));
        assert!(!inverted.clone().guarded().evaluate(&cx, None));
        assert!(StateFormula::tt().guarded().evaluate(&cx, Some(graph.initial)));
        assert!(!StateFormula::tt().guarded().evaluate(&cx, None));
    }

    #[test]
    fn atoms_reject_the_opposite_kind() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);
        let firing = Some(firing_ix(&graph, "to_mid"));

        assert!(!reached_end(&net).evaluate(&cx, firing));
        let fired = TransitionFormula::atom(ArcExpression::fired("to_mid"));
        assert!(fired.evaluate(&cx, firing));
        assert!(!fired.evaluate(&cx, Some(graph.initial)));
    }

    #[test]
    fn exist_until_finds_the_terminal_branch() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);

        let formula = Formula::State(StateFormula::exist_until(
            StateFormula::tt(),
            reached_end(&net),
        ));
        assert!(evaluator.evaluate(&formula, Some(graph.initial)));
    }

    #[test]
    fn forall_until_fails_on_the_looping_branch() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);

        let formula = Formula::State(StateFormula::forall_until(
            StateFormula::tt(),
            reached_end(&net),
        ));
        assert!(!evaluator.evaluate(&formula, Some(graph.initial)));
    }

    #[test]
    fn forall_until_holds_on_a_linear_route() {
        let net = linear_route_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);

        let drained = StateFormula::atom(NodeExpression::only_place_marked(
            "sink",
            net.node_id("sink").unwrap(),
        ));
        let formula = Formula::State(StateFormula::forall_until(StateFormula::tt(), drained));
        assert!(evaluator.evaluate(&formula, Some(graph.initial)));
    }

    #[test]
    fn until_requires_hold_at_every_earlier_position() {
        let net = linear_route_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);

        let staged_clear = StateFormula::atom(NodeExpression::place_marked(
            "staged",
            net.node_id("staged").unwrap(),
        ))
        .not();
        let at_sink = StateFormula::atom(NodeExpression::place_marked(
            "sink",
            net.node_id("sink").unwrap(),
        ));
        // The route passes through {staged}, so the hold side breaks first.
        let formula = StateFormula::exist_until(staged_clear, at_sink);
        assert!(!formula.evaluate(&cx, Some(graph.initial)));
    }

    #[test]
    fn next_operators_look_one_step_down_the_paths() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);
        let initial = Some(graph.initial);

        assert!(StateFormula::tt().exist_next().evaluate(&cx, initial));
        assert!(!StateFormula::ff().forall_next().evaluate(&cx, initial));
        // Path entries alternate kinds, so a place-kind atom one step after a
        // marking can never hold.
        assert!(!reached_end(&net).exist_next().evaluate(&cx, initial));
    }

    #[test]
    fn forall_next_is_vacuously_true_without_successors() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);
        let terminal = Some(graph.terminals()[0]);

        assert!(StateFormula::ff().forall_next().evaluate(&cx, terminal));
        assert!(StateFormula::ff().forall_next().evaluate(&cx, None));
        assert!(!StateFormula::tt().exist_next().evaluate(&cx, terminal));
    }

    #[test]
    fn modal_quantifies_over_adjacency() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);
        let initial = Some(graph.initial);

        let sees = |name: &str| {
            StateFormula::modal(TransitionFormula::atom(ArcExpression::fired(name)))
        };
        assert!(sees("to_mid").evaluate(&cx, initial));
        assert!(sees("enter_loop").evaluate(&cx, initial));
        assert!(!sees("to_end").evaluate(&cx, initial));
    }

    #[test]
    fn path_modals_quantify_over_realized_successors() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let cx = EvalCx::new(&graph, &paths.paths);
        let initial = Some(graph.initial);

        let fired = |name: &str| TransitionFormula::atom(ArcExpression::fired(name));
        assert!(StateFormula::exist_modal(fired("enter_loop")).evaluate(&cx, initial));
        assert!(!StateFormula::forall_modal(fired("to_mid")).evaluate(&cx, initial));
        assert!(StateFormula::forall_modal(TransitionFormula::tt()).evaluate(&cx, initial));
    }

    #[test]
    fn transition_modal_flips_back_to_markings() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);
        let to_mid = Some(firing_ix(&graph, "to_mid"));

        let mid_marked = StateFormula::atom(NodeExpression::place_marked(
            "mid",
            net.node_id("mid").unwrap(),
        ));
        let formula = Formula::Transition(TransitionFormula::modal(mid_marked));
        assert!(evaluator.evaluate(&formula, to_mid));
    }

    #[test]
    fn empty_path_set_starves_existential_operators() {
        let net = branch_and_loop_net();
        let graph = StepGraph::build(&net, &SimConfig::default());
        let no_paths = PathSet::default();
        let evaluator = CtlEvaluator::new(&graph, &no_paths);
        let initial = Some(graph.initial);

        let exists = Formula::State(StateFormula::exist_until(
            StateFormula::tt(),
            StateFormula::tt(),
        ));
        let forall = Formula::State(StateFormula::forall_until(
            StateFormula::tt(),
            StateFormula::ff(),
        ));
        assert!(!evaluator.evaluate(&exists, initial));
        assert!(evaluator.evaluate(&forall, initial));
    }

    #[test]
    fn shared_context_evaluates_from_multiple_threads() {
        let net = branch_and_loop_net();
        let (graph, paths) = explore(&net);
        let evaluator = CtlEvaluator::new(&graph, &paths);

        std::thread::scope(|scope| {
            let exist = scope.spawn(|| {
                evaluator.evaluate(
                    &Formula::State(StateFormula::exist_until(
                        StateFormula::tt(),
                        reached_end(&net),
                    )),
                    Some(graph.initial),
                )
            });
            let forall = scope.spawn(|| {
                evaluator.evaluate(
                    &Formula::State(StateFormula::forall_until(
                        StateFormula::tt(),
                        reached_end(&net),
                    )),
                    Some(graph.initial),
                )
            });
            assert!(exist.join().unwrap());
            assert!(!forall.join().unwrap());
        });
    }
}
