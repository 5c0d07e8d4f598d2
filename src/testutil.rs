//! Net builders shared by the unit tests.
use crate::net::PetriNet;

/// `start` branches into a straight segment reaching `end` and a two-place
/// loop that never does.
pub(crate) fn branch_and_loop_net() -> PetriNet {
    let mut net = PetriNet::new("branch-and-loop");
    let start = net.add_place("start", 1).unwrap();
    let mid = net.add_place("mid", 0).unwrap();
    let end = net.add_place("end", 0).unwrap();
    let loop1 = net.add_place("loop1", 0).unwrap();
    let loop2 = net.add_place("loop2", 0).unwrap();
    let to_mid = net.add_transition("to_mid", None).unwrap();
    let to_end = net.add_transition("to_end", None).unwrap();
    let enter_loop = net.add_transition("enter_loop", None).unwrap();
    let swap_a = net.add_transition("swap_a", None).unwrap();
    let swap_b = net.add_transition("swap_b", None).unwrap();

    net.add_arc(start, to_mid).unwrap();
    net.add_arc(to_mid, mid).unwrap();
    net.add_arc(mid, to_end).unwrap();
    net.add_arc(to_end, end).unwrap();
    net.add_arc(start, enter_loop).unwrap();
    net.add_arc(enter_loop, loop1).unwrap();
    net.add_arc(loop1, swap_a).unwrap();
    net.add_arc(swap_a, loop2).unwrap();
    net.add_arc(loop2, swap_b).unwrap();
    net.add_arc(swap_b, loop1).unwrap();
    net
}

/// `source -> fetch -> staged -> deliver -> sink`, one token at the source.
pub(crate) fn linear_route_net() -> PetriNet {
    let mut net = PetriNet::new("linear-route");
    let source = net.add_place("source", 1).unwrap();
    let staged = net.add_place("staged", 0).unwrap();
    let sink = net.add_place("sink", 0).unwrap();
    let fetch = net.add_transition("fetch", None).unwrap();
    let deliver = net.add_transition("deliver", None).unwrap();

    net.add_arc(source, fetch).unwrap();
    net.add_arc(fetch, staged).unwrap();
    net.add_arc(staged, deliver).unwrap();
    net.add_arc(deliver, sink).unwrap();
    net
}
