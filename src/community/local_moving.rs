//! Queue-driven greedy local moving.
//!
//! Every node starts out pending, in a random order drawn from the caller's
//! rng. A popped node goes to the community (or a fresh one) with the highest
//! quality gain, and only if that gain is strictly positive. After a move,
//! the neighbours that now sit outside the node's community are queued again
//! unless they are already pending. The loop ends once the queue is empty,
//! at which point no single pending move was worth making.
//!
//! Candidates are scanned in slot order with a fresh community last, and the
//! first maximum wins. A NaN gain never beats anything, so an undefined
//! quality leaves the partition as it is.

use crate::graph::{Graph, Weighting};
use crate::partition::{Partition, Target};
use crate::quality::QualityMetric;
use log::trace;
use petgraph::graph::NodeIndex;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Greedily move nodes between communities until no queued move helps.
///
/// Visitation order is a seeded shuffle of all nodes, followed by
/// re-queued neighbours in FIFO order.
pub fn move_nodes_fast<Q, R>(
    graph: &Graph,
    partition: Partition,
    quality: &Q,
    weighting: Weighting,
    rng: &mut R,
) -> Partition
where
    Q: QualityMetric + ?Sized,
    R: Rng + ?Sized,
{
    count_moves(graph, partition, quality, weighting, rng).0
}

/// Same as [`move_nodes_fast`], also returning how many moves were applied.
pub(crate) fn count_moves<Q, R>(
    graph: &Graph,
    partition: Partition,
    quality: &Q,
    weighting: Weighting,
    rng: &mut R,
) -> (Partition, usize)
where
    Q: QualityMetric + ?Sized,
    R: Rng + ?Sized,
{
    let mut order: Vec<NodeIndex> = graph.node_indices().collect();
    order.shuffle(rng);

    let mut queued = vec![true; graph.node_count()];
    let mut queue: VecDeque<NodeIndex> = order.into();
    let mut partition = partition;
    let mut moves = 0usize;

    while let Some(v) = queue.pop_front() {
        queued[v.index()] = false;

        let (target, gain) = best_target(graph, &partition, quality, v, weighting);
        if gain <= 0.0 || gain.is_nan() {
            continue;
        }

        partition = partition.into_moved(v, target);
        moves += 1;

        let home = partition.community_of(v);
        for u in graph.neighbors(v) {
            if partition.community_of(u) != home && !queued[u.index()] {
                queued[u.index()] = true;
                queue.push_back(u);
            }
        }
    }

    trace!(
        "local moving: {} moves over {} nodes, {} communities",
        moves,
        graph.node_count(),
        partition.len()
    );
    (partition, moves)
}

fn candidates(partition: &Partition) -> impl Iterator<Item = Target> + '_ {
    partition
        .ids()
        .map(Target::Community)
        .chain(std::iter::once(Target::Fresh))
}

/// The first candidate with the largest gain.
#[cfg(not(feature = "parallel"))]
fn best_target<Q: QualityMetric + ?Sized>(
    graph: &Graph,
    partition: &Partition,
    quality: &Q,
    v: NodeIndex,
    weighting: Weighting,
) -> (Target, f64) {
    let mut best = (Target::Fresh, f64::NEG_INFINITY);
    for target in candidates(partition) {
        let gain = quality.delta(graph, partition, v, target, weighting);
        if gain > best.1 {
            best = (target, gain);
        }
    }
    best
}

/// The first candidate with the largest gain.
///
/// Gains are computed concurrently; the reduction stays in candidate order.
#[cfg(feature = "parallel")]
fn best_target<Q: QualityMetric + ?Sized>(
    graph: &Graph,
    partition: &Partition,
    quality: &Q,
    v: NodeIndex,
    weighting: Weighting,
) -> (Target, f64) {
    let targets: Vec<Target> = candidates(partition).collect();
    let gains: Vec<f64> = targets
        .par_iter()
        .map(|&target| quality.delta(graph, partition, v, target, weighting))
        .collect();

    let mut best = (Target::Fresh, f64::NEG_INFINITY);
    for (target, gain) in targets.into_iter().zip(gains) {
        if gain > best.1 {
            best = (target, gain);
        }
    }
    best
}
