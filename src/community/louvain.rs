//! Louvain algorithm for community detection.
//!
//! Fast quality optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! Louvain is a multi-level, greedy optimization algorithm:
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Repeatedly move nodes to the community with the highest quality gain
//!    until no improvement.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities.
//!    Self-loops represent internal community edges.
//!
//! 3. **Iterate**: Repeat phases 1-2 on the meta-graph, each node starting
//!    in its own community, until local moving changes nothing.
//!
//! This is [`Leiden`](super::Leiden) without refinement, and it shares the
//! local mover, the aggregation and the quality functions with it. Without
//! refinement a community can end up disconnected.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::leiden::{run_levels, starting_partition};
use super::traits::CommunityDetection;
use crate::error::{Error, Result};
use crate::graph::{Graph, Weighting};
use crate::partition::Partition;
use crate::quality::{Modularity, QualityMetric};
use petgraph::graph::UnGraph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain<Q = Modularity> {
    quality: Q,
    weighting: Weighting,
    /// Random seed for visitation order.
    seed: u64,
}

impl<Q: QualityMetric> Louvain<Q> {
    /// Create a new Louvain detector optimising `quality`.
    pub fn new(quality: Q) -> Self {
        Self {
            quality,
            weighting: Weighting::Unit,
            seed: 42,
        }
    }

    /// Use unit or stored edge weights.
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The quality function being optimised.
    pub fn quality(&self) -> &Q {
        &self.quality
    }

    /// Partition `graph`, starting from `initial` or, if `None`, from
    /// singletons.
    pub fn run(&self, graph: &Graph, initial: Option<&Partition>) -> Result<Partition> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.run_with_rng(graph, initial, &mut rng)
    }

    /// Same as [`Louvain::run`] with a caller-provided random source.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        initial: Option<&Partition>,
        rng: &mut R,
    ) -> Result<Partition> {
        louvain(graph, &self.quality, initial, self.weighting, rng)
    }
}

impl Default for Louvain<Modularity> {
    fn default() -> Self {
        Self::new(Modularity::default())
    }
}

impl<Q: QualityMetric> CommunityDetection for Louvain<Q> {
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>> {
        if graph.node_count() == 0 {
            return Err(Error::EmptyInput);
        }

        let graph = Graph::from_petgraph(graph);
        Ok(self.run(&graph, None)?.labels())
    }

    fn resolution(&self) -> f64 {
        self.quality.resolution()
    }
}

/// Run the Louvain algorithm on `graph`.
///
/// `initial` defaults to the singleton partition.
pub fn louvain<Q, R>(
    graph: &Graph,
    quality: &Q,
    initial: Option<&Partition>,
    weighting: Weighting,
    rng: &mut R,
) -> Result<Partition>
where
    Q: QualityMetric + ?Sized,
    R: Rng + ?Sized,
{
    let start = starting_partition(graph, initial, Partition::singletons)?;
    run_levels(graph, start, quality, weighting, None, rng)
}
