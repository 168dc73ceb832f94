//! Partitions of a graph's nodes into communities.
//!
//! A [`Partition`] is a disjoint cover of a graph's node set by non-empty
//! communities. Moves are value-producing: [`Partition::move_node`] leaves
//! `self` untouched and returns the moved partition, while
//! [`Partition::into_moved`] consumes `self` and reuses its storage. Both are
//! observably the same operation.
//!
//! Communities live in numbered slots. A slot emptied by a move is recycled
//! by the next move into a fresh community; ids of untouched communities stay
//! stable across moves, so a [`CommunityId`] taken before a move still names
//! the same community afterwards unless that community was the one emptied.
//!
//! Each community caches its leaf count and its volume (degree sum) under both
//! weightings, so quality deltas never have to walk a whole community.

use crate::error::{PartitionViolation, Result};
use crate::graph::{Graph, NodeStats, Weighting};
use petgraph::graph::NodeIndex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Handle to a community of a [`Partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommunityId(usize);

impl CommunityId {
    /// Slot index of this community.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a node is moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// An existing community. A vacant id behaves like [`Target::Fresh`].
    Community(CommunityId),
    /// A new community containing only the moved node.
    Fresh,
}

#[derive(Debug, Clone)]
struct Community {
    members: BTreeSet<NodeIndex>,
    size: usize,
    unit_volume: f64,
    weighted_volume: f64,
}

impl Community {
    fn empty() -> Self {
        Self {
            members: BTreeSet::new(),
            size: 0,
            unit_volume: 0.0,
            weighted_volume: 0.0,
        }
    }

    fn insert(&mut self, v: NodeIndex, stats: &NodeStats) {
        if self.members.insert(v) {
            self.size += stats.size;
            self.unit_volume += stats.unit_degree;
            self.weighted_volume += stats.weighted_degree;
        }
    }

    fn remove(&mut self, v: NodeIndex, stats: &NodeStats) {
        if self.members.remove(&v) {
            self.size -= stats.size;
            self.unit_volume -= stats.unit_degree;
            self.weighted_volume -= stats.weighted_degree;
        }
    }
}

/// A disjoint cover of a graph's nodes by non-empty communities.
#[derive(Debug, Clone)]
pub struct Partition {
    slots: Vec<Option<Community>>,
    vacant: Vec<usize>,
    membership: Vec<CommunityId>,
    stats: Arc<[NodeStats]>,
}

impl Partition {
    /// Build a partition of `graph` from the given communities.
    ///
    /// Empty communities are skipped. Fails if a community mentions a node
    /// outside the graph, if two communities share a node, or if some node is
    /// not covered.
    pub fn new<I, C>(graph: &Graph, communities: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = NodeIndex>,
    {
        let n = graph.node_count();
        let stats = Arc::clone(graph.stats());
        let mut assigned: Vec<Option<CommunityId>> = vec![None; n];
        let mut slots = Vec::new();

        for community in communities {
            let id = CommunityId(slots.len());
            let mut built = Community::empty();
            for v in community {
                let i = v.index();
                if i >= n {
                    return Err(PartitionViolation::UnknownNode(i).into());
                }
                match assigned[i] {
                    Some(existing) if existing == id => {}
                    Some(_) => return Err(PartitionViolation::OverlappingCommunities(i).into()),
                    None => assigned[i] = Some(id),
                }
                built.insert(v, &stats[i]);
            }
            if !built.members.is_empty() {
                slots.push(Some(built));
            }
        }

        let membership = assigned
            .into_iter()
            .enumerate()
            .map(|(i, id)| id.ok_or(PartitionViolation::MissingNode(i)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            slots,
            vacant: Vec::new(),
            membership,
            stats,
        })
    }

    /// Every node in its own community.
    pub fn singletons(graph: &Graph) -> Self {
        let stats = Arc::clone(graph.stats());
        let slots = graph
            .node_indices()
            .map(|v| {
                let mut c = Community::empty();
                c.insert(v, &stats[v.index()]);
                Some(c)
            })
            .collect();
        Self {
            slots,
            vacant: Vec::new(),
            membership: (0..graph.node_count()).map(CommunityId).collect(),
            stats,
        }
    }

    /// All nodes in one community (no communities for an empty graph).
    pub fn trivial(graph: &Graph) -> Self {
        let stats = Arc::clone(graph.stats());
        let mut c = Community::empty();
        for v in graph.node_indices() {
            c.insert(v, &stats[v.index()]);
        }
        let slots = if c.members.is_empty() {
            Vec::new()
        } else {
            vec![Some(c)]
        };
        Self {
            slots,
            vacant: Vec::new(),
            membership: vec![CommunityId(0); graph.node_count()],
            stats,
        }
    }

    /// Check that this partition was built for `graph` or one of its clones.
    ///
    /// Community sizes and volumes are cached from the graph the partition
    /// was built for, so a structurally different graph with the same node
    /// count is rejected too.
    pub fn check_covers(&self, graph: &Graph) -> Result<()> {
        if self.node_count() != graph.node_count() {
            return Err(PartitionViolation::NodeCountMismatch {
                expected: graph.node_count(),
                found: self.node_count(),
            }
            .into());
        }
        if !Arc::ptr_eq(&self.stats, graph.stats()) {
            return Err(PartitionViolation::ForeignGraph.into());
        }
        Ok(())
    }

    /// Number of communities.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Check if there are no communities (only for an empty graph).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes covered.
    pub fn node_count(&self) -> usize {
        self.membership.len()
    }

    /// The community containing `v`.
    pub fn community_of(&self, v: NodeIndex) -> CommunityId {
        self.membership[v.index()]
    }

    /// Members of the community containing `v`.
    pub fn node_community(&self, v: NodeIndex) -> &BTreeSet<NodeIndex> {
        &self.get(self.community_of(v)).members
    }

    /// Members of community `id`, if it is occupied.
    pub fn community(&self, id: CommunityId) -> Option<&BTreeSet<NodeIndex>> {
        self.slot(id).map(|c| &c.members)
    }

    /// Check if `id` names an occupied community.
    pub fn contains(&self, id: CommunityId) -> bool {
        self.slot(id).is_some()
    }

    /// Communities in slot order.
    pub fn communities(&self) -> impl Iterator<Item = (CommunityId, &BTreeSet<NodeIndex>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (CommunityId(i), &c.members)))
    }

    /// Ids of all communities in slot order.
    pub fn ids(&self) -> impl Iterator<Item = CommunityId> + '_ {
        self.communities().map(|(id, _)| id)
    }

    /// Leaf count of community `id` (0 if vacant).
    pub fn size(&self, id: CommunityId) -> usize {
        self.slot(id).map_or(0, |c| c.size)
    }

    /// Degree sum of community `id` (0 if vacant).
    pub fn volume(&self, id: CommunityId, weighting: Weighting) -> f64 {
        self.slot(id).map_or(0.0, |c| match weighting {
            Weighting::Unit => c.unit_volume,
            Weighting::Weighted => c.weighted_volume,
        })
    }

    /// Resolve a target to the community it names, `None` for a fresh one.
    pub fn resolve(&self, target: Target) -> Option<CommunityId> {
        match target {
            Target::Community(id) if self.contains(id) => Some(id),
            _ => None,
        }
    }

    /// The partition obtained by moving `v` into `target`.
    ///
    /// `v` leaves its community (which is dropped if it becomes empty) and
    /// joins `target`, or a new singleton community for [`Target::Fresh`].
    /// Moving a node into its own community changes nothing.
    pub fn move_node(&self, v: NodeIndex, target: Target) -> Partition {
        self.clone().into_moved(v, target)
    }

    /// Same as [`Partition::move_node`], consuming `self`.
    pub fn into_moved(mut self, v: NodeIndex, target: Target) -> Partition {
        self.apply_move(v, target);
        self
    }

    fn apply_move(&mut self, v: NodeIndex, target: Target) {
        let current = self.community_of(v);
        let target = self.resolve(target);
        if target == Some(current) {
            return;
        }

        let stats = self.stats[v.index()];
        let emptied = {
            let c = self.get_mut(current);
            c.remove(v, &stats);
            c.members.is_empty()
        };
        if emptied {
            self.slots[current.0] = None;
            self.vacant.push(current.0);
        }

        let destination = match target {
            Some(id) => id,
            None => self.open_slot(),
        };
        self.get_mut(destination).insert(v, &stats);
        self.membership[v.index()] = destination;
    }

    fn open_slot(&mut self) -> CommunityId {
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        self.slots[index] = Some(Community::empty());
        CommunityId(index)
    }

    /// Canonical form: the set of communities as node sets.
    pub fn as_set(&self) -> BTreeSet<BTreeSet<NodeIndex>> {
        self.communities().map(|(_, members)| members.clone()).collect()
    }

    /// Community label per node, numbered consecutively in slot order.
    pub fn labels(&self) -> Vec<usize> {
        let mut renumbered = vec![usize::MAX; self.slots.len()];
        for (label, id) in self.ids().enumerate() {
            renumbered[id.0] = label;
        }
        self.membership.iter().map(|id| renumbered[id.0]).collect()
    }

    fn slot(&self, id: CommunityId) -> Option<&Community> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    // Membership always points at an occupied slot.
    fn get(&self, id: CommunityId) -> &Community {
        match self.slots[id.0].as_ref() {
            Some(c) => c,
            None => unreachable!("membership points at vacant slot {}", id.0),
        }
    }

    fn get_mut(&mut self, id: CommunityId) -> &mut Community {
        match self.slots[id.0].as_mut() {
            Some(c) => c,
            None => unreachable!("move into vacant slot {}", id.0),
        }
    }
}

impl PartialEq for Partition {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count() && self.as_set() == other.as_set()
    }
}

impl Eq for Partition {}
