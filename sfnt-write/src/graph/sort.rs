//! Topological orderings of the graph.
//!
//! Both orderings only place an object once all of its parents are placed.
//! They differ in which ready object goes next: the lowest id, or the one
//! closest to the root.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet, VecDeque},
};

use super::{Graph, ObjectId, OffsetLen, Space};

/// Per-object packing state.
#[derive(Debug)]
pub(super) struct Node {
    pub(super) size: u64,
    /// weighted distance from the root; see [`Graph::update_distances`]
    distance: u64,
    /// start of the object in the current order
    pub(super) position: u64,
    pub(super) space: Space,
    pub(super) parents: Vec<(ObjectId, OffsetLen)>,
    priority: u8,
}

/// Key for picking the next object in a shortest distance sort.
///
/// Spaces are never interleaved. Within a space the closest object wins,
/// and then the one that became ready first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Distance {
    space: Space,
    distance: u64,
    order: u32,
}

impl Node {
    const MAX_PRIORITY: u8 = 3;

    pub(super) fn new(size: u64) -> Self {
        Node {
            size,
            distance: 0,
            position: 0,
            space: Space::REACHABLE,
            parents: Vec::new(),
            priority: 0,
        }
    }

    /// Pull this node towards its parents. `false` once it can't move further.
    pub(super) fn raise_priority(&mut self) -> bool {
        if self.priority == Self::MAX_PRIORITY {
            return false;
        }
        self.priority += 1;
        true
    }

    fn sort_key(&self, order: u32) -> Distance {
        let distance = match self.priority {
            0 => self.distance,
            1 => self.distance.saturating_sub(self.size / 2),
            2 => self.distance.saturating_sub(self.size),
            _ => 0,
        };
        Distance {
            space: self.space,
            distance,
            order,
        }
    }
}

impl Graph {
    /// Kahn's algorithm, with the lowest id first among ready objects.
    pub(super) fn sort_kahn(&mut self) {
        self.topological_sort(|_, _| ());
    }

    /// Order by space, and then by distance from the root.
    pub(crate) fn sort_shortest_distance(&mut self) {
        self.update_parents();
        self.update_distances();
        self.assign_space_0();
        self.topological_sort(Node::sort_key);
    }

    /// Try Kahn first, falling back to shortest distance.
    ///
    /// This establishes the order every later step works from. Returns
    /// `true` if the result has no overflows.
    pub(super) fn basic_sort(&mut self) -> bool {
        log::trace!("sorting {} objects", self.objects.len());
        self.sort_kahn();
        if !self.has_overflows() {
            return true;
        }
        log::trace!("kahn overflows, trying shortest distance");
        self.sort_shortest_distance();
        !self.has_overflows()
    }

    /// Place objects once all their parents are placed, choosing among the
    /// ready ones by `key` (and then by id).
    ///
    /// `key` also gets a counter of how many objects have become ready.
    fn topological_sort<K: Ord>(&mut self, key: impl Fn(&Node, u32) -> K) {
        self.update_parents();
        self.order.clear();

        let mut placed_parents = HashMap::with_capacity(self.nodes.len());
        let mut ready = BinaryHeap::new();
        let mut n_ready = 0u32;
        ready.push(Reverse((key(&self.nodes[&self.root], n_ready), self.root)));

        let mut pos = 0u64;
        while let Some(Reverse((_, id))) = ready.pop() {
            self.order.push(id);
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            node.position = pos;
            pos += node.size;

            for link in &self.objects[&id].offsets {
                let count = placed_parents.entry(link.object).or_insert(0usize);
                *count += 1;
                let child = &self.nodes[&link.object];
                if *count == child.parents.len() {
                    n_ready += 1;
                    ready.push(Reverse((key(child, n_ready), link.object)));
                }
            }
        }
        self.place_unsorted(pos);
    }

    /// Objects in a cycle never become ready; they go at the end, by id.
    fn place_unsorted(&mut self, mut pos: u64) {
        if self.order.len() == self.nodes.len() {
            return;
        }
        let placed = self.order.iter().copied().collect::<HashSet<_>>();
        let stragglers = self
            .nodes
            .keys()
            .filter(|id| !placed.contains(id))
            .copied()
            .collect::<Vec<_>>();
        log::warn!("{} objects are unreachable or in a cycle", stragglers.len());
        for id in stragglers {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.position = pos;
                pos += node.size;
            }
            self.order.push(id);
        }
    }

    /// Dijkstra from the root, where entering an object costs its size plus
    /// `2^(8 * width)` of the link used.
    ///
    /// The link cost makes objects behind wide offsets look far away.
    fn update_distances(&mut self) {
        self.nodes
            .values_mut()
            .for_each(|node| node.distance = u64::MAX);

        let mut frontier = BinaryHeap::from([Reverse((0u64, self.root))]);
        let mut done = HashSet::with_capacity(self.nodes.len());
        while let Some(Reverse((distance, id))) = frontier.pop() {
            if !done.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                node.distance = distance;
            }
            let Some(obj) = self.objects.get(&id) else {
                continue;
            };
            for link in obj.offsets.iter().filter(|link| !done.contains(&link.object)) {
                let Some(child) = self.nodes.get(&link.object) else {
                    continue;
                };
                let hop = child.size.saturating_add(1u64 << (8 * link.len.width()));
                frontier.push(Reverse((distance.saturating_add(hop), link.object)));
            }
        }
    }

    /// Everything the root reaches without a 32-bit offset goes in
    /// [`Space::SHORT_REACHABLE`].
    fn assign_space_0(&mut self) {
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            match self.nodes.get_mut(&id) {
                Some(node) if node.space != Space::SHORT_REACHABLE => {
                    node.space = Space::SHORT_REACHABLE;
                }
                _ => continue,
            }
            if let Some(obj) = self.objects.get(&id) {
                queue.extend(
                    obj.offsets
                        .iter()
                        .filter(|link| !link.len.is_long())
                        .map(|link| link.object),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::tests::{id, mock_graph, LONG, SHORT};
    use super::*;

    #[test]
    fn priority_pulls_a_node_closer() {
        let mut node = Node::new(40);
        node.distance = 1000;
        let keys = std::iter::from_fn(|| {
            let key = node.sort_key(7).distance;
            node.raise_priority().then_some(key)
        })
        .collect::<Vec<_>>();
        assert_eq!(keys, [1000, 980, 960]);
        assert_eq!(node.sort_key(7).distance, 0);
        assert!(!node.raise_priority());
    }

    #[test]
    fn kahn_waits_for_every_parent() {
        //   0 -> 1, 2, 3;  2 -> 1
        let mut graph = mock_graph(
            &[6, 1, 1, 1],
            &[(0, 1, SHORT), (0, 2, SHORT), (0, 3, SHORT), (2, 1, SHORT)],
        );
        graph.sort_kahn();
        assert_eq!(graph.order, [id(0), id(2), id(1), id(3)]);
        let positions = graph
            .order
            .iter()
            .map(|id| graph.nodes[id].position)
            .collect::<Vec<_>>();
        assert_eq!(positions, [0, 6, 7, 8]);
    }

    #[test]
    fn shortest_distance_prefers_small_children() {
        let mut graph = mock_graph(
            &[6, 500, 5, 50],
            &[(0, 1, SHORT), (0, 2, SHORT), (0, 3, SHORT)],
        );
        graph.sort_shortest_distance();
        assert_eq!(graph.order, [id(0), id(2), id(3), id(1)]);
    }

    #[test]
    fn wide_links_sort_last() {
        // 1 is tiny, but behind a 32-bit offset
        let mut graph = mock_graph(&[6, 1, 1000], &[(0, 1, LONG), (0, 2, SHORT)]);
        graph.sort_shortest_distance();
        assert_eq!(graph.order, [id(0), id(2), id(1)]);
        assert_eq!(graph.nodes[&id(1)].space, Space::REACHABLE);
        assert_eq!(graph.nodes[&id(2)].space, Space::SHORT_REACHABLE);
    }

    #[test]
    fn distances_take_the_cheapest_path() {
        // 3 is reachable through a long link from 0, or two short ones
        let mut graph = mock_graph(
            &[8, 10, 10, 20],
            &[(0, 1, SHORT), (0, 3, LONG), (1, 2, SHORT), (2, 3, SHORT)],
        );
        graph.update_parents();
        graph.update_distances();
        let hop = 1 << 16;
        assert_eq!(graph.nodes[&id(2)].distance, 20 + 2 * hop);
        assert_eq!(graph.nodes[&id(3)].distance, 40 + 3 * hop);
    }

    #[test]
    fn cycles_are_placed_at_the_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut graph = mock_graph(
            &[4, 10, 10, 10],
            &[(0, 1, SHORT), (0, 3, SHORT), (1, 2, SHORT), (2, 1, SHORT)],
        );
        graph.sort_kahn();
        assert_eq!(graph.order, [id(0), id(3), id(1), id(2)]);
        assert_eq!(graph.nodes[&id(2)].position, 24);
        graph.sort_shortest_distance();
        assert_eq!(graph.order.len(), 4);
    }
}
