//! Spaces: groups of objects that are packed together.
//!
//! Everything the root reaches through 16 and 24-bit offsets lives in the
//! first space. Each group of subgraphs hanging off 32-bit offsets gets a
//! space of its own, so its members stay close to each other. A subgraph
//! that is also reachable from outside its space is copied first.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use super::{Graph, ObjectId, Overflow};

/// A ranking used for sorting the graph.
///
/// Nodes in lower spaces are always packed before nodes in higher spaces.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, Hash, PartialEq, Eq)]
pub(super) struct Space(u32);

impl Space {
    /// Reachable from the root without a 32-bit offset.
    pub(super) const SHORT_REACHABLE: Space = Space(0);
    /// Not yet assigned.
    pub(super) const REACHABLE: Space = Space(1);
    /// Spaces from here on belong to specific subgraphs.
    pub(super) const INIT: Space = Space(2);

    pub(super) const fn is_custom(self) -> bool {
        self.0 >= Space::INIT.0
    }
}

impl Graph {
    /// Give each connected group of 32-bit subgraphs a space of its own.
    ///
    /// Returns `false` if the graph has no 32-bit offsets.
    pub(super) fn assign_spaces(&mut self) -> bool {
        self.update_parents();
        let (long_reachable, mut roots) = self.find_space_roots();
        if roots.is_empty() {
            return false;
        }
        log::trace!("found {} space roots to isolate", roots.len());

        // the search for connected roots never leaves the 32-bit subgraphs
        let mut visited = self
            .nodes
            .keys()
            .filter(|id| !long_reachable.contains(id))
            .copied()
            .collect::<HashSet<_>>();

        while let Some(start) = roots.pop_first() {
            let mut group = self.take_connected_roots(start, &mut roots, &mut visited);
            group.insert(start);
            self.isolate_subgraph(&mut group);
        }
        true
    }

    /// The targets of 32-bit offsets that the root reaches without passing
    /// through another 32-bit offset, along with everything below them.
    fn find_space_roots(&self) -> (HashSet<ObjectId>, BTreeSet<ObjectId>) {
        let mut long_reachable = HashSet::new();
        let mut roots = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.root]);

        while let Some(id) = queue.pop_front() {
            if long_reachable.contains(&id) || !seen.insert(id) {
                continue;
            }
            let Some(obj) = self.objects.get(&id) else {
                continue;
            };
            for link in &obj.offsets {
                if link.len.is_long() {
                    roots.insert(link.object);
                    self.find_subgraph(link.object, &mut long_reachable);
                } else {
                    queue.push_back(link.object);
                }
            }
        }
        (long_reachable, roots)
    }

    /// Remove and return the members of `roots` connected to `start`,
    /// following links in both directions and skipping `visited` nodes.
    fn take_connected_roots(
        &self,
        start: ObjectId,
        roots: &mut BTreeSet<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) -> BTreeSet<ObjectId> {
        let mut found = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if roots.remove(&id) {
                found.insert(id);
            }
            stack.extend(self.nodes[&id].parents.iter().map(|(parent, _)| *parent));
            stack.extend(self.objects[&id].offsets.iter().map(|link| link.object));
        }
        found
    }

    /// For every object under `roots`, the number of links to it from inside
    /// that subgraph. Each root starts with its count of 32-bit parents.
    fn count_links_within(&self, roots: &BTreeSet<ObjectId>) -> BTreeMap<ObjectId, usize> {
        let mut counts = BTreeMap::new();
        for root in roots {
            let long_parents = self.nodes[root]
                .parents
                .iter()
                .filter(|(_, len)| len.is_long())
                .count();
            counts.insert(*root, long_parents);

            let mut stack = vec![*root];
            while let Some(id) = stack.pop() {
                for link in &self.objects[&id].offsets {
                    let count = counts.entry(link.object).or_insert(0);
                    *count += 1;
                    // only walk below an object the first time we reach it
                    if *count == 1 {
                        stack.push(link.object);
                    }
                }
            }
        }
        counts
    }

    /// Move the subgraph under `roots` to a new space.
    ///
    /// Anything in the subgraph that also has parents outside of it is
    /// copied, along with everything below it. Roots that get copied are
    /// replaced in `roots`. Returns `true` if anything was copied.
    fn isolate_subgraph(&mut self, roots: &mut BTreeSet<ObjectId>) -> bool {
        self.update_parents();
        let subgraph = self.count_links_within(roots);

        let space = self.next_space();
        log::debug!("moving {} roots to {space:?}", roots.len());
        self.num_roots_per_space.insert(space, roots.len());

        let mut copies = HashMap::new();
        for (id, links_within) in &subgraph {
            if *links_within < self.nodes[id].parents.len() {
                self.duplicate_subgraph(*id, &mut copies, space);
            }
        }

        // the rest of the subgraph moves as is, pointing at the copies
        for id in subgraph.keys().filter(|id| !copies.contains_key(*id)) {
            if let Some(node) = self.nodes.get_mut(id) {
                node.space = space;
            }
            if let Some(obj) = self.objects.get_mut(id) {
                for link in &mut obj.offsets {
                    if let Some(copy) = copies.get(&link.object) {
                        link.object = *copy;
                    }
                }
            }
        }

        if copies.is_empty() {
            return false;
        }

        // only the 32-bit links into a copied root switch to the copy
        for root in roots.iter() {
            let Some(copy) = copies.get(root) else {
                continue;
            };
            self.parents_stale = true;
            let long_parents = self.nodes[root]
                .parents
                .iter()
                .filter(|(_, len)| len.is_long())
                .map(|(parent, _)| *parent);
            for parent in long_parents {
                let Some(parent) = self.objects.get_mut(&parent) else {
                    continue;
                };
                parent
                    .offsets
                    .iter_mut()
                    .filter(|link| link.object == *root && link.len.is_long())
                    .for_each(|link| link.object = *copy);
            }
        }

        for (original, copy) in copies {
            if roots.remove(&original) {
                roots.insert(copy);
            }
        }
        true
    }

    /// Copy `root` and everything below it into `space`, reusing copies
    /// already made.
    fn duplicate_subgraph(
        &mut self,
        root: ObjectId,
        copies: &mut HashMap<ObjectId, ObjectId>,
        space: Space,
    ) -> ObjectId {
        if let Some(copy) = copies.get(&root) {
            return *copy;
        }
        let mut obj = self.objects[&root].clone();
        for link in &mut obj.offsets {
            link.object = self.duplicate_subgraph(link.object, copies, space);
        }
        let copy = self.add_object(obj);
        log::trace!("copied {root:?} to {copy:?}");
        if let Some(node) = self.nodes.get_mut(&copy) {
            node.space = space;
        }
        copies.insert(root, copy);
        copy
    }

    /// Split crowded spaces.
    ///
    /// For each overflowing space with more than one root, half of the
    /// roots involved in overflows move to a new space. Returns `true` if
    /// any did.
    pub(super) fn try_isolating_subgraphs(&mut self, overflows: &[Overflow]) -> bool {
        let mut crowded: BTreeMap<_, BTreeSet<_>> = BTreeMap::new();
        for overflow in overflows {
            let space = self.nodes[&overflow.parent].space;
            if !space.is_custom() || self.roots_in(space) < 2 {
                continue;
            }
            if self.nodes[&overflow.child].space != space {
                log::warn!("overflow {overflow:?} crosses spaces");
                continue;
            }
            let root = self.find_root_of_space(overflow.parent);
            crowded.entry(space).or_default().insert(root);
        }

        if crowded.is_empty() {
            return false;
        }
        for (space, mut roots) in crowded {
            let max_to_move = self.roots_in(space) / 2;
            log::trace!(
                "moving {} of {} overflowing roots out of {space:?}",
                max_to_move.min(roots.len()),
                roots.len()
            );
            while roots.len() > max_to_move {
                roots.pop_last();
            }
            self.isolate_subgraph(&mut roots);
            if let Some(count) = self.num_roots_per_space.get_mut(&space) {
                *count -= roots.len();
            }
        }
        true
    }

    fn roots_in(&self, space: Space) -> usize {
        self.num_roots_per_space.get(&space).copied().unwrap_or_default()
    }

    /// Climb first parents while they stay in the same space.
    fn find_root_of_space(&self, mut id: ObjectId) -> ObjectId {
        let space = self.nodes[&id].space;
        while let Some((parent, _)) = self.nodes[&id].parents.first() {
            if self.nodes[parent].space != space {
                break;
            }
            id = *parent;
        }
        id
    }

    fn next_space(&mut self) -> Space {
        self.next_space = Space(self.next_space.0 + 1);
        self.next_space
    }
}
