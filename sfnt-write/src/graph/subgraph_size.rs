//! Measuring what a subtable drags along with it

use std::collections::{hash_map::Entry, HashMap, HashSet};

use super::{Graph, ObjectId, OffsetLen};
use crate::error::PackingError;

/// Computes the size of the subgraph reachable from a node.
///
/// Only links of at most a given width are followed: a subtable reached by a
/// wider offset can be placed anywhere, and does not count against the
/// capacity of a narrower one.
///
/// The set of nodes reachable from each `(root, width)` pair is memoized, so
/// repeated queries while planning a split are cheap.
pub(crate) struct SizeAccountant<'a> {
    graph: &'a Graph,
    memo: HashMap<(ObjectId, OffsetLen), Vec<ObjectId>>,
}

impl<'a> SizeAccountant<'a> {
    pub(crate) fn new(graph: &'a Graph) -> Self {
        SizeAccountant {
            graph,
            memo: Default::default(),
        }
    }

    /// The total size of the nodes reachable from `root` that are not already
    /// in `visited`.
    ///
    /// Every counted node is added to `visited`, so that a node shared by
    /// several items is only paid for once by the caller.
    pub(crate) fn size(
        &mut self,
        root: ObjectId,
        width: OffsetLen,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<usize, PackingError> {
        let graph = self.graph;
        let reachable = self.reachable(root, width)?;
        Ok(reachable
            .iter()
            .filter(|id| visited.insert(**id))
            .filter_map(|id| graph.objects.get(id))
            .map(|obj| obj.bytes.len())
            .sum())
    }

    /// `true` if everything reachable from `root` fits within a single offset
    /// of this width.
    pub(crate) fn fits(&mut self, root: ObjectId, width: OffsetLen) -> Result<bool, PackingError> {
        let size = self.size(root, width, &mut HashSet::new())?;
        Ok(size <= width.max_value() as usize)
    }

    fn reachable(&mut self, root: ObjectId, width: OffsetLen) -> Result<&[ObjectId], PackingError> {
        let graph = self.graph;
        match self.memo.entry((root, width)) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_slice()),
            Entry::Vacant(entry) => {
                let nodes = find_reachable(graph, root, width)?;
                Ok(entry.insert(nodes).as_slice())
            }
        }
    }
}

fn find_reachable(
    graph: &Graph,
    root: ObjectId,
    width: OffsetLen,
) -> Result<Vec<ObjectId>, PackingError> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(obj) = graph.objects.get(&id) else {
            continue;
        };
        // the root's own size is the caller's problem
        if id != root && obj.bytes.len() > width.max_value() as usize {
            return Err(PackingError::OversizedNode {
                id,
                size: obj.bytes.len(),
                capacity: width,
            });
        }
        result.push(id);
        stack.extend(
            obj.offsets
                .iter()
                .rev()
                .filter(|link| link.len <= width)
                .map(|link| link.object),
        );
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::tests::{id, mock_graph, LONG, SHORT};
    use super::*;

    #[test]
    fn shared_children_are_counted_once() {
        //    0
        //   / \
        //  1   2
        //   \ /
        //    3
        let graph = mock_graph(
            &[10, 20, 30, 40],
            &[(0, 1, SHORT), (0, 2, SHORT), (1, 3, SHORT), (2, 3, SHORT)],
        );

        let mut accountant = SizeAccountant::new(&graph);
        let mut visited = HashSet::new();
        assert_eq!(accountant.size(id(0), SHORT, &mut visited), Ok(100));

        let mut visited = HashSet::new();
        assert_eq!(accountant.size(id(1), SHORT, &mut visited), Ok(60));
        // 3 is already paid for
        assert_eq!(accountant.size(id(2), SHORT, &mut visited), Ok(30));
        assert_eq!(accountant.size(id(2), SHORT, &mut visited), Ok(0));
    }

    #[test]
    fn wide_links_are_not_followed() {
        let graph = mock_graph(&[10, 20, 70000], &[(0, 1, SHORT), (0, 2, LONG)]);

        let mut accountant = SizeAccountant::new(&graph);
        assert_eq!(accountant.size(id(0), SHORT, &mut HashSet::new()), Ok(30));
        assert_eq!(accountant.fits(id(0), SHORT), Ok(true));
        assert_eq!(accountant.size(id(0), LONG, &mut HashSet::new()), Ok(70030));
        assert_eq!(accountant.memo.len(), 2);
    }

    #[test]
    fn byte_offsets_have_a_tiny_capacity() {
        let graph = mock_graph(&[4, 200, 100], &[(0, 1, SHORT), (1, 2, OffsetLen::Offset8)]);
        let mut accountant = SizeAccountant::new(&graph);
        assert_eq!(accountant.fits(id(2), OffsetLen::Offset8), Ok(true));
        assert_eq!(accountant.fits(id(1), OffsetLen::Offset8), Ok(false));
        assert_eq!(accountant.fits(id(0), OffsetLen::Offset24), Ok(true));
    }

    #[test]
    fn subgraph_bigger_than_capacity_does_not_fit() {
        let graph = mock_graph(&[10, 40000, 40000], &[(0, 1, SHORT), (0, 2, SHORT)]);
        let mut accountant = SizeAccountant::new(&graph);
        assert_eq!(accountant.fits(id(0), SHORT), Ok(false));
        assert_eq!(accountant.fits(id(1), SHORT), Ok(true));
    }

    #[test]
    fn oversized_child_is_an_error() {
        let graph = mock_graph(&[10, 70000], &[(0, 1, SHORT)]);
        let mut accountant = SizeAccountant::new(&graph);
        assert_eq!(
            accountant.size(id(0), SHORT, &mut HashSet::new()),
            Err(PackingError::OversizedNode {
                id: id(1),
                size: 70000,
                capacity: SHORT,
            })
        );
        // but the node itself can still be measured
        assert_eq!(accountant.size(id(1), SHORT, &mut HashSet::new()), Ok(70000));
    }
}
