//! Ordering compiled objects so that every offset can be encoded.
//!
//! Compilation produces a DAG of [`TableData`] objects joined by offsets.
//! Packing picks a byte order for those objects. When plain topological
//! orders leave some offset out of range, the graph is edited: large
//! subtables are split, lookups are moved behind extension subtables, and
//! subgraphs behind 32-bit offsets are duplicated into their own spaces.

use indexmap::IndexSet;

use crate::{
    error::PackingError,
    write::{OffsetRecord, TableData, Whence},
};

use std::collections::{BTreeMap, HashMap, HashSet};

mod promotion;
mod sort;
mod spaces;
mod splitting;
mod subgraph_size;

use sort::Node;
use spaces::Space;

/// An identifier for an object in the compilation graph.
///
/// Ids are assigned sequentially by each [`TableWriter`](crate::TableWriter),
/// so compiling the same table twice produces the same ids.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, Hash, PartialEq, Eq)]
pub struct ObjectId(u32);

impl ObjectId {
    pub(crate) const fn new(raw: u32) -> Self {
        ObjectId(raw)
    }
}

/// The width of an offset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OffsetLen {
    Offset8 = 1,
    Offset16 = 2,
    Offset24 = 3,
    Offset32 = 4,
}

impl OffsetLen {
    pub(crate) const fn from_width(width: usize) -> Self {
        match width {
            1 => Self::Offset8,
            2 => Self::Offset16,
            3 => Self::Offset24,
            _ => Self::Offset32,
        }
    }

    /// The width of this offset, in bytes.
    pub const fn width(self) -> usize {
        self as u8 as usize
    }

    /// The largest unsigned value this offset can hold.
    pub const fn max_value(self) -> u32 {
        u32::MAX >> (32 - 8 * self.width())
    }

    /// `true` if `value` can be encoded in an offset of this length.
    pub fn fits(self, value: i64, signed: bool) -> bool {
        let bits = 8 * self.width() as u32;
        if signed {
            let reach = 1i64 << (bits - 1);
            value >= -reach && value < reach
        } else {
            value >= 0 && value <= self.max_value() as i64
        }
    }

    /// Only 32-bit offsets lead into spaces of their own.
    const fn is_long(self) -> bool {
        matches!(self, Self::Offset32)
    }
}

impl std::fmt::Display for OffsetLen {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Offset{}", self.width() * 8)
    }
}

/// Options that control how hard we try to pack a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PackOptions {
    /// The maximum number of rounds of overflow resolution.
    pub max_rounds: usize,
    /// Whether large subtables may be split into several.
    pub allow_splitting: bool,
    /// Whether lookups may be moved behind extension subtables.
    pub allow_promotion: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            max_rounds: 10,
            allow_splitting: true,
            allow_promotion: true,
        }
    }
}

/// Deduplicating storage for compiled tables.
#[derive(Debug, Default)]
pub(crate) struct ObjectStore {
    objects: IndexSet<TableData>,
}

impl ObjectStore {
    pub(crate) fn add(&mut self, data: TableData) -> ObjectId {
        let (idx, _) = self.objects.insert_full(data);
        ObjectId(idx as u32)
    }
}

/// An offset that cannot hold the distance to its target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overflow {
    pub parent: ObjectId,
    pub child: ObjectId,
    /// The value the offset would need to encode.
    pub distance: i64,
    pub offset_type: OffsetLen,
    pub signed: bool,
}

/// The objects of one table, with the state used to order them.
//NOTE: no Debug; a graph of a real table is far too big to print
pub(crate) struct Graph {
    objects: BTreeMap<ObjectId, TableData>,
    nodes: BTreeMap<ObjectId, Node>,
    /// the current byte order; positions in `nodes` follow it
    order: Vec<ObjectId>,
    root: ObjectId,
    next_id: u32,
    parents_stale: bool,
    next_space: Space,
    num_roots_per_space: HashMap<Space, usize>,
}

impl Graph {
    pub(crate) fn from_obj_store(store: ObjectStore, root: ObjectId) -> Self {
        let objects = (0u32..)
            .map(ObjectId)
            .zip(store.objects)
            .collect::<BTreeMap<_, _>>();
        Self::from_objects(objects, root)
    }

    fn from_objects(objects: BTreeMap<ObjectId, TableData>, root: ObjectId) -> Self {
        let nodes = objects
            .iter()
            .map(|(id, obj)| (*id, Node::new(obj.bytes.len() as u64)))
            .collect();
        let next_id = objects
            .last_key_value()
            .map(|(id, _)| id.0 + 1)
            .unwrap_or_default();
        Graph {
            objects,
            nodes,
            order: Vec::new(),
            root,
            next_id,
            parents_stale: true,
            next_space: Space::INIT,
            num_roots_per_space: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }

    #[cfg(test)]
    pub(crate) fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Concatenate the objects in their packed order and fill in the offsets.
    ///
    /// Each offset is range-checked as it is written, so a graph that was
    /// never packed fails here instead of producing garbage.
    pub(crate) fn serialize(&self) -> Result<Vec<u8>, PackingError> {
        let mut out = self
            .order
            .iter()
            .flat_map(|id| self.objects[id].bytes.iter().copied())
            .collect::<Vec<_>>();
        let mut overflows = Vec::new();

        for id in &self.order {
            let start = self.nodes[id].position as usize;
            for link in &self.objects[id].offsets {
                let value = self.resolve_offset(*id, link);
                if !link.len.fits(value, link.signed) {
                    overflows.push(self.overflow(*id, link, value));
                    continue;
                }
                let at = start + link.pos as usize;
                let width = link.len.width();
                // the low bytes of the two's complement value
                let encoded = value.to_be_bytes();
                if let Some(field) = out.get_mut(at..at + width) {
                    field.copy_from_slice(&encoded[encoded.len() - width..]);
                }
            }
        }

        if overflows.is_empty() {
            Ok(out)
        } else {
            self.log_overflows(&overflows);
            Err(PackingError::Overflows(overflows))
        }
    }

    /// Find an order in which every offset fits, editing the graph if needed.
    ///
    /// A topological order is tried first. If that overflows, subtables are
    /// split and lookups promoted (as allowed by `options`), 32-bit subgraphs
    /// are moved to their own spaces, and then up to `max_rounds` rounds of
    /// isolation, duplication and reprioritizing are run.
    pub(crate) fn pack_objects(&mut self, options: &PackOptions) -> Result<(), PackingError> {
        if self.basic_sort() {
            return Ok(());
        }

        if options.allow_splitting {
            self.try_splitting_subtables()?;
        }
        if options.allow_promotion {
            self.try_promoting_subtables();
        }

        log::info!("assigning spaces");
        self.assign_spaces();
        self.sort_shortest_distance();

        for round in 0..options.max_rounds {
            let overflows = self.find_overflows();
            if overflows.is_empty() {
                break;
            }
            log::trace!(
                "round {round}: {} overflows in {} bytes",
                overflows.len(),
                self.packed_len()
            );
            let changed = self.try_isolating_subgraphs(&overflows)
                || self.try_resolving_overflows(&overflows);
            if !changed {
                log::debug!("no strategy left to try");
                break;
            }
            self.sort_shortest_distance();
        }

        let overflows = self.find_overflows();
        if overflows.is_empty() {
            Ok(())
        } else {
            self.log_overflows(&overflows);
            Err(PackingError::Overflows(overflows))
        }
    }

    /// The value an offset would need to encode, given the current positions.
    fn resolve_offset(&self, parent_id: ObjectId, link: &OffsetRecord) -> i64 {
        let parent = &self.nodes[&parent_id];
        let base = match link.whence {
            Whence::Head => parent.position,
            Whence::Tail => parent.position + parent.size,
            Whence::Absolute => 0,
        };
        let target = self.nodes[&link.object].position;
        target as i64 - base as i64 - link.bias as i64
    }

    fn overflow(&self, parent: ObjectId, link: &OffsetRecord, distance: i64) -> Overflow {
        Overflow {
            parent,
            child: link.object,
            distance,
            offset_type: link.len,
            signed: link.signed,
        }
    }

    fn overflowing_links(&self) -> impl Iterator<Item = Overflow> + '_ {
        self.objects.iter().flat_map(move |(id, obj)| {
            obj.offsets.iter().filter_map(move |link| {
                let value = self.resolve_offset(*id, link);
                (!link.len.fits(value, link.signed)).then(|| self.overflow(*id, link, value))
            })
        })
    }

    fn has_overflows(&self) -> bool {
        self.overflowing_links().next().is_some()
    }

    pub(crate) fn find_overflows(&self) -> Vec<Overflow> {
        self.overflowing_links().collect()
    }

    fn log_overflows(&self, overflows: &[Overflow]) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let parents = overflows.iter().map(|o| o.parent).collect::<HashSet<_>>();
        let children = overflows.iter().map(|o| o.child).collect::<HashSet<_>>();
        log::debug!(
            "{} overflows from {} parents to {} children",
            overflows.len(),
            parents.len(),
            children.len()
        );
        for overflow in overflows {
            log::debug!(
                "  {:?} -> {:?}: {} can't hold {}",
                overflow.parent,
                overflow.child,
                overflow.offset_type,
                overflow.distance
            );
        }
    }

    /// Total length of the objects in the current order.
    fn packed_len(&self) -> usize {
        self.order
            .iter()
            .filter_map(|id| self.objects.get(id))
            .map(|obj| obj.bytes.len())
            .sum()
    }

    fn update_parents(&mut self) {
        if !self.parents_stale {
            return;
        }
        self.nodes.values_mut().for_each(|node| node.parents.clear());
        for (id, obj) in &self.objects {
            for link in &obj.offsets {
                if let Some(child) = self.nodes.get_mut(&link.object) {
                    child.parents.push((*id, link.len));
                }
            }
        }
        self.parents_stale = false;
    }

    /// Every object reachable from `from`, including `from`.
    fn find_subgraph(&self, from: ObjectId, found: &mut HashSet<ObjectId>) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if found.insert(id) {
                if let Some(obj) = self.objects.get(&id) {
                    stack.extend(obj.offsets.iter().map(|link| link.object));
                }
            }
        }
    }

    /// Drop objects that can no longer be reached from the root.
    fn remove_orphans(&mut self) {
        let mut reachable = HashSet::with_capacity(self.nodes.len());
        self.find_subgraph(self.root, &mut reachable);
        let n_orphans = self.nodes.len() - reachable.len();
        if n_orphans == 0 {
            return;
        }
        log::info!("removing {n_orphans} orphaned objects");
        self.nodes.retain(|id, _| reachable.contains(id));
        self.objects.retain(|id, _| reachable.contains(id));
        self.order.retain(|id| reachable.contains(id));
        self.parents_stale = true;
    }

    /// Add an object after compilation. Objects added this way are never
    /// deduplicated.
    fn add_object(&mut self, data: TableData) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(data.bytes.len() as u64));
        self.objects.insert(id, data);
        self.parents_stale = true;
        id
    }

    fn replace_object(&mut self, id: ObjectId, data: TableData) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.size = data.bytes.len() as u64;
        }
        self.objects.insert(id, data);
        self.parents_stale = true;
    }

    /// Split every splittable lookup's oversized subtables.
    fn try_splitting_subtables(&mut self) -> Result<(), PackingError> {
        let lookups = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.type_.is_splittable())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        if lookups.is_empty() {
            return Ok(());
        }
        for lookup in lookups {
            splitting::split_subtables(self, lookup)?;
        }
        self.remove_orphans();
        Ok(())
    }

    /// Work on the overflows furthest from the root first.
    ///
    /// A child that other parents also point to is copied for the
    /// overflowing parent. A child with no other parents is instead
    /// prioritized, so it sorts closer to its parent.
    fn try_resolving_overflows(&mut self, overflows: &[Overflow]) -> bool {
        self.update_parents();
        let mut handled = HashSet::new();
        let mut changed = false;
        for overflow in overflows.iter().rev() {
            if !handled.insert(overflow.child) {
                continue;
            }
            let has_other_parents = self.nodes[&overflow.child]
                .parents
                .iter()
                .any(|(parent, _)| *parent != overflow.parent);
            if has_other_parents {
                self.duplicate_child(overflow.parent, overflow.child);
                changed = true;
            } else if let Some(child) = self.nodes.get_mut(&overflow.child) {
                changed |= child.raise_priority();
            }
        }
        changed
    }

    /// Point `parent` at a fresh copy of `child`. The copy's own offsets
    /// still point to the original grandchildren.
    fn duplicate_child(&mut self, parent: ObjectId, child: ObjectId) -> ObjectId {
        let space = self.nodes[&child].space;
        let copy = self.add_object(self.objects[&child].clone());
        if let Some(node) = self.nodes.get_mut(&copy) {
            node.space = space;
        }
        if let Some(parent) = self.objects.get_mut(&parent) {
            parent
                .offsets
                .iter_mut()
                .filter(|link| link.object == child)
                .for_each(|link| link.object = copy);
        }
        log::trace!("copied {child:?} to {copy:?} for {parent:?}");
        copy
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::write::OffsetLink;

    use super::*;

    pub(super) const SHORT: OffsetLen = OffsetLen::Offset16;
    pub(super) const LONG: OffsetLen = OffsetLen::Offset32;

    pub(super) fn id(raw: u32) -> ObjectId {
        ObjectId(raw)
    }

    /// Placeholder objects of the given sizes, joined by `links`.
    /// Object 0 is the root.
    pub(super) fn mock_graph(sizes: &[usize], links: &[(u32, u32, OffsetLen)]) -> Graph {
        let mut objects = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| (id(i as u32), TableData::make_mock(*size)))
            .collect::<BTreeMap<_, _>>();
        for (from, to, len) in links {
            objects
                .get_mut(&id(*from))
                .unwrap()
                .add_mock_offset(id(*to), *len);
        }
        Graph::from_objects(objects, id(0))
    }

    /// A root holding only the given links, each to its own one byte child.
    fn root_with_links(links: &[OffsetLink]) -> Graph {
        let mut root = TableData::default();
        let mut objects = BTreeMap::new();
        for (i, link) in links.iter().enumerate() {
            let child = id(i as u32 + 1);
            root.add_offset_with(child, *link);
            objects.insert(child, TableData::make_mock(1));
        }
        objects.insert(id(0), root);
        Graph::from_objects(objects, id(0))
    }

    #[rstest]
    #[case::u8_max(OffsetLen::Offset8, 255, false, true)]
    #[case::u8_past(OffsetLen::Offset8, 256, false, false)]
    #[case::i8_min(OffsetLen::Offset8, -128, true, true)]
    #[case::i8_past(OffsetLen::Offset8, -129, true, false)]
    #[case::u16_negative(OffsetLen::Offset16, -1, false, false)]
    #[case::i16_max(OffsetLen::Offset16, 32767, true, true)]
    #[case::i16_past(OffsetLen::Offset16, 32768, true, false)]
    #[case::u24_max(OffsetLen::Offset24, 0xFF_FFFF, false, true)]
    #[case::i24_max(OffsetLen::Offset24, 0x80_0000, true, false)]
    #[case::u32_max(OffsetLen::Offset32, u32::MAX as i64, false, true)]
    #[case::i32_min(OffsetLen::Offset32, i32::MIN as i64, true, true)]
    fn offset_ranges(
        #[case] len: OffsetLen,
        #[case] value: i64,
        #[case] signed: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(len.fits(value, signed), expected);
    }

    #[test]
    fn offset_len_basics() {
        assert_eq!(OffsetLen::Offset24.max_value(), 0xFF_FFFF);
        assert_eq!(OffsetLen::Offset8.to_string(), "Offset8");
        assert_eq!(OffsetLen::from_width(3), OffsetLen::Offset24);
    }

    #[test]
    fn short_graph_packs_in_id_order() {
        let mut graph = mock_graph(
            &[6, 100, 100, 4],
            &[(0, 1, SHORT), (0, 2, SHORT), (1, 3, SHORT), (2, 3, SHORT)],
        );
        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.order, [id(0), id(1), id(2), id(3)]);
        let bytes = graph.serialize().unwrap();
        assert_eq!(bytes.len(), 210);
        // 0 -> 1, 0 -> 2, then 1 -> 3 written over 1's first two bytes
        assert_eq!(&bytes[..4], &[0, 6, 0, 106]);
        assert_eq!(&bytes[6..8], &[0, 200]);
    }

    #[test]
    fn head_tail_and_absolute_offsets() {
        let mut parent = TableData::default();
        parent.add_offset(id(1), 2, 0);
        parent.add_offset_with(id(1), OffsetLink::new(OffsetLen::Offset8).with_whence(Whence::Tail));
        parent.add_offset_with(
            id(1),
            OffsetLink::new(OffsetLen::Offset32)
                .with_whence(Whence::Absolute)
                .with_bias(2),
        );
        parent.add_offset_with(id(1), OffsetLink::new(OffsetLen::Offset24).signed());
        let mut child = TableData::default();
        child.write(0xabcdu16);

        let objects = BTreeMap::from([(id(0), parent), (id(1), child)]);
        let mut graph = Graph::from_objects(objects, id(0));
        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(
            graph.serialize().unwrap(),
            [0, 10, 0, 0, 0, 0, 8, 0, 0, 10, 0xab, 0xcd],
        );
    }

    #[test]
    fn signed_offset_to_an_earlier_object() {
        // root -> child, root -> parent, parent -(signed)-> child
        let mut root = TableData::default();
        root.add_offset(id(1), 2, 0);
        root.add_offset(id(2), 2, 0);
        let mut child = TableData::default();
        child.write(7u16);
        let mut parent = TableData::default();
        parent.write(1u16);
        parent.add_offset_with(id(1), OffsetLink::new(OffsetLen::Offset16).signed());

        let objects = BTreeMap::from([(id(0), root), (id(1), child), (id(2), parent)]);
        let mut graph = Graph::from_objects(objects, id(0));
        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(graph.order, [id(0), id(2), id(1)]);
        assert_eq!(graph.serialize().unwrap(), [0, 8, 0, 4, 0, 1, 0, 4, 0, 7]);

        // moving the child in front of its parent makes the offset negative
        graph.order = vec![id(0), id(1), id(2)];
        graph.nodes.get_mut(&id(1)).unwrap().position = 4;
        graph.nodes.get_mut(&id(2)).unwrap().position = 6;
        assert!(!graph.has_overflows());
        assert_eq!(graph.serialize().unwrap(), [0, 4, 0, 6, 0, 7, 0, 1, 0xff, 0xfe]);
    }

    #[test]
    fn signed_offset_that_cannot_reach_back() {
        let mut graph = root_with_links(&[OffsetLink::new(OffsetLen::Offset8)
            .signed()
            .with_bias(200)]);
        graph.sort_kahn();
        let overflows = graph.find_overflows();
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].distance, 1 - 200);
        assert!(overflows[0].signed);
        assert!(matches!(graph.serialize(), Err(PackingError::Overflows(_))));
    }

    #[test]
    fn byte_offset_overflow_is_fixed_by_reordering() {
        // root: an Offset16 to a big child, then an Offset8 to a small one
        let mut graph = mock_graph(&[3, 300, 1], &[(0, 1, SHORT), (0, 2, OffsetLen::Offset8)]);
        graph.sort_kahn();
        let overflows = graph.find_overflows();
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].offset_type, OffsetLen::Offset8);
        assert_eq!(overflows[0].distance, 303);

        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(graph.order, [id(0), id(2), id(1)]);
        let bytes = graph.serialize().unwrap();
        assert_eq!(&bytes[..3], &[0, 4, 3]);
    }

    #[test]
    fn offset24_reaches_past_16_bits() {
        let mut graph = mock_graph(&[7, 70000, 2], &[(0, 1, LONG), (0, 2, OffsetLen::Offset24)]);
        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(graph.order, [id(0), id(1), id(2)]);
        let bytes = graph.serialize().unwrap();
        assert!(!SHORT.fits(70007, false));
        assert_eq!(&bytes[..7], &[0, 0, 0, 7, 0x01, 0x11, 0x77]);
    }

    #[test]
    fn absolute_bias_brings_target_into_range() {
        let biased = OffsetLink::new(OffsetLen::Offset8)
            .with_whence(Whence::Absolute)
            .with_bias(250);
        let mut root = TableData::default();
        root.add_offset(id(1), 2, 0);
        root.add_offset_with(id(2), biased);
        let objects = BTreeMap::from([
            (id(0), root),
            (id(1), TableData::make_mock(300)),
            (id(2), TableData::make_mock(1)),
        ]);
        let mut graph = Graph::from_objects(objects, id(0));
        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(graph.order, [id(0), id(1), id(2)]);
        // the small object is at 303
        assert_eq!(graph.serialize().unwrap()[2], 53);
    }

    #[test]
    fn unresolvable_overflow_is_an_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        // the bias puts the target before the start of the table
        let mut graph = root_with_links(&[OffsetLink::new(OffsetLen::Offset16)
            .with_whence(Whence::Absolute)
            .with_bias(400)]);
        let Err(PackingError::Overflows(overflows)) = graph.pack_objects(&PackOptions::default())
        else {
            panic!("packing should fail");
        };
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].distance, 2 - 400);
        assert_eq!((overflows[0].parent, overflows[0].child), (id(0), id(1)));
    }

    #[test]
    fn overflow_reports_each_bad_link() {
        // both 0 -> 3 and 1 -> 3 are too long once 2 sits between them
        let mut graph = mock_graph(
            &[6, 4, 65535, 1],
            &[(0, 1, SHORT), (0, 2, SHORT), (0, 3, SHORT), (1, 3, SHORT)],
        );
        graph.sort_kahn();
        let mut overflows = graph.find_overflows();
        overflows.sort_by_key(|o| o.parent);
        assert_eq!(
            overflows
                .iter()
                .map(|o| (o.parent, o.child, o.distance))
                .collect::<Vec<_>>(),
            [(id(0), id(3), 65545), (id(1), id(3), 65539)]
        );
    }

    #[test]
    fn shared_child_is_copied_for_the_far_parent() {
        let _ = env_logger::builder().is_test(true).try_init();
        //      0
        //     / \
        //    1   2   (2 is huge)
        //     \ /
        //      3
        let mut graph = mock_graph(
            &[10, 10, 65530, 10],
            &[(0, 1, SHORT), (0, 2, SHORT), (1, 3, SHORT), (2, 3, SHORT)],
        );
        assert!(!graph.basic_sort());
        let overflows = graph.find_overflows();
        assert_eq!(overflows.len(), 1);
        assert_eq!((overflows[0].parent, overflows[0].child), (id(1), id(3)));

        graph.pack_objects(&PackOptions::default()).unwrap();
        assert_eq!(graph.len(), 5);
        let copy = id(4);
        assert_eq!(graph.objects[&id(1)].offsets[0].object, copy);
        assert_eq!(graph.objects[&id(2)].offsets[0].object, id(3));
        assert!(graph.serialize().is_ok());
    }

    #[test]
    fn zero_rounds_skips_overflow_repair() {
        let sizes = [10, 10, 65530, 10];
        let links = [(0, 1, SHORT), (0, 2, SHORT), (1, 3, SHORT), (2, 3, SHORT)];
        let options = PackOptions {
            max_rounds: 0,
            ..Default::default()
        };
        let mut graph = mock_graph(&sizes, &links);
        assert!(matches!(
            graph.pack_objects(&options),
            Err(PackingError::Overflows(overflows)) if overflows.len() == 1
        ));
        assert_eq!(graph.len(), 4);

        let mut graph = mock_graph(&sizes, &links);
        assert_eq!(graph.pack_objects(&PackOptions::default()), Ok(()));
    }

    #[test]
    fn too_many_large_children_fail() {
        let _ = env_logger::builder().is_test(true).try_init();
        // one of the four children of 1 has to start past 16 bits
        let mut graph = mock_graph(
            &[10, 10, 25000, 25000, 25000, 25000],
            &[
                (0, 1, LONG),
                (1, 2, SHORT),
                (1, 3, SHORT),
                (1, 4, SHORT),
                (1, 5, SHORT),
            ],
        );
        let err = graph.pack_objects(&PackOptions::default()).unwrap_err();
        assert!(matches!(err, PackingError::Overflows(_)), "{err}");
    }

    #[test]
    fn orphans_are_removed() {
        let mut graph = mock_graph(&[4, 4, 4, 4], &[(0, 1, SHORT), (2, 3, SHORT)]);
        graph.remove_orphans();
        assert_eq!(graph.ids().collect::<Vec<_>>(), [id(0), id(1)]);
        // new ids keep counting from the original objects
        assert_eq!(graph.add_object(TableData::make_mock(1)), id(4));
    }
}
