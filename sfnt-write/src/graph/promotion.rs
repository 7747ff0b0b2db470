//! Moving lookups behind extension subtables.
//!
//! An extension subtable reaches its target through a 32-bit offset, which
//! lets the target live outside the 16-bit space of the lookup list.

use std::collections::{HashSet, VecDeque};

use super::{Graph, ObjectId};
use crate::{
    table_type::{TableType, GPOS_EXTENSION},
    write::TableData,
};

/// Bytes added by wrapping one subtable in an extension.
const EXTENSION_SIZE: usize = 8;
/// Each layer of 16-bit offsets has to fit below this.
const MAX_LAYER_SIZE: usize = u16::MAX as usize;

/// What promoting a lookup would move out of 16-bit space.
struct Candidate {
    id: ObjectId,
    own_size: usize,
    children_size: usize,
    subgraph_size: usize,
    n_subtables: usize,
}

impl Graph {
    pub(super) fn try_promoting_subtables(&mut self) {
        let Some((lookup_list, lookups)) = self.promotable_lookups() else {
            return;
        };
        let chosen = self.select_promotions(lookup_list, &lookups);
        log::info!(
            "promoting {} of {} eligible lookups",
            chosen.len(),
            lookups.len()
        );
        for lookup in chosen {
            self.promote_to_extension(lookup);
        }
    }

    /// The lookups that could be promoted, and the lookup list they share.
    ///
    /// `None` if there are none, or if they don't have exactly one parent.
    fn promotable_lookups(&mut self) -> Option<(ObjectId, Vec<ObjectId>)> {
        self.update_parents();
        let lookups = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.type_.is_promotable())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        let parents = lookups
            .iter()
            .flat_map(|id| self.nodes[id].parents.iter().map(|(parent, _)| *parent))
            .collect::<HashSet<_>>();
        match parents.len() {
            0 => None,
            1 => parents.into_iter().next().map(|list| (list, lookups)),
            _ => {
                log::warn!("promotable lookups have more than one parent");
                None
            }
        }
    }

    /// Lookups with the most subtables per byte stay where they are for as
    /// long as the three layers below the lookup list each fit in 16 bits;
    /// everything after that is promoted.
    ///
    /// The layers are the lookup list with its lookups, the lookups with
    /// their subtables, and the subtables with everything below them.
    fn select_promotions(&self, lookup_list: ObjectId, lookups: &[ObjectId]) -> Vec<ObjectId> {
        let mut candidates = lookups
            .iter()
            .map(|id| Candidate {
                id: *id,
                own_size: self.objects[id].bytes.len(),
                children_size: self.children_size(*id),
                subgraph_size: self.subgraph_size(*id),
                n_subtables: self.objects[id].offsets.len(),
            })
            .collect::<Vec<_>>();
        // descending subtables per byte, compared without division
        candidates.sort_by(|a, b| {
            (b.n_subtables * a.subgraph_size).cmp(&(a.n_subtables * b.subgraph_size))
        });

        // start as if everything were promoted
        let all_extensions = candidates
            .iter()
            .map(|c| c.n_subtables * EXTENSION_SIZE)
            .sum::<usize>();
        let mut list_and_lookups = self.objects[&lookup_list].bytes.len();
        let mut lookups_and_subtables = all_extensions;
        let mut subtables_and_below = all_extensions;

        let mut promoted = Vec::new();
        for candidate in &candidates {
            if promoted.is_empty() {
                let below_subtables = candidate
                    .subgraph_size
                    .saturating_sub(candidate.own_size + candidate.children_size);
                list_and_lookups += candidate.own_size;
                lookups_and_subtables = (lookups_and_subtables
                    + candidate.own_size
                    + candidate.children_size)
                    .saturating_sub(candidate.n_subtables * EXTENSION_SIZE);
                subtables_and_below += candidate.children_size + below_subtables;

                let fits = [list_and_lookups, lookups_and_subtables, subtables_and_below]
                    .iter()
                    .all(|size| *size < MAX_LAYER_SIZE);
                if fits {
                    continue;
                }
            }
            promoted.push(candidate.id);
        }
        promoted
    }

    /// Turn `lookup` into an extension lookup, giving each of its subtables
    /// an extension wrapper.
    fn promote_to_extension(&mut self, lookup: ObjectId) {
        let type_ = self.objects.get(&lookup).map(|obj| obj.type_);
        let Some(TableType::GposLookup(lookup_type)) = type_ else {
            return;
        };
        let subtables = self.objects[&lookup]
            .offsets
            .iter()
            .map(|link| link.object)
            .collect::<Vec<_>>();
        let wrappers = subtables
            .into_iter()
            .map(|subtable| {
                let mut ext = TableData::new(TableType::Unknown);
                ext.write(1u16);
                ext.write(lookup_type);
                ext.add_offset(subtable, 4, 0);
                self.add_object(ext)
            })
            .collect::<Vec<_>>();

        if let Some(obj) = self.objects.get_mut(&lookup) {
            for (link, wrapper) in obj.offsets.iter_mut().zip(wrappers) {
                link.object = wrapper;
            }
            obj.write_over(GPOS_EXTENSION, 0);
            obj.type_ = TableType::GposLookup(GPOS_EXTENSION);
        }
        self.parents_stale = true;
    }

    /// Total size of the direct children of `id`.
    fn children_size(&self, id: ObjectId) -> usize {
        self.objects[&id]
            .offsets
            .iter()
            .filter_map(|link| self.objects.get(&link.object))
            .map(|child| child.bytes.len())
            .sum()
    }

    /// Total size of `id` and everything below it, counting shared objects once.
    fn subgraph_size(&self, id: ObjectId) -> usize {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        let mut size = 0;
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            let Some(obj) = self.objects.get(&next) else {
                continue;
            };
            size += obj.bytes.len();
            queue.extend(obj.offsets.iter().map(|link| link.object));
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use pretty_assertions::assert_eq;
    use read::{tables::gpos as read_gpos, FontData, FontRead};
    use types::GlyphId16;

    use super::super::PackOptions;
    use super::*;
    use crate::error::PackingError;
    use crate::tables::{gpos, layout};
    use crate::TableWriter;

    /// One pair set per first glyph, each holding `n_pairs` pairs.
    fn pair_lookup(first_glyphs: Range<u16>, n_pairs: u16) -> gpos::PositionLookup {
        let coverage = first_glyphs.clone().map(GlyphId16::new).collect();
        let pair_sets = first_glyphs
            .map(|first| {
                let records = (0..n_pairs)
                    .map(|i| {
                        gpos::PairValueRecord::new(
                            GlyphId16::new(1000 + i),
                            gpos::ValueRecord::new().with_x_advance(first as i16 - i as i16),
                            gpos::ValueRecord::new(),
                        )
                    })
                    .collect();
                gpos::PairSet::new(records)
            })
            .collect();
        gpos::PositionLookup::Pair(layout::Lookup::new(
            layout::LookupFlag::empty(),
            vec![gpos::PairPos::format_1(coverage, pair_sets)],
        ))
    }

    /// Six lookups of roughly 13 to 16KB each; together they can't all be
    /// reached through 16-bit offsets.
    fn crowded_gpos() -> gpos::Gpos {
        let lookups = (0..6u16)
            .map(|i| pair_lookup(i * 40..i * 40 + 20 + i, 160))
            .collect();
        gpos::Gpos::new(
            Default::default(),
            Default::default(),
            layout::LookupList::new(lookups),
        )
    }

    #[test]
    fn crowded_lookups_are_promoted() {
        let _ = env_logger::builder().is_test(true).try_init();
        let table = crowded_gpos();
        let mut graph = TableWriter::make_graph(&table);
        assert!(!graph.basic_sort());

        graph.pack_objects(&PackOptions::default()).unwrap();
        let extension_lookups = graph
            .objects
            .values()
            .filter(|obj| obj.type_ == TableType::GposLookup(GPOS_EXTENSION))
            .count();
        // the smallest four fit, the other two are moved
        assert_eq!(extension_lookups, 2);

        let bytes = graph.serialize().unwrap();
        let gpos = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let lookups = gpos.lookup_list().unwrap();
        assert_eq!(lookups.lookup_count(), 6);
        for (i, lookup) in lookups.lookups().enumerate() {
            let pair_pos = match lookup.unwrap() {
                read_gpos::PositionLookup::Pair(lookup) => lookup.subtables().next(),
                read_gpos::PositionLookup::Extension(lookup) => {
                    let ext = lookup.subtables().next().unwrap().unwrap();
                    assert_eq!(ext.extension_lookup_type(), 2);
                    Some(ext.extension::<read_gpos::PairPos>())
                }
                other => panic!("unexpected lookup {other:?}"),
            };
            let read_gpos::PairPos::Format1(pair_pos) = pair_pos.unwrap().unwrap() else {
                panic!("wrong format");
            };
            assert_eq!(pair_pos.pair_set_count() as usize, 20 + i);
            let set = pair_pos.pair_sets().nth(3).unwrap().unwrap();
            let record = set.pair_value_records().iter().nth(5).unwrap().unwrap();
            assert_eq!(record.second_glyph, GlyphId16::new(1005));
            assert_eq!(record.value_record1.x_advance, Some(i as i16 * 40 + 3 - 5));
        }
    }

    #[test]
    fn promotion_can_be_disabled() {
        let table = crowded_gpos();
        let mut graph = TableWriter::make_graph(&table);
        let options = PackOptions {
            allow_promotion: false,
            ..Default::default()
        };
        assert!(matches!(
            graph.pack_objects(&options),
            Err(PackingError::Overflows(_))
        ));
    }

    #[test]
    fn small_lookups_stay_put() {
        let table = gpos::Gpos::new(
            Default::default(),
            Default::default(),
            layout::LookupList::new(vec![pair_lookup(0..4, 10), pair_lookup(10..12, 10)]),
        );
        let mut graph = TableWriter::make_graph(&table);
        let (list, lookups) = graph.promotable_lookups().unwrap();
        assert_eq!(lookups.len(), 2);
        assert!(graph.select_promotions(list, &lookups).is_empty());
    }

    #[test]
    fn extension_wraps_each_subtable() {
        let table = gpos::Gpos::new(
            Default::default(),
            Default::default(),
            layout::LookupList::new(vec![pair_lookup(0..4, 10)]),
        );
        let mut graph = TableWriter::make_graph(&table);
        let (_, lookups) = graph.promotable_lookups().unwrap();
        let lookup = lookups[0];
        let subtable = graph.objects[&lookup].offsets[0].object;
        graph.promote_to_extension(lookup);

        let lookup = &graph.objects[&lookup];
        assert_eq!(lookup.type_, TableType::GposLookup(GPOS_EXTENSION));
        assert_eq!(&lookup.bytes[..2], &[0, 9]);
        let wrapper = &graph.objects[&lookup.offsets[0].object];
        assert_eq!(&wrapper.bytes, &[0, 1, 0, 2, 0, 0, 0, 0]);
        assert_eq!(wrapper.offsets[0].object, subtable);
        assert_eq!(wrapper.offsets[0].len.width(), 4);
    }
}
