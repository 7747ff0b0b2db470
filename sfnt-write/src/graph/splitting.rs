//! splitting layout (GPOS) subtables

use std::{
    collections::{BTreeMap, HashSet},
    ops::Range,
};

use read::tables::{gpos as rgpos, layout as rlayout};
use types::{FixedSize, GlyphId16, Offset16};

use super::{subgraph_size::SizeAccountant, Graph, ObjectId, OffsetLen};
use crate::{
    error::PackingError,
    table_type::{GPOS_EXTENSION, GPOS_MARK_TO_BASE, GPOS_PAIR},
    tables::layout as wlayout,
    write::{OffsetRecord, TableData, TableWriter},
    FontWrite,
};

const MAX_TABLE_SIZE: usize = u16::MAX as usize;

/// The result of planning how to split a subtable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SplitPlan {
    /// The subtable can stay as it is.
    Fits,
    /// The subtable's items, partitioned into consecutive groups, each of
    /// which becomes its own subtable.
    Groups(Vec<Range<usize>>),
    /// The subtable's format cannot be split.
    NotSplittable,
}

/// Greedily partitions a sequence of items into groups that each fit in a
/// single subtable.
///
/// Every group pays for the subtable header once; items are added in order,
/// and a new group is started whenever the next item does not fit.
pub(crate) struct GroupBuilder {
    header: usize,
    capacity: usize,
    current_size: usize,
    start: usize,
    next: usize,
    groups: Vec<Range<usize>>,
}

impl GroupBuilder {
    pub(crate) fn new(header: usize, capacity: usize) -> Self {
        GroupBuilder {
            header,
            capacity,
            current_size: header,
            start: 0,
            next: 0,
            groups: Vec::new(),
        }
    }

    /// Add the next item.
    ///
    /// `cost_of` is called with `true` if the item is being moved to a fresh
    /// group, in which case anything it shares with the previous group has to
    /// be paid for again.
    pub(crate) fn add(
        &mut self,
        id: ObjectId,
        mut cost_of: impl FnMut(bool) -> Result<usize, PackingError>,
    ) -> Result<(), PackingError> {
        let mut cost = cost_of(false)?;
        if self.current_size + cost > self.capacity && self.next > self.start {
            self.groups.push(self.start..self.next);
            self.start = self.next;
            self.current_size = self.header;
            cost = cost_of(true)?;
        }
        if self.header + cost > self.capacity {
            return Err(PackingError::OversizedNode {
                id,
                size: self.header + cost,
                capacity: OffsetLen::Offset16,
            });
        }
        self.current_size += cost;
        self.next += 1;
        Ok(())
    }

    pub(crate) fn finish(mut self) -> SplitPlan {
        if self.next > self.start {
            self.groups.push(self.start..self.next);
        }
        if self.groups.len() > 1 {
            SplitPlan::Groups(self.groups)
        } else {
            SplitPlan::Fits
        }
    }
}

/// Split any of the subtables of this lookup that are too big to be reached
/// from it.
///
/// Pair adjustment and mark-to-base subtables can be split, either directly
/// or behind an extension subtable. The lookup is rewritten to point at the
/// new subtables, in order; the old subtables are left in the graph for the
/// caller to remove.
pub(super) fn split_subtables(graph: &mut Graph, lookup: ObjectId) -> Result<(), PackingError> {
    let data = &graph.objects[&lookup];
    // we just want the lookup type/flag/etc, but we need a generic FontRead type
    let generic_lookup = match data.reparse::<rlayout::Lookup<()>>() {
        Ok(table) => table,
        Err(e) => {
            log::warn!("could not read lookup {lookup:?} for splitting: {e}");
            return Ok(());
        }
    };
    let lookup_type = generic_lookup.lookup_type();
    let lookup_flag = generic_lookup.lookup_flag();
    let mark_filtering_set = generic_lookup.mark_filtering_set();
    let type_ = data.type_;
    let subtables = data
        .offsets
        .iter()
        .map(|off| off.object)
        .collect::<Vec<_>>();

    let mut plans = BTreeMap::new();
    for subtable in &subtables {
        let plan = match lookup_type {
            GPOS_EXTENSION => match extension_target(graph, *subtable) {
                Some((wrapped_type, target)) => plan_split(graph, wrapped_type, target)?,
                None => SplitPlan::NotSplittable,
            },
            _ => plan_split(graph, lookup_type, *subtable)?,
        };
        if let SplitPlan::Groups(groups) = plan {
            plans.insert(*subtable, groups);
        }
    }

    if plans.is_empty() {
        log::debug!("splitting produced no new subtables");
        return Ok(());
    }

    let mut new_subtables = Vec::with_capacity(subtables.len() + plans.len());
    for subtable in subtables {
        match plans.get(&subtable) {
            Some(groups) if lookup_type == GPOS_EXTENSION => {
                new_subtables.extend(split_extension_subtable(graph, subtable, groups))
            }
            Some(groups) => {
                new_subtables.extend(split_subtable(graph, lookup_type, subtable, groups))
            }
            None => new_subtables.push(subtable),
        }
    }

    let Ok(n_total_subtables) = u16::try_from(new_subtables.len()) else {
        log::warn!(
            "splitting lookup {lookup:?} would need {} subtables",
            new_subtables.len()
        );
        return Ok(());
    };
    log::debug!("lookup {lookup:?} now has {n_total_subtables} subtables");

    let mut new_data = TableData::new(type_);
    new_data.write(lookup_type);
    new_data.write(lookup_flag);
    new_data.write(n_total_subtables);
    for id in new_subtables {
        new_data.add_offset(id, Offset16::RAW_BYTE_LEN, 0);
    }
    if let Some(mark_filtering_set) = mark_filtering_set {
        new_data.write(mark_filtering_set);
    }
    graph.replace_object(lookup, new_data);
    Ok(())
}

fn plan_split(
    graph: &Graph,
    lookup_type: u16,
    subtable: ObjectId,
) -> Result<SplitPlan, PackingError> {
    match lookup_type {
        GPOS_PAIR => plan_pair_pos_split(graph, subtable),
        GPOS_MARK_TO_BASE => plan_mark_base_split(graph, subtable),
        _ => Ok(SplitPlan::NotSplittable),
    }
}

fn split_subtable(
    graph: &mut Graph,
    lookup_type: u16,
    subtable: ObjectId,
    groups: &[Range<usize>],
) -> Vec<ObjectId> {
    match lookup_type {
        GPOS_PAIR => split_pair_pos_subtable(graph, subtable, groups),
        GPOS_MARK_TO_BASE => split_mark_base_subtable(graph, subtable, groups),
        _ => vec![subtable],
    }
}

// ExtensionPosFormat1: format, the wrapped lookup type, then a 32-bit offset
const EXTENSION_TYPE_POS: usize = u16::RAW_BYTE_LEN;
const EXTENSION_OFFSET_POS: usize = 2 * u16::RAW_BYTE_LEN;

/// The lookup type and id of the subtable wrapped by an extension subtable.
fn extension_target(graph: &Graph, extension: ObjectId) -> Option<(u16, ObjectId)> {
    let data = graph.objects.get(&extension)?;
    let wrapped_type = data.read_at::<u16>(EXTENSION_TYPE_POS).ok()?;
    let target = offset_at(data, EXTENSION_OFFSET_POS)?;
    Some((wrapped_type, target))
}

/// Split the subtable behind an extension, wrapping each new subtable in an
/// extension of its own.
fn split_extension_subtable(
    graph: &mut Graph,
    extension: ObjectId,
    groups: &[Range<usize>],
) -> Vec<ObjectId> {
    let data = &graph.objects[&extension];
    let type_ = data.type_;
    let (Some((wrapped_type, target)), Some(link)) = (
        extension_target(graph, extension),
        data.offsets
            .iter()
            .find(|off| off.pos as usize == EXTENSION_OFFSET_POS)
            .map(OffsetRecord::link),
    ) else {
        return vec![extension];
    };

    let new_tables = split_subtable(graph, wrapped_type, target, groups);
    if new_tables == [target] {
        return vec![extension];
    }
    new_tables
        .into_iter()
        .map(|id| {
            let mut new_extension = TableData::new(type_);
            new_extension.write(1u16);
            new_extension.write(wrapped_type);
            new_extension.add_offset_with(id, link);
            graph.add_object(new_extension)
        })
        .collect()
}

/// Decide whether, and where, a PairPos subtable should be split.
pub(crate) fn plan_pair_pos_split(
    graph: &Graph,
    subtable: ObjectId,
) -> Result<SplitPlan, PackingError> {
    let mut accountant = SizeAccountant::new(graph);
    if accountant.fits(subtable, OffsetLen::Offset16)? {
        return Ok(SplitPlan::Fits);
    }

    let data = &graph.objects[&subtable];
    match data.reparse::<rgpos::PairPos>() {
        Ok(rgpos::PairPos::Format1(table)) => {
            plan_format_1(&mut accountant, data, table.pair_set_count() as usize)
        }
        Ok(rgpos::PairPos::Format2(table)) => {
            plan_format_2(graph, &mut accountant, subtable, &table)
        }
        Err(e) => {
            log::warn!("cannot split subtable {subtable:?}: {e}");
            Ok(SplitPlan::NotSplittable)
        }
    }
}

/// The offsets in `data` whose positions are in `range`, in order.
fn offsets_in(data: &TableData, range: Range<usize>) -> BTreeMap<usize, ObjectId> {
    data.offsets
        .iter()
        .filter(|off| range.contains(&(off.pos as usize)))
        .map(|off| (off.pos as usize, off.object))
        .collect()
}

fn offset_at(data: &TableData, pos: usize) -> Option<ObjectId> {
    data.offsets
        .iter()
        .find(|off| off.pos as usize == pos)
        .map(|off| off.object)
}

// both formats start with the format and the coverage offset
const COVERAGE_POS: usize = u16::RAW_BYTE_LEN;
// PairPosFormat1: format, coverage, two value formats, a count, then the
// pair set offsets.
const PPF1_PAIR_SETS_START: usize = 5 * u16::RAW_BYTE_LEN;
// the header of a format 1 coverage table
const COVERAGE_HEADER: usize = 2 * u16::RAW_BYTE_LEN;

fn plan_format_1(
    accountant: &mut SizeAccountant,
    data: &TableData,
    pair_set_count: usize,
) -> Result<SplitPlan, PackingError> {
    let pair_sets = offsets_in(
        data,
        PPF1_PAIR_SETS_START..PPF1_PAIR_SETS_START + pair_set_count * Offset16::RAW_BYTE_LEN,
    );
    if pair_sets.len() != pair_set_count {
        log::warn!("pair set offsets do not match pair set count");
        return Ok(SplitPlan::NotSplittable);
    }

    let mut groups = GroupBuilder::new(PPF1_PAIR_SETS_START + COVERAGE_HEADER, MAX_TABLE_SIZE);
    let mut visited = HashSet::new();
    for pair_set in pair_sets.values().copied() {
        groups.add(pair_set, |fresh| {
            if fresh {
                visited.clear();
            }
            // the offset, plus a glyph in the coverage table
            let own = Offset16::RAW_BYTE_LEN + GlyphId16::RAW_BYTE_LEN;
            Ok(own + accountant.size(pair_set, OffsetLen::Offset16, &mut visited)?)
        })?;
    }
    Ok(groups.finish())
}

// PairPosFormat2: format, coverage, two value formats, two class defs,
// two counts, then the class1 records.
const PPF2_CLASS_DEF1_POS: usize = 4 * u16::RAW_BYTE_LEN;
const PPF2_CLASS_DEF2_POS: usize = 5 * u16::RAW_BYTE_LEN;
const PPF2_RECORDS_START: usize = 8 * u16::RAW_BYTE_LEN;
// the header of a format 2 class def, plus one range record
const CLASS_DEF_HEADER: usize = 2 * u16::RAW_BYTE_LEN;
const CLASS_RANGE_SIZE: usize = 3 * u16::RAW_BYTE_LEN;

fn plan_format_2(
    graph: &Graph,
    accountant: &mut SizeAccountant,
    subtable: ObjectId,
    table: &rgpos::PairPosFormat2,
) -> Result<SplitPlan, PackingError> {
    let data = &graph.objects[&subtable];
    let class1_count = table.class1_count() as usize;
    let record_size = class1_record_size(table);
    let (Some(class_def2), Some(glyphs_by_class)) = (
        offset_at(data, PPF2_CLASS_DEF2_POS),
        glyphs_by_class(graph, data, class1_count),
    ) else {
        log::warn!("PairPos format 2 subtable is missing its coverage or class defs");
        return Ok(SplitPlan::NotSplittable);
    };

    // class def 2 is shared by all of the new subtables
    let class_def2_size = accountant.size(class_def2, OffsetLen::Offset16, &mut HashSet::new())?;
    let header = PPF2_RECORDS_START + COVERAGE_HEADER + CLASS_DEF_HEADER + class_def2_size;

    let mut groups = GroupBuilder::new(header, MAX_TABLE_SIZE);
    let mut visited = HashSet::new();
    for (class, glyphs) in glyphs_by_class.iter().enumerate() {
        let record_start = PPF2_RECORDS_START + class * record_size;
        let devices = offsets_in(data, record_start..record_start + record_size);
        let own = record_size + glyphs.len() * (GlyphId16::RAW_BYTE_LEN + CLASS_RANGE_SIZE);
        // class records have no id of their own
        groups.add(subtable, |fresh| {
            if fresh {
                visited.clear();
            }
            let mut size = own;
            for device in devices.values() {
                size += accountant.size(*device, OffsetLen::Offset16, &mut visited)?;
            }
            Ok(size)
        })?;
    }
    Ok(groups.finish())
}

fn class1_record_size(table: &rgpos::PairPosFormat2) -> usize {
    table.class2_count() as usize
        * (table.value_format1().record_byte_len() + table.value_format2().record_byte_len())
}

/// The covered glyphs of each class in ClassDef1, in coverage order.
fn glyphs_by_class(
    graph: &Graph,
    data: &TableData,
    class1_count: usize,
) -> Option<Vec<Vec<GlyphId16>>> {
    let coverage = offset_at(data, COVERAGE_POS)?;
    let coverage = graph.objects.get(&coverage)?;
    let coverage = coverage.reparse::<rlayout::CoverageTable>().ok()?;
    let class_def1 = offset_at(data, PPF2_CLASS_DEF1_POS)?;
    let class_def1 = graph.objects.get(&class_def1)?;
    let class_def1 = class_def1.reparse::<rlayout::ClassDef>().ok()?;

    let mut result = vec![Vec::new(); class1_count];
    for gid in coverage.iter() {
        match result.get_mut(class_def1.get(gid) as usize) {
            Some(glyphs) => glyphs.push(gid),
            None => log::warn!("glyph {gid} has a class beyond class1Count"),
        }
    }
    Some(result)
}

// MarkBasePosFormat1: format, mark coverage, base coverage, class count,
// mark array, base array.
const MB_MARK_COVERAGE_POS: usize = u16::RAW_BYTE_LEN;
const MB_BASE_COVERAGE_POS: usize = 2 * u16::RAW_BYTE_LEN;
const MB_MARK_ARRAY_POS: usize = 4 * u16::RAW_BYTE_LEN;
const MB_BASE_ARRAY_POS: usize = 5 * u16::RAW_BYTE_LEN;
const MB_HEADER: usize = 6 * u16::RAW_BYTE_LEN;
// both arrays start with a count
const ARRAY_HEADER: usize = u16::RAW_BYTE_LEN;

/// The marks of one mark class, and the anchors that go with them.
#[derive(Clone, Debug, Default)]
struct MarkClass {
    /// Indices into the mark coverage, in order.
    marks: Vec<usize>,
    /// Anchors of the marks, then of the bases, for this class.
    anchors: Vec<ObjectId>,
}

/// The parts of a MarkBasePos subtable needed to split it by mark class.
struct MarkBaseParts {
    mark_array: ObjectId,
    base_array: ObjectId,
    base_coverage: ObjectId,
    base_count: usize,
    classes: Vec<MarkClass>,
}

impl MarkBaseParts {
    fn read(graph: &Graph, subtable: ObjectId) -> Option<Self> {
        let data = graph.objects.get(&subtable)?;
        let table = data.reparse::<rgpos::MarkBasePosFormat1>().ok()?;
        let class_count = table.mark_class_count() as usize;
        let base_coverage = offset_at(data, MB_BASE_COVERAGE_POS)?;
        let mark_array = offset_at(data, MB_MARK_ARRAY_POS)?;
        let base_array = offset_at(data, MB_BASE_ARRAY_POS)?;

        let mut classes = vec![MarkClass::default(); class_count];
        let mark_data = graph.objects.get(&mark_array)?;
        let marks = mark_data.reparse::<rgpos::MarkArray>().ok()?;
        let mark_anchors = offsets_in(mark_data, 0..mark_data.bytes.len());
        for (i, record) in marks.mark_records().iter().enumerate() {
            let Some(class) = classes.get_mut(record.mark_class() as usize) else {
                log::warn!("mark {i} has a class beyond markClassCount");
                return None;
            };
            class.marks.push(i);
            class
                .anchors
                .extend(mark_anchors.get(&mark_anchor_pos(i)).copied());
        }

        let base_data = graph.objects.get(&base_array)?;
        let base_count = base_data.read_at::<u16>(0).ok()? as usize;
        let base_anchors = offsets_in(base_data, 0..base_data.bytes.len());
        for base in 0..base_count {
            for (class_idx, class) in classes.iter_mut().enumerate() {
                let pos = base_anchor_pos(base, class_idx, class_count);
                class.anchors.extend(base_anchors.get(&pos).copied());
            }
        }
        Some(MarkBaseParts {
            mark_array,
            base_array,
            base_coverage,
            base_count,
            classes,
        })
    }
}

fn mark_anchor_pos(mark: usize) -> usize {
    ARRAY_HEADER + mark * rgpos::MarkRecord::RAW_BYTE_LEN + u16::RAW_BYTE_LEN
}

fn base_anchor_pos(base: usize, class: usize, class_count: usize) -> usize {
    ARRAY_HEADER + (base * class_count + class) * Offset16::RAW_BYTE_LEN
}

/// Decide whether, and where, a MarkBasePos subtable should be split.
///
/// Groups are runs of mark classes; the base coverage is shared.
pub(crate) fn plan_mark_base_split(
    graph: &Graph,
    subtable: ObjectId,
) -> Result<SplitPlan, PackingError> {
    let mut accountant = SizeAccountant::new(graph);
    if accountant.fits(subtable, OffsetLen::Offset16)? {
        return Ok(SplitPlan::Fits);
    }
    let Some(parts) = MarkBaseParts::read(graph, subtable) else {
        log::warn!("cannot split mark-to-base subtable {subtable:?}");
        return Ok(SplitPlan::NotSplittable);
    };

    let base_coverage_size = accountant.size(
        parts.base_coverage,
        OffsetLen::Offset16,
        &mut HashSet::new(),
    )?;
    let header = MB_HEADER + 2 * ARRAY_HEADER + COVERAGE_HEADER + base_coverage_size;
    let mut groups = GroupBuilder::new(header, MAX_TABLE_SIZE);
    let mut visited = HashSet::new();
    for class in &parts.classes {
        let own = class.marks.len() * (rgpos::MarkRecord::RAW_BYTE_LEN + GlyphId16::RAW_BYTE_LEN)
            + parts.base_count * Offset16::RAW_BYTE_LEN;
        groups.add(subtable, |fresh| {
            if fresh {
                visited.clear();
            }
            let mut size = own;
            for anchor in &class.anchors {
                size += accountant.size(*anchor, OffsetLen::Offset16, &mut visited)?;
            }
            Ok(size)
        })?;
    }
    Ok(groups.finish())
}

/// Each group gets new mark coverage, mark array and base array tables,
/// holding only its own classes; anchors and the base coverage are shared.
fn split_mark_base_subtable(
    graph: &mut Graph,
    subtable: ObjectId,
    groups: &[Range<usize>],
) -> Vec<ObjectId> {
    match split_mark_base(graph, subtable, groups) {
        Some(new_tables) => {
            log::debug!("split subtable {subtable:?} into {}", new_tables.len());
            new_tables
        }
        None => {
            log::warn!("failed to split subtable {subtable:?}");
            vec![subtable]
        }
    }
}

fn split_mark_base(
    graph: &mut Graph,
    subtable: ObjectId,
    groups: &[Range<usize>],
) -> Option<Vec<ObjectId>> {
    let parts = MarkBaseParts::read(graph, subtable)?;
    let data = graph.objects.get(&subtable)?.clone();
    let base_coverage = data
        .offsets
        .iter()
        .find(|off| off.pos as usize == MB_BASE_COVERAGE_POS)?
        .clone();
    let mark_glyphs = graph
        .objects
        .get(&offset_at(&data, MB_MARK_COVERAGE_POS)?)?
        .reparse::<rlayout::CoverageTable>()
        .ok()?
        .iter()
        .collect::<Vec<_>>();
    let mark_data = graph.objects.get(&parts.mark_array)?.clone();
    let base_data = graph.objects.get(&parts.base_array)?.clone();
    let class_count = parts.classes.len();

    let mut new_subtables = Vec::with_capacity(groups.len());
    for group in groups {
        let mut marks = parts
            .classes
            .get(group.clone())?
            .iter()
            .flat_map(|class| class.marks.iter().copied())
            .collect::<Vec<_>>();
        marks.sort_unstable();

        let new_coverage = marks
            .iter()
            .map(|i| mark_glyphs.get(*i).copied())
            .collect::<Option<wlayout::CoverageTable>>()?;
        let new_coverage = graph.add_object(make_table_data(&new_coverage));

        let mut new_marks = TableData::new(mark_data.type_);
        new_marks.write(u16::try_from(marks.len()).ok()?);
        for mark in &marks {
            let class_pos = ARRAY_HEADER + mark * rgpos::MarkRecord::RAW_BYTE_LEN;
            let class = mark_data.read_at::<u16>(class_pos).ok()?;
            new_marks.write(class.checked_sub(group.start as u16)?);
            let anchor = mark_anchor_pos(*mark);
            if !copy_range(
                &mark_data,
                anchor..anchor + Offset16::RAW_BYTE_LEN,
                &mut new_marks,
            ) {
                return None;
            }
        }
        let new_marks = graph.add_object(new_marks);

        let mut new_bases = TableData::new(base_data.type_);
        new_bases.write(u16::try_from(parts.base_count).ok()?);
        for base in 0..parts.base_count {
            let start = base_anchor_pos(base, group.start, class_count);
            let end = base_anchor_pos(base, group.end, class_count);
            if !copy_range(&base_data, start..end, &mut new_bases) {
                return None;
            }
        }
        let new_bases = graph.add_object(new_bases);

        let mut new_table = TableData::new(data.type_);
        new_table.write(1u16);
        new_table.add_offset(new_coverage, Offset16::RAW_BYTE_LEN, 0);
        new_table.add_offset_with(base_coverage.object, base_coverage.link());
        new_table.write(group.len() as u16);
        new_table.add_offset(new_marks, Offset16::RAW_BYTE_LEN, 0);
        new_table.add_offset(new_bases, Offset16::RAW_BYTE_LEN, 0);
        new_subtables.push(graph.add_object(new_table));
    }
    Some(new_subtables)
}

/// Compile a table that contains no offsets.
fn make_table_data(table: &dyn FontWrite) -> TableData {
    let mut writer = TableWriter::default();
    table.write_into(&mut writer);
    writer.into_data()
}

/// Copy a range of bytes, along with any offsets inside it, onto the end of
/// `target`.
fn copy_range(source: &TableData, range: Range<usize>, target: &mut TableData) -> bool {
    let Some(bytes) = source.bytes.get(range.clone()) else {
        return false;
    };
    let base = target.bytes.len();
    target.write_bytes(bytes);
    for record in source
        .offsets
        .iter()
        .filter(|off| range.contains(&(off.pos as usize)))
    {
        let pos = record.pos as usize - range.start + base;
        target.add_offset_record_at(record, pos as u32);
    }
    true
}

/// Carry out a planned split, returning the ids of the new subtables.
///
/// If anything about the subtable has changed since it was planned, it is
/// returned unchanged.
fn split_pair_pos_subtable(
    graph: &mut Graph,
    subtable: ObjectId,
    groups: &[Range<usize>],
) -> Vec<ObjectId> {
    let data = graph.objects[&subtable].clone();
    let new_tables = match data.reparse::<rgpos::PairPos>() {
        Ok(rgpos::PairPos::Format1(table)) => split_format_1(graph, &data, &table, groups),
        Ok(rgpos::PairPos::Format2(table)) => split_format_2(graph, &data, &table, groups),
        Err(_) => None,
    };
    let Some(new_tables) = new_tables else {
        log::warn!("failed to split subtable {subtable:?}");
        return vec![subtable];
    };
    log::debug!("split subtable {subtable:?} into {}", new_tables.len());
    new_tables
}

/// Each group gets a new coverage table; the pair sets themselves are shared.
fn split_format_1(
    graph: &mut Graph,
    data: &TableData,
    table: &rgpos::PairPosFormat1,
    groups: &[Range<usize>],
) -> Option<Vec<ObjectId>> {
    let coverage = offset_at(data, COVERAGE_POS)?;
    let coverage = graph.objects.get(&coverage)?;
    let glyphs = coverage
        .reparse::<rlayout::CoverageTable>()
        .ok()?
        .iter()
        .collect::<Vec<_>>();

    let mut new_subtables = Vec::with_capacity(groups.len());
    for group in groups {
        let new_coverage = glyphs
            .get(group.clone())?
            .iter()
            .copied()
            .collect::<wlayout::CoverageTable>();
        let new_coverage = graph.add_object(make_table_data(&new_coverage));

        let mut new_table = TableData::new(data.type_);
        new_table.write(table.pos_format());
        new_table.add_offset(new_coverage, Offset16::RAW_BYTE_LEN, 0);
        new_table.write(table.value_format1());
        new_table.write(table.value_format2());
        new_table.write(group.len() as u16);
        let start = PPF1_PAIR_SETS_START + group.start * Offset16::RAW_BYTE_LEN;
        let end = PPF1_PAIR_SETS_START + group.end * Offset16::RAW_BYTE_LEN;
        if !copy_range(data, start..end, &mut new_table) {
            return None;
        }
        new_subtables.push(graph.add_object(new_table));
    }
    Some(new_subtables)
}

/// Each group gets a new coverage table and class def 1; class def 2 is shared.
fn split_format_2(
    graph: &mut Graph,
    data: &TableData,
    table: &rgpos::PairPosFormat2,
    groups: &[Range<usize>],
) -> Option<Vec<ObjectId>> {
    let glyphs_by_class = glyphs_by_class(graph, data, table.class1_count() as usize)?;
    let class_def2 = data
        .offsets
        .iter()
        .find(|off| off.pos as usize == PPF2_CLASS_DEF2_POS)?
        .clone();
    let record_size = class1_record_size(table);

    let mut new_subtables = Vec::with_capacity(groups.len());
    for group in groups {
        let classes = glyphs_by_class.get(group.clone())?;
        let mut coverage = classes.iter().flatten().copied().collect::<Vec<_>>();
        coverage.sort_unstable();
        let new_coverage = graph.add_object(make_table_data(
            &wlayout::CoverageTableBuilder::from_glyphs(coverage).build(),
        ));
        // classes are used as indices, so they are renumbered from zero; the
        // first class of the group becomes class 0, which is implicit.
        let new_class_def = classes
            .iter()
            .enumerate()
            .skip(1)
            .flat_map(|(class, glyphs)| glyphs.iter().map(move |gid| (*gid, class as u16)))
            .collect::<wlayout::ClassDef>();
        let new_class_def = graph.add_object(make_table_data(&new_class_def));

        let mut new_table = TableData::new(data.type_);
        new_table.write(table.pos_format());
        new_table.add_offset(new_coverage, Offset16::RAW_BYTE_LEN, 0);
        new_table.write(table.value_format1());
        new_table.write(table.value_format2());
        new_table.add_offset(new_class_def, Offset16::RAW_BYTE_LEN, 0);
        new_table.add_offset_with(class_def2.object, class_def2.link());
        new_table.write(group.len() as u16);
        new_table.write(table.class2_count());
        let start = PPF2_RECORDS_START + group.start * record_size;
        let end = PPF2_RECORDS_START + group.end * record_size;
        if !copy_range(data, start..end, &mut new_table) {
            return None;
        }
        new_subtables.push(graph.add_object(new_table));
    }
    Some(new_subtables)
}
