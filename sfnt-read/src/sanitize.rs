//! Bounds checking of untrusted font tables.
//!
//! Reading a table with [`FontRead`] only validates the table itself: its
//! header and the arrays whose lengths it declares. Sanitizing walks the
//! whole graph of tables reachable from a top-level table, following every
//! offset, and checks that everything it finds is in bounds.
//!
//! The walk is depth-first and is driven by the same [`dispatch`] machinery
//! used elsewhere, so format-tagged tables with an unknown format are
//! accepted without being inspected.
//!
//! Each walk keeps its own record of which tables it has visited. A table
//! reached a second time after its walk finished is not walked again; a
//! table reached again while it is still being walked is a cycle, and is an
//! error. The walk is also bounded by a maximum nesting depth and a maximum
//! number of operations, so that hostile inputs cannot make it run for long.
//!
//! A failure only affects the top-level table it was found in.
//!
//! [`dispatch`]: crate::dispatch

mod gpos;
mod layout;
mod maxp;

use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use types::Tag;

use crate::dispatch::{dispatch, Dispatch, DispatchContext, FormatRecord};
use crate::tables::{gpos::Gpos, maxp::Maxp};
use crate::{FontData, FontRead, FontReadWithArgs, FontRef, Offset, ReadError, TableRef};

/// Limits on the work done while sanitizing a single table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SanitizeOptions {
    /// The maximum nesting depth of tables.
    pub max_depth: usize,
    /// The operation budget is this many operations per byte of input...
    pub max_ops_factor: usize,
    /// ...but never fewer than this...
    pub min_ops: usize,
    /// ...and never more than this.
    pub max_ops: usize,
}

impl SanitizeOptions {
    /// The number of operations allowed for a table of `len` bytes.
    pub fn ops_budget(&self, len: usize) -> usize {
        len.saturating_mul(self.max_ops_factor)
            .max(self.min_ops)
            .min(self.max_ops)
    }
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        SanitizeOptions {
            max_depth: 64,
            max_ops_factor: 8,
            min_ops: 16384,
            max_ops: 0x3FFF_FFFF,
        }
    }
}

/// A problem found while sanitizing.
///
/// Positions are relative to the start of the data that was sanitized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SanitizeError {
    /// The structure at `offset` needs more than the `len` bytes that remain.
    Truncation { offset: usize, len: usize },
    /// A declared length or count at `offset` cannot describe real data.
    InconsistentLength { offset: usize },
    /// The table at `offset` is reachable from itself.
    CyclicReference { offset: usize },
    /// The structure at `offset` is invalid in some other way.
    Malformed { offset: usize, reason: &'static str },
    /// The depth or operation budget ran out.
    BudgetExhausted,
}

impl std::fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeError::Truncation { offset, len } => {
                write!(f, "data truncated at {offset} ({len} bytes left)")
            }
            SanitizeError::InconsistentLength { offset } => {
                write!(f, "inconsistent length at {offset}")
            }
            SanitizeError::CyclicReference { offset } => {
                write!(f, "cyclic reference to table at {offset}")
            }
            SanitizeError::Malformed { offset, reason } => {
                write!(f, "malformed data at {offset}: {reason}")
            }
            SanitizeError::BudgetExhausted => write!(f, "sanitize budget exhausted"),
        }
    }
}

impl std::error::Error for SanitizeError {}

/// The result of sanitizing one top-level table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(SanitizeError),
    /// The table is not one we know how to sanitize.
    Skipped,
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }
}

/// The verdicts for each table in a font.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    verdicts: BTreeMap<Tag, Verdict>,
}

impl SanitizeReport {
    pub fn get(&self, tag: Tag) -> Option<&Verdict> {
        self.verdicts.get(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &Verdict)> + '_ {
        self.verdicts.iter().map(|(tag, verdict)| (*tag, verdict))
    }

    /// `true` if no table failed.
    pub fn is_ok(&self) -> bool {
        !self.verdicts.values().any(Verdict::is_failed)
    }

    /// The tags of the tables that failed.
    pub fn failed(&self) -> impl Iterator<Item = Tag> + '_ {
        self.verdicts
            .iter()
            .filter(|(_, verdict)| verdict.is_failed())
            .map(|(tag, _)| *tag)
    }
}

/// Sanitize every table in `font`.
///
/// A table whose record points outside the font fails with
/// [`SanitizeError::Truncation`].
pub fn sanitize_font(font: &FontRef, options: &SanitizeOptions) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    for record in font.table_directory.table_records() {
        let tag = record.tag();
        let verdict = match font.table_data(tag) {
            Some(data) => sanitize_table(tag, data, options),
            None => {
                log::warn!("table record for '{tag}' is out of bounds");
                Verdict::Failed(SanitizeError::Truncation {
                    offset: record.offset() as usize,
                    len: font.data().len().saturating_sub(record.offset() as usize),
                })
            }
        };
        report.verdicts.insert(tag, verdict);
    }
    report
}

/// Sanitize a single top-level table.
pub fn sanitize_table(tag: Tag, data: FontData, options: &SanitizeOptions) -> Verdict {
    let mut ctx = SanitizeContext::new(data, options);
    let result = match tag {
        crate::tables::gpos::TAG => ctx.visit::<Gpos>(data),
        crate::tables::maxp::TAG => ctx.visit::<Maxp>(data),
        _ => {
            log::trace!("skipping '{tag}'");
            return Verdict::Skipped;
        }
    };
    match result {
        Ok(()) => {
            log::debug!("'{tag}' passed, {} ops left", ctx.ops_left);
            Verdict::Passed
        }
        Err(e) => {
            log::warn!("'{tag}' failed sanitization: {e}");
            Verdict::Failed(e)
        }
    }
}

/// Check everything reachable from a table.
///
/// Implementations check their own fields and then visit each of their
/// children through the [`SanitizeContext`].
pub trait Sanitize<'a> {
    fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError>;
}

impl<'a, T: Sanitize<'a>> Dispatch<'a, SanitizeContext<'a>> for T {
    fn dispatch(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
        self.sanitize_with(ctx)
    }
}

/// A table that has been sanitized.
#[derive(Clone, Debug)]
pub struct Sanitized<T>(T);

impl<T> Sanitized<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Sanitized<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<'a, T> TableRef<'a, T>
where
    TableRef<'a, T>: Sanitize<'a>,
{
    /// Sanitize this table and everything reachable from it, using the
    /// default [`SanitizeOptions`].
    pub fn sanitize(self) -> Result<Sanitized<Self>, SanitizeError> {
        let data = self.data;
        let mut ctx = SanitizeContext::new(data, &SanitizeOptions::default());
        ctx.enter::<Self>(data, 0, |ctx| self.sanitize_with(ctx))?;
        Ok(Sanitized(self))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

// position, type, and a hash of any args used to read it
type VisitKey = (usize, &'static str, u64);

/// The state of a single sanitize walk.
pub struct SanitizeContext<'a> {
    blob: FontData<'a>,
    visited: HashMap<VisitKey, VisitState>,
    depth: usize,
    max_depth: usize,
    ops_left: usize,
}

impl<'a> SanitizeContext<'a> {
    /// Create a context for walking the tables in `blob`.
    pub fn new(blob: FontData<'a>, options: &SanitizeOptions) -> Self {
        SanitizeContext {
            blob,
            visited: HashMap::new(),
            depth: 0,
            max_depth: options.max_depth,
            ops_left: options.ops_budget(blob.len()),
        }
    }

    /// The number of operations left in the budget.
    pub fn ops_left(&self) -> usize {
        self.ops_left
    }

    fn charge(&mut self) -> Result<(), SanitizeError> {
        match self.ops_left.checked_sub(1) {
            Some(left) => {
                self.ops_left = left;
                Ok(())
            }
            None => {
                log::debug!("ops budget exhausted");
                Err(SanitizeError::BudgetExhausted)
            }
        }
    }

    // a position relative to the start of the blob
    fn relative(&self, data: FontData<'a>, offset: usize) -> usize {
        data.position()
            .saturating_sub(self.blob.position())
            .saturating_add(offset)
    }

    /// Check that `size` bytes starting at `offset` are inside `data`.
    pub fn check_range(
        &mut self,
        data: FontData<'a>,
        offset: usize,
        size: usize,
    ) -> Result<(), SanitizeError> {
        self.charge()?;
        match offset.checked_add(size) {
            Some(end) if end <= data.len() => Ok(()),
            _ => Err(SanitizeError::Truncation {
                offset: self.relative(data, offset),
                len: data.len().saturating_sub(offset),
            }),
        }
    }

    /// Check that an array of `count` items of `item_size` bytes each,
    /// starting at `offset`, is inside `data`.
    pub fn check_array(
        &mut self,
        data: FontData<'a>,
        offset: usize,
        count: usize,
        item_size: usize,
    ) -> Result<(), SanitizeError> {
        let len = count
            .checked_mul(item_size)
            .ok_or(SanitizeError::InconsistentLength {
                offset: self.relative(data, offset),
            })?;
        self.check_range(data, offset, len)
    }

    // the data at `offset` from the start of `base`.
    fn resolve(&mut self, base: FontData<'a>, offset: usize) -> Result<FontData<'a>, SanitizeError> {
        self.check_range(base, offset, 0)?;
        base.split_off(offset)
            .ok_or_else(|| SanitizeError::Truncation {
                offset: self.relative(base, offset),
                len: 0,
            })
    }

    /// Convert a read error for the structure at `data` into a result.
    ///
    /// An unknown format is not an error.
    pub fn read_error(&self, data: FontData<'a>, error: ReadError) -> Result<(), SanitizeError> {
        let offset = self.relative(data, 0);
        match error {
            ReadError::OutOfBounds => Err(SanitizeError::Truncation {
                offset,
                len: data.len(),
            }),
            ReadError::InvalidArrayLen => Err(SanitizeError::InconsistentLength { offset }),
            ReadError::InvalidFormat(format) => {
                log::debug!("unknown format {format} at {offset}");
                Ok(())
            }
            ReadError::NullOffset => Ok(()),
            ReadError::MalformedData(reason) => Err(SanitizeError::Malformed { offset, reason }),
            ReadError::InvalidSfnt(_)
            | ReadError::TableIsMissing(_) => Err(SanitizeError::Malformed {
                offset,
                reason: "unreadable table",
            }),
        }
    }

    /// Visit the table at `data`.
    pub fn visit<T>(&mut self, data: FontData<'a>) -> Result<(), SanitizeError>
    where
        T: FontRead<'a> + Sanitize<'a>,
    {
        self.enter::<T>(data, 0, |ctx| match T::read(data) {
            Ok(table) => table.sanitize_with(ctx),
            Err(e) => ctx.read_error(data, e),
        })
    }

    /// Visit the table at `offset` from the start of `base`.
    ///
    /// A null offset is accepted.
    pub fn visit_table<T>(&mut self, base: FontData<'a>, offset: impl Offset) -> Result<(), SanitizeError>
    where
        T: FontRead<'a> + Sanitize<'a>,
    {
        let Some(offset) = offset.non_null() else {
            return Ok(());
        };
        let data = self.resolve(base, offset)?;
        self.visit::<T>(data)
    }

    /// Visit the table at `offset` from the start of `base`, which needs
    /// `args` to be read.
    pub fn visit_table_with_args<T>(
        &mut self,
        base: FontData<'a>,
        offset: impl Offset,
        args: &T::Args,
    ) -> Result<(), SanitizeError>
    where
        T: FontReadWithArgs<'a> + Sanitize<'a>,
        T::Args: Hash,
    {
        let Some(offset) = offset.non_null() else {
            return Ok(());
        };
        let data = self.resolve(base, offset)?;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        args.hash(&mut hasher);
        self.enter::<T>(data, hasher.finish(), |ctx| {
            match T::read_with_args(data, args) {
                Ok(table) => table.sanitize_with(ctx),
                Err(e) => ctx.read_error(data, e),
            }
        })
    }

    /// Visit the format-tagged table at `offset` from the start of `base`.
    ///
    /// Unknown formats are accepted without being inspected.
    pub fn visit_format<T>(&mut self, base: FontData<'a>, offset: impl Offset) -> Result<(), SanitizeError>
    where
        T: FormatRecord<'a> + Sanitize<'a>,
    {
        let Some(offset) = offset.non_null() else {
            return Ok(());
        };
        let data = self.resolve(base, offset)?;
        self.enter::<T>(data, 0, |ctx| dispatch::<T, _>(data, ctx))
    }

    /// Visit the table at a signed `offset` from the start of `base`.
    ///
    /// The target may come before `base`, but must be inside the data this
    /// context was created with.
    pub fn visit_signed<T>(&mut self, base: FontData<'a>, offset: i32) -> Result<(), SanitizeError>
    where
        T: FontRead<'a> + Sanitize<'a>,
    {
        if offset == 0 {
            return Ok(());
        }
        self.charge()?;
        let target = (self.relative(base, 0) as i64).checked_add(offset as i64);
        let data = target
            .and_then(|pos| usize::try_from(pos).ok())
            .and_then(|pos| self.blob.split_off(pos))
            .ok_or(SanitizeError::Truncation {
                offset: self.relative(base, 0),
                len: 0,
            })?;
        self.visit::<T>(data)
    }

    fn enter<T>(
        &mut self,
        data: FontData<'a>,
        args_hash: u64,
        f: impl FnOnce(&mut Self) -> Result<(), SanitizeError>,
    ) -> Result<(), SanitizeError> {
        let key = (data.position(), std::any::type_name::<T>(), args_hash);
        match self.visited.get(&key) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => {
                let offset = self.relative(data, 0);
                log::debug!("cycle through {} at {offset}", key.1);
                return Err(SanitizeError::CyclicReference { offset });
            }
            None => (),
        }
        self.charge()?;
        if self.depth >= self.max_depth {
            log::debug!("max depth {} exceeded", self.max_depth);
            return Err(SanitizeError::BudgetExhausted);
        }
        self.visited.insert(key, VisitState::InProgress);
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        if result.is_ok() {
            self.visited.insert(key, VisitState::Done);
        }
        result
    }
}

impl<'a> DispatchContext<'a> for SanitizeContext<'a> {
    type Output = Result<(), SanitizeError>;

    fn may_dispatch(&mut self, _data: FontData<'a>, _format: u16) -> bool {
        self.charge().is_ok()
    }

    fn default_return_value(&mut self) -> Self::Output {
        Ok(())
    }

    fn no_dispatch_return_value(&mut self) -> Self::Output {
        Err(SanitizeError::BudgetExhausted)
    }

    fn read_error(&mut self, data: FontData<'a>, error: ReadError) -> Self::Output {
        SanitizeContext::read_error(self, data, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_prelude::*;
    use crate::TableProvider;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sfnt_test_data::{be_buffer, bebuffer::BeBuffer, gpos as gpos_data, maxp as maxp_data};

    const GPOS: Tag = crate::tables::gpos::TAG;
    const MAXP: Tag = crate::tables::maxp::TAG;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sanitize_gpos(data: &[u8]) -> Verdict {
        sanitize_table(GPOS, FontData::new(data), &SanitizeOptions::default())
    }

    // a table that is just a signed offset to another of its kind
    #[derive(Debug, Clone, Copy)]
    struct LinkMarker;

    type Link<'a> = TableRef<'a, LinkMarker>;

    impl<'a> FontRead<'a> for Link<'a> {
        fn read(data: FontData<'a>) -> Result<Self, ReadError> {
            let mut cursor = data.cursor();
            cursor.advance::<i16>();
            cursor.finish(LinkMarker)
        }
    }

    impl<'a> Sanitize<'a> for Link<'a> {
        fn sanitize_with(&self, ctx: &mut SanitizeContext<'a>) -> Result<(), SanitizeError> {
            let next: i16 = self.data.read_at(0).unwrap_or_default();
            ctx.visit_signed::<Link>(self.data, next.into())
        }
    }

    fn walk_links(buf: &[u8]) -> Result<(), SanitizeError> {
        let data = FontData::new(buf);
        SanitizeContext::new(data, &SanitizeOptions::default()).visit::<Link>(data)
    }

    #[test]
    fn well_formed_gpos_passes_repeatably() {
        init_logging();
        let buf = gpos_data::simple_gpos();
        let first = sanitize_gpos(&buf);
        assert_eq!(first, Verdict::Passed);
        assert_eq!(sanitize_gpos(&buf), first);
    }

    #[test]
    fn truncated_gpos_always_fails() {
        init_logging();
        let buf = gpos_data::simple_gpos();
        for len in 0..buf.len() {
            let verdict = sanitize_gpos(&buf[..len]);
            assert!(verdict.is_failed(), "truncated at {len}: {verdict:?}");
        }
    }

    #[rstest]
    #[case::v05(maxp_data::MAXP_V05)]
    #[case::v1(maxp_data::MAXP_V1)]
    fn truncated_maxp_always_fails(#[case] table: &[u8]) {
        let opts = SanitizeOptions::default();
        assert!(sanitize_table(MAXP, FontData::new(table), &opts).is_passed());
        for len in 0..table.len() {
            let verdict = sanitize_table(MAXP, FontData::new(&table[..len]), &opts);
            assert!(verdict.is_failed(), "truncated at {len}");
        }
    }

    #[test]
    fn unknown_maxp_version() {
        let buf = be_buffer! { 0x00020000u32, 5u16 };
        let verdict = sanitize_table(MAXP, FontData::new(&buf), &SanitizeOptions::default());
        assert!(matches!(
            verdict,
            Verdict::Failed(SanitizeError::Malformed { offset: 0, .. })
        ));
    }

    #[test]
    fn mutually_referencing_offsets_terminate() {
        init_logging();
        // two links, each pointing at the other
        let buf = be_buffer! { 2u16, (-2i16) };
        assert_eq!(
            walk_links(&buf),
            Err(SanitizeError::CyclicReference { offset: 0 })
        );
        // a chain that ends is fine
        let buf = be_buffer! { 2u16, 2u16, 0u16 };
        assert_eq!(walk_links(&buf), Ok(()));
        // and one that leaves the data is not
        let buf = be_buffer! { (-4i16) };
        assert!(matches!(
            walk_links(&buf),
            Err(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn shared_tables_are_not_cycles() {
        // both lookups point at the same lookup table
        let single = gpos_data::lookup(1, &[gpos_data::SINGLEPOSFORMAT1]);
        let buf = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16, 2u16, 6u16, 6u16 }
            .extend_bytes(&single);
        assert_eq!(sanitize_gpos(&buf), Verdict::Passed);
    }

    #[test]
    fn extension_of_extension_fails() {
        let ext = gpos_data::extension(9, gpos_data::PAIRPOSFORMAT1);
        let lookup = gpos_data::lookup(9, &[&ext]);
        let lookups = gpos_data::lookup_list(&[&lookup]);
        let buf = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }.extend_bytes(&lookups);
        assert!(matches!(
            sanitize_gpos(&buf),
            Verdict::Failed(SanitizeError::Malformed { .. })
        ));
    }

    #[test]
    fn mixed_extension_types_fail() {
        let ext1 = gpos_data::extension(1, gpos_data::SINGLEPOSFORMAT1);
        let ext2 = gpos_data::extension(2, gpos_data::PAIRPOSFORMAT1);
        let lookup = gpos_data::lookup(9, &[&ext1, &ext2]);
        let lookups = gpos_data::lookup_list(&[&lookup]);
        let buf = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }.extend_bytes(&lookups);
        assert!(sanitize_gpos(&buf).is_failed());
    }

    #[test]
    fn unknown_formats_pass() {
        // a pair adjustment subtable with format 7, and a lookup of type 12
        let pair = gpos_data::lookup(2, &[&[0u8, 7, 0xFF, 0xFF]]);
        let unknown = be_buffer! { 12u16, 0u16, 1u16, 0xFFFFu16 };
        let lookups = gpos_data::lookup_list(&[&pair, &unknown]);
        let buf = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }.extend_bytes(&lookups);
        assert_eq!(sanitize_gpos(&buf), Verdict::Passed);
    }

    #[test]
    fn unmodeled_lookup_needs_readable_format() {
        // a mark-to-base lookup whose only subtable starts past the end
        let lookup = be_buffer! { 4u16, 0u16, 1u16, 8u16 };
        let lookups = gpos_data::lookup_list(&[&lookup]);
        let buf = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }.extend_bytes(&lookups);
        assert!(sanitize_gpos(&buf).is_failed());
    }

    #[test]
    fn bad_device_offset_fails() {
        // single adjustment with an x placement device past the end
        let subtable = be_buffer! { 1u16, 8u16, 0x0010u16, 100u16, 1u16, 1u16, [1u16] };
        let lookup = gpos_data::lookup(1, &[&subtable]);
        let lookups = gpos_data::lookup_list(&[&lookup]);
        let buf = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }.extend_bytes(&lookups);
        assert!(matches!(
            sanitize_gpos(&buf),
            Verdict::Failed(SanitizeError::Truncation { .. })
        ));
    }

    #[test]
    fn feature_variations_offset_is_checked() {
        let buf = be_buffer! { 1u16, 1u16, 0u16, 0u16, 0u16, 0x1000u32 };
        assert!(sanitize_gpos(&buf).is_failed());
        let buf = be_buffer! { 1u16, 1u16, 0u16, 0u16, 0u16, 0u32 };
        assert!(sanitize_gpos(&buf).is_passed());
    }

    #[test]
    fn ops_budget() {
        let buf = gpos_data::simple_gpos();
        let opts = SanitizeOptions {
            max_ops_factor: 0,
            min_ops: 8,
            ..Default::default()
        };
        let verdict = sanitize_table(GPOS, FontData::new(&buf), &opts);
        assert_eq!(verdict, Verdict::Failed(SanitizeError::BudgetExhausted));
        assert_eq!(opts.ops_budget(10_000), 8);
        assert_eq!(SanitizeOptions::default().ops_budget(10), 16384);
        assert_eq!(SanitizeOptions::default().ops_budget(usize::MAX), 0x3FFF_FFFF);
    }

    #[test]
    fn depth_budget() {
        let buf = gpos_data::simple_gpos();
        let opts = SanitizeOptions {
            max_depth: 3,
            ..Default::default()
        };
        let verdict = sanitize_table(GPOS, FontData::new(&buf), &opts);
        assert_eq!(verdict, Verdict::Failed(SanitizeError::BudgetExhausted));
    }

    #[test]
    fn check_array_overflow() {
        let buf = [0u8; 8];
        let data = FontData::new(&buf);
        let mut ctx = SanitizeContext::new(data, &SanitizeOptions::default());
        assert_eq!(
            ctx.check_array(data, 2, usize::MAX, 2),
            Err(SanitizeError::InconsistentLength { offset: 2 })
        );
        assert_eq!(
            ctx.check_range(data, usize::MAX, 2),
            Err(SanitizeError::Truncation {
                offset: usize::MAX,
                len: 0
            })
        );
        assert_eq!(ctx.check_array(data, 2, 3, 2), Ok(()));
        assert!(ctx.check_array(data, 2, 4, 2).is_err());
    }

    #[test]
    fn failures_stay_local() {
        init_logging();
        let gpos = gpos_data::simple_gpos();
        let font = sfnt_test_data::sfnt(&[
            (GPOS, gpos.as_slice()),
            (MAXP, &maxp_data::MAXP_V1[..20]),
            (Tag::new(b"head"), &[0u8; 54]),
        ]);
        let font = FontRef::new(&font).unwrap();
        let report = sanitize_font(&font, &SanitizeOptions::default());
        assert_eq!(report.get(GPOS), Some(&Verdict::Passed));
        assert!(report.get(MAXP).unwrap().is_failed());
        assert_eq!(report.get(Tag::new(b"head")), Some(&Verdict::Skipped));
        assert_eq!(report.failed().collect::<Vec<_>>(), [MAXP]);
        assert!(!report.is_ok());
    }

    #[test]
    fn sanitize_typed_table() {
        let gpos = gpos_data::simple_gpos();
        let font = sfnt_test_data::sfnt(&[(GPOS, gpos.as_slice())]);
        let font = FontRef::new(&font).unwrap();
        let sanitized = font.gpos().unwrap().sanitize().unwrap();
        assert_eq!(sanitized.lookup_list().unwrap().lookup_count(), 3);
    }

    #[test]
    fn bebuffer_tables_can_be_patched() {
        // patching the coverage offset of a pair adjustment to point past the end
        let mut subtable = be_buffer! {
            1u16, {0u16: "coverage"}, 0u16, 0u16, 0u16
        };
        subtable.write_at("coverage", 0x100u16);
        let lookup = gpos_data::lookup(2, &[&subtable]);
        let lookups = gpos_data::lookup_list(&[&lookup]);
        let buf: BeBuffer = be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }.extend_bytes(&lookups);
        assert!(sanitize_gpos(&buf).is_failed());
    }
}
