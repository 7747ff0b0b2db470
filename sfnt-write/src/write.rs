use crate::error::Error;
use crate::graph::{Graph, ObjectId, ObjectStore, OffsetLen, PackOptions};
use crate::table_type::TableType;
use crate::validate::Validate;

use read::{FontData, FontRead, ReadError};
use types::Scalar;

/// A type that that can be written out as part of a font file.
///
/// This both handles writing big-endian bytes as well as describing the
/// relationship between tables and their subtables.
pub trait FontWrite {
    /// Write our data and information about offsets into this [TableWriter].
    fn write_into(&self, writer: &mut TableWriter);

    /// The type of this table, when it needs to be recognized while packing.
    fn table_type(&self) -> TableType {
        TableType::Unknown
    }
}

/// An object that manages a collection of serialized tables.
///
/// This handles deduplicating objects and tracking offsets.
#[derive(Debug, Default)]
pub struct TableWriter {
    /// Finished tables, associated with an ObjectId; duplicate tables share an id.
    tables: ObjectStore,
    /// The table currently being written.
    current: TableData,
}

/// The position an offset is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Whence {
    /// The start of the table containing the offset.
    #[default]
    Head,
    /// The end of the table containing the offset.
    Tail,
    /// The start of the serialized output.
    Absolute,
}

/// The encoding of an offset field.
///
/// Most offsets are unsigned and measured from the start of the table that
/// contains them; a few formats use signed offsets, or measure from somewhere
/// else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OffsetLink {
    pub len: OffsetLen,
    pub signed: bool,
    pub whence: Whence,
    /// A value subtracted from the resolved offset before it is written.
    pub bias: u32,
}

impl OffsetLink {
    /// An unsigned offset of the given width, relative to the parent table.
    pub const fn new(len: OffsetLen) -> Self {
        OffsetLink {
            len,
            signed: false,
            whence: Whence::Head,
            bias: 0,
        }
    }

    pub const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub const fn with_whence(mut self, whence: Whence) -> Self {
        self.whence = whence;
        self
    }

    pub const fn with_bias(mut self, bias: u32) -> Self {
        self.bias = bias;
        self
    }
}

/// Attempt to serialize a table.
///
/// The table is validated, its subtables are packed so that every offset is
/// in range, and the bytes encoding the table are returned.
pub fn dump_table<T: FontWrite + Validate>(table: &T) -> Result<Vec<u8>, Error> {
    dump_table_with(table, &PackOptions::default())
}

/// Serialize a table, with custom packing options.
pub fn dump_table_with<T: FontWrite + Validate>(
    table: &T,
    options: &PackOptions,
) -> Result<Vec<u8>, Error> {
    log::trace!("writing table '{}'", table.table_type());
    table.validate().map_err(Error::ValidationFailed)?;
    let mut graph = TableWriter::make_graph(table);
    graph.pack_objects(options).map_err(Error::PackingFailed)?;
    graph.serialize().map_err(Error::PackingFailed)
}

impl TableWriter {
    /// Compile a table and all of its subtables into an object graph.
    pub(crate) fn make_graph(root: &impl FontWrite) -> Graph {
        let mut writer = TableWriter::default();
        let root_id = writer.add_table(root);
        Graph::from_obj_store(writer.tables, root_id)
    }

    fn add_table(&mut self, table: &dyn FontWrite) -> ObjectId {
        let parent = std::mem::replace(&mut self.current, TableData::new(table.table_type()));
        table.write_into(self);
        let data = std::mem::replace(&mut self.current, parent);
        self.tables.add(data)
    }

    /// Write raw bytes into this table.
    ///
    /// The caller is responsible for ensuring bytes are in big-endian order.
    #[inline]
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.current.write_bytes(bytes)
    }

    /// Create an offset to another table.
    ///
    /// The `width` argument is the size in bytes of the offset, e.g. 2 for
    /// an `Offset16`, and 4 for an `Offset32`.
    ///
    /// The provided table will be serialized immediately, and the position
    /// of the offset within the current table will be recorded. Offsets
    /// are resolved when the root table object is serialized, at which point
    /// we overwrite each recorded offset position with the final offset of the
    /// appropriate table.
    pub fn write_offset(&mut self, obj: &dyn FontWrite, width: usize) {
        self.write_offset_with(obj, OffsetLink::new(OffsetLen::from_width(width)))
    }

    /// Create an offset to another table, with an explicit encoding.
    pub fn write_offset_with(&mut self, obj: &dyn FontWrite, link: OffsetLink) {
        let obj_id = self.add_table(obj);
        self.current.add_offset_with(obj_id, link);
    }

    /// The bytes of a table written without any offsets.
    ///
    /// Used when writing top-level font objects, which are done more manually.
    pub(crate) fn into_data(self) -> TableData {
        debug_assert!(self.current.offsets.is_empty());
        self.current
    }
}

/// The encoded data for a given table, along with info on included offsets
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq)]
pub(crate) struct TableData {
    pub(crate) type_: TableType,
    pub(crate) bytes: Vec<u8>,
    pub(crate) offsets: Vec<OffsetRecord>,
}

/// The position and type of an offset, along with the id of the pointed-to entity
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct OffsetRecord {
    /// the position of the offset within the parent table
    pub(crate) pos: u32,
    /// the offset length in bytes
    pub(crate) len: OffsetLen,
    pub(crate) signed: bool,
    pub(crate) whence: Whence,
    pub(crate) bias: u32,
    /// The object pointed to by the offset
    pub(crate) object: ObjectId,
}

impl OffsetRecord {
    pub(crate) fn link(&self) -> OffsetLink {
        OffsetLink {
            len: self.len,
            signed: self.signed,
            whence: self.whence,
            bias: self.bias,
        }
    }
}

impl TableData {
    pub(crate) fn new(type_: TableType) -> Self {
        TableData {
            type_,
            ..Default::default()
        }
    }

    /// Add an unsigned offset at the current position, relative to the start
    /// of this table.
    pub(crate) fn add_offset(&mut self, object: ObjectId, width: usize, bias: u32) {
        let link = OffsetLink::new(OffsetLen::from_width(width)).with_bias(bias);
        self.add_offset_with(object, link);
    }

    pub(crate) fn add_offset_with(&mut self, object: ObjectId, link: OffsetLink) {
        self.offsets.push(OffsetRecord {
            pos: self.bytes.len() as u32,
            len: link.len,
            signed: link.signed,
            whence: link.whence,
            bias: link.bias,
            object,
        });
        const NULL_BYTES: [u8; 4] = [0; 4];
        self.write_bytes(&NULL_BYTES[..link.len.width()]);
    }

    /// Copy an existing offset record, placing it at a new position.
    pub(crate) fn add_offset_record_at(&mut self, record: &OffsetRecord, pos: u32) {
        self.offsets.push(OffsetRecord {
            pos,
            ..record.clone()
        });
    }

    pub(crate) fn write<T: Scalar>(&mut self, value: T) {
        self.bytes.extend_from_slice(value.to_raw().as_ref())
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes)
    }

    /// Overwrite a previously written value.
    pub(crate) fn write_over<T: Scalar>(&mut self, value: T, pos: usize) {
        let raw = value.to_raw();
        let raw = raw.as_ref();
        if let Some(slot) = self.bytes.get_mut(pos..pos + raw.len()) {
            slot.copy_from_slice(raw);
        }
    }

    pub(crate) fn read_at<T: Scalar>(&self, pos: usize) -> Result<T, ReadError> {
        FontData::new(&self.bytes).read_at(pos)
    }

    /// Parse these bytes as a table.
    ///
    /// Offsets in the result are not meaningful until the graph is serialized;
    /// only the inline fields can be trusted.
    pub(crate) fn reparse<'a, T: FontRead<'a>>(&'a self) -> Result<T, ReadError> {
        T::read(FontData::new(&self.bytes))
    }

    #[cfg(test)]
    pub fn make_mock(size: usize) -> Self {
        TableData {
            bytes: vec![0xca; size], // has no special meaning
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn add_mock_offset(&mut self, object: ObjectId, len: OffsetLen) {
        let pos = self.offsets.iter().map(|off| off.len.width() as u32).sum();
        self.offsets.push(OffsetRecord {
            pos,
            len,
            signed: false,
            whence: Whence::Head,
            bias: 0,
            object,
        });
    }
}

macro_rules! write_be_bytes {
    ($ty:ty) => {
        impl FontWrite for $ty {
            #[inline]
            fn write_into(&self, writer: &mut TableWriter) {
                writer.write_slice(&self.to_be_bytes())
            }
        }
    };
}

//NOTE: not implemented for offsets! it would be too easy to accidentally write them.
write_be_bytes!(u8);
write_be_bytes!(i8);
write_be_bytes!(u16);
write_be_bytes!(i16);
write_be_bytes!(u32);
write_be_bytes!(i32);
write_be_bytes!(types::Uint24);
write_be_bytes!(types::Tag);
write_be_bytes!(types::Version16Dot16);
write_be_bytes!(types::MajorMinor);
write_be_bytes!(types::GlyphId16);

impl<T: FontWrite> FontWrite for [T] {
    fn write_into(&self, writer: &mut TableWriter) {
        self.iter().for_each(|item| item.write_into(writer))
    }
}
