//! Fields that hold a subtable and are written as an offset to it

use super::write::{FontWrite, TableWriter};

/// Bytes in an `Offset16`.
pub const WIDTH_16: usize = 2;
/// Bytes in an `Offset24`.
pub const WIDTH_24: usize = 3;
/// Bytes in an `Offset32`.
pub const WIDTH_32: usize = 4;

/// A required subtable, written as an `N`-byte offset.
///
/// A marker without a subtable only exists as a [`Default`] placeholder;
/// validation reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetMarker<T, const N: usize = WIDTH_16> {
    obj: Option<T>,
}

/// An optional subtable, written as an `N`-byte offset that is zero when
/// the subtable is missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NullableOffsetMarker<T, const N: usize = WIDTH_16> {
    obj: Option<T>,
}

// the derive would require `T: Default`
impl<T, const N: usize> Default for OffsetMarker<T, N> {
    fn default() -> Self {
        OffsetMarker { obj: None }
    }
}

impl<T, const N: usize> Default for NullableOffsetMarker<T, N> {
    fn default() -> Self {
        NullableOffsetMarker { obj: None }
    }
}

impl<const N: usize, T> OffsetMarker<T, N> {
    pub fn new(obj: T) -> Self {
        OffsetMarker { obj: Some(obj) }
    }

    pub fn is_some(&self) -> bool {
        self.obj.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.obj.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.obj.as_mut()
    }

    pub fn set(&mut self, obj: T) {
        self.obj = Some(obj);
    }
}

impl<const N: usize, T> NullableOffsetMarker<T, N> {
    pub fn new(obj: Option<T>) -> Self {
        NullableOffsetMarker { obj }
    }

    pub fn is_none(&self) -> bool {
        self.obj.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        self.obj.as_ref()
    }

    pub fn set(&mut self, obj: T) {
        self.obj = Some(obj);
    }

    pub fn clear(&mut self) {
        self.obj = None;
    }
}

impl<const N: usize, T> From<T> for OffsetMarker<T, N> {
    fn from(obj: T) -> Self {
        OffsetMarker::new(obj)
    }
}

impl<const N: usize, T> From<Option<T>> for NullableOffsetMarker<T, N> {
    fn from(obj: Option<T>) -> Self {
        NullableOffsetMarker::new(obj)
    }
}

/// Write an offset to `obj`, or `N` zero bytes.
fn write_marker<T: FontWrite, const N: usize>(obj: Option<&T>, writer: &mut TableWriter) {
    match obj {
        Some(obj) => writer.write_offset(obj, N),
        None => writer.write_slice(&[0u8; N]),
    }
}

impl<const N: usize, T: FontWrite> FontWrite for OffsetMarker<T, N> {
    fn write_into(&self, writer: &mut TableWriter) {
        if self.obj.is_none() {
            log::warn!("writing a required offset with no subtable as null");
        }
        write_marker::<T, N>(self.get(), writer);
    }
}

impl<const N: usize, T: FontWrite> FontWrite for NullableOffsetMarker<T, N> {
    fn write_into(&self, writer: &mut TableWriter) {
        write_marker::<T, N>(self.get(), writer);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // not `Default`, so the markers' own impls are exercised
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Payload(u16);

    impl FontWrite for Payload {
        fn write_into(&self, writer: &mut TableWriter) {
            self.0.write_into(writer);
        }
    }

    #[test]
    fn markers_start_empty() {
        let mut required = OffsetMarker::<Payload>::default();
        assert!(!required.is_some());
        required.set(Payload(3));
        assert_eq!(required.get(), Some(&Payload(3)));

        let mut optional = NullableOffsetMarker::<Payload, WIDTH_32>::from(Some(Payload(1)));
        assert!(!optional.is_none());
        optional.clear();
        assert_eq!(optional.get(), None);
    }

    #[test]
    fn missing_subtables_write_zeros() {
        let mut writer = TableWriter::default();
        NullableOffsetMarker::<Payload, WIDTH_24>::default().write_into(&mut writer);
        OffsetMarker::<Payload, WIDTH_16>::default().write_into(&mut writer);
        assert_eq!(writer.into_data().bytes, [0, 0, 0, 0, 0]);
    }

    #[test]
    fn present_subtable_is_linked() {
        let mut writer = TableWriter::default();
        OffsetMarker::<Payload, WIDTH_32>::new(Payload(7)).write_into(&mut writer);
        let data = writer.into_data();
        assert_eq!(data.bytes, [0, 0, 0, 0]);
        assert_eq!(data.offsets.len(), 1);
        assert_eq!(data.offsets[0].len.width(), WIDTH_32);
    }
}
