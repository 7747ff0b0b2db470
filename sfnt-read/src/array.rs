//! Custom array types

use crate::read::{ComputeSize, FontReadWithArgs, ReadArgs};
use crate::{FontData, ReadError};

/// An array whose items size is not known at compile time.
///
/// At runtime, `Args` are provided which will be used to compute the size
/// of each item; this is used for records that embed a `ValueRecord`.
#[derive(Clone)]
pub struct ComputedArray<'a, T: ReadArgs> {
    // the length of each item
    item_len: usize,
    len: usize,
    data: FontData<'a>,
    args: T::Args,
}

impl<'a, T: ComputeSize> ComputedArray<'a, T> {
    pub fn new(data: FontData<'a>, args: T::Args) -> Self {
        let item_len = T::compute_size(&args);
        let len = data.len().checked_div(item_len).unwrap_or(0);
        ComputedArray {
            item_len,
            len,
            data,
            args,
        }
    }

    /// The number of items in the array.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The size of each item, in bytes.
    pub fn item_len(&self) -> usize {
        self.item_len
    }
}

impl<T: ReadArgs> ReadArgs for ComputedArray<'_, T> {
    type Args = T::Args;
}

impl<'a, T> FontReadWithArgs<'a> for ComputedArray<'a, T>
where
    T: ComputeSize + FontReadWithArgs<'a>,
{
    fn read_with_args(data: FontData<'a>, args: &Self::Args) -> Result<Self, ReadError> {
        Ok(Self::new(data, *args))
    }
}

impl<'a, T> ComputedArray<'a, T>
where
    T: FontReadWithArgs<'a>,
    T::Args: 'static,
{
    pub fn iter(&self) -> impl Iterator<Item = Result<T, ReadError>> + 'a {
        let data = self.data;
        let args = self.args;
        let item_len = self.item_len;
        (0..self.len).map(move |i| {
            let start = item_len * i;
            data.read_with_args(start..start + item_len, &args)
        })
    }

    pub fn get(&self, idx: usize) -> Result<T, ReadError> {
        if idx >= self.len {
            return Err(ReadError::OutOfBounds);
        }
        let item_start = idx * self.item_len;
        self.data
            .read_with_args(item_start..item_start + self.item_len, &self.args)
    }
}

impl<T: ReadArgs> std::fmt::Debug for ComputedArray<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ComputedArray")
            .field("len", &self.len)
            .field("item_len", &self.item_len)
            .finish()
    }
}
