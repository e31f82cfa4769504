// SPDX-License-Identifier: MIT

//! A read-only view over the bytes of a HID Report Descriptor.
//!
//! Items are variable-length, so a [DescriptorView] can only be traversed
//! front to back. Iteration is lazy and decodes each item in place, see
//! [ItemRef].
//!
//! ```
//! # use hidrp::*;
//! let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];
//! let view = DescriptorView::new(&bytes);
//! assert!(view.has_valid_bounds());
//! let offsets: Vec<usize> = view.iter().map(|item| item.offset()).collect();
//! assert_eq!(offsets, [0, 2, 4, 6]);
//! ```

use crate::hid::{item_size, ItemRef};

/// A contiguous run of items from a HID Report Descriptor.
///
/// A view may cover only a part of the descriptor (see [DescriptorView::subview]),
/// item offsets are always relative to the start of the full descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorView<'a> {
    bytes: &'a [u8],
    base: usize,
}

impl<'a> DescriptorView<'a> {
    pub fn new(bytes: &'a [u8]) -> DescriptorView<'a> {
        DescriptorView { bytes, base: 0 }
    }

    /// The bytes covered by this view
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The descriptor offset of the first byte of this view
    pub fn begin(&self) -> usize {
        self.base
    }

    /// The descriptor offset just past the last byte of this view
    pub fn end(&self) -> usize {
        self.base + self.bytes.len()
    }

    /// Returns true if every item in this view lies fully within the view.
    ///
    /// Iteration stops silently at the first truncated item, so this check
    /// must pass before the items are interpreted.
    pub fn has_valid_bounds(&self) -> bool {
        let mut offset = 0;
        while offset < self.bytes.len() {
            match item_size(&self.bytes[offset..]) {
                Some(size) => offset += size,
                None => return false,
            }
        }
        true
    }

    pub fn iter(&self) -> Items<'a> {
        Items {
            bytes: self.bytes,
            base: self.base,
            offset: 0,
        }
    }

    /// The item at the given descriptor offset, if that offset lies
    /// within this view and holds a complete item.
    pub fn item_at(&self, offset: usize) -> Option<ItemRef<'a>> {
        let start = offset.checked_sub(self.base)?;
        ItemRef::new(self.bytes.get(start..)?, offset)
    }

    /// The part of this view between the descriptor offsets `begin` and `end`.
    /// Offsets outside of this view are clamped to it.
    pub fn subview(&self, begin: usize, end: usize) -> DescriptorView<'a> {
        let end = end.clamp(self.begin(), self.end());
        let begin = begin.clamp(self.begin(), end);
        DescriptorView {
            bytes: &self.bytes[begin - self.base..end - self.base],
            base: begin,
        }
    }

    /// The remainder of this view starting at the descriptor offset `begin`.
    pub fn tail(&self, begin: usize) -> DescriptorView<'a> {
        self.subview(begin, self.end())
    }
}

impl<'a> From<&'a [u8]> for DescriptorView<'a> {
    fn from(bytes: &'a [u8]) -> DescriptorView<'a> {
        DescriptorView::new(bytes)
    }
}

impl<'a> IntoIterator for &DescriptorView<'a> {
    type Item = ItemRef<'a>;
    type IntoIter = Items<'a>;

    fn into_iter(self) -> Items<'a> {
        self.iter()
    }
}

/// The iterator over the items of a [DescriptorView]. Each step advances
/// by the size of the current item. The iterator ends at the end of the
/// view or at the first truncated item.
#[derive(Debug, Clone)]
pub struct Items<'a> {
    bytes: &'a [u8],
    base: usize,
    offset: usize,
}

impl Items<'_> {
    /// The descriptor offset of the next item
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }
}

impl<'a> Iterator for Items<'a> {
    type Item = ItemRef<'a>;

    fn next(&mut self) -> Option<ItemRef<'a>> {
        let item = ItemRef::new(self.bytes.get(self.offset..)?, self.base + self.offset)?;
        self.offset += item.bytes().len();
        Some(item)
    }
}

impl std::iter::FusedIterator for Items<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::{GlobalTag, Item};

    #[test]
    fn valid_bounds() {
        let valid: [&[u8]; 5] = [
            &[],
            &[0x00],
            &[0x01, 42],
            &[0x02, 0xab, 0xcd],
            &[0x03, 0x01, 0x23, 0x45, 0x67],
        ];
        for bytes in valid {
            assert!(DescriptorView::new(bytes).has_valid_bounds(), "{bytes:?}");
        }

        let invalid: [&[u8]; 4] = [
            // 0xff claims 4 data bytes
            &[0x00, 0xff],
            &[0x01],
            &[0x02, 0x01],
            &[0x03, 0x01, 0x23, 0x45],
        ];
        for bytes in invalid {
            assert!(!DescriptorView::new(bytes).has_valid_bounds(), "{bytes:?}");
        }
    }

    #[test]
    fn iterate() {
        let bytes = [0x05, 0x01, 0xa4, 0x27, 0xff, 0xff, 0x00, 0x00, 0xb4];
        let view = DescriptorView::new(&bytes);
        let items: Vec<ItemRef> = view.iter().collect();
        assert_eq!(items.len(), 4);
        assert!(items[0].has_tag(GlobalTag::UsagePage));
        assert!(items[1].has_tag(GlobalTag::Push));
        assert_eq!(items[2].value_unsigned().unwrap(), 0xffff);
        assert_eq!(items[2].offset(), 3);
        assert!(items[3].has_tag(GlobalTag::Pop));

        // restartable
        assert_eq!(view.iter().count(), 4);
        assert_eq!((&view).into_iter().count(), 4);
    }

    #[test]
    fn iterate_truncated() {
        let bytes = [0x05, 0x01, 0x06, 0x01];
        let view = DescriptorView::new(&bytes);
        let mut iter = view.iter();
        assert!(iter.next().is_some());
        assert_eq!(iter.offset(), 2);
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn subview() {
        let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];
        let view = DescriptorView::new(&bytes);
        let sub = view.subview(2, 6);
        assert_eq!(sub.begin(), 2);
        assert_eq!(sub.end(), 6);
        let offsets: Vec<usize> = sub.iter().map(|item| item.offset()).collect();
        assert_eq!(offsets, [2, 4]);

        assert_eq!(sub.item_at(4).unwrap().bytes(), &[0xa1, 0x01]);
        assert!(sub.item_at(0).is_none());
        assert!(sub.item_at(6).is_none());

        let tail = view.tail(4);
        assert_eq!(tail.iter().count(), 2);
        assert!(view.subview(10, 20).is_empty());
    }
}
