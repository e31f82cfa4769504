// SPDX-License-Identifier: MIT

//! The binary item model of a HID Report Descriptor. This module handles
//! decoding the individual items of a report descriptor byte stream and
//! encoding items for a new report descriptor.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Decoding items
//!
//! An [Item] is either an [ItemRef], which borrows the bytes of the report descriptor, or an
//! [ItemBuffer], which owns a copy of a short item. Iterating over a descriptor is done through
//! a [DescriptorView](crate::view::DescriptorView):
//!
//! ```
//! # use hidrp::*;
//! # fn dump(bytes: &[u8]) -> Result<(), ParserError> {
//! for item in DescriptorView::new(bytes).iter() {
//!     println!("Item at offset {:02x}", item.offset());
//!     if item.has_tag(MainTag::Output) {
//!         println!("This is an output item with flags {:x}", item.value_unsigned()?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Building HID Report Descriptors programmatically
//!
//! ```
//! # use hidrp::hid::*;
//! # use hidrp::types::*;
//! let rdesc: Vec<u8> = ReportDescriptorBuilder::new()
//!        .usage_page(UsagePage(0x01))
//!        .usage(UsageId(0x02))
//!        .open_collection(CollectionType::Application)
//!        .open_collection(CollectionType::Physical)
//!        .push()
//!        .append(LogicalMinimum(-127))
//!        .append(LogicalMaximum(127))
//!        .append(ReportCount(2))
//!        .append(ReportSize(8))
//!        .usage(UsageId(0x30))
//!        .usage(UsageId(0x31))
//!        .input(DataFieldFlags::VARIABLE | DataFieldFlags::RELATIVE)
//!        .pop()
//!        .close_collection()
//!        .close_collection()
//!        .build();
//! assert_eq!(&rdesc[..4], &[0x05, 0x01, 0x09, 0x02]);
//! ```
//!
//! Note that the [ReportDescriptorBuilder] does **not** validate the items, use
//! [ReportProtocol::try_from()](crate::ReportProtocol::try_from) for that.

use crate::types::*;
use crate::{ensure, ParserError, Result};

/// The header byte of a long item, see Section 6.2.2.3.
pub const LONG_ITEM_PREFIX: u8 = 0xfe;

/// The number of data bytes encoded in the two size bits of a short item header.
/// A size of 3 means 4 bytes.
const fn short_data_size(header: u8) -> usize {
    match header & 0b11 {
        0 => 0,
        1 => 1,
        2 => 2,
        _ => 4,
    }
}

/// The total size in bytes of the item starting at the first byte of `bytes`,
/// or `None` if the item is truncated.
pub fn item_size(bytes: &[u8]) -> Option<usize> {
    let header = *bytes.first()?;
    let size = if header == LONG_ITEM_PREFIX {
        // header, data size and long item tag
        3 + *bytes.get(1)? as usize
    } else {
        1 + short_data_size(header)
    };
    (size <= bytes.len()).then_some(size)
}

/// The type of an item, bits 2 and 3 of the item header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Main = 0,
    Global = 1,
    Local = 2,
    Reserved = 3,
}

impl From<u8> for ItemType {
    /// Extract the item type from an item header byte.
    fn from(header: u8) -> ItemType {
        match (header >> 2) & 0b11 {
            0 => ItemType::Main,
            1 => ItemType::Global,
            2 => ItemType::Local,
            _ => ItemType::Reserved,
        }
    }
}

/// The tag of a short item, the upper 4 bits of its header byte.
/// The meaning of a tag depends on the [ItemType], each type has its
/// own set of tags.
pub trait Tag: Copy + PartialEq + Into<u8> + TryFrom<u8, Error = ParserError> {
    /// The item type this tag belongs to
    const ITEM_TYPE: ItemType;

    /// The name of this tag as used in the HID specification
    fn name(&self) -> &'static str;
}

macro_rules! item_tags {
    ($(#[$meta:meta])* $name:ident, $item_type:expr, {
        $($variant:ident = $value:literal => $label:literal,)+
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value,)+
        }

        impl TryFrom<u8> for $name {
            type Error = ParserError;

            fn try_from(tag: u8) -> Result<$name> {
                match tag {
                    $($value => Ok($name::$variant),)+
                    _ => Err(ParserError::ItemUnknown),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(tag: $name) -> u8 {
                tag as u8
            }
        }

        impl Tag for $name {
            const ITEM_TYPE: ItemType = $item_type;

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

item_tags!(
    /// Main item tags, see Section 6.2.2.4
    ///
    /// > Main items are used to either define or group certain types of data fields within a
    /// > Report descriptor. There are two types of Main items: data and non-data.
    MainTag, ItemType::Main, {
        Input = 0x8 => "Input",
        Output = 0x9 => "Output",
        Collection = 0xa => "Collection",
        Feature = 0xb => "Feature",
        EndCollection = 0xc => "End Collection",
    }
);

item_tags!(
    /// Global item tags, see Section 6.2.2.7
    ///
    /// > Global items describe rather than define data from a control. [...]
    /// > Global item tags apply to all subsequently defined items
    /// > unless overridden by another Global item.
    GlobalTag, ItemType::Global, {
        UsagePage = 0x0 => "Usage Page",
        LogicalMinimum = 0x1 => "Logical Minimum",
        LogicalMaximum = 0x2 => "Logical Maximum",
        PhysicalMinimum = 0x3 => "Physical Minimum",
        PhysicalMaximum = 0x4 => "Physical Maximum",
        UnitExponent = 0x5 => "Unit Exponent",
        Unit = 0x6 => "Unit",
        ReportSize = 0x7 => "Report Size",
        ReportId = 0x8 => "Report ID",
        ReportCount = 0x9 => "Report Count",
        Push = 0xa => "Push",
        Pop = 0xb => "Pop",
    }
);

item_tags!(
    /// Local item tags, see Section 6.2.2.8
    ///
    /// > Local item tags define characteristics of controls. These items do not carry over to
    /// > the next Main item.
    LocalTag, ItemType::Local, {
        Usage = 0x0 => "Usage",
        UsageMinimum = 0x1 => "Usage Minimum",
        UsageMaximum = 0x2 => "Usage Maximum",
        DesignatorIndex = 0x3 => "Designator Index",
        DesignatorMinimum = 0x4 => "Designator Minimum",
        DesignatorMaximum = 0x5 => "Designator Maximum",
        StringIndex = 0x7 => "String Index",
        StringMinimum = 0x8 => "String Minimum",
        StringMaximum = 0x9 => "String Maximum",
        Delimiter = 0xa => "Delimiter",
    }
);

impl MainTag {
    /// The report type of a data main item, `None` for collection items.
    pub fn report_type(&self) -> Option<ReportType> {
        match self {
            MainTag::Input => Some(ReportType::Input),
            MainTag::Output => Some(ReportType::Output),
            MainTag::Feature => Some(ReportType::Feature),
            MainTag::Collection | MainTag::EndCollection => None,
        }
    }
}

/// One item of a HID Report Descriptor, see Section 6.2.2.
///
/// Implementors only provide the header byte and the data bytes,
/// everything else is decoded from those.
pub trait Item {
    /// The header byte of this item. For short items this
    /// comprises data size, type and tag. For long items this is the
    /// constant [LONG_ITEM_PREFIX].
    fn header(&self) -> u8;

    /// The data bytes of this item, excluding any header bytes.
    fn data(&self) -> &[u8];

    /// Returns true if this item is a Long Item (Section 6.2.2.3).
    fn is_long(&self) -> bool {
        self.header() == LONG_ITEM_PREFIX
    }

    fn is_short(&self) -> bool {
        !self.is_long()
    }

    /// The type of this item. Long items are always [ItemType::Reserved].
    fn item_type(&self) -> ItemType {
        ItemType::from(self.header())
    }

    /// The number of data bytes, 0, 1, 2 or 4 for a short item.
    fn data_size(&self) -> usize {
        self.data().len()
    }

    /// The length of this item in bytes, inclusive of the header byte(s).
    fn size(&self) -> usize {
        if self.is_long() {
            3 + self.data_size()
        } else {
            1 + self.data_size()
        }
    }

    fn has_data(&self) -> bool {
        !self.data().is_empty()
    }

    /// The data of this item as little endian unsigned value.
    /// Items without data have the value zero.
    fn value_unsigned(&self) -> Result<u32> {
        ensure!(self.is_short(), ParserError::ItemLong);
        let value = match *self.data() {
            [] => 0,
            [b0] => b0 as u32,
            [b0, b1] => u16::from_le_bytes([b0, b1]) as u32,
            [b0, b1, b2, b3] => u32::from_le_bytes([b0, b1, b2, b3]),
            _ => return Err(ParserError::InvalidBounds),
        };
        Ok(value)
    }

    /// The data of this item as little endian signed value, sign-extended
    /// from the item's data size.
    fn value_signed(&self) -> Result<i32> {
        let value = self.value_unsigned()?;
        let value = match self.data_size() {
            1 => value as u8 as i8 as i32,
            2 => value as u16 as i16 as i32,
            _ => value as i32,
        };
        Ok(value)
    }

    /// The tag of this item, interpreted as the requested tag type.
    ///
    /// Fails with [ParserError::InvalidTagType] if this item is not of the
    /// tag's [ItemType] and with [ParserError::ItemUnknown] if the tag
    /// value is not defined for that type.
    fn tag<T: Tag>(&self) -> Result<T> {
        ensure!(self.item_type() == T::ITEM_TYPE, ParserError::InvalidTagType);
        T::try_from(self.header() >> 4)
    }

    /// Returns true if this item is of the given tag.
    fn has_tag<T: Tag>(&self, tag: T) -> bool {
        matches!(self.tag::<T>(), Ok(t) if t == tag)
    }

    fn main_tag(&self) -> Result<MainTag> {
        self.tag()
    }

    fn global_tag(&self) -> Result<GlobalTag> {
        self.tag()
    }

    fn local_tag(&self) -> Result<LocalTag> {
        self.tag()
    }

    /// The HID name of this item's tag, `None` for long, reserved
    /// and undefined tags.
    fn tag_name(&self) -> Option<&'static str> {
        match self.item_type() {
            ItemType::Main => self.main_tag().ok().map(|t| t.name()),
            ItemType::Global => self.global_tag().ok().map(|t| t.name()),
            ItemType::Local => self.local_tag().ok().map(|t| t.name()),
            ItemType::Reserved => None,
        }
    }
}

/// An [Item] borrowed from the bytes of a report descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRef<'a> {
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> ItemRef<'a> {
    /// Decode the item at the start of `bytes`, which is located at `offset`
    /// within its report descriptor. Returns `None` if the item is truncated.
    pub fn new(bytes: &'a [u8], offset: usize) -> Option<ItemRef<'a>> {
        let size = item_size(bytes)?;
        Some(ItemRef {
            offset,
            bytes: &bytes[..size],
        })
    }

    /// The offset of this item within its report descriptor
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The offset just past this item
    pub fn end(&self) -> usize {
        self.offset + self.bytes.len()
    }

    /// All bytes of this item, including the header
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl Item for ItemRef<'_> {
    fn header(&self) -> u8 {
        self.bytes[0]
    }

    fn data(&self) -> &[u8] {
        if self.is_long() {
            &self.bytes[3..]
        } else {
            &self.bytes[1..]
        }
    }
}

/// An owned copy of a short [Item].
///
/// The default value is all zeroes, a data-less Input item header. Since
/// it is never of type [ItemType::Global] it doubles as "no item" marker
/// in the [GlobalItemStore](crate::parser::GlobalItemStore).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemBuffer {
    header: u8,
    data: [u8; 4],
}

impl ItemBuffer {
    /// Copy the given item. Long items cannot be copied and fail with
    /// [ParserError::ItemLong].
    pub fn from_item(item: &impl Item) -> Result<ItemBuffer> {
        ensure!(item.is_short(), ParserError::ItemLong);
        let header = item.header();
        let len = short_data_size(header);
        let src = item.data();
        ensure!(src.len() == len, ParserError::InvalidBounds);
        let mut data = [0u8; 4];
        data[..len].copy_from_slice(src);
        Ok(ItemBuffer { header, data })
    }
}

impl Item for ItemBuffer {
    fn header(&self) -> u8 {
        self.header
    }

    fn data(&self) -> &[u8] {
        &self.data[..short_data_size(self.header)]
    }
}

/// The type of a Collection, see Section 6.2.2.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    Physical,
    Application,
    Logical,
    Report,
    NamedArray,
    UsageSwitch,
    UsageModifier,
    Reserved { value: u8 },
    VendorDefined { value: u8 },
}

impl From<u8> for CollectionType {
    fn from(value: u8) -> CollectionType {
        match value {
            0x00 => CollectionType::Physical,
            0x01 => CollectionType::Application,
            0x02 => CollectionType::Logical,
            0x03 => CollectionType::Report,
            0x04 => CollectionType::NamedArray,
            0x05 => CollectionType::UsageSwitch,
            0x06 => CollectionType::UsageModifier,
            0x07..=0x7f => CollectionType::Reserved { value },
            _ => CollectionType::VendorDefined { value },
        }
    }
}

impl From<CollectionType> for u8 {
    fn from(c: CollectionType) -> u8 {
        match c {
            CollectionType::Physical => 0x00,
            CollectionType::Application => 0x01,
            CollectionType::Logical => 0x02,
            CollectionType::Report => 0x03,
            CollectionType::NamedArray => 0x04,
            CollectionType::UsageSwitch => 0x05,
            CollectionType::UsageModifier => 0x06,
            CollectionType::Reserved { value } => value,
            CollectionType::VendorDefined { value } => value,
        }
    }
}

impl std::fmt::Display for CollectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionType::Physical => write!(f, "Physical"),
            CollectionType::Application => write!(f, "Application"),
            CollectionType::Logical => write!(f, "Logical"),
            CollectionType::Report => write!(f, "Report"),
            CollectionType::NamedArray => write!(f, "Named Array"),
            CollectionType::UsageSwitch => write!(f, "Usage Switch"),
            CollectionType::UsageModifier => write!(f, "Usage Modifier"),
            CollectionType::Reserved { value } => write!(f, "Reserved({value:#04x})"),
            CollectionType::VendorDefined { value } => write!(f, "Vendor Defined({value:#04x})"),
        }
    }
}

/// The flags of an Input, Output or Feature item, see Section 6.2.2.5.
///
/// These properties come in pairs (bit set or unset in the HID report descriptor item),
/// the default value (all bits unset) is Data, Array, Absolute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DataFieldFlags(pub u32);

impl DataFieldFlags {
    pub const CONSTANT: DataFieldFlags = DataFieldFlags(0x01);
    pub const VARIABLE: DataFieldFlags = DataFieldFlags(0x02);
    pub const RELATIVE: DataFieldFlags = DataFieldFlags(0x04);
    pub const WRAP: DataFieldFlags = DataFieldFlags(0x08);
    pub const NONLINEAR: DataFieldFlags = DataFieldFlags(0x10);
    pub const NO_PREFERRED: DataFieldFlags = DataFieldFlags(0x20);
    pub const NULL_STATE: DataFieldFlags = DataFieldFlags(0x40);
    /// Not valid for Input items
    pub const VOLATILE: DataFieldFlags = DataFieldFlags(0x80);
    pub const BUFFERED_BYTES: DataFieldFlags = DataFieldFlags(0x100);

    pub const fn contains(&self, other: DataFieldFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if the data is constant and never changes. This typically means the data
    /// can be ignored, it is padding.
    pub fn is_constant(&self) -> bool {
        self.contains(Self::CONSTANT)
    }

    /// True if each field represents one [Usage], false if the field is an
    /// array of indices into the Usages.
    pub fn is_variable(&self) -> bool {
        self.contains(Self::VARIABLE)
    }

    pub fn is_array(&self) -> bool {
        !self.is_variable()
    }

    /// True if the data is relative to the previous value, e.g. mouse motion.
    pub fn is_relative(&self) -> bool {
        self.contains(Self::RELATIVE)
    }

    pub fn wraps(&self) -> bool {
        self.contains(Self::WRAP)
    }

    pub fn is_nonlinear(&self) -> bool {
        self.contains(Self::NONLINEAR)
    }

    pub fn has_no_preferred_state(&self) -> bool {
        self.contains(Self::NO_PREFERRED)
    }

    pub fn has_null_state(&self) -> bool {
        self.contains(Self::NULL_STATE)
    }

    pub fn is_volatile(&self) -> bool {
        self.contains(Self::VOLATILE)
    }

    /// True if the field is a stream of bytes rather than a bit field.
    pub fn is_buffered_bytes(&self) -> bool {
        self.contains(Self::BUFFERED_BYTES)
    }
}

impl std::ops::BitOr for DataFieldFlags {
    type Output = DataFieldFlags;

    fn bitor(self, rhs: DataFieldFlags) -> DataFieldFlags {
        DataFieldFlags(self.0 | rhs.0)
    }
}

impl From<u32> for DataFieldFlags {
    fn from(value: u32) -> DataFieldFlags {
        DataFieldFlags(value)
    }
}

impl std::fmt::Display for DataFieldFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = vec![
            if self.is_constant() { "Const" } else { "Data" },
            if self.is_variable() { "Var" } else { "Arr" },
            if self.is_relative() { "Rel" } else { "Abs" },
        ];
        let optional = [
            (self.wraps(), "Wrap"),
            (self.is_nonlinear(), "NonLinear"),
            (self.has_no_preferred_state(), "NoPreferred"),
            (self.has_null_state(), "NullState"),
            (self.is_volatile(), "Volatile"),
            (self.is_buffered_bytes(), "Buff"),
        ];
        names.extend(optional.iter().filter(|(set, _)| *set).map(|(_, name)| *name));
        write!(f, "{}", names.join(","))
    }
}

/// The data bytes of a HID item, guaranteed to
/// be of length 1, 2, or 4 bytes depending on the
/// input and in LE byte order.
///
/// This struct only exists for conversion from numbers to
/// a hid-compatible byte array.
struct HidBytes(Vec<u8>);

impl HidBytes {
    fn take(self) -> Vec<u8> {
        self.0
    }
}

impl From<u32> for HidBytes {
    fn from(value: u32) -> HidBytes {
        let bytes = value.to_le_bytes();
        let cutoff = match value {
            0..=255 => 1,
            256..=0xffff => 2,
            _ => 4,
        };
        HidBytes(bytes[0..cutoff].to_vec())
    }
}

impl From<usize> for HidBytes {
    fn from(value: usize) -> HidBytes {
        HidBytes::from(u32::try_from(value).unwrap_or(u32::MAX))
    }
}

impl From<i32> for HidBytes {
    fn from(value: i32) -> HidBytes {
        const MIN16: i32 = i16::MIN as i32;
        const MAX16: i32 = i16::MAX as i32;
        let bytes = match value {
            -128..=127 => (value as i8).to_le_bytes().to_vec(),
            MIN16..=MAX16 => (value as i16).to_le_bytes().to_vec(),
            _ => value.to_le_bytes().to_vec(),
        };
        HidBytes(bytes)
    }
}

/// Encode a short item from its header prefix (tag and type bits) and data bytes.
fn encode_short_item(prefix: u8, data: Vec<u8>) -> Vec<u8> {
    let size = match data.len() {
        0 => 0b00,
        1 => 0b01,
        2 => 0b10,
        _ => 0b11,
    };
    [vec![prefix | size], data].concat()
}

/// The header prefix (tag and type bits, zero size bits) of a short item.
fn prefix<T: Tag>(tag: T) -> u8 {
    let tag: u8 = tag.into();
    (tag << 4) | ((T::ITEM_TYPE as u8) << 2)
}

/// A Main item to be encoded into a report descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainItem {
    Input(DataFieldFlags),
    Output(DataFieldFlags),
    Feature(DataFieldFlags),
    Collection(CollectionType),
    EndCollection,
}

impl MainItem {
    pub fn tag(&self) -> MainTag {
        match self {
            MainItem::Input(_) => MainTag::Input,
            MainItem::Output(_) => MainTag::Output,
            MainItem::Feature(_) => MainTag::Feature,
            MainItem::Collection(_) => MainTag::Collection,
            MainItem::EndCollection => MainTag::EndCollection,
        }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let data = match self {
            MainItem::Input(flags) | MainItem::Output(flags) | MainItem::Feature(flags) => {
                HidBytes::from(flags.0).take()
            }
            MainItem::Collection(collection) => vec![u8::from(*collection)],
            MainItem::EndCollection => vec![],
        };
        encode_short_item(prefix(self.tag()), data)
    }
}

/// A Global item to be encoded into a report descriptor, see Section 6.2.2.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalItem {
    UsagePage(UsagePage),
    LogicalMinimum(LogicalMinimum),
    LogicalMaximum(LogicalMaximum),
    PhysicalMinimum(PhysicalMinimum),
    PhysicalMaximum(PhysicalMaximum),
    UnitExponent(UnitExponent),
    Unit(Unit),
    ReportSize(ReportSize),
    ReportId(ReportId),
    ReportCount(ReportCount),
    Push,
    Pop,
}

impl GlobalItem {
    pub fn tag(&self) -> GlobalTag {
        match self {
            GlobalItem::UsagePage(_) => GlobalTag::UsagePage,
            GlobalItem::LogicalMinimum(_) => GlobalTag::LogicalMinimum,
            GlobalItem::LogicalMaximum(_) => GlobalTag::LogicalMaximum,
            GlobalItem::PhysicalMinimum(_) => GlobalTag::PhysicalMinimum,
            GlobalItem::PhysicalMaximum(_) => GlobalTag::PhysicalMaximum,
            GlobalItem::UnitExponent(_) => GlobalTag::UnitExponent,
            GlobalItem::Unit(_) => GlobalTag::Unit,
            GlobalItem::ReportSize(_) => GlobalTag::ReportSize,
            GlobalItem::ReportId(_) => GlobalTag::ReportId,
            GlobalItem::ReportCount(_) => GlobalTag::ReportCount,
            GlobalItem::Push => GlobalTag::Push,
            GlobalItem::Pop => GlobalTag::Pop,
        }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let data = match self {
            GlobalItem::UsagePage(usage_page) => {
                HidBytes::from(u16::from(usage_page) as u32).take()
            }
            GlobalItem::LogicalMinimum(min) => HidBytes::from(i32::from(min)).take(),
            GlobalItem::LogicalMaximum(max) => HidBytes::from(i32::from(max)).take(),
            GlobalItem::PhysicalMinimum(min) => HidBytes::from(i32::from(min)).take(),
            GlobalItem::PhysicalMaximum(max) => HidBytes::from(i32::from(max)).take(),
            // the exponent is a 4-bit two's complement nibble
            GlobalItem::UnitExponent(exponent) => vec![(i32::from(exponent) & 0xf) as u8],
            GlobalItem::Unit(unit) => HidBytes::from(u32::from(unit)).take(),
            GlobalItem::ReportSize(size) => HidBytes::from(usize::from(size)).take(),
            GlobalItem::ReportId(id) => vec![u8::from(id)],
            GlobalItem::ReportCount(count) => HidBytes::from(usize::from(count)).take(),
            GlobalItem::Push | GlobalItem::Pop => vec![],
        };
        encode_short_item(prefix(self.tag()), data)
    }
}

/// A Local item to be encoded into a report descriptor, see Section 6.2.2.8.
///
/// A HID Usage included in a local item may or may not include a Usage Page.
/// Where it does, it is an extended [LocalItem::Usage] that is always encoded
/// in 4 bytes, otherwise the [LocalItem::UsageId] refers to the current
/// Usage Page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalItem {
    Usage(Usage),
    UsageId(UsageId),
    UsageMinimum(UsageMinimum),
    UsageMaximum(UsageMaximum),
    DesignatorIndex(DesignatorIndex),
    DesignatorMinimum(DesignatorMinimum),
    DesignatorMaximum(DesignatorMaximum),
    StringIndex(StringIndex),
    StringMinimum(StringMinimum),
    StringMaximum(StringMaximum),
    Delimiter(Delimiter),
}

impl LocalItem {
    pub fn tag(&self) -> LocalTag {
        match self {
            LocalItem::Usage(_) | LocalItem::UsageId(_) => LocalTag::Usage,
            LocalItem::UsageMinimum(_) => LocalTag::UsageMinimum,
            LocalItem::UsageMaximum(_) => LocalTag::UsageMaximum,
            LocalItem::DesignatorIndex(_) => LocalTag::DesignatorIndex,
            LocalItem::DesignatorMinimum(_) => LocalTag::DesignatorMinimum,
            LocalItem::DesignatorMaximum(_) => LocalTag::DesignatorMaximum,
            LocalItem::StringIndex(_) => LocalTag::StringIndex,
            LocalItem::StringMinimum(_) => LocalTag::StringMinimum,
            LocalItem::StringMaximum(_) => LocalTag::StringMaximum,
            LocalItem::Delimiter(_) => LocalTag::Delimiter,
        }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let data = match self {
            LocalItem::Usage(usage) => u32::from(*usage).to_le_bytes().to_vec(),
            LocalItem::UsageId(id) => HidBytes::from(u16::from(id) as u32).take(),
            LocalItem::UsageMinimum(min) => HidBytes::from(u32::from(min)).take(),
            LocalItem::UsageMaximum(max) => HidBytes::from(u32::from(max)).take(),
            LocalItem::DesignatorIndex(idx) => HidBytes::from(u32::from(idx)).take(),
            LocalItem::DesignatorMinimum(min) => HidBytes::from(u32::from(min)).take(),
            LocalItem::DesignatorMaximum(max) => HidBytes::from(u32::from(max)).take(),
            LocalItem::StringIndex(idx) => HidBytes::from(u32::from(idx)).take(),
            LocalItem::StringMinimum(min) => HidBytes::from(u32::from(min)).take(),
            LocalItem::StringMaximum(max) => HidBytes::from(u32::from(max)).take(),
            LocalItem::Delimiter(delimiter) => HidBytes::from(u32::from(delimiter)).take(),
        };
        encode_short_item(prefix(self.tag()), data)
    }
}

/// Any item that can be appended to a [ReportDescriptorBuilder].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidItem {
    Main(MainItem),
    Global(GlobalItem),
    Local(LocalItem),
}

impl HidItem {
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            HidItem::Main(item) => item.as_bytes(),
            HidItem::Global(item) => item.as_bytes(),
            HidItem::Local(item) => item.as_bytes(),
        }
    }
}

impl From<MainItem> for HidItem {
    fn from(item: MainItem) -> HidItem {
        HidItem::Main(item)
    }
}

impl From<GlobalItem> for HidItem {
    fn from(item: GlobalItem) -> HidItem {
        HidItem::Global(item)
    }
}

impl From<LocalItem> for HidItem {
    fn from(item: LocalItem) -> HidItem {
        HidItem::Local(item)
    }
}

/// Creates a `From<Foo> for HidItem` for a type wrapped by the `$item` enum's `Foo` variant.
macro_rules! impl_hid_item_from {
    ($item:ident, $($tipo:ident),+) => {
        $(
            impl From<$tipo> for HidItem {
                fn from(v: $tipo) -> HidItem {
                    $item::$tipo(v).into()
                }
            }
        )+
    };
}

impl_hid_item_from!(
    GlobalItem,
    UsagePage,
    LogicalMinimum,
    LogicalMaximum,
    PhysicalMinimum,
    PhysicalMaximum,
    UnitExponent,
    Unit,
    ReportSize,
    ReportId,
    ReportCount
);

impl_hid_item_from!(
    LocalItem,
    Usage,
    UsageId,
    UsageMinimum,
    UsageMaximum,
    DesignatorIndex,
    DesignatorMinimum,
    DesignatorMaximum,
    StringIndex,
    StringMinimum,
    StringMaximum,
    Delimiter
);

impl From<CollectionType> for HidItem {
    fn from(collection: CollectionType) -> HidItem {
        MainItem::Collection(collection).into()
    }
}

/// A builder for a HID Report Descriptor.
///
/// Items are encoded in the order they are appended, numeric values use
/// the smallest data size that fits. Signed values (logical and physical
/// limits) are encoded as signed, so e.g. a Logical Maximum of 255 takes
/// two data bytes.
///
/// The builder does not validate, it is possible to create report descriptors
/// with unbalanced collections or missing items.
///
/// ```
/// # use hidrp::hid::*;
/// # use hidrp::types::*;
/// # use hidrp::ReportProtocol;
/// let rdesc = ReportDescriptorBuilder::new()
///     .usage_page(UsagePage(0x0c)) // Consumer
///     .usage(UsageId(0x01)) // Consumer Control
///     .open_collection(CollectionType::Application)
///     .append(ReportId(3))
///     .append(LogicalMinimum(0))
///     .append(LogicalMaximum(0x3ff))
///     .append(UsageMinimum(0))
///     .append(UsageMaximum(0x3ff))
///     .append(ReportSize(16))
///     .append(ReportCount(1))
///     .input(DataFieldFlags::default())
///     .close_collection()
///     .build();
///
/// let protocol = ReportProtocol::try_from(rdesc.as_slice()).unwrap();
/// assert_eq!(protocol.max_report_size(ReportType::Input), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReportDescriptorBuilder {
    bytes: Vec<u8>,
}

impl ReportDescriptorBuilder {
    /// Create a new builder
    pub fn new() -> ReportDescriptorBuilder {
        ReportDescriptorBuilder::default()
    }

    /// Append an item to this builder.
    pub fn append(mut self, item: impl Into<HidItem>) -> Self {
        self.bytes.extend(item.into().as_bytes());
        self
    }

    /// Append the given Usage Page. With the `hut` feature, any
    /// `hut::UsagePage` can be passed.
    ///
    /// This is a convenience wrapper for [Self::append()].
    pub fn usage_page(self, usage_page: impl Into<UsagePage>) -> Self {
        self.append(usage_page.into())
    }

    /// Append a Usage ID that refers to the current Usage Page. With the
    /// `hut` feature, any `hut::Usage` can be passed, only its Usage ID is
    /// used.
    ///
    /// <div class="warning">
    /// This only appends the Usage ID but not the Usage Page for the given Usage.
    /// This may result in subtle bugs where the Usage Page differs from the Usage.
    /// </div>
    ///
    /// This is a convenience wrapper for [Self::append()].
    pub fn usage(self, usage_id: impl Into<UsageId>) -> Self {
        self.append(usage_id.into())
    }

    /// Append the Usage Page of the given `hut` Usage Page or Usage.
    ///
    /// ```
    /// # use hidrp::hid::ReportDescriptorBuilder;
    /// let rdesc = ReportDescriptorBuilder::new()
    ///     .usage_page_of(hut::GenericDesktop::Mouse)
    ///     .usage_id(hut::GenericDesktop::Mouse)
    ///     .build();
    /// assert_eq!(rdesc, [0x05, 0x01, 0x09, 0x02]);
    /// ```
    ///
    /// This is a convenience wrapper for [Self::append()].
    #[cfg(feature = "hut")]
    pub fn usage_page_of(self, usage_page: impl hut::AsUsagePage) -> Self {
        self.usage_page(hut::AsUsagePage::usage_page(&usage_page))
    }

    /// Append the Usage ID of the given `hut` Usage, see [Self::usage()].
    ///
    /// This is a convenience wrapper for [Self::append()].
    #[cfg(feature = "hut")]
    pub fn usage_id(self, usage: impl hut::AsUsage) -> Self {
        self.usage(hut::AsUsage::usage(&usage))
    }

    /// Append an extended Usage that carries its own Usage Page.
    ///
    /// This is a convenience wrapper for [Self::append()].
    pub fn usage_extended(self, usage: impl Into<Usage>) -> Self {
        self.append(usage.into())
    }

    /// Append an Input item with the given flags.
    pub fn input(self, flags: DataFieldFlags) -> Self {
        self.append(MainItem::Input(flags))
    }

    /// Append an Output item with the given flags.
    pub fn output(self, flags: DataFieldFlags) -> Self {
        self.append(MainItem::Output(flags))
    }

    /// Append a Feature item with the given flags.
    pub fn feature(self, flags: DataFieldFlags) -> Self {
        self.append(MainItem::Feature(flags))
    }

    /// Open a new collection. This collection must be closed with
    /// a call to [close_collection()](Self::close_collection).
    pub fn open_collection(self, collection: CollectionType) -> Self {
        self.append(collection)
    }

    /// Close the most recently opened collection.
    pub fn close_collection(self) -> Self {
        self.append(MainItem::EndCollection)
    }

    /// Append a constant field of `bits` bits, e.g. to pad a report to a byte boundary.
    pub fn padding(self, report_type: ReportType, bits: usize) -> Self {
        let this = self.append(ReportCount(1)).append(ReportSize(bits));
        match report_type {
            ReportType::Input => this.input(DataFieldFlags::CONSTANT),
            ReportType::Output => this.output(DataFieldFlags::CONSTANT),
            ReportType::Feature => this.feature(DataFieldFlags::CONSTANT),
        }
    }

    /// Push the current global item state, to be restored by a later
    /// call to [pop()](Self::pop).
    pub fn push(self) -> Self {
        self.append(GlobalItem::Push)
    }

    pub fn pop(self) -> Self {
        self.append(GlobalItem::Pop)
    }

    /// The report descriptor bytes.
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_size() {
        for size in 0..4 {
            let itype = 0b100; // Global
            let tag = 0b00010000; // Logical Minimum
            let bytes: [u8; 5] = [tag | itype | size, 1, 2, 3, 4];

            let item = ItemRef::new(&bytes, 0).unwrap();
            assert_eq!(item.item_type(), ItemType::Global);
            assert_eq!(item.global_tag().unwrap(), GlobalTag::LogicalMinimum);
            match size {
                0 => assert_eq!(item.size(), 1),
                1 => assert_eq!(item.size(), 2),
                2 => assert_eq!(item.size(), 3),
                3 => assert_eq!(item.size(), 5),
                _ => panic!("Size {size} cannot happen"),
            }
            assert_eq!(item.bytes().len(), item.size());
        }

        // truncated items
        assert!(ItemRef::new(&[0x27, 0x01, 0x02], 0).is_none());
        assert!(ItemRef::new(&[0x26, 0x01], 0).is_none());
        assert!(ItemRef::new(&[], 0).is_none());
    }

    #[test]
    fn item_tag() {
        let bytes = [0x91, 0b10101010];
        let item = ItemRef::new(&bytes, 0).unwrap();
        assert_eq!(item.item_type(), ItemType::Main);
        assert_eq!(item.main_tag().unwrap(), MainTag::Output);
        assert!(item.has_tag(MainTag::Output));
        assert!(!item.has_tag(MainTag::Input));
        assert!(!item.has_tag(GlobalTag::ReportCount));
        assert_eq!(item.global_tag(), Err(ParserError::InvalidTagType));
        assert_eq!(item.tag_name(), Some("Output"));

        // Local tag 6 is not defined
        let item = ItemRef::new(&[0x68], 0).unwrap();
        assert_eq!(item.local_tag(), Err(ParserError::ItemUnknown));
        assert_eq!(item.tag_name(), None);
    }

    #[test]
    fn long_item() {
        let bytes = [LONG_ITEM_PREFIX, 0x02, 0xf0, 0xaa, 0xbb, 0x09];
        let item = ItemRef::new(&bytes, 4).unwrap();
        assert!(item.is_long());
        assert_eq!(item.item_type(), ItemType::Reserved);
        assert_eq!(item.data(), &[0xaa, 0xbb]);
        assert_eq!(item.size(), 5);
        assert_eq!(item.end(), 9);
        assert_eq!(item.value_unsigned(), Err(ParserError::ItemLong));
        assert_eq!(ItemBuffer::from_item(&item), Err(ParserError::ItemLong));

        // data size claims more than available
        assert!(ItemRef::new(&[LONG_ITEM_PREFIX, 0x04, 0xf0, 0xaa], 0).is_none());
        assert!(ItemRef::new(&[LONG_ITEM_PREFIX], 0).is_none());
    }

    #[test]
    fn item_flags() {
        let bytes = [0x92, 0b10101010, 0b1];
        let item = ItemRef::new(&bytes, 0).unwrap();
        let flags = DataFieldFlags::from(item.value_unsigned().unwrap());
        assert!(!flags.is_constant());
        assert!(flags.is_variable());
        assert!(!flags.is_relative());
        assert!(flags.wraps());
        assert!(!flags.is_nonlinear());
        assert!(flags.has_no_preferred_state());
        assert!(!flags.has_null_state());
        assert!(flags.is_volatile());
        assert!(flags.is_buffered_bytes());
        assert_eq!(
            flags.to_string(),
            "Data,Var,Abs,Wrap,NoPreferred,Volatile,Buff"
        );
        assert_eq!(
            (DataFieldFlags::CONSTANT | DataFieldFlags::VARIABLE).to_string(),
            "Const,Var,Abs"
        );
    }

    macro_rules! test_item_value {
        ($bytes:expr, $unsigned:expr, $signed:expr) => {
            let item = ItemRef::new($bytes.as_slice(), 0).unwrap();
            assert_eq!(item.value_unsigned().unwrap(), $unsigned);
            assert_eq!(item.value_signed().unwrap(), $signed);
            let buffer = ItemBuffer::from_item(&item).unwrap();
            assert_eq!(buffer.value_unsigned().unwrap(), $unsigned);
            assert_eq!(buffer.value_signed().unwrap(), $signed);
            assert_eq!(buffer.data(), item.data());
        };
    }

    #[test]
    fn item_value() {
        // Logical Minimum with 0, 1, 2, 4 data bytes
        test_item_value!([0x14], 0, 0);

        test_item_value!([0x15, 0x7F], 0x7F, 127);
        test_item_value!([0x15, 0x80], 0x80, -128);
        test_item_value!([0x15, 0xFF], 0xFF, -1);
        test_item_value!([0x15, 0x0], 0x0, 0);

        test_item_value!([0x16, 0xFF, 0x7F], 0x7FFFu32, 32767); // max positive i16
        test_item_value!([0x16, 0x00, 0x80], 0x8000u32, -32768); // min i16
        test_item_value!([0x16, 0xFF, 0xFF], 0xFFFFu32, -1);
        test_item_value!([0x16, 0xCC, 0xED], 0xEDCCu32, -4660);

        test_item_value!([0x17, 0xFF, 0xFF, 0xFF, 0x7F], 0x7FFFFFFFu32, 2147483647);
        test_item_value!([0x17, 0x00, 0x00, 0x00, 0x80], 0x80000000u32, -2147483648);
        test_item_value!([0x17, 0x78, 0x56, 0x34, 0x12], 0x12345678u32, 305419896);
        test_item_value!([0x17, 0x88, 0xA9, 0xCB, 0xED], 0xEDCBA988u32, -305419896);
    }

    #[test]
    fn item_buffer_default() {
        let buffer = ItemBuffer::default();
        assert_eq!(buffer.item_type(), ItemType::Main);
        assert!(!buffer.has_data());
        assert_eq!(buffer.size(), 1);
    }

    #[test]
    fn hidbytes() {
        assert_eq!(HidBytes::from(1u32).take(), [0x1]);
        assert_eq!(HidBytes::from(255u32).take(), [0xff]);
        assert_eq!(HidBytes::from(256u32).take(), [0x0, 0x1]);
        assert_eq!(HidBytes::from(0x10000u32).take(), [0x0, 0x0, 0x1, 0x0]);

        // >=128 signed is encoded over two bytes. That's not
        // always necessary but whether a value is signed or
        // unsigned (e.g. LogicalMaximum) is only known after
        // parsing the minimum.
        assert_eq!(HidBytes::from(128i32).take(), [0x80, 0x0]);
        assert_eq!(HidBytes::from(-127i32).take(), [0x81]);
        assert_eq!(HidBytes::from(-129i32).take(), [0x7f, 0xff]);
        assert_eq!(HidBytes::from(40000i32).take(), [0x40, 0x9c, 0x0, 0x0]);
    }

    #[test]
    fn item_encoding() {
        assert_eq!(HidItem::from(UsagePage(0x01)).as_bytes(), [0x05, 0x01]);
        assert_eq!(HidItem::from(UsagePage(0xff00)).as_bytes(), [0x06, 0x00, 0xff]);
        assert_eq!(HidItem::from(LogicalMinimum(-127)).as_bytes(), [0x15, 0x81]);
        assert_eq!(HidItem::from(LogicalMaximum(255)).as_bytes(), [0x26, 0xff, 0x00]);
        assert_eq!(HidItem::from(UnitExponent(-2)).as_bytes(), [0x55, 0x0e]);
        assert_eq!(HidItem::from(ReportId(5)).as_bytes(), [0x85, 0x05]);
        assert_eq!(HidItem::from(GlobalItem::Push).as_bytes(), [0xa4]);
        assert_eq!(HidItem::from(GlobalItem::Pop).as_bytes(), [0xb4]);
        assert_eq!(HidItem::from(UsageId(0x30)).as_bytes(), [0x09, 0x30]);
        assert_eq!(HidItem::from(Delimiter::OPEN).as_bytes(), [0xa9, 0x01]);
        assert_eq!(
            HidItem::from(Usage::new(UsagePage(0x01), UsageId(0x06))).as_bytes(),
            [0x0b, 0x06, 0x00, 0x01, 0x00]
        );
        assert_eq!(
            HidItem::from(CollectionType::Application).as_bytes(),
            [0xa1, 0x01]
        );
        assert_eq!(HidItem::from(MainItem::EndCollection).as_bytes(), [0xc0]);
        assert_eq!(
            HidItem::from(MainItem::Input(DataFieldFlags::default())).as_bytes(),
            [0x81, 0x00]
        );
        assert_eq!(
            HidItem::from(MainItem::Feature(
                DataFieldFlags::VARIABLE | DataFieldFlags::BUFFERED_BYTES
            ))
            .as_bytes(),
            [0xb2, 0x02, 0x01]
        );
    }

    #[test]
    fn collection_type() {
        for value in 0..=255u8 {
            assert_eq!(u8::from(CollectionType::from(value)), value);
        }
        assert_eq!(CollectionType::from(0x07), CollectionType::Reserved { value: 0x07 });
        assert_eq!(
            CollectionType::from(0x80),
            CollectionType::VendorDefined { value: 0x80 }
        );
    }

    #[test]
    fn builder() {
        let rdesc = ReportDescriptorBuilder::new()
            .usage_page(UsagePage(0x01))
            .usage(UsageId(0x02))
            .open_collection(CollectionType::Application)
            .push()
            .append(LogicalMinimum(0))
            .pop()
            .padding(ReportType::Input, 8)
            .close_collection()
            .build();
        assert_eq!(
            rdesc,
            [
                0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xa4, 0x15, 0x00, 0xb4, 0x95, 0x01, 0x75,
                0x08, 0x81, 0x01, 0xc0
            ]
        );
    }

    #[test]
    fn builder_hut() {
        use hut::AsUsage;

        let rdesc = ReportDescriptorBuilder::new()
            .usage_page_of(hut::GenericDesktop::Mouse)
            .usage_id(hut::GenericDesktop::Mouse)
            .usage_page(hut::UsagePage::Button)
            .usage(hut::GenericDesktop::X.usage())
            .usage_extended(hut::GenericDesktop::Keyboard.usage())
            .build();
        assert_eq!(
            rdesc,
            [0x05, 0x01, 0x09, 0x02, 0x05, 0x09, 0x09, 0x30, 0x0b, 0x06, 0x00, 0x01, 0x00]
        );
    }
}
