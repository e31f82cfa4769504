// SPDX-License-Identifier: MIT

//! A parser and validator for HID Report Descriptors.
//!
//! A HID Report Descriptor is a sequence of small tag-length-value items that describes the
//! layout of the reports a HID device exchanges with its host. This crate walks those items
//! in a single pass, verifies the structural and semantic rules of the HID specification and
//! derives the report protocol, i.e. which reports exist and how large they are.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Extracting the report protocol
//!
//! Entry point is usually [`ReportProtocol::try_from(bytes)`](ReportProtocol::try_from):
//!
//! ```
//! # use hidrp::*;
//! let bytes: &[u8] = &[
//!     0x05, 0x01, // Usage Page (Generic Desktop)
//!     0x09, 0x02, // Usage (Mouse)
//!     0xa1, 0x01, // Collection (Application)
//!     0x05, 0x09, //   Usage Page (Button)
//!     0x19, 0x01, //   Usage Minimum (1)
//!     0x29, 0x03, //   Usage Maximum (3)
//!     0x15, 0x00, //   Logical Minimum (0)
//!     0x25, 0x01, //   Logical Maximum (1)
//!     0x95, 0x08, //   Report Count (8)
//!     0x75, 0x01, //   Report Size (1)
//!     0x81, 0x02, //   Input (Data,Var,Abs)
//!     0xc0,       // End Collection
//! ];
//! let protocol = ReportProtocol::try_from(bytes).unwrap();
//! assert!(!protocol.uses_report_ids());
//! assert_eq!(protocol.max_report_size(ReportType::Input), 1);
//!
//! let usage = parser::application_usage(&DescriptorView::new(bytes)).unwrap();
//! assert_eq!(usage, Usage::new(UsagePage(0x01), UsageId(0x02)));
//! ```
//!
//! # Driving your own parser
//!
//! The structural walk is exposed through the [`Parser`](parser::Parser) trait, see
//! [parser::parse_items()]. The [hid] module contains the item model and a
//! [ReportDescriptorBuilder](hid::ReportDescriptorBuilder) for creating descriptors
//! programmatically.

use thiserror::Error;

/// Returns early with the given error if the condition does not hold.
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
pub(crate) use ensure;

pub mod format;
pub mod hid;
pub mod parser;
pub mod protocol;
pub mod types;
pub mod unit;
pub mod view;

pub use hid::{GlobalTag, Item, ItemRef, ItemType, LocalTag, MainTag, Tag};
pub use parser::{Control, GlobalItemStore, Parser, ParserOptions};
pub use protocol::ReportProtocol;
pub use types::*;
pub use view::DescriptorView;

/// The errors a HID Report Descriptor may fail with. Parsing stops at the first error.
///
/// Each error maps to a 16-bit error code, see [ParserError::code()].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserError {
    #[error("invalid item tag type")]
    InvalidTagType,
    #[error("descriptor has invalid bounds")]
    InvalidBounds,
    #[error("unexpected long item")]
    ItemLong,
    #[error("unknown item tag")]
    ItemUnknown,
    #[error("report ID is zero")]
    ReportIdZero,
    #[error("report ID exceeds valid range")]
    ReportIdExcess,
    #[error("report ID missing for a subset of main data items")]
    ReportIdMissing,
    #[error("data elements of the same report are bound to different TLCs")]
    ReportCrossingTlcBounds,
    #[error("global item stack overflow")]
    GlobalStackOverflow,
    #[error("unmatched push item")]
    PushUnmatched,
    #[error("push item contains data")]
    PushNonempty,
    #[error("unmatched pop item")]
    PopUnmatched,
    #[error("pop item contains data")]
    PopNonempty,
    #[error("report size must be non-zero")]
    ReportSizeZero,
    #[error("report size missing")]
    ReportSizeMissing,
    #[error("report count must be non-zero")]
    ReportCountZero,
    #[error("report count missing")]
    ReportCountMissing,
    #[error("logical minimum must be defined before any main items")]
    LogicalMinMissing,
    #[error("logical minimum must be within bounds of report size")]
    LogicalMinOutOfBounds,
    #[error("logical maximum must be defined before any main items")]
    LogicalMaxMissing,
    #[error("logical maximum must be within bounds of report size")]
    LogicalMaxOutOfBounds,
    #[error("logical min must be less than or equal to max")]
    LogicalLimitsCrossed,
    #[error("physical min and max must either be both defined or both missing")]
    PhysicalLimitMissing,
    #[error("physical min must be less than or equal to max")]
    PhysicalLimitsCrossed,
    #[error("usage page must be non-zero")]
    UsagePageZero,
    #[error("usage page must not exceed 0xffff")]
    UsagePageOutOfRange,
    #[error("usage page must be defined before any main items")]
    UsagePageMissing,
    #[error("usage must be defined before any main items")]
    UsageMissing,
    #[error("usage min must be unique within a main section")]
    UsageMinDuplicate,
    #[error("usage max must be unique within a main section")]
    UsageMaxDuplicate,
    #[error("usage min and max must be both defined")]
    UsageLimitMissing,
    #[error("usage min must be less than or equal to max")]
    UsageLimitsCrossed,
    #[error("usage min and max must be both extended")]
    UsageLimitsSizeMismatch,
    #[error("extended usage min and max pages aren't matching")]
    UsageLimitsPageMismatch,
    #[error("delimiter must be open(1) or close(0)")]
    DelimiterInvalid,
    #[error("delimiters must not be nested")]
    DelimiterNesting,
    #[error("open delimiters must be closed")]
    DelimiterUnmatched,
    #[error("delimiters must only contain usage local items")]
    DelimiterInvalidContent,
    #[error("delimiters must not be in top level collection or end collection")]
    DelimiterInvalidLocation,
    #[error("delimiters must not be applied to an array data item")]
    DelimiterInvalidMainItem,
    #[error("all other main items must be enclosed by a collection")]
    CollectionMissing,
    #[error("application collection item inside another collection")]
    CollectionNestedApplication,
    #[error("unmatched collection item")]
    CollectionBeginUnmatched,
    #[error("unmatched end collection item")]
    CollectionEndUnmatched,
    #[error("all report total sizes must be byte-aligned")]
    ReportTotalSizeInvalid,
    #[error("buffered bytes field is not aligned on a byte boundary")]
    BufferedBytesMisaligned { tag: MainTag },
}

impl ParserError {
    const ERROR_FLAG: u16 = 1 << 15;

    /// The item type and tag this error refers to and its subcode within that tag.
    /// Errors without a tag return `None` for the first element.
    fn parts(&self) -> (Option<(ItemType, u8)>, u8) {
        use GlobalTag as G;
        use LocalTag as L;
        use MainTag as M;

        let global = |tag: GlobalTag| Some((ItemType::Global, u8::from(tag)));
        let local = |tag: LocalTag| Some((ItemType::Local, u8::from(tag)));
        let main = |tag: MainTag| Some((ItemType::Main, u8::from(tag)));

        match self {
            ParserError::InvalidTagType => (None, 0x3d),
            ParserError::InvalidBounds => (None, 0x01),
            ParserError::ItemLong => (None, 0x3e),
            ParserError::ItemUnknown => (None, 0x3f),
            ParserError::ReportIdZero => (global(G::ReportId), 0),
            ParserError::ReportIdExcess => (global(G::ReportId), 1),
            ParserError::ReportIdMissing => (global(G::ReportId), 2),
            ParserError::ReportCrossingTlcBounds => (global(G::ReportId), 3),
            ParserError::GlobalStackOverflow => (global(G::Push), 10),
            ParserError::PushUnmatched => (global(G::Push), 0),
            ParserError::PushNonempty => (global(G::Push), 1),
            ParserError::PopUnmatched => (global(G::Pop), 0),
            ParserError::PopNonempty => (global(G::Pop), 1),
            ParserError::ReportSizeZero => (global(G::ReportSize), 0),
            ParserError::ReportSizeMissing => (global(G::ReportSize), 1),
            ParserError::ReportCountZero => (global(G::ReportCount), 0),
            ParserError::ReportCountMissing => (global(G::ReportCount), 1),
            ParserError::LogicalMinMissing => (global(G::LogicalMinimum), 1),
            ParserError::LogicalMinOutOfBounds => (global(G::LogicalMinimum), 0),
            ParserError::LogicalMaxMissing => (global(G::LogicalMaximum), 1),
            ParserError::LogicalMaxOutOfBounds => (global(G::LogicalMaximum), 0),
            ParserError::LogicalLimitsCrossed => (global(G::LogicalMaximum), 3),
            ParserError::PhysicalLimitMissing => (global(G::PhysicalMaximum), 1),
            ParserError::PhysicalLimitsCrossed => (global(G::PhysicalMaximum), 1),
            ParserError::UsagePageZero => (global(G::UsagePage), 0),
            ParserError::UsagePageOutOfRange => (global(G::UsagePage), 1),
            ParserError::UsagePageMissing => (global(G::UsagePage), 2),
            ParserError::UsageMissing => (local(L::Usage), 2),
            ParserError::UsageMinDuplicate => (local(L::UsageMinimum), 3),
            ParserError::UsageMaxDuplicate => (local(L::UsageMaximum), 3),
            ParserError::UsageLimitMissing => (local(L::UsageMaximum), 0),
            ParserError::UsageLimitsCrossed => (local(L::UsageMaximum), 1),
            ParserError::UsageLimitsSizeMismatch => (local(L::UsageMaximum), 4),
            ParserError::UsageLimitsPageMismatch => (local(L::UsageMaximum), 2),
            ParserError::DelimiterInvalid => (local(L::Delimiter), 0),
            ParserError::DelimiterNesting => (local(L::Delimiter), 1),
            ParserError::DelimiterUnmatched => (local(L::Delimiter), 2),
            ParserError::DelimiterInvalidContent => (local(L::Delimiter), 3),
            ParserError::DelimiterInvalidLocation => (local(L::Delimiter), 4),
            ParserError::DelimiterInvalidMainItem => (local(L::Delimiter), 5),
            ParserError::CollectionMissing => (main(M::Collection), 10),
            ParserError::CollectionNestedApplication => (main(M::Collection), 2),
            ParserError::CollectionBeginUnmatched => (main(M::Collection), 0),
            ParserError::CollectionEndUnmatched => (main(M::EndCollection), 0),
            ParserError::ReportTotalSizeInvalid => (main(M::EndCollection), 0),
            ParserError::BufferedBytesMisaligned { tag } => (main(*tag), 0),
        }
    }

    /// The type of the item this error refers to, if any.
    pub fn item_type(&self) -> Option<ItemType> {
        self.parts().0.map(|(item_type, _)| item_type)
    }

    /// The (shifted-down) tag of the item this error refers to, if any.
    pub fn tag(&self) -> Option<u8> {
        self.parts().0.map(|(_, tag)| tag)
    }

    /// The error subcode, distinguishing multiple errors on the same tag.
    pub fn subcode(&self) -> u8 {
        self.parts().1
    }

    /// The 16-bit error code, following the conventions of the HID Parser Error Codes
    /// document: the error flag in bit 15, the subcode in the high byte and the item
    /// tag and type in the low byte.
    ///
    /// ```
    /// # use hidrp::ParserError;
    /// assert_eq!(ParserError::ReportIdZero.code(), 0x8084);
    /// assert_eq!(ParserError::PopUnmatched.code(), 0x80b4);
    /// ```
    pub fn code(&self) -> u16 {
        let (tag, subcode) = self.parts();
        let (item_type, tag) = tag
            .map(|(item_type, tag)| (item_type as u16, tag as u16))
            .unwrap_or((0, 0));
        Self::ERROR_FLAG | (((subcode as u16) & 0xcf) << 8) | (tag << 4) | (item_type << 2)
    }
}

type Result<T> = std::result::Result<T, ParserError>;
