// SPDX-License-Identifier: MIT

//! The structural parser of a HID Report Descriptor.
//!
//! [parse_items()] walks the items of a descriptor once, maintains the stack of global
//! item state (see Section 6.2.2.7, Push and Pop) and the collection nesting, and enforces
//! the structural rules of the descriptor grammar. The semantics of the descriptor are left
//! to a [Parser] implementation that receives one callback per Main item.
//!
//! ```
//! # use hidrp::*;
//! # use hidrp::hid::CollectionType;
//! # use hidrp::parser::parse_items;
//! #[derive(Default)]
//! struct CollectionCounter {
//!     count: usize,
//! }
//!
//! impl Parser for CollectionCounter {
//!     fn parse_collection_begin(
//!         &mut self,
//!         _collection: CollectionType,
//!         _globals: &GlobalItemStore,
//!         _section: &DescriptorView<'_>,
//!         _tlc_number: u32,
//!     ) -> Result<Control, ParserError> {
//!         self.count += 1;
//!         Ok(Control::Continue)
//!     }
//! }
//!
//! let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xa1, 0x00, 0xc0, 0xc0];
//! let mut counter = CollectionCounter::default();
//! parse_items(&mut counter, &DescriptorView::new(&bytes)).unwrap();
//! assert_eq!(counter.count, 2);
//! ```

use crate::hid::{
    CollectionType, GlobalTag, Item, ItemBuffer, ItemRef, ItemType, LocalTag, MainTag,
};
use crate::types::*;
use crate::view::DescriptorView;
use crate::{ensure, ParserError, Result};

/// The default number of global item states the parser can hold, i.e. the
/// maximum nesting of Push items plus one.
pub const DEFAULT_GLOBAL_STACK_CAPACITY: usize = 5;

/// The number of global item tags that carry state, Usage Page up to Report Count.
const GLOBAL_STATE_TAGS: usize = GlobalTag::ReportCount as usize + 1;

/// The global item state table, see Section 6.2.2.7. Holds the most recent
/// item of each global tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalItemStore {
    items: [ItemBuffer; GLOBAL_STATE_TAGS],
}

impl GlobalItemStore {
    pub fn new() -> GlobalItemStore {
        GlobalItemStore::default()
    }

    /// Store the given global item, replacing any previous item with the same tag.
    ///
    /// Push, Pop and undefined global tags fail with [ParserError::ItemUnknown].
    pub fn add_item(&mut self, item: &impl Item) -> Result<()> {
        let tag = u8::from(item.global_tag()?) as usize;
        ensure!(tag < GLOBAL_STATE_TAGS, ParserError::ItemUnknown);
        self.items[tag] = ItemBuffer::from_item(item)?;
        Ok(())
    }

    /// The current item for this tag, if any.
    pub fn get_item(&self, tag: GlobalTag) -> Option<&ItemBuffer> {
        self.items
            .get(u8::from(tag) as usize)
            .filter(|item| item.item_type() == ItemType::Global)
    }

    pub fn has_item(&self, tag: GlobalTag) -> bool {
        self.get_item(tag).is_some()
    }
}

/// Returned by the [Parser] callbacks to continue or stop parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Break,
}

/// The callbacks invoked by [parse_items()], one per Main item.
///
/// Each callback receives the current global item state, the section of
/// items between the previous Main item and this one (the Local items that
/// apply to this Main item, interleaved with the Global items that have
/// already been applied to the global state) and the number of the current
/// top-level collection, starting at 1.
///
/// All callbacks default to doing nothing.
pub trait Parser {
    /// Called for each Collection item, after the nesting level was increased.
    fn parse_collection_begin(
        &mut self,
        _collection: CollectionType,
        _globals: &GlobalItemStore,
        _section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        Ok(Control::Continue)
    }

    /// Called for each End Collection item, after the nesting level was decreased.
    fn parse_collection_end(
        &mut self,
        _globals: &GlobalItemStore,
        _section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        Ok(Control::Continue)
    }

    /// Called for each Input, Output and Feature item.
    fn parse_report_data_field(
        &mut self,
        _main_item: &ItemRef<'_>,
        _globals: &GlobalItemStore,
        _section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        Ok(Control::Continue)
    }
}

/// Runtime configuration of [parse_items_with_options()].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// The number of global item states, the descriptor may nest
    /// at most `global_stack_capacity - 1` Push items.
    pub global_stack_capacity: usize,
}

impl Default for ParserOptions {
    fn default() -> ParserOptions {
        ParserOptions {
            global_stack_capacity: DEFAULT_GLOBAL_STACK_CAPACITY,
        }
    }
}

/// Parse the descriptor with the default [ParserOptions].
pub fn parse_items<P: Parser + ?Sized>(parser: &mut P, view: &DescriptorView<'_>) -> Result<usize> {
    parse_items_with_options(parser, view, &ParserOptions::default())
}

/// Walk the items of the descriptor and invoke the [Parser] callbacks
/// for each Main item.
///
/// On success, returns the descriptor offset just past the last Main item
/// that was processed. This is the end of the descriptor if it ends with a Main
/// item and no callback returned [Control::Break].
///
/// Fails on the first structural error:
/// - [ParserError::InvalidBounds] if the last item is truncated
/// - [ParserError::GlobalStackOverflow] if the Push items nest too deep
/// - [ParserError::PushNonempty], [ParserError::PopNonempty],
///   [ParserError::PushUnmatched] and [ParserError::PopUnmatched] for invalid Push/Pop items
/// - [ParserError::CollectionMissing] for data items outside of any collection
/// - [ParserError::CollectionNestedApplication] for Application collections that are
///   not a top-level collection
/// - [ParserError::CollectionBeginUnmatched] and [ParserError::CollectionEndUnmatched]
///   for unbalanced collections
/// - [ParserError::ItemLong] and [ParserError::ItemUnknown] for items the parser does not know
///
/// and on any error returned by the callbacks.
pub fn parse_items_with_options<P: Parser + ?Sized>(
    parser: &mut P,
    view: &DescriptorView<'_>,
    options: &ParserOptions,
) -> Result<usize> {
    ensure!(view.has_valid_bounds(), ParserError::InvalidBounds);

    // Verify the stack depth up front so a too-deep descriptor fails before any callback
    let max_depth = global_stack_depth(view)?;
    ensure!(
        max_depth < options.global_stack_capacity,
        ParserError::GlobalStackOverflow
    );

    let mut stack = vec![GlobalItemStore::default(); options.global_stack_capacity];
    let mut depth: usize = 0;
    let mut collection_depth: u32 = 0;
    let mut tlc_number: u32 = 0;
    let mut section_begin = view.begin();
    let mut consumed = view.begin();

    for item in view.iter() {
        log::trace!(
            "{:04x}: {} {:02x?}",
            item.offset(),
            item.tag_name().unwrap_or("Unknown"),
            item.data()
        );
        match item.item_type() {
            ItemType::Main => {
                let section = view.subview(section_begin, item.offset());
                let globals = &stack[depth];
                let control = match item.main_tag()? {
                    MainTag::Input | MainTag::Output | MainTag::Feature => {
                        ensure!(collection_depth > 0, ParserError::CollectionMissing);
                        parser.parse_report_data_field(&item, globals, &section, tlc_number)?
                    }
                    MainTag::Collection => {
                        let collection =
                            CollectionType::from((item.value_unsigned()? & 0xff) as u8);
                        collection_depth += 1;
                        if collection_depth == 1 {
                            tlc_number += 1;
                            log::debug!("top-level collection {tlc_number}: {collection}");
                        } else {
                            ensure!(
                                collection != CollectionType::Application,
                                ParserError::CollectionNestedApplication
                            );
                        }
                        parser.parse_collection_begin(collection, globals, &section, tlc_number)?
                    }
                    MainTag::EndCollection => {
                        ensure!(collection_depth > 0, ParserError::CollectionEndUnmatched);
                        collection_depth -= 1;
                        parser.parse_collection_end(globals, &section, tlc_number)?
                    }
                };
                section_begin = item.end();
                consumed = item.end();
                if control == Control::Break {
                    log::debug!("parsing stopped at offset {consumed}");
                    return Ok(consumed);
                }
            }
            ItemType::Global => match item.global_tag()? {
                GlobalTag::Push => {
                    ensure!(!item.has_data(), ParserError::PushNonempty);
                    ensure!(depth + 1 < stack.len(), ParserError::GlobalStackOverflow);
                    stack[depth + 1] = stack[depth];
                    depth += 1;
                }
                GlobalTag::Pop => {
                    ensure!(!item.has_data(), ParserError::PopNonempty);
                    ensure!(depth > 0, ParserError::PopUnmatched);
                    // the popped state stays in its slot until the next Push overwrites it
                    depth -= 1;
                }
                _ => stack[depth].add_item(&item)?,
            },
            // Local items are passed to the callbacks as part of the section
            ItemType::Local => {}
            ItemType::Reserved => {
                ensure!(item.is_short(), ParserError::ItemLong);
                return Err(ParserError::ItemUnknown);
            }
        }
    }

    ensure!(depth == 0, ParserError::PushUnmatched);
    ensure!(collection_depth == 0, ParserError::CollectionBeginUnmatched);

    log::debug!(
        "parsed {} bytes with {tlc_number} top-level collection(s)",
        view.len()
    );
    Ok(consumed)
}

/// The maximum nesting depth of Push items in the descriptor.
///
/// Fails with [ParserError::PopUnmatched] if a Pop item occurs without a
/// preceding Push.
pub fn global_stack_depth(view: &DescriptorView<'_>) -> Result<usize> {
    let mut depth: usize = 0;
    let mut max_depth: usize = 0;
    for item in view.iter() {
        if item.has_tag(GlobalTag::Push) {
            depth += 1;
            max_depth = max_depth.max(depth);
        } else if item.has_tag(GlobalTag::Pop) {
            ensure!(depth > 0, ParserError::PopUnmatched);
            depth -= 1;
        }
    }
    Ok(max_depth)
}

/// Resolve a Usage, Usage Minimum or Usage Maximum item to a full [Usage].
///
/// Extended (4-byte) usages carry their own Usage Page, all others use the
/// current Usage Page of the global state.
pub fn get_usage(item: &impl Item, globals: &GlobalItemStore) -> Result<Usage> {
    let value = item.value_unsigned()?;
    if item.data_size() == 4 {
        return Ok(Usage::from(value));
    }
    let usage_page = globals
        .get_item(GlobalTag::UsagePage)
        .ok_or(ParserError::UsagePageMissing)?
        .value_unsigned()?;
    ensure!(usage_page != 0, ParserError::UsagePageZero);
    ensure!(usage_page <= 0xffff, ParserError::UsagePageOutOfRange);
    Ok(Usage::new(
        UsagePage(usage_page as u16),
        UsageId((value & 0xffff) as u16),
    ))
}

/// Verify the Delimiter items in a section: each set is opened with 1 and
/// closed with 0, sets do not nest and only contain usages.
///
/// Returns true if the section contains delimiters.
pub fn check_delimiters(section: &DescriptorView<'_>) -> Result<bool> {
    let mut open = false;
    let mut found = false;
    for item in section.iter().filter(|item| item.item_type() == ItemType::Local) {
        match item.local_tag() {
            Ok(LocalTag::Delimiter) => {
                match item.value_unsigned()? {
                    1 => ensure!(!open, ParserError::DelimiterNesting),
                    0 => ensure!(open, ParserError::DelimiterNesting),
                    _ => return Err(ParserError::DelimiterInvalid),
                }
                open = !open;
                found = true;
            }
            Ok(LocalTag::Usage | LocalTag::UsageMinimum | LocalTag::UsageMaximum) => {}
            _ => ensure!(!open, ParserError::DelimiterInvalidContent),
        }
    }
    ensure!(!open, ParserError::DelimiterUnmatched);
    Ok(found)
}

/// The report ID, size and count that apply to one data main item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDataFieldParams {
    /// The report ID, 0 if no Report ID item is present
    pub report_id: u8,
    pub report_size: u32,
    pub report_count: u32,
}

impl ReportDataFieldParams {
    /// The total size of the field(s) in bits
    pub fn bit_size(&self) -> u64 {
        self.report_size as u64 * self.report_count as u64
    }
}

/// Extract the [ReportDataFieldParams] from the global state.
pub fn get_report_data_field_params(globals: &GlobalItemStore) -> Result<ReportDataFieldParams> {
    let report_id = match globals.get_item(GlobalTag::ReportId) {
        Some(item) => {
            let id = item.value_unsigned()?;
            ensure!(id > 0, ParserError::ReportIdZero);
            ensure!(id <= u8::MAX as u32, ParserError::ReportIdExcess);
            id as u8
        }
        None => 0,
    };

    let report_size = globals
        .get_item(GlobalTag::ReportSize)
        .ok_or(ParserError::ReportSizeMissing)?
        .value_unsigned()?;
    ensure!(report_size > 0, ParserError::ReportSizeZero);

    let report_count = globals
        .get_item(GlobalTag::ReportCount)
        .ok_or(ParserError::ReportCountMissing)?
        .value_unsigned()?;
    ensure!(report_count > 0, ParserError::ReportCountZero);

    Ok(ReportDataFieldParams {
        report_id,
        report_size,
        report_count,
    })
}

/// A minimum and maximum pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits<T> {
    pub min: T,
    pub max: T,
}

fn logical_limit_items(globals: &GlobalItemStore) -> Result<(&ItemBuffer, &ItemBuffer)> {
    let min = globals
        .get_item(GlobalTag::LogicalMinimum)
        .ok_or(ParserError::LogicalMinMissing)?;
    let max = globals
        .get_item(GlobalTag::LogicalMaximum)
        .ok_or(ParserError::LogicalMaxMissing)?;
    Ok((min, max))
}

/// The Logical Minimum and Maximum as signed values.
pub fn get_logical_limits_signed(globals: &GlobalItemStore) -> Result<Limits<i32>> {
    let (min, max) = logical_limit_items(globals)?;
    let limits = Limits {
        min: min.value_signed()?,
        max: max.value_signed()?,
    };
    ensure!(limits.min <= limits.max, ParserError::LogicalLimitsCrossed);
    Ok(limits)
}

/// The Logical Minimum and Maximum as unsigned values.
pub fn get_logical_limits_unsigned(globals: &GlobalItemStore) -> Result<Limits<u32>> {
    let (min, max) = logical_limit_items(globals)?;
    let limits = Limits {
        min: min.value_unsigned()?,
        max: max.value_unsigned()?,
    };
    ensure!(limits.min <= limits.max, ParserError::LogicalLimitsCrossed);
    Ok(limits)
}

/// The Physical Minimum and Maximum, if present. Both must be present or
/// both must be missing.
pub fn get_physical_limits(globals: &GlobalItemStore) -> Result<Option<Limits<i32>>> {
    match (
        globals.get_item(GlobalTag::PhysicalMinimum),
        globals.get_item(GlobalTag::PhysicalMaximum),
    ) {
        (Some(min), Some(max)) => {
            let limits = Limits {
                min: min.value_signed()?,
                max: max.value_signed()?,
            };
            ensure!(limits.min <= limits.max, ParserError::PhysicalLimitsCrossed);
            Ok(Some(limits))
        }
        (None, None) => Ok(None),
        _ => Err(ParserError::PhysicalLimitMissing),
    }
}

/// Finds the Usage of the first top-level collection.
#[derive(Debug, Default)]
struct ApplicationUsageFinder {
    usage: Option<Usage>,
}

impl Parser for ApplicationUsageFinder {
    fn parse_collection_begin(
        &mut self,
        _collection: CollectionType,
        globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        let item = section
            .iter()
            .find(|item| item.has_tag(LocalTag::Usage))
            .ok_or(ParserError::UsageMissing)?;
        self.usage = Some(get_usage(&item, globals)?);
        Ok(Control::Break)
    }
}

/// The Usage of the first top-level collection, e.g. Generic Desktop / Mouse.
///
/// Only the items up to the first Collection item are inspected.
///
/// ```
/// # use hidrp::*;
/// # use hidrp::parser::application_usage;
/// let bytes = [0x05, 0x01, 0x09, 0x06, 0xa1, 0x01, 0xc0];
/// let usage = application_usage(&DescriptorView::new(&bytes)).unwrap();
/// assert_eq!(usage, Usage::new(UsagePage(0x1), UsageId(0x6)));
/// ```
pub fn application_usage(view: &DescriptorView<'_>) -> Result<Usage> {
    let mut finder = ApplicationUsageFinder::default();
    parse_items(&mut finder, view)?;
    finder.usage.ok_or(ParserError::CollectionMissing)
}
