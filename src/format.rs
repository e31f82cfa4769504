// SPDX-License-Identifier: MIT

//! Human-readable output of a HID Report Descriptor.
//!
//! Formatting a [DescriptorView] with `{}` prints one item per line,
//! indented by collection depth, with usage pages and usages resolved to
//! their names where known.
//!
//! ```
//! # use hidrp::*;
//! let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x09, 0x01, 0xc0];
//! let text = DescriptorView::new(&bytes).to_string();
//! let lines: Vec<&str> = text.lines().collect();
//! assert_eq!(lines[2], "Collection(Application)");
//! assert!(lines[3].starts_with("    Usage("));
//! assert_eq!(lines[4], "End Collection()");
//! ```
//!
//! A descriptor that fails to parse is printed up to the last complete Main
//! item, followed by a `Structural error: ...` line and the remaining items
//! without indentation.

use std::fmt;

use crate::hid::{
    CollectionType, DataFieldFlags, GlobalTag, Item, ItemRef, ItemType, LocalTag, MainTag,
};
use crate::parser::{get_usage, parse_items, Control, GlobalItemStore, Parser};
use crate::types::*;
use crate::unit;
use crate::view::DescriptorView;
use crate::Result;

/// The number of spaces per collection level
const INDENT: usize = 4;

/// The text of a single item, `Name(value)`.
///
/// The global state resolves usages to their usage page, the flags of the
/// following data main item decide on the sign of the Logical Maximum.
fn format_item(item: &impl Item, globals: &GlobalItemStore, flags: DataFieldFlags) -> String {
    let name = match item.tag_name() {
        Some(name) => name,
        None => return format!("Unknown({:#04x})", item.header()),
    };
    // tag_name() is only set for short items with a defined tag
    let unsigned = item.value_unsigned().unwrap_or_default();
    let signed = item.value_signed().unwrap_or_default();

    let value = match item.item_type() {
        ItemType::Main => match item.main_tag() {
            Ok(MainTag::Input | MainTag::Output | MainTag::Feature) => {
                DataFieldFlags::from(unsigned).to_string()
            }
            Ok(MainTag::Collection) => CollectionType::from((unsigned & 0xff) as u8).to_string(),
            _ => String::new(),
        },
        ItemType::Global => match item.global_tag() {
            Ok(GlobalTag::UsagePage) => u16::try_from(unsigned)
                .ok()
                .and_then(|page| UsagePage(page).name())
                .unwrap_or_else(|| format!("{unsigned:#06x}")),
            Ok(GlobalTag::LogicalMaximum) if !flags.is_variable() => unsigned.to_string(),
            Ok(
                GlobalTag::LogicalMinimum
                | GlobalTag::LogicalMaximum
                | GlobalTag::PhysicalMinimum
                | GlobalTag::PhysicalMaximum,
            ) => signed.to_string(),
            Ok(GlobalTag::UnitExponent) => unit::exponent(unsigned).to_string(),
            Ok(GlobalTag::Unit) => unit::name(Unit(unsigned))
                .map(String::from)
                .unwrap_or_else(|| format!("{unsigned:#x}")),
            Ok(GlobalTag::Push | GlobalTag::Pop) => String::new(),
            _ => unsigned.to_string(),
        },
        ItemType::Local => match item.local_tag() {
            Ok(LocalTag::Usage | LocalTag::UsageMinimum | LocalTag::UsageMaximum) => {
                match get_usage(item, globals) {
                    Ok(usage) if item.data_size() == 4 => format!("{usage:#}"),
                    Ok(usage) => usage.to_string(),
                    Err(_) => format!("{unsigned:#06x}"),
                }
            }
            Ok(LocalTag::Delimiter) if unsigned == Delimiter::OPEN.0 => String::from("Open"),
            Ok(LocalTag::Delimiter) if unsigned == Delimiter::CLOSE.0 => String::from("Close"),
            _ => unsigned.to_string(),
        },
        ItemType::Reserved => String::new(),
    };
    format!("{name}({value})")
}

/// The [Parser] that prints each section together with its Main item.
struct ItemPrinter<'a> {
    view: DescriptorView<'a>,
    out: String,
    depth: usize,
    /// The offset just past the last printed item
    printed: usize,
}

impl<'a> ItemPrinter<'a> {
    fn new(view: DescriptorView<'a>) -> ItemPrinter<'a> {
        ItemPrinter {
            view,
            out: String::new(),
            depth: 0,
            printed: view.begin(),
        }
    }

    fn print_line(&mut self, depth: usize, text: &str) {
        self.out.push_str(&" ".repeat(depth * INDENT));
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Print the section at the current depth and the Main item that
    /// follows it at `main_depth`.
    fn print_section(
        &mut self,
        section: &DescriptorView<'_>,
        globals: &GlobalItemStore,
        flags: DataFieldFlags,
        main_depth: usize,
    ) {
        for item in section.iter() {
            let text = format_item(&item, globals, flags);
            self.print_line(self.depth, &text);
        }
        if let Some(main_item) = self.view.item_at(section.end()) {
            let text = format_item(&main_item, globals, flags);
            self.print_line(main_depth, &text);
            self.printed = main_item.end();
        }
    }

    /// Print everything after the last printed item, without indentation
    /// and without global state.
    fn print_remainder(&mut self) {
        let globals = GlobalItemStore::default();
        for item in self.view.tail(self.printed).iter() {
            let text = format_item(&item, &globals, DataFieldFlags::default());
            self.print_line(0, &text);
        }
    }
}

impl Parser for ItemPrinter<'_> {
    fn parse_collection_begin(
        &mut self,
        _collection: CollectionType,
        globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        self.print_section(section, globals, DataFieldFlags::default(), self.depth);
        self.depth += 1;
        Ok(Control::Continue)
    }

    fn parse_collection_end(
        &mut self,
        globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        let outer = self.depth.saturating_sub(1);
        self.print_section(section, globals, DataFieldFlags::default(), outer);
        self.depth = outer;
        Ok(Control::Continue)
    }

    fn parse_report_data_field(
        &mut self,
        main_item: &ItemRef<'_>,
        globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        let flags = DataFieldFlags::from(main_item.value_unsigned()?);
        self.print_section(section, globals, flags, self.depth);
        Ok(Control::Continue)
    }
}

impl fmt::Display for DescriptorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = ItemPrinter::new(*self);
        let result = parse_items(&mut printer, self);
        if let Err(e) = result {
            log::warn!("Structural error at offset {}: {e}", printer.printed);
            printer.print_line(0, &format!("Structural error: {e}"));
        }
        printer.print_remainder();
        f.write_str(&printer.out)
    }
}
