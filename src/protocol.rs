// SPDX-License-Identifier: MIT

//! Report protocol properties of a HID Report Descriptor.
//!
//! A [ReportProtocol] is the result of a full validation pass over a
//! descriptor. It knows every report the descriptor declares, identified by a
//! [ReportSelector], and the size of each report. This is the information a
//! transport layer needs to set up its data channels.
//!
//! ```
//! # use hidrp::*;
//! let bytes = [
//!     0x05, 0x01, // Usage Page (Generic Desktop)
//!     0x09, 0x06, // Usage (Keyboard)
//!     0xa1, 0x01, // Collection (Application)
//!     0x85, 0x02, //   Report ID (2)
//!     0x05, 0x07, //   Usage Page (Keyboard/Keypad)
//!     0x19, 0x00, //   Usage Minimum (0)
//!     0x29, 0xdd, //   Usage Maximum (221)
//!     0x15, 0x00, //   Logical Minimum (0)
//!     0x26, 0xdd, 0x00, // Logical Maximum (221)
//!     0x75, 0x08, //   Report Size (8)
//!     0x95, 0x06, //   Report Count (6)
//!     0x81, 0x00, //   Input (Data,Arr,Abs)
//!     0xc0,       // End Collection
//! ];
//! let protocol = ReportProtocol::try_from(bytes.as_slice()).unwrap();
//! assert!(protocol.uses_report_ids());
//! assert_eq!(protocol.max_report_id(), Some(ReportId(2)));
//! assert_eq!(protocol.max_report_size(ReportType::Input), 7);
//! assert_eq!(protocol.max_report_size(ReportType::Output), 0);
//! ```

use std::collections::HashMap;

use crate::hid::{CollectionType, DataFieldFlags, Item, ItemRef, LocalTag};
use crate::parser::*;
use crate::types::*;
use crate::view::DescriptorView;
use crate::{ensure, ParserError, Result};

/// The accumulated state of one report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Report {
    bits: u64,
    /// The top-level collection this report belongs to
    tlc_number: u32,
}

/// The report protocol of a validated HID Report Descriptor.
///
/// Constructed with [ReportProtocol::try_from()] from the descriptor bytes,
/// which fails with the first [ParserError] found in the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportProtocol {
    reports: HashMap<ReportSelector, Report>,
    max_report_ids: [u8; 3],
    tlc_count: u32,
}

impl ReportProtocol {
    /// Parse and validate the descriptor in the given view.
    pub fn from_view(view: &DescriptorView<'_>) -> Result<ReportProtocol> {
        let mut extractor = ProtocolExtractor::default();
        parse_items(&mut extractor, view)?;

        for (selector, report) in &extractor.reports {
            if report.bits % 8 != 0 {
                log::debug!(
                    "{} report {} is {} bits long",
                    selector.report_type,
                    selector.report_id,
                    report.bits
                );
                return Err(ParserError::ReportTotalSizeInvalid);
            }
        }

        let protocol = ReportProtocol {
            reports: extractor.reports,
            max_report_ids: extractor.max_report_ids,
            tlc_count: extractor.tlc_count,
        };
        log::debug!(
            "{} report(s) in {} top-level collection(s), max sizes input {} output {} feature {}",
            protocol.reports.len(),
            protocol.tlc_count,
            protocol.max_report_size(ReportType::Input),
            protocol.max_report_size(ReportType::Output),
            protocol.max_report_size(ReportType::Feature)
        );
        Ok(protocol)
    }

    /// The size in bytes of the longest report of this type, including the
    /// leading report ID byte if report IDs are in use. Zero if the
    /// descriptor has no report of this type.
    pub fn max_report_size(&self, report_type: ReportType) -> usize {
        if !self.uses_report_ids() {
            return self.report_bit_size(ReportSelector::new(report_type, 0)).unwrap_or(0) / 8;
        }
        match self.max_report_data_size(report_type) {
            0 => 0,
            size => 1 + size,
        }
    }

    /// The largest [ReportProtocol::max_report_size()] across all report types.
    pub fn max_report_size_any(&self) -> usize {
        ReportType::ALL
            .iter()
            .map(|report_type| self.max_report_size(*report_type))
            .max()
            .unwrap_or(0)
    }

    /// The size in bytes of the longest report of this type, excluding
    /// the report ID byte.
    pub fn max_report_data_size(&self, report_type: ReportType) -> usize {
        self.reports
            .iter()
            .filter(|(selector, _)| selector.report_type == report_type)
            .map(|(_, report)| report.bits as usize / 8)
            .max()
            .unwrap_or(0)
    }

    /// The number of distinct reports of this type.
    pub fn report_count(&self, report_type: ReportType) -> usize {
        self.reports
            .keys()
            .filter(|selector| selector.report_type == report_type)
            .count()
    }

    pub fn uses_report_ids(&self) -> bool {
        self.max_report_id().is_some()
    }

    /// The highest report ID in use, across all report types.
    pub fn max_report_id(&self) -> Option<ReportId> {
        ReportType::ALL
            .iter()
            .filter_map(|report_type| self.max_report_id_of(*report_type))
            .max()
    }

    /// The highest report ID in use by reports of this type.
    pub fn max_report_id_of(&self, report_type: ReportType) -> Option<ReportId> {
        match self.max_report_ids[report_type.index()] {
            0 => None,
            id => Some(ReportId(id)),
        }
    }

    /// All reports of this descriptor, ordered by type, then by ID.
    pub fn selectors(&self) -> Vec<ReportSelector> {
        let mut selectors: Vec<ReportSelector> = self.reports.keys().copied().collect();
        selectors.sort();
        selectors
    }

    /// The total size in bits of the data fields of this report, excluding the report ID.
    pub fn report_bit_size(&self, selector: ReportSelector) -> Option<usize> {
        self.reports.get(&selector).map(|report| report.bits as usize)
    }

    /// The number of top-level collections in this descriptor.
    pub fn tlc_count(&self) -> u32 {
        self.tlc_count
    }
}

impl TryFrom<&[u8]> for ReportProtocol {
    type Error = ParserError;

    fn try_from(bytes: &[u8]) -> Result<ReportProtocol> {
        ReportProtocol::from_view(&DescriptorView::new(bytes))
    }
}

impl TryFrom<&DescriptorView<'_>> for ReportProtocol {
    type Error = ParserError;

    fn try_from(view: &DescriptorView<'_>) -> Result<ReportProtocol> {
        ReportProtocol::from_view(view)
    }
}

/// The [Parser] that validates each data field and accumulates the report sizes.
#[derive(Debug, Default)]
struct ProtocolExtractor {
    reports: HashMap<ReportSelector, Report>,
    max_report_ids: [u8; 3],
    /// Set by the first data field, all other fields must agree
    uses_report_ids: Option<bool>,
    tlc_count: u32,
}

impl Parser for ProtocolExtractor {
    fn parse_collection_begin(
        &mut self,
        _collection: CollectionType,
        _globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        tlc_number: u32,
    ) -> Result<Control> {
        // only the first collection of a TLC gets a new number
        if tlc_number != self.tlc_count {
            ensure!(
                !check_delimiters(section)?,
                ParserError::DelimiterInvalidLocation
            );
        }
        self.tlc_count = tlc_number;
        Ok(Control::Continue)
    }

    fn parse_collection_end(
        &mut self,
        _globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        _tlc_number: u32,
    ) -> Result<Control> {
        ensure!(
            !check_delimiters(section)?,
            ParserError::DelimiterInvalidLocation
        );
        Ok(Control::Continue)
    }

    fn parse_report_data_field(
        &mut self,
        main_item: &ItemRef<'_>,
        globals: &GlobalItemStore,
        section: &DescriptorView<'_>,
        tlc_number: u32,
    ) -> Result<Control> {
        let tag = main_item.main_tag()?;
        let report_type = tag.report_type().ok_or(ParserError::ItemUnknown)?;
        let params = get_report_data_field_params(globals)?;

        let has_report_id = params.report_id > 0;
        match self.uses_report_ids {
            Some(uses_report_ids) => {
                ensure!(uses_report_ids == has_report_id, ParserError::ReportIdMissing)
            }
            None => self.uses_report_ids = Some(has_report_id),
        }
        let max_id = &mut self.max_report_ids[report_type.index()];
        *max_id = (*max_id).max(params.report_id);

        let flags = DataFieldFlags::from(main_item.value_unsigned()?);
        let has_delimiters = check_delimiters(section)?;
        ensure!(
            !(has_delimiters && flags.is_array()),
            ParserError::DelimiterInvalidMainItem
        );

        if !flags.is_constant() {
            check_logical_limits(flags, params.report_size, globals)?;
            get_physical_limits(globals)?;
            check_usage_limits(section)?;
        }

        let selector = ReportSelector::new(report_type, params.report_id);
        let report = self.reports.entry(selector).or_insert(Report {
            bits: 0,
            tlc_number,
        });
        if flags.is_buffered_bytes() {
            ensure!(
                params.report_size % 8 == 0 && report.bits % 8 == 0,
                ParserError::BufferedBytesMisaligned { tag }
            );
        }
        ensure!(
            report.tlc_number == tlc_number,
            ParserError::ReportCrossingTlcBounds
        );
        report.bits = report
            .bits
            .checked_add(params.bit_size())
            .ok_or(ParserError::ReportTotalSizeInvalid)?;

        log::trace!(
            "{tag} report {}: {} x {} bits, flags {flags}",
            params.report_id,
            params.report_count,
            params.report_size
        );
        Ok(Control::Continue)
    }
}

/// Verify that the Logical Minimum and Maximum can be represented in a
/// field of `report_size` bits.
///
/// Variable fields with a negative minimum are checked as two's complement values,
/// array fields as unsigned values. Constant fields are padding and are not checked.
fn check_logical_limits(
    flags: DataFieldFlags,
    report_size: u32,
    globals: &GlobalItemStore,
) -> Result<()> {
    let bits = report_size.min(32);
    // an unsigned maximum of exactly 2^bits is accepted
    let unsigned_max = 1i64 << bits;

    if flags.is_variable() {
        let limits = get_logical_limits_signed(globals)?;
        if limits.min < 0 {
            let half = 1i64 << (bits - 1);
            ensure!(limits.min as i64 >= -half, ParserError::LogicalMinOutOfBounds);
            ensure!(limits.max as i64 <= half - 1, ParserError::LogicalMaxOutOfBounds);
        } else {
            ensure!(
                limits.max as i64 <= unsigned_max,
                ParserError::LogicalMaxOutOfBounds
            );
        }
    } else {
        let limits = get_logical_limits_unsigned(globals)?;
        ensure!(
            limits.max as i64 <= unsigned_max,
            ParserError::LogicalMaxOutOfBounds
        );
    }
    Ok(())
}

/// Verify the Usage Minimum and Maximum of a section: at most one of each,
/// both or neither, both extended or both not, and in order.
///
/// Usage limits inside a delimiter set are alternatives and are not checked.
fn check_usage_limits(section: &DescriptorView<'_>) -> Result<()> {
    let mut minimum: Option<ItemRef> = None;
    let mut maximum: Option<ItemRef> = None;
    let mut in_delimiter = false;

    for item in section.iter() {
        match item.local_tag() {
            Ok(LocalTag::Delimiter) => {
                in_delimiter = item.value_unsigned()? == Delimiter::OPEN.0;
            }
            Ok(LocalTag::UsageMinimum) if !in_delimiter => {
                ensure!(minimum.is_none(), ParserError::UsageMinDuplicate);
                minimum = Some(item);
            }
            Ok(LocalTag::UsageMaximum) if !in_delimiter => {
                ensure!(maximum.is_none(), ParserError::UsageMaxDuplicate);
                maximum = Some(item);
            }
            _ => {}
        }
    }

    let (minimum, maximum) = match (minimum, maximum) {
        (None, None) => return Ok(()),
        (Some(minimum), Some(maximum)) => (minimum, maximum),
        _ => return Err(ParserError::UsageLimitMissing),
    };

    let extended = minimum.data_size() == 4;
    ensure!(
        extended == (maximum.data_size() == 4),
        ParserError::UsageLimitsSizeMismatch
    );
    let min = minimum.value_unsigned()?;
    let max = maximum.value_unsigned()?;
    if extended {
        ensure!(min >> 16 == max >> 16, ParserError::UsageLimitsPageMismatch);
    }
    ensure!(min <= max, ParserError::UsageLimitsCrossed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::{MainTag, ReportDescriptorBuilder};

    const MOUSE: [u8; 50] = [
        0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x09, 0x01, 0xa1, 0x00, 0x05, 0x09, 0x19, 0x01, 0x29,
        0x03, 0x15, 0x00, 0x25, 0x01, 0x95, 0x03, 0x75, 0x01, 0x81, 0x02, 0x95, 0x01, 0x75, 0x05,
        0x81, 0x03, 0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x15, 0x81, 0x25, 0x7f, 0x75, 0x08, 0x95,
        0x02, 0x81, 0x06, 0xc0, 0xc0,
    ];

    fn protocol(bytes: &[u8]) -> Result<ReportProtocol> {
        ReportProtocol::try_from(bytes)
    }

    /// A descriptor with one application collection around the given items
    fn application(items: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x05, 0x01, 0x09, 0x00, 0xa1, 0x01];
        bytes.extend_from_slice(items);
        bytes.push(0xc0);
        bytes
    }

    #[test]
    fn mouse() {
        let protocol = protocol(&MOUSE).unwrap();
        assert!(!protocol.uses_report_ids());
        assert_eq!(protocol.max_report_id(), None);
        assert_eq!(protocol.max_report_size(ReportType::Input), 3);
        assert_eq!(protocol.max_report_size(ReportType::Output), 0);
        assert_eq!(protocol.max_report_size(ReportType::Feature), 0);
        assert_eq!(protocol.max_report_size_any(), 3);
        assert_eq!(protocol.report_count(ReportType::Input), 1);
        assert_eq!(protocol.report_count(ReportType::Output), 0);
        assert_eq!(
            protocol.selectors(),
            [ReportSelector::new(ReportType::Input, 0)]
        );
        assert_eq!(
            protocol.report_bit_size(ReportSelector::new(ReportType::Input, 0)),
            Some(24)
        );
        assert_eq!(protocol.tlc_count(), 1);

        // parsing has no hidden state
        assert_eq!(protocol, ReportProtocol::try_from(MOUSE.as_slice()).unwrap());
    }

    #[test]
    fn report_ids() {
        let bytes = application(&[
            0x85, 0x01, 0x75, 0x08, 0x95, 0x02, 0x15, 0x00, 0x25, 0x01, 0x81, 0x01, // Input 1
            0x85, 0x03, 0x95, 0x04, 0x81, 0x01, // Input 3
            0x95, 0x01, 0xb1, 0x01, // Feature 3
            0x85, 0x02, 0x91, 0x01, // Output 2
        ]);
        let protocol = protocol(&bytes).unwrap();
        assert!(protocol.uses_report_ids());
        assert_eq!(protocol.max_report_id(), Some(ReportId(3)));
        assert_eq!(protocol.max_report_id_of(ReportType::Input), Some(ReportId(3)));
        assert_eq!(protocol.max_report_id_of(ReportType::Output), Some(ReportId(2)));
        assert_eq!(protocol.max_report_id_of(ReportType::Feature), Some(ReportId(3)));
        assert_eq!(protocol.max_report_size(ReportType::Input), 5);
        assert_eq!(protocol.max_report_data_size(ReportType::Input), 4);
        assert_eq!(protocol.max_report_size(ReportType::Output), 2);
        assert_eq!(protocol.max_report_size(ReportType::Feature), 2);
        assert_eq!(protocol.report_count(ReportType::Input), 2);
        assert_eq!(
            protocol.selectors(),
            [
                ReportSelector::new(ReportType::Input, 1),
                ReportSelector::new(ReportType::Input, 3),
                ReportSelector::new(ReportType::Output, 2),
                ReportSelector::new(ReportType::Feature, 3),
            ]
        );
    }

    #[test]
    fn report_id_errors() {
        // a report with ID after one without
        let bytes = application(&[
            0x75, 0x08, 0x95, 0x01, 0x81, 0x01, 0x85, 0x01, 0x81, 0x01,
        ]);
        assert_eq!(protocol(&bytes), Err(ParserError::ReportIdMissing));

        // a report without ID after one with, Pop restores the state without ID
        let bytes = application(&[
            0x75, 0x08, 0x95, 0x01, 0xa4, 0x85, 0x01, 0x81, 0x01, 0xb4, 0x81, 0x01,
        ]);
        assert_eq!(protocol(&bytes), Err(ParserError::ReportIdMissing));

        let bytes = application(&[0x85, 0x00, 0x75, 0x08, 0x95, 0x01, 0x81, 0x01]);
        assert_eq!(protocol(&bytes), Err(ParserError::ReportIdZero));
    }

    #[test]
    fn total_size() {
        let bytes = application(&[0x75, 0x01, 0x95, 0x07, 0x81, 0x01]);
        assert_eq!(protocol(&bytes), Err(ParserError::ReportTotalSizeInvalid));

        let bytes = application(&[0x75, 0x01, 0x95, 0x07, 0x81, 0x01, 0x95, 0x01, 0x91, 0x01]);
        assert_eq!(protocol(&bytes), Err(ParserError::ReportTotalSizeInvalid));

        let bytes = application(&[0x75, 0x01, 0x95, 0x07, 0x81, 0x01, 0x95, 0x01, 0x81, 0x01]);
        assert_eq!(protocol(&bytes).unwrap().max_report_size(ReportType::Input), 1);
    }

    #[test]
    fn tlc_bounds() {
        let field = [0x75, 0x08, 0x95, 0x01, 0x81, 0x01];
        let mut bytes = application(&field);
        bytes.extend(application(&field));
        assert_eq!(protocol(&bytes), Err(ParserError::ReportCrossingTlcBounds));

        // the same report ID in different report types is fine
        let mut bytes = application(&[0x85, 0x01, 0x75, 0x08, 0x95, 0x01, 0x81, 0x01]);
        bytes.extend(application(&[0x85, 0x01, 0x75, 0x08, 0x95, 0x01, 0x91, 0x01]));
        let protocol = protocol(&bytes).unwrap();
        assert_eq!(protocol.tlc_count(), 2);
        assert_eq!(protocol.report_count(ReportType::Input), 1);
        assert_eq!(protocol.report_count(ReportType::Output), 1);
    }

    #[test]
    fn logical_limits() {
        /// Data,Var,Abs with 8 bits
        fn field(limits: &[u8]) -> Result<ReportProtocol> {
            let mut items = vec![0x75, 0x08, 0x95, 0x01];
            items.extend_from_slice(limits);
            items.extend_from_slice(&[0x81, 0x02]);
            protocol(&application(&items))
        }
        assert!(field(&[0x15, 0x80, 0x25, 0x7f]).is_ok());
        assert!(field(&[0x15, 0x00, 0x26, 0xff, 0x00]).is_ok());
        assert!(field(&[0x15, 0x00, 0x26, 0x00, 0x01]).is_ok());
        assert_eq!(
            field(&[0x15, 0x00, 0x26, 0x01, 0x01]),
            Err(ParserError::LogicalMaxOutOfBounds)
        );
        assert_eq!(
            field(&[0x16, 0x7f, 0xff, 0x25, 0x00]),
            Err(ParserError::LogicalMinOutOfBounds)
        );
        assert_eq!(
            field(&[0x15, 0xff, 0x26, 0x80, 0x00]),
            Err(ParserError::LogicalMaxOutOfBounds)
        );
        assert_eq!(field(&[0x25, 0x01]), Err(ParserError::LogicalMinMissing));
        assert_eq!(field(&[0x15, 0x01, 0x25, 0x00]), Err(ParserError::LogicalLimitsCrossed));

        // constant fields need no limits
        let bytes = application(&[0x75, 0x08, 0x95, 0x01, 0x81, 0x01]);
        assert!(protocol(&bytes).is_ok());

        // padding after signed data keeps the signed limits in the global state
        let bytes = application(&[
            0x15, 0x81, 0x25, 0x7f, 0x75, 0x08, 0x95, 0x01, 0x81, 0x06, // Input (Data,Var,Rel)
            0x75, 0x04, 0x95, 0x02, 0x81, 0x01, // 8 bits padding
        ]);
        assert_eq!(protocol(&bytes).unwrap().max_report_size(ReportType::Input), 2);

        // padding narrower than the limits of the previous field
        let bytes = application(&[
            0x15, 0x00, 0x26, 0xff, 0x00, 0x75, 0x08, 0x95, 0x01, 0x81, 0x02, // 0..255
            0x75, 0x04, 0x95, 0x02, 0x81, 0x03, // 8 bits padding
        ]);
        assert!(protocol(&bytes).is_ok());
    }

    #[test]
    fn usage_limits() {
        fn field(usages: &[u8]) -> Result<ReportProtocol> {
            let mut items = vec![0x05, 0x09, 0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x08];
            items.extend_from_slice(usages);
            items.extend_from_slice(&[0x81, 0x02]);
            protocol(&application(&items))
        }
        assert!(field(&[0x19, 0x01, 0x29, 0x08]).is_ok());
        assert_eq!(field(&[0x19, 0x01]), Err(ParserError::UsageLimitMissing));
        assert_eq!(field(&[0x29, 0x08]), Err(ParserError::UsageLimitMissing));
        assert_eq!(
            field(&[0x19, 0x01, 0x19, 0x02, 0x29, 0x08]),
            Err(ParserError::UsageMinDuplicate)
        );
        assert_eq!(
            field(&[0x19, 0x01, 0x29, 0x08, 0x29, 0x09]),
            Err(ParserError::UsageMaxDuplicate)
        );
        assert_eq!(
            field(&[0x19, 0x08, 0x29, 0x01]),
            Err(ParserError::UsageLimitsCrossed)
        );
        assert_eq!(
            field(&[0x1b, 0x01, 0x00, 0x09, 0x00, 0x29, 0x08]),
            Err(ParserError::UsageLimitsSizeMismatch)
        );
        assert_eq!(
            field(&[0x1b, 0x01, 0x00, 0x09, 0x00, 0x2b, 0x08, 0x00, 0x0a, 0x00]),
            Err(ParserError::UsageLimitsPageMismatch)
        );
        // alternatives inside a delimiter set
        assert!(field(&[
            0xa9, 0x01, 0x19, 0x01, 0x29, 0x08, 0x19, 0x11, 0x29, 0x18, 0xa9, 0x00
        ])
        .is_ok());
    }

    #[test]
    fn delimiter_on_array() {
        let bytes = application(&[
            0x05, 0x09, 0x15, 0x00, 0x25, 0x01, 0x75, 0x08, 0x95, 0x01, // globals
            0xa9, 0x01, 0x09, 0x01, 0x09, 0x02, 0xa9, 0x00, // delimiter set
            0x81, 0x00, // Input (Data,Arr,Abs)
        ]);
        assert_eq!(protocol(&bytes), Err(ParserError::DelimiterInvalidMainItem));
    }

    #[test]
    fn delimiter_location() {
        // in front of a top-level collection
        let bytes = [
            0x05, 0x01, 0xa9, 0x01, 0x09, 0x02, 0x09, 0x03, 0xa9, 0x00, 0xa1, 0x01, 0x75, 0x08,
            0x95, 0x01, 0x81, 0x01, 0xc0,
        ];
        assert_eq!(protocol(&bytes), Err(ParserError::DelimiterInvalidLocation));

        // in front of an End Collection
        let bytes = application(&[
            0x75, 0x08, 0x95, 0x01, 0x81, 0x01, // padding
            0xa9, 0x01, 0x09, 0x01, 0xa9, 0x00, // delimiter set
        ]);
        assert_eq!(protocol(&bytes), Err(ParserError::DelimiterInvalidLocation));

        // alternative usages of a nested collection
        let bytes = application(&[
            0xa9, 0x01, 0x09, 0x01, 0x09, 0x02, 0xa9, 0x00, // delimiter set
            0xa1, 0x00, 0x75, 0x08, 0x95, 0x01, 0x81, 0x01, 0xc0,
        ]);
        assert!(protocol(&bytes).is_ok());
    }

    #[test]
    fn physical_limits() {
        let bytes = application(&[
            0x15, 0x00, 0x25, 0x01, 0x75, 0x08, 0x95, 0x01, 0x35, 0x00, 0x81, 0x02,
        ]);
        assert_eq!(protocol(&bytes), Err(ParserError::PhysicalLimitMissing));
    }

    #[test]
    fn buffered_bytes() {
        let flags = DataFieldFlags::VARIABLE | DataFieldFlags::BUFFERED_BYTES;
        let bytes = ReportDescriptorBuilder::new()
            .usage_page(UsagePage(0xff00))
            .usage(UsageId(0x01))
            .open_collection(CollectionType::Application)
            .append(LogicalMinimum(0))
            .append(LogicalMaximum(0xff))
            .append(ReportSize(8))
            .append(ReportCount(4))
            .usage(UsageId(0x02))
            .input(flags)
            .close_collection()
            .build();
        assert_eq!(protocol(&bytes).unwrap().max_report_size(ReportType::Input), 4);

        let bytes = application(&[
            0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x04, 0x81, 0x01, // 4 bits padding
            0x75, 0x08, 0x95, 0x01, 0x82, 0x02, 0x01, // Input (Var,Buff)
        ]);
        assert_eq!(
            protocol(&bytes),
            Err(ParserError::BufferedBytesMisaligned {
                tag: MainTag::Input
            })
        );
    }

    #[test]
    fn report_size_overflow() {
        // one field of almost 2^64 bits fits, two of them exceed the bit counter
        let field = [
            0x77, 0xf8, 0xff, 0xff, 0xff, 0x97, 0xff, 0xff, 0xff, 0xff, 0x81, 0x01,
        ];
        assert!(protocol(&application(&field)).is_ok());

        let mut items = field.to_vec();
        items.extend_from_slice(&[0x81, 0x01]);
        assert_eq!(
            protocol(&application(&items)),
            Err(ParserError::ReportTotalSizeInvalid)
        );
    }

    #[test]
    fn structural_errors_propagate() {
        assert_eq!(protocol(&[0x81, 0x02]), Err(ParserError::CollectionMissing));
        assert_eq!(protocol(&[0xb4]), Err(ParserError::PopUnmatched));
        assert_eq!(protocol(&MOUSE[..49]), Err(ParserError::CollectionBeginUnmatched));
        assert_eq!(protocol(&MOUSE[..47]), Err(ParserError::InvalidBounds));
    }
}
