// SPDX-License-Identifier: MIT

//! A collection of standalone HID types that exist for type safety only.
//! Most of these are simple wrappers around their underlying integer data type.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

#[cfg(feature = "hut")]
use hut::{AsUsage, AsUsagePage};

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from(Foo, Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ty, $tipo_expr:expr, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo_expr(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just converts into the underlying number.
/// Use like this: `impl_fmt(Foo, u32)`.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

// ---------- GLOBAL ITEMS ---------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsagePage(pub u16);

impl_from!(UsagePage, UsagePage, u16);
impl_fmt!(UsagePage, u16);

impl UsagePage {
    /// The name of this Usage Page as listed in the HID Usage Tables, if known.
    #[cfg(feature = "hut")]
    pub fn name(&self) -> Option<String> {
        hut::UsagePage::from_usage_page_value(self.0)
            .ok()
            .map(|page| page.name())
    }

    /// The name of this Usage Page. Always `None` without the `hut` feature.
    #[cfg(not(feature = "hut"))]
    pub fn name(&self) -> Option<String> {
        None
    }
}

#[cfg(feature = "hut")]
impl From<&hut::UsagePage> for UsagePage {
    fn from(hut: &hut::UsagePage) -> UsagePage {
        UsagePage(hut.usage_page_value())
    }
}

#[cfg(feature = "hut")]
impl From<hut::UsagePage> for UsagePage {
    fn from(hut: hut::UsagePage) -> UsagePage {
        UsagePage::from(&hut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalMinimum(pub i32);

impl_from!(LogicalMinimum, LogicalMinimum, i32);
impl_fmt!(LogicalMinimum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalMaximum(pub i32);

impl_from!(LogicalMaximum, LogicalMaximum, i32);
impl_fmt!(LogicalMaximum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalMinimum(pub i32);

impl_from!(PhysicalMinimum, PhysicalMinimum, i32);
impl_fmt!(PhysicalMinimum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalMaximum(pub i32);

impl_from!(PhysicalMaximum, PhysicalMaximum, i32);
impl_fmt!(PhysicalMaximum, i32);

/// A unit code, see [crate::unit].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit(pub u32);

impl_from!(Unit, Unit, u32);
impl_fmt!(Unit, u32);

/// The base-10 exponent applied to a [Unit], in the range -8..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitExponent(pub i32);

impl_from!(UnitExponent, UnitExponent, i32);
impl_fmt!(UnitExponent, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSize(pub usize);

impl_from!(ReportSize, ReportSize, usize);
impl_fmt!(ReportSize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(pub u8);

impl_from!(ReportId, ReportId, u8);
impl_fmt!(ReportId, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCount(pub usize);

impl_from!(ReportCount, ReportCount, usize);
impl_fmt!(ReportCount, usize);

// ----------------- LOCAL ITEMS --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsageId(pub u16);

impl_from!(UsageId, UsageId, u16);
impl_fmt!(UsageId, u16);

#[cfg(feature = "hut")]
impl From<&hut::Usage> for UsageId {
    fn from(usage: &hut::Usage) -> UsageId {
        UsageId(usage.usage_id_value())
    }
}

#[cfg(feature = "hut")]
impl From<hut::Usage> for UsageId {
    fn from(usage: hut::Usage) -> UsageId {
        UsageId::from(&usage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageMinimum(pub u32);

impl_from!(UsageMinimum, UsageMinimum, u32);
impl_fmt!(UsageMinimum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageMaximum(pub u32);

impl_from!(UsageMaximum, UsageMaximum, u32);
impl_fmt!(UsageMaximum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringIndex(pub u32);

impl_from!(StringIndex, StringIndex, u32);
impl_fmt!(StringIndex, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringMinimum(pub u32);

impl_from!(StringMinimum, StringMinimum, u32);
impl_fmt!(StringMinimum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringMaximum(pub u32);

impl_from!(StringMaximum, StringMaximum, u32);
impl_fmt!(StringMaximum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatorIndex(pub u32);

impl_from!(DesignatorIndex, DesignatorIndex, u32);
impl_fmt!(DesignatorIndex, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatorMinimum(pub u32);

impl_from!(DesignatorMinimum, DesignatorMinimum, u32);
impl_fmt!(DesignatorMinimum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatorMaximum(pub u32);

impl_from!(DesignatorMaximum, DesignatorMaximum, u32);
impl_fmt!(DesignatorMaximum, u32);

/// Opens (1) or closes (0) a set of alternative usages, see Section 6.2.2.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter(pub u32);

impl_from!(Delimiter, Delimiter, u32);
impl_fmt!(Delimiter, u32);

impl Delimiter {
    pub const OPEN: Delimiter = Delimiter(1);
    pub const CLOSE: Delimiter = Delimiter(0);
}

// ----------------- USAGES AND REPORTS --------------------

/// A full HID Usage, the combination of a [UsagePage] and a [UsageId].
///
/// As a 32-bit value the Usage Page is the upper 16 bits, this is also the
/// encoding of an extended Usage item.
///
/// Formatting with `{}` prints the Usage name (or hex ID), the alternate
/// form `{:#}` prefixes the Usage Page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Usage {
    pub usage_page: UsagePage,
    pub usage_id: UsageId,
}

impl Usage {
    pub fn new(usage_page: UsagePage, usage_id: UsageId) -> Usage {
        Usage {
            usage_page,
            usage_id,
        }
    }

    /// The name of this Usage as listed in the HID Usage Tables, if known.
    #[cfg(feature = "hut")]
    pub fn name(&self) -> Option<String> {
        hut::Usage::new_from_page_and_id(self.usage_page.0, self.usage_id.0)
            .ok()
            .map(|usage| usage.name())
    }

    /// The name of this Usage. Always `None` without the `hut` feature.
    #[cfg(not(feature = "hut"))]
    pub fn name(&self) -> Option<String> {
        None
    }
}

impl From<u32> for Usage {
    fn from(value: u32) -> Usage {
        Usage {
            usage_page: UsagePage((value >> 16) as u16),
            usage_id: UsageId((value & 0xffff) as u16),
        }
    }
}

impl From<Usage> for u32 {
    fn from(usage: Usage) -> u32 {
        ((usage.usage_page.0 as u32) << 16) | usage.usage_id.0 as u32
    }
}

#[cfg(feature = "hut")]
impl From<&hut::Usage> for Usage {
    fn from(usage: &hut::Usage) -> Usage {
        Usage::from(usage.usage_value())
    }
}

#[cfg(feature = "hut")]
impl From<hut::Usage> for Usage {
    fn from(usage: hut::Usage) -> Usage {
        Usage::from(&usage)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            match self.usage_page.name() {
                Some(name) => write!(f, "{name} / ")?,
                None => write!(f, "{:#06x} / ", self.usage_page.0)?,
            }
        }
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{:#06x}", self.usage_id.0),
        }
    }
}

/// The type of a report, see Section 5.5.
///
/// The numeric values match the report type of the HID class
/// GET_REPORT/SET_REPORT requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportType {
    Input = 1,
    Output = 2,
    Feature = 3,
}

impl ReportType {
    pub const ALL: [ReportType; 3] = [ReportType::Input, ReportType::Output, ReportType::Feature];

    /// A zero-based index, for per-type lookup tables.
    pub(crate) fn index(&self) -> usize {
        *self as usize - 1
    }
}

impl TryFrom<u8> for ReportType {
    type Error = crate::ParserError;

    fn try_from(value: u8) -> Result<ReportType, Self::Error> {
        match value {
            1 => Ok(ReportType::Input),
            2 => Ok(ReportType::Output),
            3 => Ok(ReportType::Feature),
            _ => Err(crate::ParserError::ItemUnknown),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReportType::Input => "Input",
            ReportType::Output => "Output",
            ReportType::Feature => "Feature",
        };
        write!(f, "{name}")
    }
}

/// Identifies one report by its [ReportType] and report ID.
///
/// A report ID of zero means the descriptor does not use report IDs.
/// Selectors order by type first, then by ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportSelector {
    pub report_type: ReportType,
    pub report_id: u8,
}

impl ReportSelector {
    pub fn new(report_type: ReportType, report_id: u8) -> ReportSelector {
        ReportSelector {
            report_type,
            report_id,
        }
    }

    /// The report ID, or `None` if report IDs are not in use.
    pub fn report_id(&self) -> Option<ReportId> {
        match self.report_id {
            0 => None,
            id => Some(ReportId(id)),
        }
    }
}

/// The 16-bit encoding used as wValue in GET_REPORT/SET_REPORT requests:
/// the report type in the high byte, the report ID in the low byte.
impl From<ReportSelector> for u16 {
    fn from(selector: ReportSelector) -> u16 {
        ((selector.report_type as u16) << 8) | selector.report_id as u16
    }
}

impl TryFrom<u16> for ReportSelector {
    type Error = crate::ParserError;

    fn try_from(value: u16) -> Result<ReportSelector, Self::Error> {
        let report_type = ReportType::try_from((value >> 8) as u8)?;
        Ok(ReportSelector::new(report_type, (value & 0xff) as u8))
    }
}
