// SPDX-License-Identifier: MIT

//! HID units, see Section 6.2.2.7, Unit and Unit Exponent.
//!
//! A unit code is made of 4-bit nibbles. The lowest nibble selects the
//! [UnitSystem], each following nibble holds the signed exponent of one base
//! unit: length, mass, time, temperature, current and luminous intensity.
//!
//! ```
//! # use hidrp::Unit;
//! # use hidrp::unit::{self, UnitSystem};
//! // m/s² in centimeter per second squared
//! let acceleration = unit::code(UnitSystem::SiLinear, 1, 0, -2, 0, 0, 0);
//! assert_eq!(acceleration, Unit(0xe011));
//! assert_eq!(unit::name(acceleration), Some("cm/s²"));
//! ```

use crate::types::{Unit, UnitExponent};

/// The system of measurement, the lowest nibble of a unit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    None = 0,
    SiLinear = 1,
    SiRotation = 2,
    EnglishLinear = 3,
    EnglishRotation = 4,
}

// nibble positions of the base units within a unit code
const LENGTH: u32 = 1;
const MASS: u32 = 2;
const TIME: u32 = 3;
const TEMPERATURE: u32 = 4;
const CURRENT: u32 = 5;
const LUMINOUS_INTENSITY: u32 = 6;

fn nibble(exponent: i8, index: u32) -> u32 {
    ((exponent as u32) & 0xf) << (index * 4)
}

/// Compose a unit code from the system and the exponent of each base unit.
/// Exponents are truncated to 4 bits.
pub fn code(
    system: UnitSystem,
    length: i8,
    mass: i8,
    time: i8,
    temperature: i8,
    current: i8,
    luminous_intensity: i8,
) -> Unit {
    Unit(
        system as u32
            | nibble(length, LENGTH)
            | nibble(mass, MASS)
            | nibble(time, TIME)
            | nibble(temperature, TEMPERATURE)
            | nibble(current, CURRENT)
            | nibble(luminous_intensity, LUMINOUS_INTENSITY),
    )
}

/// Sign-extend a 4-bit nibble
fn signed_nibble(value: u32) -> i32 {
    ((value & 0xf) as i32) << 28 >> 28
}

/// The exponent of the base unit at nibble `index` of a unit code.
fn base_exponent(unit: Unit, index: u32) -> i32 {
    signed_nibble(unit.0 >> (index * 4))
}

/// Decode the data of a Unit Exponent item. Only the lowest nibble is used,
/// as a signed value between -8 and 7.
pub fn exponent(value: u32) -> UnitExponent {
    UnitExponent(signed_nibble(value))
}

/// The power of ten a value in this unit is divided by to convert it to meter
/// and kilogram, e.g. 2 for cm, 4 for cm² and 3 for g.
pub fn si_exponent(unit: Unit) -> i32 {
    base_exponent(unit, LENGTH) * 2 + base_exponent(unit, MASS) * 3
}

const NAMES: &[(u32, &str)] = &[
    (0x0000_0011, "cm"),
    (0x0000_0012, "rad"),
    (0x0000_0013, "in"),
    (0x0000_0014, "deg"),
    (0x0000_0101, "g"),
    (0x0000_0103, "slug"),
    (0x0000_1001, "s"),
    (0x0001_0001, "K"),
    (0x0001_0003, "°F"),
    (0x0010_0001, "A"),
    (0x0100_0001, "cd"),
    (0x0000_e111, "N"),
    (0x0000_f011, "cm/s"),
    (0x0000_e011, "cm/s²"),
    (0x0000_e1f1, "Pa"),
    (0x0000_e121, "J"),
    (0x0000_f001, "Hz"),
    (0x0000_f014, "deg/s"),
    (0x0000_e014, "deg/s²"),
    (0x0000_f012, "rad/s"),
    (0x0000_e012, "rad/s²"),
    (0x0000_d121, "W"),
    (0x0010_f001, "A/s"),
    (0x0010_1001, "C"),
    (0x0020_4fe1, "F"),
    (0x00e0_e121, "H"),
    (0x0100_00e1, "lx"),
    (0x00e0_d121, "Ω"),
    (0x0020_3fe1, "S"),
    (0x00f0_e101, "T"),
    (0x00f0_d121, "V"),
    (0x00f0_e121, "Wb"),
];

/// The symbol of a common unit, if this code is one.
pub fn name(unit: Unit) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(code, _)| *code == unit.0)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_codes() {
        assert_eq!(code(UnitSystem::None, 0, 0, 0, 0, 0, 0), Unit(0));
        assert_eq!(code(UnitSystem::SiLinear, 1, 0, 0, 0, 0, 0), Unit(0x11));
        assert_eq!(code(UnitSystem::EnglishRotation, 1, 0, -1, 0, 0, 0), Unit(0xf014));
        assert_eq!(code(UnitSystem::SiLinear, 1, 1, -2, 0, 0, 0), Unit(0xe111));
        assert_eq!(code(UnitSystem::SiLinear, 2, 1, -3, 0, -1, 0), Unit(0x00f0_d121));
        assert_eq!(code(UnitSystem::SiLinear, -2, -1, 4, 0, 2, 0), Unit(0x0020_4fe1));
        assert_eq!(code(UnitSystem::SiLinear, -2, 0, 0, 0, 0, 1), Unit(0x0100_00e1));
    }

    #[test]
    fn unit_names() {
        for (value, name) in NAMES {
            assert_eq!(super::name(Unit(*value)), Some(*name));
        }
        assert_eq!(name(code(UnitSystem::SiRotation, 1, 0, 0, 0, 0, 0)), Some("rad"));
        assert_eq!(name(Unit(0)), None);
        assert_eq!(name(Unit(0x21)), None);
    }

    #[test]
    fn unit_exponents() {
        assert_eq!(exponent(0x0), UnitExponent(0));
        assert_eq!(exponent(0x7), UnitExponent(7));
        assert_eq!(exponent(0x8), UnitExponent(-8));
        assert_eq!(exponent(0xe), UnitExponent(-2));
        assert_eq!(exponent(0xf), UnitExponent(-1));
        // only the lowest nibble counts
        assert_eq!(exponent(0xf3), UnitExponent(3));

        assert_eq!(si_exponent(Unit(0x11)), 2);
        assert_eq!(si_exponent(Unit(0x101)), 3);
        assert_eq!(si_exponent(Unit(0xe111)), 5);
        assert_eq!(si_exponent(Unit(0x1001)), 0);
        assert_eq!(si_exponent(Unit(0xe1f1)), 1);
    }
}
