// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! General-purpose I/O ports.
//!
//! Each port is a bank of sixteen pins sharing packed configuration
//! registers: two bits per pin for mode, pull and speed, one bit per pin for
//! the driver type and four bits per pin for the alternate function number
//! (split across two sub-registers). All configuration entry points take a
//! [`PinSet`] and update every selected pin's field in a single combined
//! read-modify-write of the target register, leaving unselected pins'
//! fields untouched bit for bit.
//!
//! Output state goes through the set/reset register wherever possible:
//! [`Port::set`], [`Port::clear`] and [`Port::clear_and_set`] are each one
//! write and therefore safe against concurrent writers toggling *other*
//! pins of the same port. [`Port::toggle`] has no such hardware shortcut —
//! it must read the output latch first — so it is documented as not atomic
//! rather than pretending otherwise.
//!
//! A port powers itself through its clock gate:
//!
//! ```rust,ignore
//! let led = PinSet::pin(5);
//! let port_a = gpio::Port::new(gpio::GPIOA_BASE, PeripheralClock::new(gates::GPIOA, &clocks));
//! port_a.enable_clock();
//! port_a.set_mode(gpio::Mode::GeneralPurposeOutputMode, led);
//! port_a.set(led);
//! ```

use core::ops::{BitAnd, BitOr, BitXor, Not};

use tock_registers::interfaces::{Readable, Writeable};

use crate::clocks::phclk::PeripheralClock;
use crate::registers::{ReadOnly, ReadWrite, RegisterOps, StaticRef, WriteOnly};

/// General-purpose I/O port
#[repr(C)]
pub struct GpioRegisters {
    /// port mode register, two bits per pin
    moder: ReadWrite<u32>,
    /// port output type register, one bit per pin
    otyper: ReadWrite<u32>,
    /// port output speed register, two bits per pin
    ospeedr: ReadWrite<u32>,
    /// port pull-up/pull-down register, two bits per pin
    pupdr: ReadWrite<u32>,
    /// port input data register
    idr: ReadOnly<u32>,
    /// port output data register
    odr: ReadWrite<u32>,
    /// port bit set/reset register; low half sets, high half clears,
    /// set has priority
    bsrr: WriteOnly<u32>,
    /// port configuration lock register
    lckr: ReadWrite<u32>,
    /// alternate function low register, four bits per pin, pins 0-7
    afrl: ReadWrite<u32>,
    /// alternate function high register, four bits per pin, pins 8-15
    afrh: ReadWrite<u32>,
}

pub const GPIOA_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40020000 as *const GpioRegisters) };
pub const GPIOB_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40020400 as *const GpioRegisters) };
pub const GPIOC_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40020800 as *const GpioRegisters) };
pub const GPIOD_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40020C00 as *const GpioRegisters) };
pub const GPIOE_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40021000 as *const GpioRegisters) };
pub const GPIOF_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40021400 as *const GpioRegisters) };
pub const GPIOG_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40021800 as *const GpioRegisters) };
pub const GPIOH_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x40021C00 as *const GpioRegisters) };

/// Pin mode field values (MODER)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Input = 0b00,
    GeneralPurposeOutputMode = 0b01,
    AlternateFunctionMode = 0b10,
    AnalogMode = 0b11,
}

/// Pin pull resistor field values (PUPDR)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PullMode {
    NoPullUpPullDown = 0b00,
    PullUp = 0b01,
    PullDown = 0b10,
}

/// Pin output slew rate field values (OSPEEDR)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Low = 0b00,
    Medium = 0b01,
    Fast = 0b10,
    High = 0b11,
}

/// Pin output driver field values (OTYPER)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverType {
    PushPull = 0b0,
    OpenDrain = 0b1,
}

/// A set of pins of one port.
///
/// Every mask-taking port operation works on a `PinSet`, which carries the
/// usual set algebra (`|` union, `&` intersection, `^` symmetric difference,
/// `!` complement) and iterates over the indices of its members, so callers
/// build and inspect selections without hand-rolled bit twiddling.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSet(u16);

impl PinSet {
    pub const fn empty() -> PinSet {
        PinSet(0)
    }

    /// All sixteen pins of the port.
    pub const fn all() -> PinSet {
        PinSet(0xffff)
    }

    /// The set containing only pin `index` (0-15). Evaluated in `const`
    /// context an out-of-range index fails the build.
    pub const fn pin(index: u8) -> PinSet {
        assert!(index < 16);
        PinSet(1 << index)
    }

    /// The set described by a raw bit mask, bit `i` selecting pin `i`.
    pub const fn from_mask(mask: u16) -> PinSet {
        PinSet(mask)
    }

    pub const fn mask(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, index: u8) -> bool {
        index < 16 && self.0 & (1 << index) != 0
    }

    /// Iterate the indices of the member pins, lowest first.
    pub const fn iter(self) -> PinSetIter {
        PinSetIter(self.0)
    }
}

impl BitOr for PinSet {
    type Output = PinSet;
    fn bitor(self, rhs: PinSet) -> PinSet {
        PinSet(self.0 | rhs.0)
    }
}

impl BitAnd for PinSet {
    type Output = PinSet;
    fn bitand(self, rhs: PinSet) -> PinSet {
        PinSet(self.0 & rhs.0)
    }
}

impl BitXor for PinSet {
    type Output = PinSet;
    fn bitxor(self, rhs: PinSet) -> PinSet {
        PinSet(self.0 ^ rhs.0)
    }
}

impl Not for PinSet {
    type Output = PinSet;
    fn not(self) -> PinSet {
        PinSet(!self.0)
    }
}

pub struct PinSetIter(u16);

impl Iterator for PinSetIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(index)
    }
}

impl IntoIterator for PinSet {
    type Item = u8;
    type IntoIter = PinSetIter;

    fn into_iter(self) -> PinSetIter {
        self.iter()
    }
}

// Expand the set bits of a pin mask into all-ones lanes of `bits` width.
const fn packed_field_mask(mask: u32, bits: u32) -> u32 {
    let lane = (1u32 << bits) - 1;
    let mut out = 0;
    let mut pin = 0;
    while pin * bits < 32 {
        if mask & (1 << pin) != 0 {
            out |= lane << (pin * bits);
        }
        pin += 1;
    }
    out
}

// Replicate a `bits`-wide field value into the lane of every selected pin.
const fn packed_field_value(mask: u32, bits: u32, value: u32) -> u32 {
    let lane = (1u32 << bits) - 1;
    let value = value & lane;
    let mut out = 0;
    let mut pin = 0;
    while pin * bits < 32 {
        if mask & (1 << pin) != 0 {
            out |= value << (pin * bits);
        }
        pin += 1;
    }
    out
}

// The single combined read-modify-write every packed configuration update
// compiles down to: clear the selected lanes, merge in the replicated value.
fn replace_packed_field(register: &ReadWrite<u32>, mask: u32, bits: u32, value: u32) {
    register.and_or(
        !packed_field_mask(mask, bits),
        packed_field_value(mask, bits, value),
    );
}

/// One GPIO bank.
///
/// Process-wide there is a single `Port` per physical bank; boards create
/// them once next to the clock tree and hand out references.
pub struct Port<'a> {
    registers: StaticRef<GpioRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Port<'a> {
    pub const fn new(base: StaticRef<GpioRegisters>, clock: PeripheralClock<'a>) -> Self {
        Self {
            registers: base,
            clock,
        }
    }

    /// Open this port's clock gate. Until then the bank's registers do not
    /// respond.
    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    pub fn is_enabled_clock(&self) -> bool {
        self.clock.is_enabled()
    }

    /* Output state */

    /// Replace the output state of all sixteen pins in one write.
    pub fn write(&self, value: u16) {
        self.registers.odr.set(value as u32);
    }

    /// The output latch (ODR): the last written output state.
    pub fn read(&self) -> u16 {
        self.registers.odr.get() as u16
    }

    /// The sampled input state (IDR).
    pub fn input(&self) -> u16 {
        self.registers.idr.get() as u16
    }

    /// Drive the selected pins high. One set/reset register write; pins
    /// outside the set are untouched even against concurrent writers.
    pub fn set(&self, pins: PinSet) {
        self.registers.bsrr.set(pins.mask() as u32);
    }

    /// Drive the selected pins low. One set/reset register write.
    pub fn clear(&self, pins: PinSet) {
        self.registers.bsrr.set((pins.mask() as u32) << 16);
    }

    /// Drive `set_pins` high and `clear_pins` low in exactly one write.
    ///
    /// Callers must keep the sets disjoint. If they do overlap, the
    /// hardware applies the set half with priority, so the overlapping pins
    /// end up high; that precedence is part of the register's contract and
    /// is preserved here.
    pub fn clear_and_set(&self, clear_pins: PinSet, set_pins: PinSet) {
        self.registers
            .bsrr
            .set((clear_pins.mask() as u32) << 16 | set_pins.mask() as u32);
    }

    /// Invert the selected pins.
    ///
    /// This reads the output latch and then issues one combined set/clear
    /// write, so unlike [`Port::set`] and [`Port::clear`] it is *not* atomic
    /// with respect to a concurrent writer of the same port: a write landing
    /// between the read and the write is lost for the selected pins. The
    /// hardware offers no atomic toggle; callers needing one must serialize.
    pub fn toggle(&self, pins: PinSet) {
        let driven_high = PinSet::from_mask(self.read());
        self.clear_and_set(pins & driven_high, pins & !driven_high);
    }

    /* Packed pin configuration */

    /// Set the mode of every selected pin. Unselected pins keep their
    /// two-bit field bit-exact.
    pub fn set_mode(&self, mode: Mode, pins: PinSet) {
        replace_packed_field(&self.registers.moder, pins.mask() as u32, 2, mode as u32);
    }

    /// Set the pull resistor of every selected pin.
    pub fn set_pull_mode(&self, mode: PullMode, pins: PinSet) {
        replace_packed_field(&self.registers.pupdr, pins.mask() as u32, 2, mode as u32);
    }

    /// Set the output slew rate of every selected pin.
    pub fn set_speed(&self, speed: Speed, pins: PinSet) {
        replace_packed_field(&self.registers.ospeedr, pins.mask() as u32, 2, speed as u32);
    }

    /// Set the output driver of every selected pin.
    pub fn set_driver_type(&self, driver: DriverType, pins: PinSet) {
        replace_packed_field(&self.registers.otyper, pins.mask() as u32, 1, driver as u32);
    }

    /// Route the selected pins to alternate function `af` (0-15).
    ///
    /// The sixteen four-bit fields span two sub-registers, so this is one
    /// combined read-modify-write per half with any selected pins there; a
    /// half with no selected pins is left alone entirely.
    pub fn set_alternate_function(&self, af: u8, pins: PinSet) {
        let low = pins.mask() & 0xff;
        if low != 0 {
            replace_packed_field(&self.registers.afrl, low as u32, 4, af as u32);
        }
        let high = pins.mask() >> 8;
        if high != 0 {
            replace_packed_field(&self.registers.afrh, high as u32, 4, af as u32);
        }
    }
}

/// One pin of a port.
///
/// A thin view over the port-level set operations for drivers that claim
/// individual pins.
pub struct Pin<'a, 'p> {
    port: &'p Port<'a>,
    pins: PinSet,
}

impl<'a, 'p> Pin<'a, 'p> {
    /// Claim pin `index` (0-15) of a port.
    pub const fn new(port: &'p Port<'a>, index: u8) -> Self {
        Self {
            port,
            pins: PinSet::pin(index),
        }
    }

    pub fn make_output(&self) {
        self.port.set_mode(Mode::GeneralPurposeOutputMode, self.pins);
    }

    pub fn make_input(&self) {
        self.port.set_mode(Mode::Input, self.pins);
    }

    /// Route the pin to a peripheral signal.
    pub fn make_alternate(&self, af: u8) {
        self.port.set_mode(Mode::AlternateFunctionMode, self.pins);
        self.port.set_alternate_function(af, self.pins);
    }

    pub fn set(&self) {
        self.port.set(self.pins);
    }

    pub fn clear(&self) {
        self.port.clear(self.pins);
    }

    pub fn toggle(&self) {
        self.port.toggle(self.pins);
    }

    /// Whether the output latch drives this pin high.
    pub fn is_set(&self) -> bool {
        self.port.read() & self.pins.mask() != 0
    }

    /// The sampled input level of this pin.
    pub fn read(&self) -> bool {
        self.port.input() & self.pins.mask() != 0
    }
}
