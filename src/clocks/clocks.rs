// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Clock tree driver: system clock mux and bus clocks.
//!
//! [`Clocks`] ties the oscillator drivers, the PLL and the bus prescalers
//! together and enforces the chip limits whenever the tree is reshaped:
//!
//! + a source can only become the system clock while it is running and
//!   within `ChipSpecs::SYS_CLOCK_FREQUENCY_LIMIT_MHZ`,
//! + a prescaler change is rejected if it would push an APB bus over its
//!   documented limit.
//!
//! # Bus clocks
//!
//! Every bus clock is an instance of the same shape: a prescaler field in
//! CFGR, a table mapping each field code to a right-shift amount, and a
//! parent clock. [`BusClockDescriptor`] captures that shape as data; AHB,
//! APB1 and APB2 are `static` descriptors, and
//! [`Clocks::bus_frequency_hz`] walks parents up to the system clock, so a
//! frequency query always reflects the current register state end to end.
//!
//! The shift tables reproduce the hardware encoding exactly, including its
//! quirks: all the low codes of a prescaler field mean "no division", and
//! the AHB table jumps from divide-by-16 straight to divide-by-64.
//!
//! # Usage
//!
//! ```rust,ignore
//! use stm32f4xx_base::chip_specific::Stm32f429Specs;
//! use stm32f4xx_base::clocks::Clocks;
//! use stm32f4xx_base::rcc::{Rcc, RCC_BASE};
//!
//! let rcc = Rcc::new(RCC_BASE);
//! let clocks: Clocks<Stm32f429Specs> = Clocks::new(&rcc);
//!
//! clocks.hse.set_frequency_hz(8_000_000);
//! clocks.hse.enable(HseMode::Crystal)?;
//! clocks.pll.configure(PllSource::HSE, 8_000_000, PLL_CONFIG)?;
//! clocks.pll.enable()?;
//! clocks.set_apb1_prescaler(APBPrescaler::DivideBy2)?;
//! clocks.set_sys_clock_source(SysClockSource::PLL)?;
//! ```

use tock_registers::fields::Field;

use crate::chip_specific::chip_specs::ChipSpecs;
use crate::clocks::hse::Hse;
use crate::clocks::hsi::Hsi;
use crate::clocks::pll::Pll;
use crate::rcc::{AHBPrescaler, APBPrescaler, PllSource, Rcc, SysClockSource, CFGR};
use crate::ErrorCode;

/// The shape of one bus clock: where its prescaler lives, what the encoded
/// codes mean, and which clock it divides.
///
/// Descriptors are constructed in `const` context only; the constructor
/// proves the shift table total over every representable field code, so an
/// undersized table fails the build rather than indexing out of bounds at
/// run time.
pub struct BusClockDescriptor {
    prescaler: Field<u32, CFGR::Register>,
    shift_table: &'static [u8],
    parent: Option<&'static BusClockDescriptor>,
}

impl BusClockDescriptor {
    const fn new(
        prescaler: Field<u32, CFGR::Register>,
        shift_table: &'static [u8],
        parent: Option<&'static BusClockDescriptor>,
    ) -> Self {
        assert!(shift_table.len() == prescaler.mask as usize + 1);
        Self {
            prescaler,
            shift_table,
            parent,
        }
    }
}

/// AHB: divides the system clock. Codes 0b0000-0b0111 all pass the clock
/// through; the divider sequence skips 32.
pub static AHB_BUS: BusClockDescriptor = BusClockDescriptor::new(
    CFGR::HPRE,
    &[0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 6, 7, 8, 9],
    None,
);

/// APB1, the low-speed peripheral bus: divides the AHB clock. Codes
/// 0b000-0b011 all pass the clock through.
pub static APB1_BUS: BusClockDescriptor =
    BusClockDescriptor::new(CFGR::PPRE1, &[0, 0, 0, 0, 1, 2, 3, 4], Some(&AHB_BUS));

/// APB2, the high-speed peripheral bus: divides the AHB clock.
pub static APB2_BUS: BusClockDescriptor =
    BusClockDescriptor::new(CFGR::PPRE2, &[0, 0, 0, 0, 1, 2, 3, 4], Some(&AHB_BUS));

/// Main struct for configuring on-board clocks.
pub struct Clocks<'a, Specs> {
    rcc: &'a Rcc,
    /// High speed internal clock
    pub hsi: Hsi<'a>,
    /// High speed external clock
    pub hse: Hse<'a>,
    /// Main phase loop-lock clock
    pub pll: Pll<'a, Specs>,
}

impl<'a, Specs: ChipSpecs> Clocks<'a, Specs> {
    // The constructor must be called when the default peripherals are created
    pub fn new(rcc: &'a Rcc) -> Self {
        Self {
            rcc,
            hsi: Hsi::new(rcc),
            hse: Hse::new(rcc),
            pll: Pll::new(rcc),
        }
    }

    /// Frequency in Hz of the clock a bus descriptor describes, recomputed
    /// bottom-up from the registers on every call.
    pub fn bus_frequency_hz(&self, bus: &BusClockDescriptor) -> u32 {
        let parent_frequency = match bus.parent {
            Some(parent) => self.bus_frequency_hz(parent),
            None => self.sys_clock_frequency_hz(),
        };
        let code = self.rcc.get_bus_prescaler_code(bus.prescaler) as usize;
        parent_frequency >> bus.shift_table[code]
    }

    // APB1 frequency must not be higher than the maximum allowable
    // frequency. This method is called when the system clock source or the
    // AHB prescaler is changed. ahb_frequency_hz is the hypothetical future
    // AHB frequency.
    fn check_apb1_frequency_limit(&self, ahb_frequency_hz: u32) -> bool {
        let apb1_divider = usize::from(self.rcc.get_apb1_prescaler()) as u64;
        ahb_frequency_hz as u64 <= Specs::APB1_FREQUENCY_LIMIT_MHZ as u64 * 1_000_000 * apb1_divider
    }

    // Same as for APB1, APB2 has a frequency limit that must be enforced by
    // software.
    fn check_apb2_frequency_limit(&self, ahb_frequency_hz: u32) -> bool {
        let apb2_divider = usize::from(self.rcc.get_apb2_prescaler()) as u64;
        ahb_frequency_hz as u64 <= Specs::APB2_FREQUENCY_LIMIT_MHZ as u64 * 1_000_000 * apb2_divider
    }

    /// Set the AHB prescaler.
    ///
    /// AHB bus, core, memory, DMA and the Cortex system timer run at the
    /// system clock frequency divided by the AHB prescaler.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ErrorCode::FAIL]\) if changing the AHB prescaler doesn't
    /// preserve the APB frequency constraints
    /// + [Err]\([ErrorCode::BUSY]\) if changing the AHB prescaler took too
    /// long. Retry.
    pub fn set_ahb_prescaler(&self, prescaler: AHBPrescaler) -> Result<(), ErrorCode> {
        // Changing the AHB prescaler affects the APB frequencies. A check
        // must be done to ensure that the constraints are still valid.
        let divider = usize::from(prescaler) as u32;
        let new_ahb_frequency = self.sys_clock_frequency_hz() / divider;
        if !self.check_apb1_frequency_limit(new_ahb_frequency)
            || !self.check_apb2_frequency_limit(new_ahb_frequency)
        {
            return Err(ErrorCode::FAIL);
        }

        self.rcc.set_ahb_prescaler(prescaler);

        for _ in 0..16 {
            if self.get_ahb_prescaler() == prescaler {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Get the current configured AHB prescaler
    pub fn get_ahb_prescaler(&self) -> AHBPrescaler {
        self.rcc.get_ahb_prescaler()
    }

    /// Get the frequency of the AHB in Hz
    pub fn ahb_frequency_hz(&self) -> u32 {
        self.bus_frequency_hz(&AHB_BUS)
    }

    /// Set the APB1 prescaler.
    ///
    /// The APB1 peripheral clock frequency is equal to the AHB frequency
    /// divided by the APB1 prescaler.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ErrorCode::FAIL]\) if the desired prescaler would break the
    /// APB1 frequency limit
    /// + [Err]\([ErrorCode::BUSY]\) if setting the prescaler took too long.
    /// Retry.
    pub fn set_apb1_prescaler(&self, prescaler: APBPrescaler) -> Result<(), ErrorCode> {
        let ahb_frequency = self.ahb_frequency_hz();
        let divider = usize::from(prescaler) as u32;
        if ahb_frequency / divider > Specs::APB1_FREQUENCY_LIMIT_MHZ * 1_000_000 {
            return Err(ErrorCode::FAIL);
        }

        self.rcc.set_apb1_prescaler(prescaler);

        for _ in 0..16 {
            if self.rcc.get_apb1_prescaler() == prescaler {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Get the current configured APB1 prescaler
    pub fn get_apb1_prescaler(&self) -> APBPrescaler {
        self.rcc.get_apb1_prescaler()
    }

    /// Get the current APB1 frequency in Hz
    pub fn apb1_frequency_hz(&self) -> u32 {
        self.bus_frequency_hz(&APB1_BUS)
    }

    /// Set the APB2 prescaler.
    ///
    /// The APB2 peripheral clock frequency is equal to the AHB frequency
    /// divided by the APB2 prescaler.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ErrorCode::FAIL]\) if the desired prescaler would break the
    /// APB2 frequency limit
    /// + [Err]\([ErrorCode::BUSY]\) if setting the prescaler took too long.
    /// Retry.
    pub fn set_apb2_prescaler(&self, prescaler: APBPrescaler) -> Result<(), ErrorCode> {
        let ahb_frequency = self.ahb_frequency_hz();
        let divider = usize::from(prescaler) as u32;
        if ahb_frequency / divider > Specs::APB2_FREQUENCY_LIMIT_MHZ * 1_000_000 {
            return Err(ErrorCode::FAIL);
        }

        self.rcc.set_apb2_prescaler(prescaler);

        for _ in 0..16 {
            if self.rcc.get_apb2_prescaler() == prescaler {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Get the current configured APB2 prescaler
    pub fn get_apb2_prescaler(&self) -> APBPrescaler {
        self.rcc.get_apb2_prescaler()
    }

    /// Get the current APB2 frequency in Hz
    pub fn apb2_frequency_hz(&self) -> u32 {
        self.bus_frequency_hz(&APB2_BUS)
    }

    /// Set the system clock source
    ///
    /// # Errors:
    ///
    /// + [Err]\([ErrorCode::FAIL]\) if the source is not enabled.
    /// + [Err]\([ErrorCode::SIZE]\) if the source frequency surpasses the
    /// system clock frequency limit, or the APB1 and APB2 limits are not
    /// satisfied.
    pub fn set_sys_clock_source(&self, source: SysClockSource) -> Result<(), ErrorCode> {
        // Immediately return if the required source is already configured as
        // the system clock source.
        if source == self.get_sys_clock_source() {
            return Ok(());
        }

        // Ensure the source is enabled before configuring it as the system
        // clock source
        if let false = match source {
            SysClockSource::HSI => self.hsi.is_enabled(),
            SysClockSource::HSE => self.hse.is_enabled(),
            SysClockSource::PLL => self.pll.is_enabled(),
        } {
            return Err(ErrorCode::FAIL);
        }

        // Get the frequency of the source to be configured. The unwraps
        // can't fail because the source clock status was checked before, and
        // declaring the HSE frequency is part of enabling it.
        let alternate_frequency = match source {
            SysClockSource::HSI => self.hsi.frequency_hz().unwrap(),
            SysClockSource::HSE => self.hse.frequency_hz().unwrap(),
            SysClockSource::PLL => self.pll_frequency_hz().unwrap(),
        };

        // Check the alternate frequency is not higher than the system clock
        // limit
        if alternate_frequency > Specs::SYS_CLOCK_FREQUENCY_LIMIT_MHZ * 1_000_000 {
            return Err(ErrorCode::SIZE);
        }

        // Retrieve the currently configured AHB prescaler and compute the
        // possible future AHB frequency
        let ahb_divider = usize::from(self.get_ahb_prescaler()) as u32;
        let ahb_frequency = alternate_frequency / ahb_divider;

        // APB1 and APB2 frequencies must not exceed their limits
        if !self.check_apb1_frequency_limit(ahb_frequency) {
            return Err(ErrorCode::SIZE);
        }
        if !self.check_apb2_frequency_limit(ahb_frequency) {
            return Err(ErrorCode::SIZE);
        }

        self.rcc.set_sys_clock_source(source);
        debug!("system clock source changed, {} Hz", alternate_frequency);

        Ok(())
    }

    /// Get the current system clock source
    pub fn get_sys_clock_source(&self) -> SysClockSource {
        self.rcc.get_sys_clock_source()
    }

    /// Get the current system clock frequency in Hz, recomputed from the
    /// registers on every call.
    pub fn sys_clock_frequency_hz(&self) -> u32 {
        match self.get_sys_clock_source() {
            // These unwraps can't panic because set_sys_clock_source ensures
            // that the source is enabled. Also, the Hsi and Pll structs
            // ensure that the clocks can't be disabled while they are the
            // system clock.
            SysClockSource::HSI => self.hsi.frequency_hz().unwrap(),
            SysClockSource::HSE => self.hse.frequency_hz().unwrap(),
            SysClockSource::PLL => self.pll_frequency_hz().unwrap(),
        }
    }

    /// Get the current main PLL output frequency in Hz, resolving the PLL's
    /// source mux first.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the PLL and its source are enabled.
    /// + [None]: otherwise.
    pub fn pll_frequency_hz(&self) -> Option<u32> {
        let source_frequency = match self.rcc.get_pll_clocks_source() {
            PllSource::HSI => self.hsi.frequency_hz()?,
            PllSource::HSE => self.hse.frequency_hz()?,
        };
        self.pll.frequency_hz(source_frequency)
    }
}

/// Clock interface to the rest of the chip.
///
/// Peripherals hold this trait object instead of the chip-specific
/// [`Clocks`] instantiation.
pub trait Stm32f4Clocks {
    /// Get RCC instance
    fn get_rcc(&self) -> &Rcc;

    /// Current AHB clock (HCLK) frequency in Hz
    fn ahb_frequency_hz(&self) -> u32;

    /// Current APB1 clock (PCLK1) frequency in Hz
    fn apb1_frequency_hz(&self) -> u32;

    /// Current APB2 clock (PCLK2) frequency in Hz
    fn apb2_frequency_hz(&self) -> u32;
}

impl<'a, Specs: ChipSpecs> Stm32f4Clocks for Clocks<'a, Specs> {
    fn get_rcc(&self) -> &'a Rcc {
        self.rcc
    }

    fn ahb_frequency_hz(&self) -> u32 {
        self.ahb_frequency_hz()
    }

    fn apb1_frequency_hz(&self) -> u32 {
        self.apb1_frequency_hz()
    }

    fn apb2_frequency_hz(&self) -> u32 {
        self.apb2_frequency_hz()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip_specific::Stm32f429Specs;
    use crate::clocks::hsi::HSI_FREQUENCY_HZ;
    use crate::clocks::pll::PllConfig;
    use crate::rcc::tests::fake_rcc;
    use crate::rcc::{HseMode, PLLP};

    const HSE_FREQUENCY_HZ: u32 = 8_000_000;
    const PLL_84MHZ: PllConfig = PllConfig::new(8, 336, PLLP::DivideBy4, 7);
    const PLL_168MHZ: PllConfig = PllConfig::new(8, 336, PLLP::DivideBy2, 7);

    fn clocks() -> Clocks<'static, Stm32f429Specs> {
        let rcc = fake_rcc();
        // Hardware reset state: HSI running and selected as system clock.
        rcc.registers_for_test().simulate_hsi_ready();
        let clocks = Clocks::new(rcc);
        assert_eq!(Ok(()), clocks.hsi.enable());
        clocks
    }

    fn switch_to_pll(clocks: &Clocks<'static, Stm32f429Specs>, config: PllConfig) {
        let rcc = clocks.rcc;
        rcc.registers_for_test().simulate_hse_ready();
        clocks.hse.set_frequency_hz(HSE_FREQUENCY_HZ);
        assert_eq!(Ok(()), clocks.hse.enable(HseMode::Crystal));

        assert_eq!(
            Ok(()),
            clocks.pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, config)
        );
        rcc.registers_for_test().simulate_pll_locked(true);
        assert_eq!(Ok(()), clocks.pll.enable());

        assert_eq!(Ok(()), clocks.set_sys_clock_source(SysClockSource::PLL));
        rcc.registers_for_test().simulate_sys_clock_switch();
    }

    #[test]
    fn reset_state_runs_everything_from_the_hsi() {
        let clocks = clocks();

        assert_eq!(SysClockSource::HSI, clocks.get_sys_clock_source());
        assert_eq!(HSI_FREQUENCY_HZ, clocks.sys_clock_frequency_hz());
        assert_eq!(AHBPrescaler::DivideBy1, clocks.get_ahb_prescaler());
        assert_eq!(HSI_FREQUENCY_HZ, clocks.ahb_frequency_hz());
        assert_eq!(HSI_FREQUENCY_HZ, clocks.apb1_frequency_hz());
        assert_eq!(HSI_FREQUENCY_HZ, clocks.apb2_frequency_hz());
    }

    #[test]
    fn frequency_round_trip_through_pll_and_bus_prescalers() {
        let clocks = clocks();

        // 84 MHz fits under the APB2 limit (90 MHz) but not under the APB1
        // limit (45 MHz), so APB1 must be divided first.
        assert_eq!(Ok(()), clocks.set_apb1_prescaler(APBPrescaler::DivideBy2));
        switch_to_pll(&clocks, PLL_84MHZ);

        // 8 MHz / 8 * 336 / 4
        assert_eq!(84_000_000, clocks.sys_clock_frequency_hz());

        // One level of bus division: prescaler code for shift 1.
        assert_eq!(Ok(()), clocks.set_ahb_prescaler(AHBPrescaler::DivideBy2));
        assert_eq!(42_000_000, clocks.ahb_frequency_hz());

        // Chained bus division: APB1 divides the divided AHB clock.
        assert_eq!(21_000_000, clocks.apb1_frequency_hz());
        assert_eq!(42_000_000, clocks.apb2_frequency_hz());
    }

    #[test]
    fn shift_tables_are_total_and_reproduce_the_encoding_quirks() {
        let clocks = clocks();
        let rcc = clocks.rcc;

        // Every representable HPRE code must produce a defined frequency,
        // and codes 0-7 all mean divide-by-1.
        let ahb_expected_shifts = [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 6, 7, 8, 9];
        for code in 0..16u32 {
            rcc.registers_for_test().write_raw_hpre(code);
            assert_eq!(
                HSI_FREQUENCY_HZ >> ahb_expected_shifts[code as usize],
                clocks.ahb_frequency_hz(),
                "HPRE code {}",
                code
            );
        }
        rcc.registers_for_test().write_raw_hpre(0);

        // Same for the 3-bit PPRE1 field: codes 0-3 are divide-by-1.
        let apb_expected_shifts = [0, 0, 0, 0, 1, 2, 3, 4];
        for code in 0..8u32 {
            rcc.registers_for_test().write_raw_ppre1(code);
            assert_eq!(
                HSI_FREQUENCY_HZ >> apb_expected_shifts[code as usize],
                clocks.apb1_frequency_hz(),
                "PPRE1 code {}",
                code
            );
        }
    }

    #[test]
    fn refuses_a_stopped_source() {
        let clocks = clocks();
        assert_eq!(
            Err(ErrorCode::FAIL),
            clocks.set_sys_clock_source(SysClockSource::PLL)
        );
        // Selecting the already-active source is fine.
        assert_eq!(Ok(()), clocks.set_sys_clock_source(SysClockSource::HSI));
    }

    #[test]
    fn apb_limits_gate_the_system_clock_switch() {
        let clocks = clocks();
        let rcc = clocks.rcc;

        rcc.registers_for_test().simulate_hse_ready();
        clocks.hse.set_frequency_hz(HSE_FREQUENCY_HZ);
        assert_eq!(Ok(()), clocks.hse.enable(HseMode::Crystal));
        assert_eq!(
            Ok(()),
            clocks
                .pll
                .configure(PllSource::HSE, HSE_FREQUENCY_HZ, PLL_168MHZ)
        );
        rcc.registers_for_test().simulate_pll_locked(true);
        assert_eq!(Ok(()), clocks.pll.enable());

        // 168 MHz against untouched APB prescalers violates both limits.
        assert_eq!(
            Err(ErrorCode::SIZE),
            clocks.set_sys_clock_source(SysClockSource::PLL)
        );

        // APB1 at /2 is still over its 45 MHz limit.
        assert_eq!(Ok(()), clocks.set_apb1_prescaler(APBPrescaler::DivideBy2));
        assert_eq!(
            Err(ErrorCode::SIZE),
            clocks.set_sys_clock_source(SysClockSource::PLL)
        );

        // /4 and /2 satisfy 45/90 MHz; the switch may proceed.
        assert_eq!(Ok(()), clocks.set_apb1_prescaler(APBPrescaler::DivideBy4));
        assert_eq!(Ok(()), clocks.set_apb2_prescaler(APBPrescaler::DivideBy2));
        assert_eq!(Ok(()), clocks.set_sys_clock_source(SysClockSource::PLL));
        rcc.registers_for_test().simulate_sys_clock_switch();

        assert_eq!(168_000_000, clocks.sys_clock_frequency_hz());
        assert_eq!(42_000_000, clocks.apb1_frequency_hz());
        assert_eq!(84_000_000, clocks.apb2_frequency_hz());
    }

    #[test]
    fn apb_limits_gate_the_prescaler_change() {
        let clocks = clocks();

        assert_eq!(Ok(()), clocks.set_apb1_prescaler(APBPrescaler::DivideBy4));
        assert_eq!(Ok(()), clocks.set_apb2_prescaler(APBPrescaler::DivideBy2));
        switch_to_pll(&clocks, PLL_168MHZ);

        // Lowering APB1 back to /1 would mean 168 MHz on a 45 MHz bus.
        assert_eq!(
            Err(ErrorCode::FAIL),
            clocks.set_apb1_prescaler(APBPrescaler::DivideBy1)
        );
        // Any failure in changing the APB prescaler must preserve its value.
        assert_eq!(APBPrescaler::DivideBy4, clocks.get_apb1_prescaler());

        // Increasing the AHB prescaler relaxes the APB constraints.
        assert_eq!(Ok(()), clocks.set_ahb_prescaler(AHBPrescaler::DivideBy4));
        assert_eq!(Ok(()), clocks.set_apb1_prescaler(APBPrescaler::DivideBy1));

        // And lowering it again is refused while APB1 depends on it.
        assert_eq!(
            Err(ErrorCode::FAIL),
            clocks.set_ahb_prescaler(AHBPrescaler::DivideBy1)
        );
        assert_eq!(AHBPrescaler::DivideBy4, clocks.get_ahb_prescaler());
    }
}
