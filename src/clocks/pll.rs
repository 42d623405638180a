// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Main phase-locked loop (PLL) clock driver.
//!
//! The main PLL takes the HSI or HSE oscillator, divides it into the VCO
//! input, multiplies it up and splits the VCO output across up to three
//! dividers:
//!
//! + the system output (PLLP), feeding the system clock mux,
//! + the peripheral output (PLLQ), feeding USB OTG FS, SDIO and the random
//!   number generator (48 MHz domain),
//! + on chips that have it, the I2S/SAI output (PLLR).
//!
//! # Configuration
//!
//! A configuration is captured in a [`PllConfig`], whose constructor
//! enforces the documented ranges of every factor. Bind the configuration as
//! a `const` and an out-of-range value is a *compile* error, the same way an
//! impossible prescaler is unrepresentable by its enum:
//!
//! ```rust,ignore
//! use stm32f4xx_base::clocks::pll::PllConfig;
//! use stm32f4xx_base::rcc::PLLP;
//!
//! // 8 MHz crystal / 8 * 336 / 4 = 84 MHz system output
//! const PLL_84MHZ: PllConfig = PllConfig::new(8, 336, PLLP::DivideBy4, 7);
//! ```
//!
//! [`Pll::configure`] additionally checks the *derived* frequencies — the
//! VCO input and output windows and the chip's PLL output limits — because
//! those depend on the source frequency, which is only known at run time.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pll = &clocks.pll;
//!
//! pll.configure(PllSource::HSE, 8_000_000, PLL_84MHZ)?;
//! pll.enable()?;
//! let sys = pll.frequency_hz(8_000_000); // Some(84_000_000)
//! ```
//!
//! Reconfiguration requires stopping the clock first; the configuration
//! methods refuse to touch a running PLL. Frequencies are always recomputed
//! from the PLLCFGR register, never cached, so a query after an external
//! reconfiguration is immediately correct.

use core::marker::PhantomData;

use crate::chip_specific::chip_specs::ChipSpecs;
use crate::chip_specific::clock_constants::{
    VCO_INPUT_FREQUENCY_MAX_HZ, VCO_INPUT_FREQUENCY_MIN_HZ, VCO_OUTPUT_FREQUENCY_MAX_HZ,
    VCO_OUTPUT_FREQUENCY_MIN_HZ,
};
use crate::rcc::{PllSource, Rcc, SysClockSource, PLLP};
use crate::ErrorCode;

/// A validated main PLL configuration.
///
/// The constructors assert the hardware-documented range of every factor.
/// Constructed in `const` context, a violation fails the build; constructed
/// at run time, it panics — either way an invalid configuration never
/// reaches the hardware.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    m: u32,
    n: u32,
    p: PLLP,
    q: u32,
    r: Option<u32>,
}

impl PllConfig {
    /// Build a configuration from the input divider `m`, the VCO multiplier
    /// `n`, the system output divider `p` and the peripheral output divider
    /// `q`.
    pub const fn new(m: u32, n: u32, p: PLLP, q: u32) -> PllConfig {
        assert!(2 <= m && m <= 63, "PLL input divider must be in 2..=63");
        assert!(2 <= n && n <= 432, "PLL multiplier must be in 2..=432");
        assert!(
            2 <= q && q <= 15,
            "PLL peripheral output divider must be in 2..=15"
        );
        PllConfig {
            m,
            n,
            p,
            q,
            r: None,
        }
    }

    /// Add the I2S/SAI output divider `r`. Only meaningful on chip models
    /// whose PLLCFGR carries the PLLR field.
    pub const fn with_i2s_output(mut self, r: u32) -> PllConfig {
        assert!(2 <= r && r <= 7, "PLL I2S output divider must be in 2..=7");
        self.r = Some(r);
        self
    }

    pub const fn input_divider(&self) -> u32 {
        self.m
    }

    pub const fn multiplier(&self) -> u32 {
        self.n
    }

    pub const fn system_output_divider(&self) -> PLLP {
        self.p
    }

    pub const fn peripheral_output_divider(&self) -> u32 {
        self.q
    }
}

/// Main PLL clock structure.
pub struct Pll<'a, Specs> {
    rcc: &'a Rcc,
    _specs: PhantomData<Specs>,
}

impl<'a, Specs: ChipSpecs> Pll<'a, Specs> {
    pub(in crate::clocks) fn new(rcc: &'a Rcc) -> Self {
        Self {
            rcc,
            _specs: PhantomData,
        }
    }

    /// Write a validated configuration to PLLCFGR.
    ///
    /// # Parameters
    ///
    /// + pll_source: which oscillator feeds the PLL
    /// + source_frequency_hz: that oscillator's frequency
    /// + config: the divider/multiplier set to apply
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::FAIL]\): the PLL is running. It must be disabled
    /// before it can be reconfigured.
    /// + [Err]\([ErrorCode::NOSUPPORT]\): the configuration asks for the I2S
    /// output on a chip model without the PLLR field.
    /// + [Err]\([ErrorCode::INVAL]\): the derived VCO input, VCO output or
    /// PLL output frequency falls outside the documented windows for this
    /// source frequency.
    pub fn configure(
        &self,
        pll_source: PllSource,
        source_frequency_hz: u32,
        config: PllConfig,
    ) -> Result<(), ErrorCode> {
        if self.is_enabled() {
            return Err(ErrorCode::FAIL);
        }

        if config.r.is_some() && !Specs::HAS_PLL_I2S_OUTPUT {
            return Err(ErrorCode::NOSUPPORT);
        }

        // Source frequency / PLLM = VCO input frequency, 1-2MHz
        let vco_input_frequency = source_frequency_hz / config.m;
        if vco_input_frequency < VCO_INPUT_FREQUENCY_MIN_HZ
            || vco_input_frequency > VCO_INPUT_FREQUENCY_MAX_HZ
        {
            return Err(ErrorCode::INVAL);
        }

        // VCO input frequency * PLLN = VCO output frequency, 100-432MHz.
        // 2MHz * 432 overflows u32, so the product is taken in u64.
        let vco_output_frequency = vco_input_frequency as u64 * config.n as u64;
        if vco_output_frequency < VCO_OUTPUT_FREQUENCY_MIN_HZ as u64
            || vco_output_frequency > VCO_OUTPUT_FREQUENCY_MAX_HZ as u64
        {
            return Err(ErrorCode::INVAL);
        }

        // VCO output frequency / PLLP = PLL output frequency
        let output_frequency = (vco_output_frequency / u32::from(config.p) as u64) as u32;
        if output_frequency < Specs::MIN_FREQ_MHZ * 1_000_000
            || output_frequency > Specs::MAX_FREQ_MHZ * 1_000_000
        {
            return Err(ErrorCode::INVAL);
        }

        self.rcc.set_pll_clocks_source(pll_source);
        self.rcc.set_pll_clocks_m_divider(config.m);
        self.rcc.set_pll_clock_n_multiplier(config.n);
        self.rcc.set_pll_clock_p_divider(config.p);
        self.rcc.set_pll_clock_q_divider(config.q);
        if let Some(r) = config.r {
            self.rcc.set_pll_clock_r_divider(r);
        }

        debug!(
            "PLL configured: {} Hz source -> {} Hz system output",
            source_frequency_hz, output_frequency
        );

        Ok(())
    }

    /// Start the PLL clock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): if locking the PLL clock took too long.
    /// Recall this method to ensure the PLL clock is running.
    pub fn enable(&self) -> Result<(), ErrorCode> {
        self.rcc.enable_pll_clock();

        // Wait until the PLL clock is locked.
        for _ in 0..200 {
            if self.rcc.is_locked_pll_clock() {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Stop the PLL clock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::FAIL]\): if the PLL clock is configured as the
    /// system clock.
    /// + [Err]\([ErrorCode::BUSY]\): disabling the PLL clock took too long.
    /// Retry to ensure it is not running.
    pub fn disable(&self) -> Result<(), ErrorCode> {
        // Can't disable the PLL clock when it is used as the system clock
        if self.rcc.get_sys_clock_source() == SysClockSource::PLL {
            return Err(ErrorCode::FAIL);
        }

        self.rcc.disable_pll_clock();

        // Wait to unlock the PLL clock
        for _ in 0..10 {
            if !self.rcc.is_locked_pll_clock() {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Check whether the PLL clock is enabled or not.
    pub fn is_enabled(&self) -> bool {
        self.rcc.is_enabled_pll_clock()
    }

    /// The oscillator currently selected into the PLL.
    pub fn source(&self) -> PllSource {
        self.rcc.get_pll_clocks_source()
    }

    /// The configured input divider M, read back from PLLCFGR.
    pub fn input_divider(&self) -> u32 {
        self.rcc.get_pll_clocks_m_divider()
    }

    /// The configured VCO multiplier N, read back from PLLCFGR.
    pub fn multiplier(&self) -> u32 {
        self.rcc.get_pll_clock_n_multiplier()
    }

    /// The configured system output divider P (2, 4, 6 or 8), read back
    /// from PLLCFGR.
    pub fn system_output_divider(&self) -> u32 {
        u32::from(self.rcc.get_pll_clock_p_divider())
    }

    /// The configured peripheral output divider Q, read back from PLLCFGR.
    pub fn peripheral_output_divider(&self) -> u32 {
        self.rcc.get_pll_clock_q_divider()
    }

    /// The configured I2S output divider R, on chip models that have it.
    pub fn i2s_output_divider(&self) -> Option<u32> {
        if !Specs::HAS_PLL_I2S_OUTPUT {
            return None;
        }
        Some(self.rcc.get_pll_clock_r_divider())
    }

    // All outputs share source / M * N; only the final divider differs. The
    // division is performed first so the intermediate fits 64 bits for any
    // representable source frequency and multiplier.
    fn output_frequency_hz(&self, source_frequency_hz: u32, final_divider: u32) -> Option<u32> {
        if !self.is_enabled() {
            return None;
        }

        let m = self.rcc.get_pll_clocks_m_divider();
        let n = self.rcc.get_pll_clock_n_multiplier();
        if m < 2 || final_divider < 2 {
            // The registers hold their reset state; nothing configured this
            // PLL yet, so no meaningful frequency can be reported.
            return None;
        }

        Some((source_frequency_hz as u64 / m as u64 * n as u64 / final_divider as u64) as u32)
    }

    /// Frequency in Hz of the system output, recomputed from PLLCFGR.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the PLL clock is enabled and configured.
    /// + [None]: otherwise.
    pub fn frequency_hz(&self, source_frequency_hz: u32) -> Option<u32> {
        self.output_frequency_hz(source_frequency_hz, u32::from(self.rcc.get_pll_clock_p_divider()))
    }

    /// Frequency in Hz of the peripheral (USB OTG FS/SDIO/RNG) output.
    ///
    /// USB OTG FS requires exactly 48 MHz here; SDIO and the RNG accept
    /// anything at or below it.
    pub fn usb_frequency_hz(&self, source_frequency_hz: u32) -> Option<u32> {
        self.output_frequency_hz(source_frequency_hz, self.rcc.get_pll_clock_q_divider())
    }

    /// Frequency in Hz of the I2S/SAI output, on chip models that have it.
    pub fn i2s_frequency_hz(&self, source_frequency_hz: u32) -> Option<u32> {
        if !Specs::HAS_PLL_I2S_OUTPUT {
            return None;
        }
        self.output_frequency_hz(source_frequency_hz, self.rcc.get_pll_clock_r_divider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip_specific::{Stm32f401Specs, Stm32f429Specs, Stm32f446Specs};
    use crate::rcc::tests::fake_rcc;
    use crate::rcc::Rcc;

    const HSE_FREQUENCY_HZ: u32 = 8_000_000;

    // Binding a configuration as a `const` is the supported way to get
    // build-time validation; this item doubles as proof that the
    // constructors are const-evaluable.
    const PLL_84MHZ: PllConfig = PllConfig::new(8, 336, PLLP::DivideBy4, 7);
    const PLL_168MHZ: PllConfig = PllConfig::new(8, 336, PLLP::DivideBy2, 7);

    fn pll(rcc: &'static Rcc) -> Pll<'static, Stm32f429Specs> {
        Pll::new(rcc)
    }

    #[test]
    #[should_panic(expected = "input divider")]
    fn rejects_input_divider_below_two() {
        let _ = PllConfig::new(1, 336, PLLP::DivideBy4, 7);
    }

    #[test]
    #[should_panic(expected = "input divider")]
    fn rejects_input_divider_beyond_field_width() {
        let _ = PllConfig::new(64, 336, PLLP::DivideBy4, 7);
    }

    #[test]
    #[should_panic(expected = "multiplier")]
    fn rejects_multiplier_out_of_range() {
        let _ = PllConfig::new(8, 433, PLLP::DivideBy4, 7);
    }

    #[test]
    #[should_panic(expected = "peripheral output divider")]
    fn rejects_peripheral_output_divider_out_of_range() {
        let _ = PllConfig::new(8, 336, PLLP::DivideBy4, 16);
    }

    #[test]
    #[should_panic(expected = "I2S output divider")]
    fn rejects_i2s_output_divider_out_of_range() {
        let _ = PllConfig::new(8, 336, PLLP::DivideBy4, 7).with_i2s_output(8);
    }

    #[test]
    fn configure_writes_every_field() {
        let rcc = fake_rcc();
        let pll = pll(rcc);

        assert_eq!(
            Ok(()),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, PLL_84MHZ)
        );
        assert_eq!(8, rcc.get_pll_clocks_m_divider());
        assert_eq!(336, rcc.get_pll_clock_n_multiplier());
        assert_eq!(PLLP::DivideBy4, rcc.get_pll_clock_p_divider());
        assert_eq!(7, rcc.get_pll_clock_q_divider());
        assert_eq!(PllSource::HSE, rcc.get_pll_clocks_source());

        // The read-back getters report the same values.
        assert_eq!(8, pll.input_divider());
        assert_eq!(336, pll.multiplier());
        assert_eq!(4, pll.system_output_divider());
        assert_eq!(7, pll.peripheral_output_divider());
        assert_eq!(PllSource::HSE, pll.source());
        assert_eq!(None, pll.i2s_output_divider());
    }

    #[test]
    fn frequency_round_trip() {
        let rcc = fake_rcc();
        let pll = pll(rcc);

        assert_eq!(
            Ok(()),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, PLL_84MHZ)
        );

        // Not started yet: no frequency to report.
        assert_eq!(None, pll.frequency_hz(HSE_FREQUENCY_HZ));

        rcc.registers_for_test().simulate_pll_locked(true);
        assert_eq!(Ok(()), pll.enable());

        // 8 MHz / 8 * 336 / 4
        assert_eq!(Some(84_000_000), pll.frequency_hz(HSE_FREQUENCY_HZ));
        // 8 MHz / 8 * 336 / 7 = the calibrated 48 MHz USB domain
        assert_eq!(Some(48_000_000), pll.usb_frequency_hz(HSE_FREQUENCY_HZ));
    }

    #[test]
    fn refuses_reconfiguration_while_running() {
        let rcc = fake_rcc();
        let pll = pll(rcc);

        assert_eq!(
            Ok(()),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, PLL_84MHZ)
        );
        rcc.registers_for_test().simulate_pll_locked(true);
        assert_eq!(Ok(()), pll.enable());

        assert_eq!(
            Err(ErrorCode::FAIL),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, PLL_168MHZ)
        );

        rcc.registers_for_test().simulate_pll_locked(false);
        assert_eq!(Ok(()), pll.disable());
        assert_eq!(
            Ok(()),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, PLL_168MHZ)
        );
    }

    #[test]
    fn rejects_derived_frequencies_outside_the_windows() {
        let rcc = fake_rcc();
        let pll = pll(rcc);

        // 8 MHz / 16 = 0.5 MHz VCO input, below the window.
        let slow_vco_input = PllConfig::new(16, 336, PLLP::DivideBy4, 7);
        assert_eq!(
            Err(ErrorCode::INVAL),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, slow_vco_input)
        );

        // 8 MHz / 8 * 50 = 50 MHz VCO output, below the window.
        let slow_vco_output = PllConfig::new(8, 50, PLLP::DivideBy4, 7);
        assert_eq!(
            Err(ErrorCode::INVAL),
            pll.configure(PllSource::HSE, HSE_FREQUENCY_HZ, slow_vco_output)
        );

        // 100 MHz VCO output / 8 = 12.5 MHz output, below the F401 PLL
        // minimum of 24 MHz.
        let pll401: Pll<Stm32f401Specs> = Pll::new(rcc);
        let slow_output = PllConfig::new(8, 100, PLLP::DivideBy8, 7);
        assert_eq!(
            Err(ErrorCode::INVAL),
            pll401.configure(PllSource::HSE, HSE_FREQUENCY_HZ, slow_output)
        );
    }

    #[test]
    fn i2s_output_depends_on_the_chip_model() {
        let rcc = fake_rcc();
        let with_i2s = PLL_84MHZ.with_i2s_output(2);

        let pll429 = pll(rcc);
        assert_eq!(
            Err(ErrorCode::NOSUPPORT),
            pll429.configure(PllSource::HSE, HSE_FREQUENCY_HZ, with_i2s)
        );

        let pll446: Pll<Stm32f446Specs> = Pll::new(rcc);
        assert_eq!(
            Ok(()),
            pll446.configure(PllSource::HSE, HSE_FREQUENCY_HZ, with_i2s)
        );
        rcc.registers_for_test().simulate_pll_locked(true);
        assert_eq!(Ok(()), pll446.enable());
        // 8 MHz / 8 * 336 / 2
        assert_eq!(Some(168_000_000), pll446.i2s_frequency_hz(HSE_FREQUENCY_HZ));
    }
}
