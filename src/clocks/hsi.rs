// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! HSI (high-speed internal) clock driver.
//!
//! The HSI is the 16 MHz internal RC oscillator. It is the reset-time system
//! clock, so it can only be stopped once another source has taken over.

use crate::rcc::Rcc;
use crate::ErrorCode;

/// HSI frequency in Hz
pub const HSI_FREQUENCY_HZ: u32 = 16_000_000;

/// Main HSI clock structure
pub struct Hsi<'a> {
    rcc: &'a Rcc,
}

impl<'a> Hsi<'a> {
    pub(in crate::clocks) fn new(rcc: &'a Rcc) -> Self {
        Self { rcc }
    }

    /// Start the HSI clock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): if enabling the HSI clock took too long.
    /// Recall this method to ensure the HSI clock is running.
    pub fn enable(&self) -> Result<(), ErrorCode> {
        self.rcc.enable_hsi_clock();

        for _ in 0..100 {
            if self.rcc.is_ready_hsi_clock() {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Stop the HSI clock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::FAIL]\): if the HSI clock is configured as the
    /// system clock, directly or through the PLL.
    /// + [Err]\([ErrorCode::BUSY]\): disabling the HSI clock took too long.
    /// Retry to ensure it is not running.
    pub fn disable(&self) -> Result<(), ErrorCode> {
        if self.rcc.is_hsi_clock_system_clock() {
            return Err(ErrorCode::FAIL);
        }

        self.rcc.disable_hsi_clock();

        for _ in 0..10 {
            if !self.rcc.is_ready_hsi_clock() {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Check whether the HSI clock is enabled or not.
    pub fn is_enabled(&self) -> bool {
        self.rcc.is_enabled_hsi_clock()
    }

    /// Get the frequency in Hz of the HSI clock.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the HSI clock is enabled.
    /// + [None]: if the HSI clock is disabled.
    pub fn frequency_hz(&self) -> Option<u32> {
        if self.is_enabled() {
            Some(HSI_FREQUENCY_HZ)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::tests::fake_rcc;
    use crate::rcc::SysClockSource;

    #[test]
    fn enable_reports_ready_oscillator() {
        let rcc = fake_rcc();
        let hsi = Hsi::new(rcc);

        rcc.registers_for_test().simulate_hsi_ready();
        assert_eq!(Ok(()), hsi.enable());
        assert!(hsi.is_enabled());
        assert_eq!(Some(HSI_FREQUENCY_HZ), hsi.frequency_hz());
    }

    #[test]
    fn enable_times_out_without_ready_flag() {
        let rcc = fake_rcc();
        let hsi = Hsi::new(rcc);

        assert_eq!(Err(ErrorCode::BUSY), hsi.enable());
    }

    #[test]
    fn cannot_disable_the_system_clock() {
        let rcc = fake_rcc();
        let hsi = Hsi::new(rcc);

        // Out of reset SWS reads as HSI.
        assert_eq!(SysClockSource::HSI, rcc.get_sys_clock_source());
        assert_eq!(Err(ErrorCode::FAIL), hsi.disable());
    }

    #[test]
    fn disable_once_another_source_runs_the_system() {
        let rcc = fake_rcc();
        let hsi = Hsi::new(rcc);

        rcc.registers_for_test().simulate_hsi_ready();
        assert_eq!(Ok(()), hsi.enable());

        rcc.set_sys_clock_source(SysClockSource::HSE);
        rcc.registers_for_test().simulate_sys_clock_switch();

        // The simulated oscillator stops as soon as it is turned off.
        rcc.registers_for_test().simulate_hsi_stopped();
        assert_eq!(Ok(()), hsi.disable());
        assert_eq!(None, hsi.frequency_hz());
    }
}
