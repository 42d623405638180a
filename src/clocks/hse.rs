// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! HSE (high-speed external) clock driver.
//!
//! The HSE input is either a crystal across the OSC pins or an external
//! clock signal fed through in bypass mode. Its frequency is a property of
//! the board, not the chip, so it must be declared once during bring-up with
//! [`Hse::set_frequency_hz`] before anything derives timing from it.

use core::cell::Cell;

use crate::rcc::{HseMode, Rcc};
use crate::ErrorCode;

/// Main HSE clock structure
pub struct Hse<'a> {
    rcc: &'a Rcc,
    hse_frequency_hz: Cell<Option<u32>>,
}

impl<'a> Hse<'a> {
    pub(in crate::clocks) fn new(rcc: &'a Rcc) -> Self {
        Self {
            rcc,
            hse_frequency_hz: Cell::new(None),
        }
    }

    /// Declare the board's oscillator frequency in Hz.
    pub fn set_frequency_hz(&self, frequency_hz: u32) {
        self.hse_frequency_hz.set(Some(frequency_hz));
    }

    /// Start the HSE clock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): if enabling the HSE clock took too long.
    /// Recall this method to ensure the HSE clock is running.
    pub fn enable(&self, mode: HseMode) -> Result<(), ErrorCode> {
        if mode == HseMode::Bypass {
            self.rcc.enable_hse_clock_bypass();
        }

        self.rcc.enable_hse_clock();

        for _ in 0..100 {
            if self.rcc.is_ready_hse_clock() {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Stop the HSE clock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::FAIL]\): if the HSE clock is configured as the
    /// system clock, directly or through the PLL.
    /// + [Err]\([ErrorCode::BUSY]\): disabling the HSE clock took too long.
    /// Retry to ensure it is not running.
    pub fn disable(&self) -> Result<(), ErrorCode> {
        if self.rcc.is_hse_clock_system_clock() {
            return Err(ErrorCode::FAIL);
        }

        self.rcc.disable_hse_clock();

        for _ in 0..10 {
            if !self.rcc.is_ready_hse_clock() {
                return Ok(());
            }
        }

        Err(ErrorCode::BUSY)
    }

    /// Check whether the HSE clock is enabled or not.
    pub fn is_enabled(&self) -> bool {
        self.rcc.is_enabled_hse_clock()
    }

    /// Get the frequency in Hz of the HSE clock.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the HSE clock is enabled and its
    /// frequency has been declared.
    /// + [None]: otherwise.
    pub fn frequency_hz(&self) -> Option<u32> {
        if self.is_enabled() {
            self.hse_frequency_hz.get()
        } else {
            None
        }
    }
}
