// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Per-chip specifications.

use crate::chip_specific::clock_constants::PllConstants;

/// Clock-related limits of one chip model.
///
/// The limits bound what software may configure, not what the silicon can
/// momentarily survive; exceeding them is rejected by the [`crate::clocks`]
/// setters before any register is written.
pub trait ChipSpecs: PllConstants {
    /// Maximum allowed system clock (and therefore core) frequency in MHz
    const SYS_CLOCK_FREQUENCY_LIMIT_MHZ: u32;
    /// Maximum allowed APB1 bus frequency in MHz
    const APB1_FREQUENCY_LIMIT_MHZ: u32;
    /// Maximum allowed APB2 bus frequency in MHz
    const APB2_FREQUENCY_LIMIT_MHZ: u32;
    /// Whether PLLCFGR carries the PLLR (I2S/SAI) output divider field
    const HAS_PLL_I2S_OUTPUT: bool;
}

/// STM32F401 specifications
pub struct Stm32f401Specs;

impl PllConstants for Stm32f401Specs {
    const MIN_FREQ_MHZ: u32 = 24;
}

impl ChipSpecs for Stm32f401Specs {
    const SYS_CLOCK_FREQUENCY_LIMIT_MHZ: u32 = 84;
    const APB1_FREQUENCY_LIMIT_MHZ: u32 = 42;
    const APB2_FREQUENCY_LIMIT_MHZ: u32 = 84;
    const HAS_PLL_I2S_OUTPUT: bool = false;
}

/// STM32F429 specifications
pub struct Stm32f429Specs;

impl PllConstants for Stm32f429Specs {
    const MIN_FREQ_MHZ: u32 = 13;
}

impl ChipSpecs for Stm32f429Specs {
    const SYS_CLOCK_FREQUENCY_LIMIT_MHZ: u32 = 180;
    const APB1_FREQUENCY_LIMIT_MHZ: u32 = 45;
    const APB2_FREQUENCY_LIMIT_MHZ: u32 = 90;
    const HAS_PLL_I2S_OUTPUT: bool = false;
}

/// STM32F446 specifications
pub struct Stm32f446Specs;

impl PllConstants for Stm32f446Specs {
    const MIN_FREQ_MHZ: u32 = 13;
}

impl ChipSpecs for Stm32f446Specs {
    const SYS_CLOCK_FREQUENCY_LIMIT_MHZ: u32 = 180;
    const APB1_FREQUENCY_LIMIT_MHZ: u32 = 45;
    const APB2_FREQUENCY_LIMIT_MHZ: u32 = 90;
    const HAS_PLL_I2S_OUTPUT: bool = true;
}
