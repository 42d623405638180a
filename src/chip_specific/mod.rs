// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Chip-specific constants.
//!
//! Models in the STM32F4 family differ in their frequency limits and in a
//! few PLL capabilities. Everything model-dependent is collected here behind
//! traits, as data; the drivers in [`crate::clocks`] are written against the
//! trait shape only and never branch on a concrete chip.

pub mod chip_specs;
pub mod clock_constants;

pub use chip_specs::{ChipSpecs, Stm32f401Specs, Stm32f429Specs, Stm32f446Specs};
