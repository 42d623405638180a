// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Peripheral clocks.
//!
//! A [`PeripheralClock`] is the one handle a peripheral driver needs from
//! the clock tree: its gate, to power the peripheral's bus interface on and
//! off, and its bus, to learn the frequency its timing math must be based
//! on. The gate-to-peripheral assignment is pure data (see [`gates`]), so
//! adding a peripheral is one constant, not a new set of register accessors.
//!
//! Gate writes are fire-and-forget: the enable bit is set or cleared in one
//! read-modify-write, without readback verification. Registers of a
//! peripheral whose gate is disabled do not respond; accessing them anyway
//! is a caller error this crate does not detect.

use crate::clocks::Stm32f4Clocks;
use crate::rcc::{ClockBank, ClockGate};

pub struct PeripheralClock<'a> {
    gate: ClockGate,
    clocks: &'a dyn Stm32f4Clocks,
}

impl<'a> PeripheralClock<'a> {
    pub const fn new(gate: ClockGate, clocks: &'a dyn Stm32f4Clocks) -> Self {
        Self { gate, clocks }
    }

    /// Set the gate's enable bit. Enabling an enabled gate is a no-op write.
    pub fn enable(&self) {
        self.clocks.get_rcc().enable_clock(self.gate);
    }

    /// Clear the gate's enable bit.
    pub fn disable(&self) {
        self.clocks.get_rcc().disable_clock(self.gate);
    }

    pub fn is_enabled(&self) -> bool {
        self.clocks.get_rcc().is_enabled_clock(self.gate)
    }

    /// The operating frequency of this peripheral's bus in Hz, recomputed
    /// from the clock tree on every call.
    pub fn frequency_hz(&self) -> u32 {
        match self.gate.bank() {
            ClockBank::Ahb1 | ClockBank::Ahb2 | ClockBank::Ahb3 => self.clocks.ahb_frequency_hz(),
            ClockBank::Apb1 => self.clocks.apb1_frequency_hz(),
            ClockBank::Apb2 => self.clocks.apb2_frequency_hz(),
        }
    }
}

/// Clock gate assignments for the supported chip models (RM0090/RM0390).
pub mod gates {
    use crate::rcc::{ClockBank, ClockGate};

    // AHB1
    pub const GPIOA: ClockGate = ClockGate::new(ClockBank::Ahb1, 0);
    pub const GPIOB: ClockGate = ClockGate::new(ClockBank::Ahb1, 1);
    pub const GPIOC: ClockGate = ClockGate::new(ClockBank::Ahb1, 2);
    pub const GPIOD: ClockGate = ClockGate::new(ClockBank::Ahb1, 3);
    pub const GPIOE: ClockGate = ClockGate::new(ClockBank::Ahb1, 4);
    pub const GPIOF: ClockGate = ClockGate::new(ClockBank::Ahb1, 5);
    pub const GPIOG: ClockGate = ClockGate::new(ClockBank::Ahb1, 6);
    pub const GPIOH: ClockGate = ClockGate::new(ClockBank::Ahb1, 7);
    pub const CRC: ClockGate = ClockGate::new(ClockBank::Ahb1, 12);
    pub const DMA1: ClockGate = ClockGate::new(ClockBank::Ahb1, 21);
    pub const DMA2: ClockGate = ClockGate::new(ClockBank::Ahb1, 22);
    pub const OTGHS: ClockGate = ClockGate::new(ClockBank::Ahb1, 29);

    // AHB2
    pub const DCMI: ClockGate = ClockGate::new(ClockBank::Ahb2, 0);
    pub const RNG: ClockGate = ClockGate::new(ClockBank::Ahb2, 6);
    pub const OTGFS: ClockGate = ClockGate::new(ClockBank::Ahb2, 7);

    // AHB3
    pub const FMC: ClockGate = ClockGate::new(ClockBank::Ahb3, 0);
    pub const QSPI: ClockGate = ClockGate::new(ClockBank::Ahb3, 1);

    // APB1
    pub const TIM2: ClockGate = ClockGate::new(ClockBank::Apb1, 0);
    pub const TIM3: ClockGate = ClockGate::new(ClockBank::Apb1, 1);
    pub const TIM4: ClockGate = ClockGate::new(ClockBank::Apb1, 2);
    pub const TIM5: ClockGate = ClockGate::new(ClockBank::Apb1, 3);
    pub const TIM6: ClockGate = ClockGate::new(ClockBank::Apb1, 4);
    pub const TIM7: ClockGate = ClockGate::new(ClockBank::Apb1, 5);
    pub const WWDG: ClockGate = ClockGate::new(ClockBank::Apb1, 11);
    pub const SPI2: ClockGate = ClockGate::new(ClockBank::Apb1, 14);
    pub const SPI3: ClockGate = ClockGate::new(ClockBank::Apb1, 15);
    pub const USART2: ClockGate = ClockGate::new(ClockBank::Apb1, 17);
    pub const USART3: ClockGate = ClockGate::new(ClockBank::Apb1, 18);
    pub const UART4: ClockGate = ClockGate::new(ClockBank::Apb1, 19);
    pub const UART5: ClockGate = ClockGate::new(ClockBank::Apb1, 20);
    pub const I2C1: ClockGate = ClockGate::new(ClockBank::Apb1, 21);
    pub const I2C2: ClockGate = ClockGate::new(ClockBank::Apb1, 22);
    pub const I2C3: ClockGate = ClockGate::new(ClockBank::Apb1, 23);
    pub const CAN1: ClockGate = ClockGate::new(ClockBank::Apb1, 25);
    pub const CAN2: ClockGate = ClockGate::new(ClockBank::Apb1, 26);
    pub const PWR: ClockGate = ClockGate::new(ClockBank::Apb1, 28);
    pub const DAC: ClockGate = ClockGate::new(ClockBank::Apb1, 29);

    // APB2
    pub const TIM1: ClockGate = ClockGate::new(ClockBank::Apb2, 0);
    pub const TIM8: ClockGate = ClockGate::new(ClockBank::Apb2, 1);
    pub const USART1: ClockGate = ClockGate::new(ClockBank::Apb2, 4);
    pub const USART6: ClockGate = ClockGate::new(ClockBank::Apb2, 5);
    pub const ADC1: ClockGate = ClockGate::new(ClockBank::Apb2, 8);
    pub const ADC2: ClockGate = ClockGate::new(ClockBank::Apb2, 9);
    pub const ADC3: ClockGate = ClockGate::new(ClockBank::Apb2, 10);
    pub const SDIO: ClockGate = ClockGate::new(ClockBank::Apb2, 11);
    pub const SPI1: ClockGate = ClockGate::new(ClockBank::Apb2, 12);
    pub const SPI4: ClockGate = ClockGate::new(ClockBank::Apb2, 13);
    pub const SYSCFG: ClockGate = ClockGate::new(ClockBank::Apb2, 14);
    pub const TIM9: ClockGate = ClockGate::new(ClockBank::Apb2, 16);
    pub const TIM10: ClockGate = ClockGate::new(ClockBank::Apb2, 17);
    pub const TIM11: ClockGate = ClockGate::new(ClockBank::Apb2, 18);
}
