// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Reset and clock control (RCC) register interface.
//!
//! This module owns the raw register map and the enumerated encodings. The
//! policy — limit checks, frequency computation, gate bookkeeping — lives in
//! [`crate::clocks`].

use tock_registers::interfaces::{ReadWriteable, Readable};
use tock_registers::register_bitfields;

use crate::registers::{ReadWrite, RegisterOps, StaticRef};

/// Reset and clock control
#[repr(C)]
pub struct RccRegisters {
    /// clock control register
    cr: ReadWrite<u32, CR::Register>,
    /// PLL configuration register
    pllcfgr: ReadWrite<u32, PLLCFGR::Register>,
    /// clock configuration register
    cfgr: ReadWrite<u32, CFGR::Register>,
    /// clock interrupt register
    cir: ReadWrite<u32>,
    /// AHB1 peripheral reset register
    ahb1rstr: ReadWrite<u32>,
    /// AHB2 peripheral reset register
    ahb2rstr: ReadWrite<u32>,
    /// AHB3 peripheral reset register
    ahb3rstr: ReadWrite<u32>,
    _reserved0: [u8; 4],
    /// APB1 peripheral reset register
    apb1rstr: ReadWrite<u32>,
    /// APB2 peripheral reset register
    apb2rstr: ReadWrite<u32>,
    _reserved1: [u8; 8],
    /// AHB1 peripheral clock enable register
    ahb1enr: ReadWrite<u32>,
    /// AHB2 peripheral clock enable register
    ahb2enr: ReadWrite<u32>,
    /// AHB3 peripheral clock enable register
    ahb3enr: ReadWrite<u32>,
    _reserved2: [u8; 4],
    /// APB1 peripheral clock enable register
    apb1enr: ReadWrite<u32>,
    /// APB2 peripheral clock enable register
    apb2enr: ReadWrite<u32>,
    _reserved3: [u8; 8],
    /// AHB1 peripheral clock enable in low power mode register
    ahb1lpenr: ReadWrite<u32>,
    /// AHB2 peripheral clock enable in low power mode register
    ahb2lpenr: ReadWrite<u32>,
    /// AHB3 peripheral clock enable in low power mode register
    ahb3lpenr: ReadWrite<u32>,
    _reserved4: [u8; 4],
    /// APB1 peripheral clock enable in low power mode register
    apb1lpenr: ReadWrite<u32>,
    /// APB2 peripheral clock enabled in low power mode register
    apb2lpenr: ReadWrite<u32>,
    _reserved5: [u8; 8],
    /// Backup domain control register
    bdcr: ReadWrite<u32>,
    /// clock control & status register
    csr: ReadWrite<u32>,
    _reserved6: [u8; 8],
    /// spread spectrum clock generation register
    sscgr: ReadWrite<u32>,
    /// PLLI2S configuration register
    plli2scfgr: ReadWrite<u32>,
    /// PLLSAI configuration register
    pllsaicfgr: ReadWrite<u32>,
    /// Dedicated clock configuration register
    dckcfgr: ReadWrite<u32>,
}

register_bitfields![u32,
    CR [
        /// Main PLL (PLL) clock ready flag
        PLLRDY OFFSET(25) NUMBITS(1) [],
        /// Main PLL (PLL) enable
        PLLON OFFSET(24) NUMBITS(1) [],
        /// HSE clock bypass
        HSEBYP OFFSET(18) NUMBITS(1) [],
        /// HSE clock ready flag
        HSERDY OFFSET(17) NUMBITS(1) [],
        /// HSE clock enable
        HSEON OFFSET(16) NUMBITS(1) [],
        /// Internal high-speed clock ready flag
        HSIRDY OFFSET(1) NUMBITS(1) [],
        /// Internal high-speed clock enable
        HSION OFFSET(0) NUMBITS(1) []
    ],
    PLLCFGR [
        /// Main PLL division factor for I2S and SAI clocks (not present on
        /// every chip model)
        PLLR OFFSET(28) NUMBITS(3) [],
        /// Main PLL division factor for USB OTG FS, SDIO and the random
        /// number generator
        PLLQ OFFSET(24) NUMBITS(4) [],
        /// Main PLL and audio PLL entry clock source
        PLLSRC OFFSET(22) NUMBITS(1) [
            HSI = 0,
            HSE = 1,
        ],
        /// Main PLL division factor for the main system clock
        PLLP OFFSET(16) NUMBITS(2) [
            DivideBy2 = 0b00,
            DivideBy4 = 0b01,
            DivideBy6 = 0b10,
            DivideBy8 = 0b11,
        ],
        /// Main PLL multiplication factor for the VCO
        PLLN OFFSET(6) NUMBITS(9) [],
        /// Division factor for the main PLL input clock
        PLLM OFFSET(0) NUMBITS(6) []
    ],
    pub(crate) CFGR [
        /// APB high-speed prescaler (APB2)
        PPRE2 OFFSET(13) NUMBITS(3) [],
        /// APB low-speed prescaler (APB1)
        PPRE1 OFFSET(10) NUMBITS(3) [],
        /// AHB prescaler
        HPRE OFFSET(4) NUMBITS(4) [],
        /// System clock switch status
        SWS OFFSET(2) NUMBITS(2) [],
        /// System clock switch
        SW OFFSET(0) NUMBITS(2) [
            HSI = 0b00,
            HSE = 0b01,
            PLL = 0b10,
        ]
    ]
];

pub const RCC_BASE: StaticRef<RccRegisters> =
    unsafe { StaticRef::new(0x40023800 as *const RccRegisters) };

pub struct Rcc {
    registers: StaticRef<RccRegisters>,
}

/// System clock mux inputs.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockSource {
    HSI = 0b00,
    HSE = 0b01,
    PLL = 0b10,
}

/// PLL input mux.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    HSI = 0b0,
    HSE = 0b1,
}

/// HSE oscillator operating mode.
///
/// `Bypass` feeds an external clock signal straight through; `Crystal`
/// drives a crystal/ceramic resonator connected across the OSC pins.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HseMode {
    Crystal,
    Bypass,
}

/// Main PLL system clock output divider (the PLLP field encoding).
///
/// The hardware only supports dividing the VCO output by 2, 4, 6 or 8;
/// anything else is unrepresentable by construction.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PLLP {
    DivideBy2 = 0b00,
    DivideBy4 = 0b01,
    DivideBy6 = 0b10,
    DivideBy8 = 0b11,
}

impl From<PLLP> for u32 {
    fn from(p: PLLP) -> u32 {
        (p as u32 + 1) * 2
    }
}

/// AHB prescaler field encoding (HPRE).
///
/// Codes 0b0000-0b0111 all mean "no division"; this is a hardware quirk,
/// not a gap in the enum.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AHBPrescaler {
    DivideBy1 = 0b0000,
    DivideBy2 = 0b1000,
    DivideBy4 = 0b1001,
    DivideBy8 = 0b1010,
    DivideBy16 = 0b1011,
    DivideBy64 = 0b1100,
    DivideBy128 = 0b1101,
    DivideBy256 = 0b1110,
    DivideBy512 = 0b1111,
}

impl From<AHBPrescaler> for usize {
    fn from(prescaler: AHBPrescaler) -> usize {
        match prescaler {
            AHBPrescaler::DivideBy1 => 1,
            AHBPrescaler::DivideBy2 => 2,
            AHBPrescaler::DivideBy4 => 4,
            AHBPrescaler::DivideBy8 => 8,
            AHBPrescaler::DivideBy16 => 16,
            AHBPrescaler::DivideBy64 => 64,
            AHBPrescaler::DivideBy128 => 128,
            AHBPrescaler::DivideBy256 => 256,
            AHBPrescaler::DivideBy512 => 512,
        }
    }
}

/// APB prescaler field encoding (PPRE1/PPRE2).
///
/// Codes 0b000-0b011 all mean "no division".
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum APBPrescaler {
    DivideBy1 = 0b000,
    DivideBy2 = 0b100,
    DivideBy4 = 0b101,
    DivideBy8 = 0b110,
    DivideBy16 = 0b111,
}

impl From<APBPrescaler> for usize {
    fn from(prescaler: APBPrescaler) -> usize {
        match prescaler {
            APBPrescaler::DivideBy1 => 1,
            APBPrescaler::DivideBy2 => 2,
            APBPrescaler::DivideBy4 => 4,
            APBPrescaler::DivideBy8 => 8,
            APBPrescaler::DivideBy16 => 16,
        }
    }
}

/// The peripheral clock enable registers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockBank {
    Ahb1,
    Ahb2,
    Ahb3,
    Apb1,
    Apb2,
}

/// One peripheral clock enable bit, bound to its enable register.
///
/// Gates are plain data: (bank, bit). The full set of gates for the
/// supported chips is enumerated in [`crate::clocks::phclk::gates`];
/// peripheral drivers normally receive a
/// [`crate::clocks::phclk::PeripheralClock`] wrapping one of these rather
/// than a bare gate.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockGate {
    bank: ClockBank,
    bit: u32,
}

impl ClockGate {
    /// Bind an enable bit. Evaluated in `const` context for the gate tables,
    /// so an out-of-range bit position fails the build.
    pub const fn new(bank: ClockBank, bit: u32) -> ClockGate {
        assert!(bit < 32);
        ClockGate { bank, bit }
    }

    pub const fn bank(&self) -> ClockBank {
        self.bank
    }

    const fn mask(&self) -> u32 {
        1 << self.bit
    }
}

impl Rcc {
    pub const fn new(registers: StaticRef<RccRegisters>) -> Self {
        Self { registers }
    }

    /* System clock mux */

    pub(crate) fn get_sys_clock_source(&self) -> SysClockSource {
        match self.registers.cfgr.read(CFGR::SWS) {
            0b00 => SysClockSource::HSI,
            0b01 => SysClockSource::HSE,
            _ => SysClockSource::PLL,
        }
    }

    // The source must be enabled before it is selected.
    pub(crate) fn set_sys_clock_source(&self, source: SysClockSource) {
        self.registers.cfgr.modify(CFGR::SW.val(source as u32));
    }

    pub(crate) fn is_hsi_clock_system_clock(&self) -> bool {
        let system_clock_source = self.get_sys_clock_source();
        system_clock_source == SysClockSource::HSI
            || system_clock_source == SysClockSource::PLL
                && self.registers.pllcfgr.read(PLLCFGR::PLLSRC) == PllSource::HSI as u32
    }

    pub(crate) fn is_hse_clock_system_clock(&self) -> bool {
        let system_clock_source = self.get_sys_clock_source();
        system_clock_source == SysClockSource::HSE
            || system_clock_source == SysClockSource::PLL
                && self.registers.pllcfgr.read(PLLCFGR::PLLSRC) == PllSource::HSE as u32
    }

    /* HSI clock */

    // The HSI clock must not be configured as the system clock, either
    // directly or indirectly.
    pub(crate) fn disable_hsi_clock(&self) {
        self.registers.cr.modify(CR::HSION::CLEAR);
    }

    pub(crate) fn enable_hsi_clock(&self) {
        self.registers.cr.modify(CR::HSION::SET);
    }

    pub(crate) fn is_enabled_hsi_clock(&self) -> bool {
        self.registers.cr.is_set(CR::HSION)
    }

    // Indicates whether the HSI oscillator is stable
    pub(crate) fn is_ready_hsi_clock(&self) -> bool {
        self.registers.cr.is_set(CR::HSIRDY)
    }

    /* HSE clock */

    pub(crate) fn disable_hse_clock(&self) {
        self.registers.cr.modify(CR::HSEON::CLEAR);
        self.registers.cr.modify(CR::HSEBYP::CLEAR);
    }

    pub(crate) fn enable_hse_clock_bypass(&self) {
        self.registers.cr.modify(CR::HSEBYP::SET);
    }

    pub(crate) fn enable_hse_clock(&self) {
        self.registers.cr.modify(CR::HSEON::SET);
    }

    pub(crate) fn is_enabled_hse_clock(&self) -> bool {
        self.registers.cr.is_set(CR::HSEON)
    }

    // Indicates whether the HSE oscillator is stable
    pub(crate) fn is_ready_hse_clock(&self) -> bool {
        self.registers.cr.is_set(CR::HSERDY)
    }

    /* Main PLL clock */

    // The main PLL clock must not be configured as the system clock.
    pub(crate) fn disable_pll_clock(&self) {
        self.registers.cr.modify(CR::PLLON::CLEAR);
    }

    pub(crate) fn enable_pll_clock(&self) {
        self.registers.cr.modify(CR::PLLON::SET);
    }

    pub(crate) fn is_enabled_pll_clock(&self) -> bool {
        self.registers.cr.is_set(CR::PLLON)
    }

    // The PLL clock is locked when its signal is stable
    pub(crate) fn is_locked_pll_clock(&self) -> bool {
        self.registers.cr.is_set(CR::PLLRDY)
    }

    pub(crate) fn get_pll_clocks_source(&self) -> PllSource {
        match self.registers.pllcfgr.read(PLLCFGR::PLLSRC) {
            0b0 => PllSource::HSI,
            _ => PllSource::HSE,
        }
    }

    // The PLL configuration methods below must be called only when the main
    // PLL clock is disabled.

    pub(crate) fn set_pll_clocks_source(&self, source: PllSource) {
        self.registers
            .pllcfgr
            .modify(PLLCFGR::PLLSRC.val(source as u32));
    }

    pub(crate) fn get_pll_clocks_m_divider(&self) -> u32 {
        self.registers.pllcfgr.read(PLLCFGR::PLLM)
    }

    pub(crate) fn set_pll_clocks_m_divider(&self, m: u32) {
        self.registers.pllcfgr.modify(PLLCFGR::PLLM.val(m));
    }

    pub(crate) fn get_pll_clock_n_multiplier(&self) -> u32 {
        self.registers.pllcfgr.read(PLLCFGR::PLLN)
    }

    pub(crate) fn set_pll_clock_n_multiplier(&self, n: u32) {
        self.registers.pllcfgr.modify(PLLCFGR::PLLN.val(n));
    }

    pub(crate) fn get_pll_clock_p_divider(&self) -> PLLP {
        match self.registers.pllcfgr.read(PLLCFGR::PLLP) {
            0b00 => PLLP::DivideBy2,
            0b01 => PLLP::DivideBy4,
            0b10 => PLLP::DivideBy6,
            _ => PLLP::DivideBy8,
        }
    }

    pub(crate) fn set_pll_clock_p_divider(&self, p: PLLP) {
        self.registers.pllcfgr.modify(PLLCFGR::PLLP.val(p as u32));
    }

    pub(crate) fn get_pll_clock_q_divider(&self) -> u32 {
        self.registers.pllcfgr.read(PLLCFGR::PLLQ)
    }

    pub(crate) fn set_pll_clock_q_divider(&self, q: u32) {
        self.registers.pllcfgr.modify(PLLCFGR::PLLQ.val(q));
    }

    pub(crate) fn get_pll_clock_r_divider(&self) -> u32 {
        self.registers.pllcfgr.read(PLLCFGR::PLLR)
    }

    pub(crate) fn set_pll_clock_r_divider(&self, r: u32) {
        self.registers.pllcfgr.modify(PLLCFGR::PLLR.val(r));
    }

    /* Bus prescalers */

    pub(crate) fn set_ahb_prescaler(&self, prescaler: AHBPrescaler) {
        self.registers.cfgr.modify(CFGR::HPRE.val(prescaler as u32));
    }

    pub(crate) fn get_ahb_prescaler(&self) -> AHBPrescaler {
        match self.registers.cfgr.read(CFGR::HPRE) {
            0b1000 => AHBPrescaler::DivideBy2,
            0b1001 => AHBPrescaler::DivideBy4,
            0b1010 => AHBPrescaler::DivideBy8,
            0b1011 => AHBPrescaler::DivideBy16,
            0b1100 => AHBPrescaler::DivideBy64,
            0b1101 => AHBPrescaler::DivideBy128,
            0b1110 => AHBPrescaler::DivideBy256,
            0b1111 => AHBPrescaler::DivideBy512,
            _ => AHBPrescaler::DivideBy1, // 0b0xxx means no division
        }
    }

    pub(crate) fn set_apb1_prescaler(&self, prescaler: APBPrescaler) {
        self.registers
            .cfgr
            .modify(CFGR::PPRE1.val(prescaler as u32));
    }

    pub(crate) fn get_apb1_prescaler(&self) -> APBPrescaler {
        match self.registers.cfgr.read(CFGR::PPRE1) {
            0b100 => APBPrescaler::DivideBy2,
            0b101 => APBPrescaler::DivideBy4,
            0b110 => APBPrescaler::DivideBy8,
            0b111 => APBPrescaler::DivideBy16,
            _ => APBPrescaler::DivideBy1, // 0b0xx means no division
        }
    }

    pub(crate) fn set_apb2_prescaler(&self, prescaler: APBPrescaler) {
        self.registers
            .cfgr
            .modify(CFGR::PPRE2.val(prescaler as u32));
    }

    pub(crate) fn get_apb2_prescaler(&self) -> APBPrescaler {
        match self.registers.cfgr.read(CFGR::PPRE2) {
            0b100 => APBPrescaler::DivideBy2,
            0b101 => APBPrescaler::DivideBy4,
            0b110 => APBPrescaler::DivideBy8,
            0b111 => APBPrescaler::DivideBy16,
            _ => APBPrescaler::DivideBy1, // 0b0xx means no division
        }
    }

    // Raw prescaler field values, used by the bus clock descriptors to index
    // their shift tables.
    pub(crate) fn get_bus_prescaler_code(
        &self,
        field: tock_registers::fields::Field<u32, CFGR::Register>,
    ) -> u32 {
        self.registers.cfgr.read(field)
    }

    /* Peripheral clock gates */

    fn enable_register(&self, bank: ClockBank) -> &ReadWrite<u32> {
        match bank {
            ClockBank::Ahb1 => &self.registers.ahb1enr,
            ClockBank::Ahb2 => &self.registers.ahb2enr,
            ClockBank::Ahb3 => &self.registers.ahb3enr,
            ClockBank::Apb1 => &self.registers.apb1enr,
            ClockBank::Apb2 => &self.registers.apb2enr,
        }
    }

    /// Set the gate's enable bit. One read-modify-write; enabling an already
    /// enabled gate writes the unchanged value back.
    pub(crate) fn enable_clock(&self, gate: ClockGate) {
        self.enable_register(gate.bank).or(gate.mask());
    }

    /// Clear the gate's enable bit. One read-modify-write.
    pub(crate) fn disable_clock(&self, gate: ClockGate) {
        self.enable_register(gate.bank).and(!gate.mask());
    }

    pub(crate) fn is_enabled_clock(&self, gate: ClockGate) -> bool {
        self.enable_register(gate.bank).test_bit(gate.bit as usize)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn fake_rcc() -> &'static Rcc {
        let registers: &'static RccRegisters =
            Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Box::leak(Box::new(Rcc::new(unsafe {
            StaticRef::new(registers as *const RccRegisters)
        })))
    }

    // Test-only access to the backing registers, for simulating hardware
    // responses (ready flags, the SWS status field).
    impl Rcc {
        pub(crate) fn registers_for_test(&self) -> &RccRegisters {
            &self.registers
        }
    }

    impl RccRegisters {
        pub(crate) fn simulate_hsi_ready(&self) {
            self.cr.modify(CR::HSIRDY::SET);
        }

        pub(crate) fn simulate_hsi_stopped(&self) {
            self.cr.modify(CR::HSIRDY::CLEAR);
        }

        pub(crate) fn simulate_hse_ready(&self) {
            self.cr.modify(CR::HSERDY::SET);
        }

        pub(crate) fn simulate_pll_locked(&self, locked: bool) {
            self.cr.modify(if locked {
                CR::PLLRDY::SET
            } else {
                CR::PLLRDY::CLEAR
            });
        }

        // Mirror the SW field into SWS the way the hardware mux does once it
        // has switched over.
        pub(crate) fn simulate_sys_clock_switch(&self) {
            let sw = self.cfgr.read(CFGR::SW);
            self.cfgr.modify(CFGR::SWS.val(sw));
        }

        // Raw prescaler codes, for exercising every representable field
        // value including the ones the typed setters never produce.
        pub(crate) fn write_raw_hpre(&self, code: u32) {
            self.cfgr.modify(CFGR::HPRE.val(code));
        }

        pub(crate) fn write_raw_ppre1(&self, code: u32) {
            self.cfgr.modify(CFGR::PPRE1.val(code));
        }
    }

    #[test]
    fn gate_enable_flips_only_the_bound_bit() {
        let rcc = fake_rcc();
        let gpioa = ClockGate::new(ClockBank::Ahb1, 0);
        let dma2 = ClockGate::new(ClockBank::Ahb1, 22);

        rcc.enable_clock(dma2);
        let before = rcc.registers.ahb1enr.get();

        rcc.enable_clock(gpioa);
        assert!(rcc.is_enabled_clock(gpioa));
        assert_eq!(before | 1, rcc.registers.ahb1enr.get());

        rcc.disable_clock(gpioa);
        assert!(!rcc.is_enabled_clock(gpioa));
        assert_eq!(before, rcc.registers.ahb1enr.get());
        assert!(rcc.is_enabled_clock(dma2));
    }

    #[test]
    fn gate_enable_is_idempotent() {
        let rcc = fake_rcc();
        let gate = ClockGate::new(ClockBank::Apb1, 17);

        rcc.enable_clock(gate);
        let value = rcc.registers.apb1enr.get();
        rcc.enable_clock(gate);
        assert_eq!(value, rcc.registers.apb1enr.get());
    }

    #[test]
    fn gates_target_their_own_bank() {
        let rcc = fake_rcc();
        rcc.enable_clock(ClockGate::new(ClockBank::Apb2, 4));
        assert_eq!(0, rcc.registers.apb1enr.get());
        assert_eq!(0, rcc.registers.ahb1enr.get());
        assert_eq!(1 << 4, rcc.registers.apb2enr.get());
    }

    #[test]
    fn pll_configuration_fields_round_trip() {
        let rcc = fake_rcc();
        rcc.set_pll_clocks_m_divider(8);
        rcc.set_pll_clock_n_multiplier(336);
        rcc.set_pll_clock_p_divider(PLLP::DivideBy4);
        rcc.set_pll_clock_q_divider(7);
        rcc.set_pll_clocks_source(PllSource::HSE);

        assert_eq!(8, rcc.get_pll_clocks_m_divider());
        assert_eq!(336, rcc.get_pll_clock_n_multiplier());
        assert_eq!(PLLP::DivideBy4, rcc.get_pll_clock_p_divider());
        assert_eq!(7, rcc.get_pll_clock_q_divider());
        assert_eq!(PllSource::HSE, rcc.get_pll_clocks_source());
    }

    #[test]
    fn prescaler_fields_round_trip() {
        let rcc = fake_rcc();
        assert_eq!(AHBPrescaler::DivideBy1, rcc.get_ahb_prescaler());

        rcc.set_ahb_prescaler(AHBPrescaler::DivideBy64);
        rcc.set_apb1_prescaler(APBPrescaler::DivideBy4);
        rcc.set_apb2_prescaler(APBPrescaler::DivideBy2);

        assert_eq!(AHBPrescaler::DivideBy64, rcc.get_ahb_prescaler());
        assert_eq!(APBPrescaler::DivideBy4, rcc.get_apb1_prescaler());
        assert_eq!(APBPrescaler::DivideBy2, rcc.get_apb2_prescaler());
    }
}
