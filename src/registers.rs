// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Register access primitives.
//!
//! The typed volatile register machinery comes from the `tock-registers`
//! crate. This module re-exports the register types the drivers use and adds
//! two pieces on top:
//!
//! + [`StaticRef`], an immutable reference to a memory-mapped register block
//!   that lives for the program lifetime, and
//! + [`RegisterOps`], whole-word mask operations for registers that are
//!   driven by computed bit masks rather than named fields.
//!
//! Under `cfg(test)` the re-exported register types are swapped for
//! in-memory substitutes backed by [`core::cell::Cell`], so every driver
//! unit test runs against a simulated backing store on the host. The
//! substitutes additionally count writes, which lets tests assert that an
//! operation touched the hardware exactly once.

use core::ops::{BitAnd, BitOr, BitXor, Not, Shl};

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::{RegisterLongName, UIntLike};

#[cfg(not(test))]
pub use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};

#[cfg(test)]
pub use self::test_registers::{ReadOnly, ReadWrite, WriteOnly};

/// A pointer to statically allocated mutable data such as memory mapped I/O
/// registers.
///
/// This is a simple wrapper around a raw pointer that encapsulates an unsafe
/// dereference in a safe manner. It serves the role of creating a `&'static`
/// reference to a register block without the dangers of a plain static item:
/// the block is never constructed by Rust code, it only ever exists at the
/// address the hardware gives it.
pub struct StaticRef<T> {
    ptr: *const T,
}

impl<T> StaticRef<T> {
    /// Create a new `StaticRef` from a raw pointer
    ///
    /// ## Safety
    ///
    /// Callers must pass in a reference to a statically allocated instance of
    /// `T` which remains valid (and is never aliased by a Rust reference that
    /// allows mutation) for the lifetime of the program.
    pub const unsafe fn new(ptr: *const T) -> StaticRef<T> {
        StaticRef { ptr }
    }
}

impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticRef<T> {}

impl<T> core::ops::Deref for StaticRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: `new()` requires the pointed-to value to outlive the
        // program and to never be mutably aliased.
        unsafe { &*self.ptr }
    }
}

/// Whole-word mask operations on a readable and writable register.
///
/// Named bit fields go through `tock_registers::fields::Field`; these
/// operations cover the cases where the mask is computed at runtime — clock
/// enable bits selected by a [`crate::rcc::ClockGate`], packed pin
/// configuration words built by [`crate::gpio`]. Each mutation performs one
/// read and one write of the backing word; callers needing atomicity with
/// respect to other execution contexts must serialize externally.
///
/// Bit indices out of the register width are caller errors and are not
/// checked here.
pub trait RegisterOps {
    /// The register word type.
    type Word: UIntLike;

    /// `reg <- reg | mask` as one read and one write.
    fn or(&self, mask: Self::Word);

    /// `reg <- reg & mask` as one read and one write.
    fn and(&self, mask: Self::Word);

    /// `reg <- reg ^ mask` as one read and one write.
    fn xor(&self, mask: Self::Word);

    /// `reg <- (reg & and_mask) | or_mask` as one read and one write.
    fn and_or(&self, and_mask: Self::Word, or_mask: Self::Word);

    /// Whether bit `index` is set.
    fn test_bit(&self, index: usize) -> bool;
}

impl<W, R, S> RegisterOps for S
where
    W: UIntLike + From<u8> + BitAnd<Output = W> + BitOr<Output = W> + BitXor<Output = W> + Not<Output = W> + Shl<usize, Output = W>,
    R: RegisterLongName,
    S: Readable<T = W, R = R> + Writeable<T = W, R = R>,
{
    type Word = W;

    fn or(&self, mask: W) {
        self.set(self.get() | mask);
    }

    fn and(&self, mask: W) {
        self.set(self.get() & mask);
    }

    fn xor(&self, mask: W) {
        self.set(self.get() ^ mask);
    }

    fn and_or(&self, and_mask: W, or_mask: W) {
        self.set((self.get() & and_mask) | or_mask);
    }

    fn test_bit(&self, index: usize) -> bool {
        self.get() & (W::from(1u8) << index) != W::zero()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> ReadWrite<u32> {
        // All-zero cells are a valid initial state for the test registers.
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn mask_operations() {
        let reg = fresh();
        reg.or(0b1010);
        assert_eq!(0b1010, reg.get());
        reg.and(0b0010);
        assert_eq!(0b0010, reg.get());
        reg.xor(0b0110);
        assert_eq!(0b0100, reg.get());
        reg.and_or(!0b0100, 0b1000_0001);
        assert_eq!(0b1000_0001, reg.get());
    }

    #[test]
    fn and_or_is_one_write() {
        let reg = fresh();
        reg.set(0xffff_0000);
        let writes_before = reg.write_count();
        reg.and_or(0x0000_ffff, 0x0000_1234);
        assert_eq!(writes_before + 1, reg.write_count());
        assert_eq!(0x0000_1234, reg.get());
    }

    #[test]
    fn test_bit() {
        let reg = fresh();
        reg.set(1 << 21);
        assert!(reg.test_bit(21));
        assert!(!reg.test_bit(20));
        assert!(!reg.test_bit(0));
    }
}
