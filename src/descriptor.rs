//! Bit-exact encodings of the hardware descriptor formats.
//!
//! Everything in this module is pure data packing: no table state, no CPU
//! access. The segment descriptor is kept as a raw `u64` image; the gate
//! descriptor keeps its fields explicit because the selector and flags bytes
//! are read back individually at dispatch-verification time.

use bit_field::BitField;

/// In-memory operand of the `lgdt`/`lidt` instructions: the size of the table
/// in bytes minus one, followed by its linear base address.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed(2))]
pub struct DescriptorTableRegister {
    pub size: u16,
    pub address: u32,
}

/// Split a 32-bit entry address into the low/high halves a gate stores.
pub const fn split_offset(offset: u32) -> (u16, u16) {
    ((offset & 0xFFFF) as u16, (offset >> 16) as u16)
}

/// Reassemble a gate's offset halves into the original address.
pub const fn join_offset(low: u16, high: u16) -> u32 {
    ((high as u32) << 16) | low as u32
}

/// One 8-byte segment descriptor.
///
/// Layout, low bit to high: `limit_lo:16, base_lo:16, base_mid:8, access:8,
/// limit_hi:4, flags:4, base_hi:8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SegmentDescriptor(u64);

impl SegmentDescriptor {
    /// The mandatory all-zero descriptor in slot 0.
    pub const NULL: Self = Self(0);

    /// Pack `base`, `limit`, the access byte and the granularity flag nibble
    /// (upper four bits of `granularity`). Limits wider than 20 bits are
    /// truncated, which is what the flat-model callers rely on.
    pub fn new(base: u32, limit: u32, access: u8, granularity: u8) -> Self {
        let mut raw = 0u64;
        raw.set_bits(0..16, u64::from(limit & 0xFFFF));
        raw.set_bits(16..32, u64::from(base & 0xFFFF));
        raw.set_bits(32..40, u64::from((base >> 16) & 0xFF));
        raw.set_bits(40..48, u64::from(access));
        raw.set_bits(48..52, u64::from((limit >> 16) & 0x0F));
        raw.set_bits(52..56, u64::from(granularity >> 4));
        raw.set_bits(56..64, u64::from(base >> 24));
        Self(raw)
    }

    pub fn base(&self) -> u32 {
        (self.0.get_bits(16..32) as u32)
            | ((self.0.get_bits(32..40) as u32) << 16)
            | ((self.0.get_bits(56..64) as u32) << 24)
    }

    /// The 20-bit limit field. Scaling by the granularity flag is the CPU's
    /// job, not the decoder's.
    pub fn limit(&self) -> u32 {
        (self.0.get_bits(0..16) as u32) | ((self.0.get_bits(48..52) as u32) << 16)
    }

    pub fn access(&self) -> u8 {
        self.0.get_bits(40..48) as u8
    }

    /// The flag nibble, returned in the upper half of the byte so it compares
    /// directly against the value handed to [`SegmentDescriptor::new`].
    pub fn granularity_flags(&self) -> u8 {
        (self.0.get_bits(52..56) as u8) << 4
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// One 8-byte interrupt gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct GateDescriptor {
    offset_low: u16,
    selector: u16,
    zero: u8,
    flags: u8,
    offset_high: u16,
}

impl GateDescriptor {
    pub const fn empty() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            zero: 0,
            flags: 0,
            offset_high: 0,
        }
    }

    pub const fn new(offset: u32, selector: u16, flags: u8) -> Self {
        let (offset_low, offset_high) = split_offset(offset);
        Self {
            offset_low,
            selector,
            zero: 0,
            flags,
            offset_high,
        }
    }

    pub const fn offset(&self) -> u32 {
        join_offset(self.offset_low, self.offset_high)
    }

    pub const fn selector(&self) -> u16 {
        self.selector
    }

    pub const fn flags(&self) -> u8 {
        self.flags
    }

    pub fn is_present(&self) -> bool {
        self.flags.get_bit(7)
    }

    /// Descriptor privilege level: the lowest ring allowed to fire the gate
    /// with a software interrupt.
    pub fn dpl(&self) -> u8 {
        self.flags.get_bits(5..7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_split_halves() {
        assert_eq!(split_offset(0x1234_5678), (0x5678, 0x1234));
        assert_eq!(split_offset(0), (0, 0));
        assert_eq!(split_offset(u32::MAX), (0xFFFF, 0xFFFF));
    }

    #[test]
    fn offset_round_trip() {
        for offset in [0, 1, 0xFFFF, 0x0001_0000, 0xDEAD_BEEF, u32::MAX] {
            let (low, high) = split_offset(offset);
            assert_eq!(join_offset(low, high), offset);
        }
        // Stride sweep across the full 32-bit range; the odd stride keeps
        // both halves churning.
        for offset in (0..=u32::MAX).step_by(0xF00F) {
            let (low, high) = split_offset(offset);
            assert_eq!(join_offset(low, high), offset);
        }
    }

    #[test]
    fn flat_model_images() {
        // The four flat 4 GiB descriptors have well-known raw encodings.
        let kcode = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0x9A, 0xC0);
        let kdata = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0x92, 0xC0);
        let ucode = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0xFA, 0xC0);
        let udata = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0xF2, 0xC0);
        assert_eq!(kcode.raw(), 0x00CF_9A00_0000_FFFF);
        assert_eq!(kdata.raw(), 0x00CF_9200_0000_FFFF);
        assert_eq!(ucode.raw(), 0x00CF_FA00_0000_FFFF);
        assert_eq!(udata.raw(), 0x00CF_F200_0000_FFFF);
    }

    #[test]
    fn segment_fields_decode() {
        let desc = SegmentDescriptor::new(0x1234_5678, 0xA_BCDE, 0x89, 0x40);
        assert_eq!(desc.base(), 0x1234_5678);
        assert_eq!(desc.limit(), 0xA_BCDE);
        assert_eq!(desc.access(), 0x89);
        assert_eq!(desc.granularity_flags(), 0x40);
    }

    #[test]
    fn null_descriptor_is_zero() {
        assert_eq!(SegmentDescriptor::NULL.raw(), 0);
        assert_eq!(SegmentDescriptor::new(0, 0, 0, 0), SegmentDescriptor::NULL);
    }

    #[test]
    fn gate_fields_decode() {
        let gate = GateDescriptor::new(0xCAFE_BABE, 0x08, 0xEE);
        assert_eq!(gate.offset(), 0xCAFE_BABE);
        assert_eq!(gate.selector(), 0x08);
        assert_eq!(gate.flags(), 0xEE);
        assert!(gate.is_present());
        assert_eq!(gate.dpl(), 3);
    }

    #[test]
    fn empty_gate_is_absent() {
        let gate = GateDescriptor::empty();
        assert!(!gate.is_present());
        assert_eq!(gate.offset(), 0);
        assert_eq!(gate.selector(), 0);
    }

    #[test]
    fn layout_sizes() {
        assert_eq!(size_of::<SegmentDescriptor>(), 8);
        assert_eq!(size_of::<GateDescriptor>(), 8);
        assert_eq!(size_of::<DescriptorTableRegister>(), 6);
    }
}
