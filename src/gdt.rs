//! The Global Descriptor Table: six fixed slots implementing the flat model.
//!
//! Slot order is load-bearing: the selectors below are compiled into far
//! jumps and into the TSS, so the table is never reordered or grown.

use crate::descriptor::{DescriptorTableRegister, SegmentDescriptor};

pub const GDT_ENTRIES: usize = 6;

// Slot indices.
pub const SLOT_NULL: usize = 0;
pub const SLOT_KERNEL_CODE: usize = 1;
pub const SLOT_KERNEL_DATA: usize = 2;
pub const SLOT_USER_CODE: usize = 3;
pub const SLOT_USER_DATA: usize = 4;
pub const SLOT_TSS: usize = 5;

// Selectors as loaded into segment registers. The user selectors carry
// RPL 3 so ring-3 code can actually use them.
pub const SEL_NULL: u16 = 0x00;
pub const SEL_KERNEL_CODE: u16 = 0x08;
pub const SEL_KERNEL_DATA: u16 = 0x10;
pub const SEL_USER_CODE: u16 = 0x18 | 3;
pub const SEL_USER_DATA: u16 = 0x20 | 3;
pub const SEL_TSS: u16 = 0x28;

/// Access-byte flags.
pub mod access {
    /// For data segments, writable; for code segments, readable.
    pub const WRITABLE: u8 = 1 << 1;
    pub const EXECUTABLE: u8 = 1 << 3;
    /// Code/data descriptor, as opposed to a system descriptor.
    pub const CODE_DATA: u8 = 1 << 4;
    pub const DPL_RING3: u8 = 3 << 5;
    pub const PRESENT: u8 = 1 << 7;

    pub const KERNEL_CODE: u8 = PRESENT | CODE_DATA | EXECUTABLE | WRITABLE; // 0x9A
    pub const KERNEL_DATA: u8 = PRESENT | CODE_DATA | WRITABLE; // 0x92
    pub const USER_CODE: u8 = KERNEL_CODE | DPL_RING3; // 0xFA
    pub const USER_DATA: u8 = KERNEL_DATA | DPL_RING3; // 0xF2
    /// 32-bit available TSS (system type 0b1001).
    pub const TSS: u8 = PRESENT | 0x09; // 0x89
}

/// Granularity-byte flag nibble (the upper four bits of byte 6).
pub mod gran {
    /// Limit is counted in 4 KiB pages instead of bytes.
    pub const PAGE_LIMIT: u8 = 1 << 7;
    /// 32-bit default operand size.
    pub const SIZE_32: u8 = 1 << 6;

    /// Flat code/data segments: page-scaled limit, 32-bit.
    pub const FLAT: u8 = PAGE_LIMIT | SIZE_32; // 0xC0
    /// The TSS limit is byte-scaled.
    pub const TSS: u8 = SIZE_32; // 0x40
}

#[derive(Debug)]
#[repr(C, align(8))]
pub struct GlobalDescriptorTable {
    entries: [SegmentDescriptor; GDT_ENTRIES],
}

impl GlobalDescriptorTable {
    pub const fn new() -> Self {
        Self {
            entries: [SegmentDescriptor::NULL; GDT_ENTRIES],
        }
    }

    /// Write one descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not one of the six slots. Callers are boot-time
    /// code using the `SLOT_*` constants; anything else is a bug.
    pub fn set_descriptor(&mut self, index: usize, base: u32, limit: u32, access: u8, granularity: u8) {
        self.entries[index] = SegmentDescriptor::new(base, limit, access, granularity);
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn entry(&self, index: usize) -> SegmentDescriptor {
        self.entries[index]
    }

    /// The register image describing this table.
    pub fn register(&self) -> DescriptorTableRegister {
        DescriptorTableRegister {
            size: (size_of::<Self>() - 1) as u16,
            address: self.entries.as_ptr().addr() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_constants_match_hardware_values() {
        assert_eq!(access::KERNEL_CODE, 0x9A);
        assert_eq!(access::KERNEL_DATA, 0x92);
        assert_eq!(access::USER_CODE, 0xFA);
        assert_eq!(access::USER_DATA, 0xF2);
        assert_eq!(access::TSS, 0x89);
        assert_eq!(gran::FLAT, 0xC0);
        assert_eq!(gran::TSS, 0x40);
    }

    #[test]
    fn selectors_index_their_slots() {
        assert_eq!(SEL_KERNEL_CODE as usize, SLOT_KERNEL_CODE * 8);
        assert_eq!(SEL_KERNEL_DATA as usize, SLOT_KERNEL_DATA * 8);
        assert_eq!((SEL_USER_CODE & !3) as usize, SLOT_USER_CODE * 8);
        assert_eq!((SEL_USER_DATA & !3) as usize, SLOT_USER_DATA * 8);
        assert_eq!(SEL_TSS as usize, SLOT_TSS * 8);
    }

    #[test]
    fn descriptor_write_reads_back() {
        let mut gdt = GlobalDescriptorTable::new();
        gdt.set_descriptor(SLOT_KERNEL_CODE, 0, 0xFFFF_FFFF, access::KERNEL_CODE, gran::FLAT);
        let entry = gdt.entry(SLOT_KERNEL_CODE);
        assert_eq!(entry.base(), 0);
        assert_eq!(entry.limit(), 0xF_FFFF);
        assert_eq!(entry.access(), access::KERNEL_CODE);
        assert_eq!(entry.granularity_flags(), gran::FLAT);
    }

    #[test]
    #[should_panic]
    fn out_of_range_slot_is_rejected() {
        let mut gdt = GlobalDescriptorTable::new();
        gdt.set_descriptor(GDT_ENTRIES, 0, 0, 0, 0);
    }

    #[test]
    fn register_image_covers_whole_table() {
        let gdt = GlobalDescriptorTable::new();
        let reg = gdt.register();
        let size = reg.size;
        let address = reg.address;
        assert_eq!(size, 6 * 8 - 1);
        assert_eq!(address, core::ptr::from_ref(&gdt).addr() as u32);
    }

    #[test]
    fn table_layout() {
        assert_eq!(size_of::<GlobalDescriptorTable>(), 48);
        assert_eq!(align_of::<GlobalDescriptorTable>(), 8);
    }
}
