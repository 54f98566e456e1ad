//! Protected-mode CPU control structures for an x86 kernel: the flat-model
//! GDT, a single TSS for ring3 -> ring0 stack switching, the IDT wiring CPU
//! exceptions (0..=31), remapped hardware IRQs (32..=47) and the reserved
//! software vector (0x80) to their entry stubs, and the runtime registry
//! routing fired vectors to registered handlers.
//!
//! The portable core builds and verifies the tables against the
//! [`platform`] traits; the `arch` module supplies the real table-register
//! loads, the 8259 driver and the link-time stub addresses on x86.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod descriptor;
pub mod dispatch;
pub mod gdt;
pub mod idt;
pub mod platform;
pub mod tss;

pub use dispatch::{HandlerTable, InterruptHandler, TrapFrame};
pub use platform::{InterruptController, TableLoader};

use gdt::{
    GlobalDescriptorTable, SEL_KERNEL_CODE, SEL_KERNEL_DATA, SEL_TSS, SLOT_KERNEL_CODE,
    SLOT_KERNEL_DATA, SLOT_NULL, SLOT_TSS, SLOT_USER_CODE, SLOT_USER_DATA, access, gran,
};
use idt::{InterruptDescriptorTable, SOFT_VECTOR, VectorStubs, gate};
use tss::TaskStateSegment;

/// Every table the CPU is pointed at, owned by one object so boot builds them
/// in place and they never move afterwards.
///
/// Created once, before interrupts are unmasked; the handler table may gain
/// entries later as drivers come up, but only before their vector class is
/// unmasked.
pub struct CpuTables {
    pub gdt: GlobalDescriptorTable,
    pub tss: TaskStateSegment,
    pub idt: InterruptDescriptorTable,
    pub interrupts: HandlerTable,
}

impl CpuTables {
    pub const fn new() -> Self {
        Self {
            gdt: GlobalDescriptorTable::new(),
            tss: TaskStateSegment::new(),
            idt: InterruptDescriptorTable::new(),
            interrupts: HandlerTable::new(),
        }
    }

    /// Populate all six segment slots with the flat model plus the TSS
    /// descriptor, then activate the table and the task register.
    ///
    /// Everything after the `load_segments` call executes under the new
    /// selectors; the flat model is hardware-enforced from that point on.
    pub fn build_segments(&mut self, loader: &mut dyn TableLoader) {
        self.gdt.set_descriptor(SLOT_NULL, 0, 0, 0, 0);
        self.gdt
            .set_descriptor(SLOT_KERNEL_CODE, 0, 0xFFFF_FFFF, access::KERNEL_CODE, gran::FLAT);
        self.gdt
            .set_descriptor(SLOT_KERNEL_DATA, 0, 0xFFFF_FFFF, access::KERNEL_DATA, gran::FLAT);
        self.gdt
            .set_descriptor(SLOT_USER_CODE, 0, 0xFFFF_FFFF, access::USER_CODE, gran::FLAT);
        self.gdt
            .set_descriptor(SLOT_USER_DATA, 0, 0xFFFF_FFFF, access::USER_DATA, gran::FLAT);
        // The kernel stack pointer is filled in when the first task is set
        // up; until then a ring switch must not happen.
        self.set_tss(SLOT_TSS, SEL_KERNEL_DATA, 0);

        let table = self.gdt.register();
        loader.load_segments(&table);
        loader.load_task_register(SEL_TSS);
        log::debug!("segmentation table active, {} slots", gdt::GDT_ENTRIES);
    }

    /// Write the TSS descriptor for the owned TSS into `index` and record the
    /// kernel stack used on a privilege-level transition.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_tss(&mut self, index: usize, ss0: u16, esp0: u32) {
        let base = core::ptr::from_ref(&self.tss).addr() as u32;
        let limit = (size_of::<TaskStateSegment>() - 1) as u32;
        self.gdt.set_descriptor(index, base, limit, access::TSS, gran::TSS);
        self.tss.set_kernel_stack(ss0, esp0);
    }

    /// Initialize the interrupt controller, wire every boot vector to its
    /// entry stub, then activate the table.
    ///
    /// All gates get the ring3-callable privilege bits, a uniform relaxation
    /// that lets user mode fire software interrupts. The policy is applied
    /// here, not in the gate codec.
    pub fn build_interrupts(
        &mut self,
        stubs: &VectorStubs,
        pic: &mut dyn InterruptController,
        loader: &mut dyn TableLoader,
    ) {
        pic.initialize();

        let flags = gate::KERNEL_INTERRUPT | gate::DPL_RING3;
        for (vector, &stub) in stubs.wired.iter().enumerate() {
            self.idt.set_gate(vector as u8, stub, SEL_KERNEL_CODE, flags);
        }
        self.idt.set_gate(SOFT_VECTOR, stubs.software, SEL_KERNEL_CODE, flags);

        let table = self.idt.register();
        loader.load_interrupts(&table);
        log::debug!("interrupt table active, {} vectors wired", idt::WIRED_VECTORS + 1);
    }

    /// The full boot sequence: segmentation first, then interrupts. The
    /// caller unmasks interrupt delivery afterwards, once its handlers are
    /// registered.
    pub fn init(
        &mut self,
        stubs: &VectorStubs,
        pic: &mut dyn InterruptController,
        loader: &mut dyn TableLoader,
    ) {
        self.build_segments(loader);
        self.build_interrupts(stubs, pic, loader);
    }
}
