//! Contracts for the hardware collaborators.
//!
//! The table builders talk to the CPU and the interrupt controller only
//! through these traits. The real implementations live under `arch`; tests
//! substitute recording mocks.

use crate::descriptor::DescriptorTableRegister;

/// Capability to load the CPU's table-base registers.
///
/// Implementations are trusted to be called only during single-threaded boot,
/// with register images that describe fully populated tables at addresses
/// that stay valid for the kernel's lifetime.
pub trait TableLoader {
    /// Load the segmentation table and re-form the segment registers around
    /// the new descriptors.
    fn load_segments(&mut self, table: &DescriptorTableRegister);

    /// Load the task register with a TSS selector from the active table.
    fn load_task_register(&mut self, selector: u16);

    /// Load the interrupt table.
    fn load_interrupts(&mut self, table: &DescriptorTableRegister);
}

/// The interrupt-controller collaborator.
pub trait InterruptController {
    /// Bring the controller up and remap its lines into the vector space.
    fn initialize(&mut self);

    /// Signal end-of-interrupt for the line behind `vector`. Must be called
    /// for every delivered hardware vector or the line stays masked.
    fn acknowledge(&mut self, vector: u8);
}
