use core::arch::asm;

/// Mask maskable interrupt delivery on this CPU.
pub fn disable() {
    unsafe {
        asm!("cli");
    }
}

/// Unmask interrupt delivery. Call only after the tables are built and the
/// handlers you care about are registered.
pub fn enable() {
    unsafe {
        asm!("sti");
    }
}

/// Halt until the next interrupt arrives.
pub fn wait_for_interrupts() {
    unsafe {
        asm!("hlt");
    }
}
