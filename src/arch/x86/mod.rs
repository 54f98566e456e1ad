//! The x86 backend: real table-register loads, the 8259 pair, the link-time
//! entry stubs, and the global table context the stubs dispatch into.

pub mod interrupts;
pub mod io_ports;
pub mod pic;

use core::arch::asm;

use lazy_static::lazy_static;
use spin::Mutex;

use crate::CpuTables;
use crate::descriptor::DescriptorTableRegister;
use crate::dispatch::{InterruptHandler, TrapFrame};
use crate::gdt::{SEL_KERNEL_CODE, SEL_KERNEL_DATA};
use crate::idt::{IRQ_BASE, VectorStubs};
use crate::platform::TableLoader;
use pic::ChainedPics;

/// Loads the real table-base registers. Only used during boot, on tables
/// pinned inside this module's static context.
pub struct ProtectedModeLoader;

impl TableLoader for ProtectedModeLoader {
    fn load_segments(&mut self, table: &DescriptorTableRegister) {
        unsafe {
            // lgdt, then a far return through the new code descriptor and a
            // rewrite of every data selector against the new table.
            asm!(
                "lgdt [{table}]",
                "push {code}",
                "lea eax, [2f]",
                "push eax",
                "retf",
                "2:",
                "mov eax, {data}",
                "mov ds, eax",
                "mov es, eax",
                "mov fs, eax",
                "mov gs, eax",
                "mov ss, eax",
                table = in(reg) table,
                code = const SEL_KERNEL_CODE as u32,
                data = const SEL_KERNEL_DATA as u32,
                out("eax") _,
                options(preserves_flags),
            );
        }
    }

    fn load_task_register(&mut self, selector: u16) {
        unsafe {
            asm!("ltr {0:x}", in(reg) selector, options(readonly, nostack, preserves_flags));
        }
    }

    fn load_interrupts(&mut self, table: &DescriptorTableRegister) {
        unsafe {
            asm!("lidt [{0}]", in(reg) table, options(readonly, nostack, preserves_flags));
        }
    }
}

// Entry stubs from the platform's assembly layer. Each pushes its vector
// (and a zero error code where the CPU pushes none), saves the TrapFrame and
// calls isr_handler or irq_handler; their addresses are all this crate needs.
unsafe extern "C" {
    fn isr0();
    fn isr1();
    fn isr2();
    fn isr3();
    fn isr4();
    fn isr5();
    fn isr6();
    fn isr7();
    fn isr8();
    fn isr9();
    fn isr10();
    fn isr11();
    fn isr12();
    fn isr13();
    fn isr14();
    fn isr15();
    fn isr16();
    fn isr17();
    fn isr18();
    fn isr19();
    fn isr20();
    fn isr21();
    fn isr22();
    fn isr23();
    fn isr24();
    fn isr25();
    fn isr26();
    fn isr27();
    fn isr28();
    fn isr29();
    fn isr30();
    fn isr31();
    fn irq0();
    fn irq1();
    fn irq2();
    fn irq3();
    fn irq4();
    fn irq5();
    fn irq6();
    fn irq7();
    fn irq8();
    fn irq9();
    fn irq10();
    fn irq11();
    fn irq12();
    fn irq13();
    fn irq14();
    fn irq15();
    fn isr128();
}

lazy_static! {
    /// Link-time entry points for every wired vector, in vector order.
    static ref STUBS: VectorStubs = VectorStubs {
        wired: [
            isr0 as usize as u32, isr1 as usize as u32, isr2 as usize as u32, isr3 as usize as u32,
            isr4 as usize as u32, isr5 as usize as u32, isr6 as usize as u32, isr7 as usize as u32,
            isr8 as usize as u32, isr9 as usize as u32, isr10 as usize as u32, isr11 as usize as u32,
            isr12 as usize as u32, isr13 as usize as u32, isr14 as usize as u32, isr15 as usize as u32,
            isr16 as usize as u32, isr17 as usize as u32, isr18 as usize as u32, isr19 as usize as u32,
            isr20 as usize as u32, isr21 as usize as u32, isr22 as usize as u32, isr23 as usize as u32,
            isr24 as usize as u32, isr25 as usize as u32, isr26 as usize as u32, isr27 as usize as u32,
            isr28 as usize as u32, isr29 as usize as u32, isr30 as usize as u32, isr31 as usize as u32,
            irq0 as usize as u32, irq1 as usize as u32, irq2 as usize as u32, irq3 as usize as u32,
            irq4 as usize as u32, irq5 as usize as u32, irq6 as usize as u32, irq7 as usize as u32,
            irq8 as usize as u32, irq9 as usize as u32, irq10 as usize as u32, irq11 as usize as u32,
            irq12 as usize as u32, irq13 as usize as u32, irq14 as usize as u32, irq15 as usize as u32,
        ],
        software: isr128 as usize as u32,
    };
}

/// The one table context the CPU is pointed at. Lives here so its address
/// never changes after activation.
static TABLES: Mutex<CpuTables> = Mutex::new(CpuTables::new());

static PICS: Mutex<ChainedPics> = Mutex::new(ChainedPics::new(IRQ_BASE, IRQ_BASE + 8));

/// Build and activate the protected-mode tables. Single-threaded boot only;
/// interrupt delivery stays masked throughout and the caller unmasks it once
/// its handlers are registered.
pub fn init() {
    interrupts::disable();
    let mut tables = TABLES.lock();
    let mut pics = PICS.lock();
    tables.init(&STUBS, &mut *pics, &mut ProtectedModeLoader);
    log::info!("protected-mode tables active");
}

/// Route `vector` to `handler`. Last registration wins. Must complete before
/// the vector's class is unmasked.
pub fn register_interrupt_handler(vector: u8, handler: InterruptHandler) {
    TABLES.lock().interrupts.register(vector, handler);
}

/// Drop the routing for `vector`.
pub fn unregister_interrupt_handler(vector: u8) {
    TABLES.lock().interrupts.unregister(vector);
}

/// Record the kernel stack used on the next ring3 -> ring0 transition.
pub fn set_kernel_stack(esp0: u32) {
    TABLES.lock().tss.set_kernel_stack(SEL_KERNEL_DATA, esp0);
}

/// Exception dispatch entry, called by the `isr*` stubs after state save.
#[unsafe(no_mangle)]
pub extern "C" fn isr_handler(frame: &mut TrapFrame) {
    TABLES.lock().interrupts.handle_exception(frame);
}

/// Hardware-IRQ dispatch entry, called by the `irq*` stubs after state save.
#[unsafe(no_mangle)]
pub extern "C" fn irq_handler(frame: &mut TrapFrame) {
    let tables = TABLES.lock();
    let mut pics = PICS.lock();
    tables.interrupts.handle_irq(frame, &mut *pics);
}
