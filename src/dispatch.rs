//! Runtime routing of fired vectors to registered handlers.
//!
//! The entry stubs save the interrupted context into a [`TrapFrame`] and call
//! one of the two dispatch paths. Exceptions without a handler are logged and
//! survived; hardware lines without a handler are normal and stay silent, but
//! are always acknowledged so the controller keeps delivering.
//!
//! The table itself is a plain array. The only legitimate writer is boot or
//! driver-initialization code running before the matching vector class is
//! unmasked; dispatch assumes a single core and no concurrent registration.

use crate::idt::IDT_ENTRIES;
use crate::platform::InterruptController;

/// CPU state captured by an entry stub, in push order: the data segment, the
/// `pusha` block, the vector and error code pushed by the stub, then the
/// frame the CPU itself pushed.
#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
pub struct TrapFrame {
    /// Data segment selector active when the vector fired.
    pub ds: u32,
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    pub esp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
    /// Vector number, pushed by the entry stub.
    pub vector: u32,
    /// Hardware error code, or zero for vectors without one.
    pub error_code: u32,
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    /// Only valid when the interrupt crossed over from ring 3.
    pub user_esp: u32,
    pub ss: u32,
}

/// A registered handler. Receives the mutable snapshot and may rewrite
/// return-state fields (`eip`, `eflags`, ...) to redirect execution.
pub type InterruptHandler = fn(&mut TrapFrame);

/// Vector -> handler routing for all 256 vectors.
pub struct HandlerTable {
    handlers: [Option<InterruptHandler>; IDT_ENTRIES],
}

impl HandlerTable {
    pub const fn new() -> Self {
        Self {
            handlers: [None; IDT_ENTRIES],
        }
    }

    /// Route `vector` to `handler`. Re-registration replaces the previous
    /// handler; the last writer wins.
    pub fn register(&mut self, vector: u8, handler: InterruptHandler) {
        self.handlers[usize::from(vector)] = Some(handler);
    }

    /// Drop the routing for `vector`. Subsequent deliveries behave as if the
    /// vector had never been registered.
    pub fn unregister(&mut self, vector: u8) {
        self.handlers[usize::from(vector)] = None;
    }

    pub fn handler(&self, vector: u8) -> Option<InterruptHandler> {
        self.handlers[usize::from(vector)]
    }

    /// Dispatch a CPU exception. An unhandled exception is logged and
    /// survived, double fault included; callers that want to die on fatal
    /// vectors must register a handler that does so.
    pub fn handle_exception(&self, frame: &mut TrapFrame) {
        match self.handlers[frame.vector as usize] {
            Some(handler) => handler(frame),
            None => log::warn!("unhandled interrupt: {}", frame.vector),
        }
    }

    /// Dispatch a hardware interrupt. The controller is acknowledged before
    /// the lookup, handler or not; a line without a handler is otherwise
    /// ignored.
    pub fn handle_irq(&self, frame: &mut TrapFrame, pic: &mut dyn InterruptController) {
        pic.acknowledge(frame.vector as u8);
        if let Some(handler) = self.handlers[frame.vector as usize] {
            handler(frame);
        }
    }
}
