//! Intel 8259 driver: the chained master/slave pair found on every PC.

use super::io_ports::{inb, io_wait, outb};
use crate::platform::InterruptController;

const MASTER_COMMAND_PORT: u16 = 0x20;
const MASTER_DATA_PORT: u16 = MASTER_COMMAND_PORT + 0x01;

const SLAVE_COMMAND_PORT: u16 = 0xA0;
const SLAVE_DATA_PORT: u16 = SLAVE_COMMAND_PORT + 0x01;

/// Edge-triggered, cascade mode, ICW4 follows.
const ICW1_INIT: u8 = 0x11;
/// 8086 mode, normal EOI.
const ICW4_8086: u8 = 0x01;
/// Slave sits on master line 2.
const MASTER_CASCADE: u8 = 0x04;
const SLAVE_CASCADE_ID: u8 = 0x02;

const EOI: u8 = 0x20;

/// The chained pair, remapped so line 0 lands on `master_offset` and line 8
/// on `slave_offset`.
pub struct ChainedPics {
    master_offset: u8,
    slave_offset: u8,
}

impl ChainedPics {
    pub const fn new(master_offset: u8, slave_offset: u8) -> Self {
        Self {
            master_offset,
            slave_offset,
        }
    }
}

impl InterruptController for ChainedPics {
    fn initialize(&mut self) {
        let saved_master_mask = inb(MASTER_DATA_PORT);
        let saved_slave_mask = inb(SLAVE_DATA_PORT);

        outb(MASTER_COMMAND_PORT, ICW1_INIT);
        io_wait();
        outb(SLAVE_COMMAND_PORT, ICW1_INIT);
        io_wait();
        outb(MASTER_DATA_PORT, self.master_offset);
        io_wait();
        outb(SLAVE_DATA_PORT, self.slave_offset);
        io_wait();
        outb(MASTER_DATA_PORT, MASTER_CASCADE);
        io_wait();
        outb(SLAVE_DATA_PORT, SLAVE_CASCADE_ID);
        io_wait();
        outb(MASTER_DATA_PORT, ICW4_8086);
        io_wait();
        outb(SLAVE_DATA_PORT, ICW4_8086);
        io_wait();

        outb(MASTER_DATA_PORT, saved_master_mask);
        outb(SLAVE_DATA_PORT, saved_slave_mask);
    }

    fn acknowledge(&mut self, vector: u8) {
        // Vectors from the slave's range need EOI on both chips.
        if vector >= self.slave_offset {
            outb(SLAVE_COMMAND_PORT, EOI);
        }
        outb(MASTER_COMMAND_PORT, EOI);
    }
}
