//! Port-mapped I/O latches and dispatch.
//!
//! The Triton hangs everything off eight ports: keyboard in on 0, UART
//! status on 1, tape data out/in on 2/4, LEDs on 3, the VDU latch on 5,
//! spare latches on 6 and the oscillator/tape-relay latch on 7. `IoState`
//! is the second of the machine's two records (the CPU being the first)
//! and owns every peripheral latch plus the VDU controller and tape deck.

use crate::tape::{TapeDeck, TapeMedia, TapeStatus};
use crate::vdu::VduState;

/// Keyboard latch (IC 49).
pub const PORT_KEYBOARD: u8 = 0;
/// UART status register.
pub const PORT_UART_STATUS: u8 = 1;
/// Tape data out.
pub const PORT_TAPE_OUT: u8 = 2;
/// LED latch (IC 50).
pub const PORT_LEDS: u8 = 3;
/// Tape data in.
pub const PORT_TAPE_IN: u8 = 4;
/// VDU latch (IC 51).
pub const PORT_VDU: u8 = 5;
/// Spare output latches (IC 52), top two bits readable back on the bus.
pub const PORT_SPARE: u8 = 6;
/// Oscillator gate and tape relay latch.
pub const PORT_CONTROL: u8 = 7;

/// The UART reports transmitter-ready and receiver-ready permanently.
pub const UART_READY: u8 = 0x11;

/// Peripheral latches and the devices behind them.
pub struct IoState {
    /// Keyboard latch; bit 7 is the strobe, cleared when the key lifts.
    pub key_buffer: u8,
    /// LED latch; a zero bit lights its LED.
    pub led_buffer: u8,
    /// Last byte written to the VDU port, for change detection.
    vdu_buffer: u8,
    /// Top two bits of the last write to port 6.
    pub port6: u8,
    /// Audio tone gate, port 7 bit 6.
    pub oscillator: bool,
    /// Tape power relay, port 7 bit 7.
    pub tape_relay: bool,
    pub uart_status: u8,
    pub vdu: VduState,
    pub tape: TapeDeck,
}

impl IoState {
    pub fn new() -> Self {
        Self::with_tape_deck(TapeDeck::default())
    }

    /// Build with a specific tape medium (tests use an in-memory reel).
    pub fn with_tape(media: Box<dyn TapeMedia>) -> Self {
        Self::with_tape_deck(TapeDeck::new(media))
    }

    fn with_tape_deck(tape: TapeDeck) -> Self {
        Self {
            key_buffer: 0,
            led_buffer: 0,
            vdu_buffer: 0,
            port6: 0,
            oscillator: false,
            tape_relay: false,
            uart_status: UART_READY,
            vdu: VduState::new(),
            tape,
        }
    }

    /// CPU IN: read a peripheral port into the accumulator.
    pub fn port_in(&mut self, port: u8) -> u8 {
        match port {
            PORT_KEYBOARD => {
                // Consume on read: a second IN sees an empty latch.
                let value = self.key_buffer;
                self.key_buffer = 0;
                value
            }
            PORT_UART_STATUS => self.uart_status,
            PORT_TAPE_IN => {
                if self.tape_relay {
                    self.tape.read_byte()
                } else {
                    0x00
                }
            }
            _ => 0x00,
        }
    }

    /// CPU OUT: write the accumulator to a peripheral port.
    ///
    /// Takes the memory image because a VDU strobe mutates the video page.
    pub fn port_out(&mut self, memory: &mut [u8], port: u8, value: u8) {
        match port {
            PORT_TAPE_OUT => {
                if self.tape_relay {
                    self.tape.write_byte(value);
                }
            }
            PORT_LEDS => self.led_buffer = value,
            PORT_VDU => {
                // The controller strobes only when the latched byte changes
                // and the new byte has its high bit set.
                if self.vdu_buffer != value {
                    self.vdu_buffer = value;
                    if value & 0x80 != 0 {
                        self.vdu.strobe(memory, value);
                    }
                }
            }
            PORT_SPARE => self.port6 = value >> 6,
            PORT_CONTROL => {
                self.oscillator = value & 0x40 != 0;
                let relay = value & 0x80 != 0;
                if relay && !self.tape_relay {
                    self.tape_relay = true;
                }
                if !relay && self.tape_relay {
                    // Relay drop closes whatever stream was in flight.
                    self.tape.stop();
                    self.tape_relay = false;
                }
            }
            _ => {}
        }
    }

    /// Latch a mapped key code from the host (strobe bit set on press).
    pub fn key_event(&mut self, code: u8, pressed: bool) {
        self.key_buffer = if pressed { code | 0x80 } else { code };
    }

    pub fn tape_status(&self) -> TapeStatus {
        self.tape.status()
    }
}

impl Default for IoState {
    fn default() -> Self {
        Self::new()
    }
}
