//! Simulated chips behind fake GPIO pins.
//!
//! Every pin of one test bench shares the same device, so a pin edge is seen
//! by the device the moment it is driven.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bitbang_peripherals::delay::Delay;
use bitbang_peripherals::three_wire::{Bidirectional, Direction};
use embedded_hal::digital::v2::{InputPin, OutputPin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Data,
    Clock,
    Latch,
    ChipEnable,
}

pub trait Device {
    fn drive(&mut self, line: Line, level: bool);

    fn sample(&mut self) -> bool {
        false
    }

    fn set_direction(&mut self, _direction: Direction) {}
}

pub struct Bench<T> {
    pub device: T,
    pub log: Vec<(Line, bool)>,
    operations: usize,
    fail_at: Option<usize>,
}

impl<T> Bench<T> {
    /// Make the `nth` pin operation from now fail
    pub fn fail_on(&mut self, nth: usize) {
        self.fail_at = Some(self.operations + nth);
    }

    pub fn operations(&self) -> usize {
        self.operations
    }

    fn operate(&mut self) -> Result<(), PinFault> {
        let current = self.operations;
        self.operations += 1;
        if self.fail_at == Some(current) {
            Err(PinFault)
        } else {
            Ok(())
        }
    }
}

pub type Shared<T> = Rc<RefCell<Bench<T>>>;

pub fn bench<T>(device: T) -> Shared<T> {
    Rc::new(RefCell::new(Bench {
        device,
        log: Vec::new(),
        operations: 0,
        fail_at: None,
    }))
}

pub struct SimPin<T> {
    bench: Shared<T>,
    line: Line,
}

impl<T: Device> SimPin<T> {
    pub fn new(bench: &Shared<T>, line: Line) -> Self {
        SimPin {
            bench: Rc::clone(bench),
            line,
        }
    }

    fn drive(&mut self, level: bool) -> Result<(), PinFault> {
        let mut bench = self.bench.borrow_mut();
        bench.operate()?;
        bench.log.push((self.line, level));
        bench.device.drive(self.line, level);
        Ok(())
    }
}

impl<T: Device> OutputPin for SimPin<T> {
    type Error = PinFault;

    fn set_low(&mut self) -> Result<(), PinFault> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.drive(true)
    }
}

impl<T: Device> InputPin for SimPin<T> {
    type Error = PinFault;

    fn is_high(&self) -> Result<bool, PinFault> {
        let mut bench = self.bench.borrow_mut();
        bench.operate()?;
        Ok(bench.device.sample())
    }

    fn is_low(&self) -> Result<bool, PinFault> {
        self.is_high().map(|high| !high)
    }
}

impl<T: Device> Bidirectional for SimPin<T> {
    type Error = PinFault;

    fn set_direction(&mut self, direction: Direction) -> Result<(), PinFault> {
        let mut bench = self.bench.borrow_mut();
        bench.operate()?;
        bench.device.set_direction(direction);
        Ok(())
    }
}

pub struct NoWait;

impl Delay for NoWait {
    fn pause_millis(&mut self, _millis: u32) {}
    fn pause_nanos(&mut self, _nanos: u32) {}
}

/// Serial-in, parallel-out register. Shifts on the rising clock edge, copies
/// the stages onto the outputs on the rising latch edge. Stage 0 is Q0.
pub struct Hc595 {
    data: bool,
    clock: bool,
    latch: bool,
    stages: Vec<bool>,
    pub outputs: Vec<bool>,
    pub latches: usize,
}

impl Hc595 {
    pub fn new(width: usize) -> Self {
        Hc595 {
            data: false,
            clock: false,
            latch: false,
            stages: vec![false; width],
            outputs: vec![false; width],
            latches: 0,
        }
    }
}

impl Device for Hc595 {
    fn drive(&mut self, line: Line, level: bool) {
        match line {
            Line::Data => self.data = level,
            Line::Clock => {
                if level && !self.clock {
                    self.stages.rotate_right(1);
                    self.stages[0] = self.data;
                }
                self.clock = level;
            }
            Line::Latch => {
                if level && !self.latch {
                    self.outputs = self.stages.clone();
                    self.latches += 1;
                }
                self.latch = level;
            }
            Line::ChipEnable => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Command { bits: u8, count: u8 },
    Write { command: u8, bits: u8, count: u8 },
    Read { value: u8, armed: bool },
    Done,
}

/// DS1302 style chip: decodes a command byte, then takes or presents one data
/// byte, LSB first.
pub struct Ds1302Chip {
    pub ram: [u8; 31],
    pub rtc: [u8; 9],
    pub commands: Vec<u8>,
    pub violations: Vec<&'static str>,
    ce: bool,
    clock: bool,
    io: bool,
    host_direction: Option<Direction>,
    phase: Phase,
}

impl Ds1302Chip {
    pub fn new() -> Self {
        Ds1302Chip {
            ram: [0; 31],
            rtc: [0; 9],
            commands: Vec::new(),
            violations: Vec::new(),
            ce: false,
            clock: false,
            io: false,
            host_direction: None,
            phase: Phase::Idle,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.ce
    }

    fn register(&mut self, command: u8) -> Option<&mut u8> {
        let index = usize::from((command >> 1) & 0x1F);
        if command & 0x40 != 0 {
            self.ram.get_mut(index)
        } else {
            self.rtc.get_mut(index)
        }
    }

    fn decode(&mut self, command: u8) -> Phase {
        self.commands.push(command);
        if command & 0x80 == 0 {
            self.violations.push("command without bit 7 set");
            return Phase::Done;
        }
        if command & 0x01 == 0 {
            Phase::Write {
                command,
                bits: 0,
                count: 0,
            }
        } else {
            let value = self.register(command).map_or(0, |r| *r);
            Phase::Read {
                value,
                armed: false,
            }
        }
    }

    fn rising_edge(&mut self) {
        let bit = u8::from(self.io);
        let phase = self.phase;
        self.phase = match phase {
            Phase::Command { bits, count } => {
                let bits = bits | bit << count;
                if count == 7 {
                    self.decode(bits)
                } else {
                    Phase::Command {
                        bits,
                        count: count + 1,
                    }
                }
            }
            Phase::Write {
                command,
                bits,
                count,
            } => {
                let bits = bits | bit << count;
                if count == 7 {
                    if let Some(register) = self.register(command) {
                        *register = bits;
                    }
                    Phase::Done
                } else {
                    Phase::Write {
                        command,
                        bits,
                        count: count + 1,
                    }
                }
            }
            Phase::Read { value, .. } => Phase::Read { value, armed: true },
            other => other,
        };
    }

    fn falling_edge(&mut self) {
        if let Phase::Read { value, armed: true } = self.phase {
            self.phase = Phase::Read {
                value: value >> 1,
                armed: false,
            };
        }
    }
}

impl Device for Ds1302Chip {
    fn drive(&mut self, line: Line, level: bool) {
        match line {
            Line::ChipEnable => {
                if level && !self.ce {
                    if self.clock {
                        self.violations.push("CE raised while clock high");
                    }
                    self.phase = Phase::Command { bits: 0, count: 0 };
                } else if !level {
                    self.phase = Phase::Idle;
                }
                self.ce = level;
            }
            Line::Clock => {
                if self.ce && level && !self.clock {
                    self.rising_edge();
                } else if self.ce && !level && self.clock {
                    self.falling_edge();
                }
                self.clock = level;
            }
            Line::Data => {
                if self.host_direction != Some(Direction::Output) {
                    self.violations.push("I/O driven while not an output");
                }
                self.io = level;
            }
            Line::Latch => {}
        }
    }

    fn sample(&mut self) -> bool {
        if self.host_direction != Some(Direction::Input) {
            self.violations.push("I/O sampled while not an input");
        }
        match self.phase {
            Phase::Read { value, .. } => value & 1 == 1,
            _ => false,
        }
    }

    fn set_direction(&mut self, direction: Direction) {
        if self.clock {
            self.violations.push("direction switched mid bit");
        }
        self.host_direction = Some(direction);
    }
}

/// Wire that plays back, in order, every bit clocked into it
pub struct Loopback {
    captured: VecDeque<bool>,
    io: bool,
    clock: bool,
    direction: Option<Direction>,
}

impl Loopback {
    pub fn new() -> Self {
        Loopback {
            captured: VecDeque::new(),
            io: false,
            clock: false,
            direction: None,
        }
    }

    pub fn pending(&self) -> usize {
        self.captured.len()
    }
}

impl Device for Loopback {
    fn drive(&mut self, line: Line, level: bool) {
        match line {
            Line::Data => self.io = level,
            Line::Clock => {
                let rising = level && !self.clock;
                let falling = !level && self.clock;
                match self.direction {
                    Some(Direction::Output) if rising => self.captured.push_back(self.io),
                    Some(Direction::Input) if falling => {
                        self.captured.pop_front();
                    }
                    _ => {}
                }
                self.clock = level;
            }
            _ => {}
        }
    }

    fn sample(&mut self) -> bool {
        self.captured.front().copied().unwrap_or(false)
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }
}
