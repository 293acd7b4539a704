// NOTE: This is not a general 8080 emulator. It implements the instructions
// the compiler generates and the two BDOS console calls, which is enough to
// run compiled programs for testing and debugging.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

use crate::cpm::{Address, BDOS, C_READ, C_WRITE, LOAD_BASE, WARM_BOOT};
use crate::opcodes::*;

/// Top of the stack given to programs, just below the BDOS. Also the end
/// of the TPA.
const STACK_TOP: Address = 0xfe00;

/// Where the BDOS vector at address 5 points
const BDOS_STUB: Address = 0xfe06;

/// The terminal programs talk to through the BDOS
pub trait Console {
    /// Blocks for the next input byte; `None` once there will never be one
    fn read(&mut self) -> Option<u8>;
    fn write(&mut self, byte: u8);
}

/// A console backed by memory, for tests
#[derive(Default)]
pub struct BufferConsole {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl BufferConsole {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }
}

impl Console for BufferConsole {
    fn read(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write(&mut self, byte: u8) {
        self.output.push(byte);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum MachineError {
    /// The image is too large to load
    ImageTooLarge(usize),
    UnsupportedOpcode { address: Address, opcode: u8 },
    UnsupportedBdosCall(u8),
    /// The program asked for input after the console ran out
    InputExhausted,
    StepLimit(u64),
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MachineError::ImageTooLarge(size) => {
                write!(f, "image of {} bytes does not fit in the TPA", size)
            }
            MachineError::UnsupportedOpcode { address, opcode } => {
                write!(f, "unsupported opcode ${:02x} at ${:04x}", opcode, address)
            }
            MachineError::UnsupportedBdosCall(function) => {
                write!(f, "unsupported BDOS function {}", function)
            }
            MachineError::InputExhausted => write!(f, "program read past end of input"),
            MachineError::StepLimit(steps) => {
                write!(f, "program still running after {} instructions", steps)
            }
        }
    }
}

impl Error for MachineError {}

/// An 8080 with 64K of RAM running a single CP/M transient program
#[derive(Debug)]
pub struct Machine {
    mem: Vec<u8>,
    pc: Address,
    sp: Address,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    h: u8,
    l: u8,
    zero: bool,
    steps: u64,
}

impl Machine {
    /// Loads a `.COM` image at `LOAD_BASE`, ready to run. Memory outside the
    /// image is filled with `fill`, so that programs relying on memory they
    /// did not clear are caught.
    pub fn load(image: &[u8], fill: u8) -> Result<Self, MachineError> {
        if image.len() + LOAD_BASE as usize > STACK_TOP as usize {
            return Err(MachineError::ImageTooLarge(image.len()));
        }
        let mut mem = vec![fill; 0x10000];
        let base = LOAD_BASE as usize;
        mem[base..base + image.len()].copy_from_slice(image);
        // The BDOS entry vector, and a stub for it to jump to
        mem[BDOS as usize] = JP_NN;
        mem[BDOS as usize + 1..BDOS as usize + 3].copy_from_slice(&BDOS_STUB.to_le_bytes());
        mem[BDOS_STUB as usize] = RET;

        Ok(Self {
            mem,
            pc: LOAD_BASE,
            sp: STACK_TOP,
            a: fill,
            b: fill,
            c: fill,
            d: fill,
            e: fill,
            h: fill,
            l: fill,
            zero: false,
            steps: 0,
        })
    }

    pub fn peek(&self, address: Address) -> u8 {
        self.mem[address as usize]
    }

    pub fn hl(&self) -> Address {
        u16::from_le_bytes([self.l, self.h])
    }

    /// The cell `hl` points at
    fn cell(&mut self) -> &mut u8 {
        let address = self.hl() as usize;
        &mut self.mem[address]
    }

    fn set_hl(&mut self, value: Address) {
        let [l, h] = value.to_le_bytes();
        self.l = l;
        self.h = h;
    }

    fn bc(&self) -> Address {
        u16::from_le_bytes([self.c, self.b])
    }

    fn de(&self) -> Address {
        u16::from_le_bytes([self.e, self.d])
    }

    fn set_de(&mut self, value: Address) {
        let [e, d] = value.to_le_bytes();
        self.e = e;
        self.d = d;
    }

    /// Address of the next instruction
    pub fn pc(&self) -> Address {
        self.pc
    }

    /// Instructions executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn fetch(&mut self) -> u8 {
        let byte = self.mem[self.pc as usize];
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch();
        let hi = self.fetch();
        u16::from_le_bytes([lo, hi])
    }

    fn push(&mut self, value: u16) {
        for byte in value.to_be_bytes().iter() {
            self.sp = self.sp.wrapping_sub(1);
            self.mem[self.sp as usize] = *byte;
        }
    }

    fn pop(&mut self) -> u16 {
        let lo = self.mem[self.sp as usize];
        let hi = self.mem[self.sp.wrapping_add(1) as usize];
        self.sp = self.sp.wrapping_add(2);
        u16::from_le_bytes([lo, hi])
    }

    fn jump_if(&mut self, condition: bool) {
        let target = self.fetch_word();
        if condition {
            self.pc = target;
        }
    }

    fn set_a(&mut self, value: u8) {
        self.a = value;
        self.zero = value == 0;
    }

    /// Performs the BDOS call selected by `c`. Like the real BDOS, this
    /// clobbers `hl`.
    fn bdos(&mut self, console: &mut impl Console) -> Result<(), MachineError> {
        match self.c {
            C_READ => {
                let byte = console.read().ok_or(MachineError::InputExhausted)?;
                self.a = byte;
            }
            C_WRITE => {
                console.write(self.e);
                self.a = 0;
            }
            function => return Err(MachineError::UnsupportedBdosCall(function)),
        }
        self.set_hl(u16::from(self.a));
        Ok(())
    }

    /// Executes one instruction. Returns `false` once the program has
    /// returned to the CCP.
    pub fn step(&mut self, console: &mut impl Console) -> Result<bool, MachineError> {
        if self.pc == WARM_BOOT {
            return Ok(false);
        }
        if self.pc == BDOS_STUB {
            self.bdos(console)?;
        }

        let address = self.pc;
        self.steps += 1;
        match self.fetch() {
            LD_BC_NN => {
                let [c, b] = self.fetch_word().to_le_bytes();
                self.c = c;
                self.b = b;
            }
            LD_DE_NN => {
                let value = self.fetch_word();
                self.set_de(value);
            }
            LD_HL_NN => {
                let value = self.fetch_word();
                self.set_hl(value);
            }
            LD_A_HL => self.a = self.mem[self.hl() as usize],
            LD_HL_A => *self.cell() = self.a,
            LD_A_D => self.a = self.d,
            LD_E_HL => self.e = self.mem[self.hl() as usize],
            LD_HL_N => {
                let n = self.fetch();
                *self.cell() = n;
            }
            LD_C_N => self.c = self.fetch(),
            LD_E_N => self.e = self.fetch(),
            INC_HL => self.set_hl(self.hl().wrapping_add(1)),
            DEC_HL => self.set_hl(self.hl().wrapping_sub(1)),
            DEC_DE => self.set_de(self.de().wrapping_sub(1)),
            INC_IND_HL => {
                let cell = self.cell();
                *cell = cell.wrapping_add(1);
                let value = *cell;
                self.zero = value == 0;
            }
            DEC_IND_HL => {
                let cell = self.cell();
                *cell = cell.wrapping_sub(1);
                let value = *cell;
                self.zero = value == 0;
            }
            ADD_A_N => {
                let n = self.fetch();
                self.set_a(self.a.wrapping_add(n));
            }
            ADD_HL_BC => {
                self.set_hl(self.hl().wrapping_add(self.bc()));
            }
            OR_A => self.set_a(self.a),
            OR_E => self.set_a(self.a | self.e),
            CP_N => {
                let n = self.fetch();
                self.zero = self.a == n;
            }
            JP_NN => self.jump_if(true),
            JP_Z_NN => self.jump_if(self.zero),
            JP_NZ_NN => self.jump_if(!self.zero),
            CALL_NN => {
                let target = self.fetch_word();
                self.push(self.pc);
                self.pc = target;
            }
            RET => self.pc = self.pop(),
            PUSH_HL => self.push(self.hl()),
            POP_HL => {
                let value = self.pop();
                self.set_hl(value);
            }
            opcode => return Err(MachineError::UnsupportedOpcode { address, opcode }),
        }
        Ok(true)
    }

    /// Runs until the program returns to the CCP, or `max_steps`
    /// instructions have been executed
    pub fn run(
        &mut self,
        console: &mut impl Console,
        max_steps: Option<u64>,
    ) -> Result<(), MachineError> {
        while self.step(console)? {
            if let Some(max_steps) = max_steps {
                if self.steps >= max_steps {
                    return Err(MachineError::StepLimit(self.steps));
                }
            }
        }
        Ok(())
    }
}

/// Runs an image on a fresh machine with `input` queued on the console,
/// returning the machine and everything the program wrote
pub fn run_image(
    image: &[u8],
    input: &[u8],
    max_steps: Option<u64>,
) -> Result<(Machine, Vec<u8>), MachineError> {
    let mut machine = Machine::load(image, 0xff)?;
    let mut console = BufferConsole::new(input);
    machine.run(&mut console, max_steps)?;
    Ok((machine, console.output))
}
