use std::io::Read;

use crate::codegen::*;
use crate::cpm::{self, WARM_BOOT};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::opcodes::*;
use crate::stack::{LoopStack, DEFAULT_MAX_DEPTH};
use crate::token::{Token, Tokenizer};

/// 30000 cells is the traditional Brainfuck tape size.
///
/// Memory past the code is not bounds checked, so the whole TPA is in
/// practice usable, but only this much of it is zeroed at startup.
pub const DEFAULT_TAPE_SIZE: u16 = 30000;

/// Offset of the clearing loop within the preamble
const CLEAR_LOOP: usize = 6;

const PREAMBLE_LEN: usize = 18;
const POSTAMBLE_LEN: usize = 3;

/// Length of the image of a program with no commands, the smallest there is
pub const EMPTY_IMAGE_LEN: usize = PREAMBLE_LEN + POSTAMBLE_LEN;

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Number of cells zeroed by the preamble. The tape must fit between
    /// the image and the top of memory; 0 would mean 65536 cells, which
    /// never does.
    pub tape_size: u16,
    /// Maximum number of loops open at once
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Translation of one program into a CP/M `.COM` image.
///
/// Creating it emits the preamble; tokens are then fed in source order, and
/// `finish` emits the postamble and fills in the tape address. The tape
/// starts right after the code, so its address is only known at the end.
pub struct Compiler<'a> {
    code: Emitter<'a>,
    loops: LoopStack,
    /// Offsets of the two `ld hl, $tape` operands in the preamble
    tape_fields: [usize; 2],
    tape_size: u16,
}

impl<'a> Compiler<'a> {
    pub fn new(config: Config) -> Self {
        Self::with_emitter(Emitter::new(), config)
    }

    /// Like `new`, calling `progress` each time the code buffer grows
    pub fn with_progress(config: Config, progress: &'a mut dyn FnMut(usize)) -> Self {
        Self::with_emitter(Emitter::with_progress(progress), config)
    }

    fn with_emitter(mut code: Emitter<'a>, config: Config) -> Self {
        let tape_fields = emit_preamble(&mut code, config.tape_size);
        Self {
            code,
            loops: LoopStack::new(config.max_depth),
            tape_fields,
            tape_size: config.tape_size,
        }
    }

    /// Generates code for one token found at `pos` in the source
    pub fn push(&mut self, pos: usize, token: Token) -> Result<(), CompileError> {
        match token {
            Token::Add(n) => emit_add(&mut self.code, n),
            Token::Move(n) => emit_right(&mut self.code, n),
            Token::Output => emit_output(&mut self.code),
            Token::Input => emit_input(&mut self.code),
            Token::LoopStart => emit_loop_start(&mut self.code, &mut self.loops, pos)?,
            Token::LoopEnd => emit_loop_end(&mut self.code, &mut self.loops, pos)?,
        }

        let size = self.code.offset();
        if !cpm::fits(size) {
            return Err(CompileError::ImageTooLarge { size });
        }
        Ok(())
    }

    /// Current number of open loops
    pub fn depth(&self) -> usize {
        self.loops.depth()
    }

    /// Emits the postamble and patches the tape address, returning the
    /// finished image
    pub fn finish(mut self) -> Result<Vec<u8>, CompileError> {
        if let Some(frame) = self.loops.top() {
            return Err(CompileError::UnclosedLoop { pos: frame.pos });
        }

        emit_postamble(&mut self.code);

        let size = self.code.offset();
        if !cpm::fits(size) {
            return Err(CompileError::ImageTooLarge { size });
        }
        if tape_cells(self.tape_size) > max_tape_size(size) {
            return Err(CompileError::TapeTooLarge {
                size,
                tape_size: self.tape_size,
            });
        }
        for field in &self.tape_fields {
            self.code.patch_address(*field, size);
        }
        Ok(self.code.into_code())
    }
}

/// Zeroes the tape and points `hl` at its first cell. Returns the offsets
/// of the tape address operands, which are left as zero.
fn emit_preamble(code: &mut Emitter, tape_size: u16) -> [usize; 2] {
    code.emit(LD_HL_NN);
    let first = code.offset();
    code.emit_word(0);
    code.emit(LD_DE_NN);
    code.emit_word(tape_size);

    debug_assert_eq!(code.offset(), CLEAR_LOOP);
    code.emit(LD_HL_N);
    code.emit(0);
    code.emit(INC_HL);
    code.emit(DEC_DE);
    code.emit(LD_A_D);
    code.emit(OR_E);
    code.emit(JP_NZ_NN);
    code.emit_address(CLEAR_LOOP);

    code.emit(LD_HL_NN);
    let second = code.offset();
    code.emit_word(0);

    debug_assert_eq!(code.offset(), PREAMBLE_LEN);
    [first, second]
}

/// The clearing loop decrements before testing, so a count of 0 runs it
/// 65536 times
fn tape_cells(tape_size: u16) -> usize {
    match tape_size {
        0 => cpm::MEMORY_SIZE,
        n => n as usize,
    }
}

/// Largest tape that fits after an image of `image_len` bytes
pub fn max_tape_size(image_len: usize) -> usize {
    cpm::space_after(image_len)
}

/// Returns to the CCP
fn emit_postamble(code: &mut Emitter) {
    code.emit(JP_NN);
    code.emit_word(WARM_BOOT);
}

/// Address the tape of an image starts at
pub fn tape_address(image: &[u8]) -> cpm::Address {
    cpm::address(image.len())
}

fn run(mut compiler: Compiler, source: impl Read) -> Result<Vec<u8>, CompileError> {
    for token in Tokenizer::new(source) {
        let (pos, token) = token?;
        compiler.push(pos, token)?;
    }
    compiler.finish()
}

/// Compiles Brainfuck source to a CP/M `.COM` image, loaded at `LOAD_BASE`
pub fn compile(source: impl Read, config: Config) -> Result<Vec<u8>, CompileError> {
    run(Compiler::new(config), source)
}

/// Like `compile`, reporting each growth of the code buffer to `progress`
pub fn compile_with_progress(
    source: impl Read,
    config: Config,
    progress: &mut dyn FnMut(usize),
) -> Result<Vec<u8>, CompileError> {
    run(Compiler::with_progress(config, progress), source)
}
