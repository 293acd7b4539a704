//! Code templates, one per Brainfuck construct.
//!
//! Register usage in the generated program is fixed: `hl` points at the
//! current cell for the whole run, `a` holds cell values being worked on,
//! and `bc`/`de` are scratch.

use static_assertions::const_assert;

use crate::cpm::{BDOS, CR, C_READ, C_WRITE, LF};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::opcodes::*;
use crate::stack::{Frame, LoopStack};

/// Longest pointer move emitted as a run of `inc hl`/`dec hl`
pub const SHORT_MOVE_LIMIT: u16 = 3;

/// Size of `ld bc, $n` followed by `add hl, bc`
const LONG_MOVE_LEN: u16 = 4;

// The short form must never be larger than the general one
const_assert!(short_move_limit_assert; SHORT_MOVE_LIMIT < LONG_MOVE_LEN);

/// Distance from the start of a loop to the branch target of its `jp z`
const LOOP_EXIT_FIELD: usize = 3;

/// Adds `n` to the current cell, modulo 256.
///
/// `inc (hl)` and `dec (hl)` take 11 clock cycles, against 21 for the
/// general load/add/store sequence.
pub fn emit_add(code: &mut Emitter, n: u8) {
    match n {
        0 => (),
        1 => code.emit(INC_IND_HL),
        0xff => code.emit(DEC_IND_HL),
        _ => {
            code.emit(LD_A_HL);
            code.emit(ADD_A_N);
            code.emit(n);
            code.emit(LD_HL_A);
        }
    }
}

/// Moves the cell pointer by `n`, modulo 65536.
///
/// `inc hl` and `dec hl` take 6 clock cycles, so up to three of them beat
/// the 21 cycles of `ld bc, $n; add hl, bc`.
pub fn emit_right(code: &mut Emitter, n: i16) {
    if n == 0 {
        return;
    }
    if n.unsigned_abs() <= SHORT_MOVE_LIMIT {
        let op = if n > 0 { INC_HL } else { DEC_HL };
        for _ in 0..n.unsigned_abs() {
            code.emit(op);
        }
    } else {
        code.emit(LD_BC_NN);
        code.emit_word(n as u16);
        code.emit(ADD_HL_BC);
    }
}

/// Calls a BDOS function, saving `hl` around the call since the BDOS
/// clobbers it
fn emit_bdos_call(code: &mut Emitter, function: u8) {
    code.emit(LD_C_N);
    code.emit(function);
    code.emit(PUSH_HL);
    code.emit(CALL_NN);
    code.emit_word(BDOS);
    code.emit(POP_HL);
}

/// Writes the current cell to the console, sending CR before every LF
pub fn emit_output(code: &mut Emitter) {
    code.emit(LD_A_HL);
    code.emit(CP_N);
    code.emit(LF);
    code.emit(JP_NZ_NN);
    let skip = code.offset();
    code.emit_word(0);

    code.emit(LD_E_N);
    code.emit(CR);
    emit_bdos_call(code, C_WRITE);

    let label = code.offset();
    code.patch_address(skip, label);
    code.emit(LD_E_HL);
    emit_bdos_call(code, C_WRITE);
}

/// Reads a byte from the console into the current cell. The console sends
/// CR LF line endings, so CR is thrown away and another byte requested.
pub fn emit_input(code: &mut Emitter) {
    let retry = code.offset();
    emit_bdos_call(code, C_READ);
    code.emit(CP_N);
    code.emit(CR);
    code.emit(JP_Z_NN);
    code.emit_address(retry);
    code.emit(LD_HL_A);
}

/// `[`: pushes the loop's start onto the stack, then skips the loop when
/// the current cell is zero. The exit address is filled in by the matching
/// `]`.
pub fn emit_loop_start(
    code: &mut Emitter,
    loops: &mut LoopStack,
    pos: usize,
) -> Result<(), CompileError> {
    let frame = Frame {
        target: code.offset(),
        pos,
    };
    loops.push(frame).map_err(|_| CompileError::StackOverflow {
        pos,
        capacity: loops.capacity(),
    })?;

    code.emit(LD_A_HL);
    code.emit(OR_A);
    code.emit(JP_Z_NN);
    code.emit_word(0);
    Ok(())
}

/// `]`: jumps back to the matching `[`, then points that loop's exit branch
/// just past this jump.
pub fn emit_loop_end(
    code: &mut Emitter,
    loops: &mut LoopStack,
    pos: usize,
) -> Result<(), CompileError> {
    let frame = loops.pop().ok_or(CompileError::ExtraCloseLoop { pos })?;

    code.emit(JP_NN);
    code.emit_address(frame.target);
    let exit = code.offset();
    code.patch_address(frame.target + LOOP_EXIT_FIELD, exit);
    Ok(())
}
