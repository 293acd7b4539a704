// 8080 opcodes used by the code templates, named after their Z80
// mnemonics. Every one of these also exists on the 8080.

pub const LD_BC_NN: u8 = 0x01;
pub const LD_DE_NN: u8 = 0x11;
pub const LD_HL_NN: u8 = 0x21;

pub const LD_A_HL: u8 = 0x7E;
pub const LD_HL_A: u8 = 0x77;
pub const LD_A_D: u8 = 0x7A;
pub const LD_E_HL: u8 = 0x5E;
pub const LD_HL_N: u8 = 0x36;
pub const LD_C_N: u8 = 0x0E;
pub const LD_E_N: u8 = 0x1E;

pub const INC_HL: u8 = 0x23;
pub const DEC_HL: u8 = 0x2B;
pub const DEC_DE: u8 = 0x1B;
pub const INC_IND_HL: u8 = 0x34;
pub const DEC_IND_HL: u8 = 0x35;

pub const ADD_A_N: u8 = 0xC6;
pub const ADD_HL_BC: u8 = 0x09;
pub const OR_A: u8 = 0xB7;
pub const OR_E: u8 = 0xB3;
pub const CP_N: u8 = 0xFE;

pub const JP_NN: u8 = 0xC3;
pub const JP_Z_NN: u8 = 0xCA;
pub const JP_NZ_NN: u8 = 0xC2;
pub const CALL_NN: u8 = 0xCD;
pub const RET: u8 = 0xC9;

pub const PUSH_HL: u8 = 0xE5;
pub const POP_HL: u8 = 0xE1;
