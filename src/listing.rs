use std::fmt::Write;

use crate::cpm;
use crate::opcodes::*;

/// One decoded instruction
#[derive(Debug, PartialEq, Eq)]
pub struct Instr {
    pub address: cpm::Address,
    pub bytes: Vec<u8>,
    pub text: String,
}

fn word(lo: u8, hi: u8) -> u16 {
    u16::from_le_bytes([lo, hi])
}

/// Length and mnemonic of the instruction at the start of `code`, or `None`
/// if it is not one the compiler generates or is cut short
fn decode(code: &[u8]) -> Option<(usize, String)> {
    let op = *code.get(0)?;
    let n = || code.get(1).copied();
    let nn = || Some(word(*code.get(1)?, *code.get(2)?));

    let decoded = match op {
        LD_BC_NN => (3, format!("ld bc, ${:04x}", nn()?)),
        LD_DE_NN => (3, format!("ld de, ${:04x}", nn()?)),
        LD_HL_NN => (3, format!("ld hl, ${:04x}", nn()?)),
        LD_A_HL => (1, "ld a, (hl)".to_string()),
        LD_HL_A => (1, "ld (hl), a".to_string()),
        LD_A_D => (1, "ld a, d".to_string()),
        LD_E_HL => (1, "ld e, (hl)".to_string()),
        LD_HL_N => (2, format!("ld (hl), ${:02x}", n()?)),
        LD_C_N => (2, format!("ld c, ${:02x}", n()?)),
        LD_E_N => (2, format!("ld e, ${:02x}", n()?)),
        INC_HL => (1, "inc hl".to_string()),
        DEC_HL => (1, "dec hl".to_string()),
        DEC_DE => (1, "dec de".to_string()),
        INC_IND_HL => (1, "inc (hl)".to_string()),
        DEC_IND_HL => (1, "dec (hl)".to_string()),
        ADD_A_N => (2, format!("add a, ${:02x}", n()?)),
        ADD_HL_BC => (1, "add hl, bc".to_string()),
        OR_A => (1, "or a".to_string()),
        OR_E => (1, "or e".to_string()),
        CP_N => (2, format!("cp ${:02x}", n()?)),
        JP_NN => (3, format!("jp ${:04x}", nn()?)),
        JP_Z_NN => (3, format!("jp z, ${:04x}", nn()?)),
        JP_NZ_NN => (3, format!("jp nz, ${:04x}", nn()?)),
        CALL_NN => (3, format!("call ${:04x}", nn()?)),
        RET => (1, "ret".to_string()),
        PUSH_HL => (1, "push hl".to_string()),
        POP_HL => (1, "pop hl".to_string()),
        _ => return None,
    };
    Some(decoded)
}

/// Decodes a whole image, as loaded at `LOAD_BASE`. Bytes that do not
/// decode are listed one at a time as `db`.
pub fn disassemble(image: &[u8]) -> Vec<Instr> {
    let mut instrs = Vec::new();
    let mut i = 0;
    while i < image.len() {
        let (len, text) = decode(&image[i..])
            .unwrap_or_else(|| (1, format!("db ${:02x}", image[i])));
        instrs.push(Instr {
            address: cpm::address(i),
            bytes: image[i..i + len].to_vec(),
            text,
        });
        i += len;
    }
    instrs
}

/// Renders an image as an assembly listing, one instruction per line
pub fn listing(image: &[u8]) -> String {
    let mut output = String::new();
    for instr in disassemble(image) {
        let bytes: Vec<String> = instr.bytes.iter().map(|b| format!("{:02x}", b)).collect();
        writeln!(output, "{:04x}  {:<9} {}", instr.address, bytes.join(" "), instr.text).unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, Config};

    #[test]
    fn lists_empty_program() {
        let image = compile(&b""[..], Config::default()).unwrap();
        assert_eq!(
            listing(&image),
            concat!(
                "0100  21 15 01  ld hl, $0115\n",
                "0103  11 30 75  ld de, $7530\n",
                "0106  36 00     ld (hl), $00\n",
                "0108  23        inc hl\n",
                "0109  1b        dec de\n",
                "010a  7a        ld a, d\n",
                "010b  b3        or e\n",
                "010c  c2 06 01  jp nz, $0106\n",
                "010f  21 15 01  ld hl, $0115\n",
                "0112  c3 00 00  jp $0000\n",
            )
        );
    }

    #[test]
    fn every_generated_byte_decodes() {
        let image = compile(&b"+-->>>>><,.[[-]<]"[..], Config::default()).unwrap();
        let instrs = disassemble(&image);
        assert!(instrs.iter().all(|i| !i.text.starts_with("db")));
        let total: usize = instrs.iter().map(|i| i.bytes.len()).sum();
        assert_eq!(total, image.len());
    }

    #[test]
    fn unknown_and_truncated_bytes_are_data() {
        let instrs = disassemble(&[0x00, JP_NN, 0x00]);
        let text: Vec<&str> = instrs.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(text, vec!["db $00", "db $c3", "db $00"]);
        assert_eq!(instrs[1].address, 0x0101);
    }
}
