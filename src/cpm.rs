use static_assertions::assert_eq_size;

// The runtime contract of a CP/M 2.2 transient program.
//
// Sources:
// * CP/M 2.2 Operating System Manual, section 5 (BDOS interface)
// * http://www.gaby.de/cpm/manuals/archive/cpm22htm/ch5.htm

/// A 16-bit absolute address in the target's memory
pub type Address = u16;

assert_eq_size!(address_size_assert; Address, [u8; 2]);

/// The whole 16-bit address space
pub const MEMORY_SIZE: usize = 0x10000;

/// Transient programs are loaded at the start of the TPA
pub const LOAD_BASE: Address = 0x0100;

/// Entry point of the BDOS; the function number goes in `c`
pub const BDOS: Address = 0x0005;

/// Jumping here performs a warm boot, returning control to the CCP
pub const WARM_BOOT: Address = 0x0000;

/// Console input: blocks, returns the byte in `a`
pub const C_READ: u8 = 1;

/// Console output: writes the byte in `e`
pub const C_WRITE: u8 = 2;

/// The console uses CR LF line endings
pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

/// Translates an offset into the image to the address it is loaded at.
///
/// Wraps around on images that do not fit the address space; those are
/// rejected once the final length is known.
pub fn address(offset: usize) -> Address {
    (offset as Address).wrapping_add(LOAD_BASE)
}

/// Whether an image of `len` bytes, plus the address just past it, fits
/// below the top of memory
pub fn fits(len: usize) -> bool {
    len + (LOAD_BASE as usize) <= Address::MAX as usize
}

/// Bytes left between the end of an image of `len` bytes and the top of
/// memory
pub fn space_after(len: usize) -> usize {
    MEMORY_SIZE.saturating_sub(LOAD_BASE as usize + len)
}
