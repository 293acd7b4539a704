use crate::cpm::{self, Address};

/// Number of bytes the output buffer grows by when it is full
pub const GROW_BY: usize = 128;

/// Growable buffer of machine code bytes.
///
/// Bytes are only ever appended, or overwritten in place once the value
/// they stand for becomes known. Each time the buffer grows, the progress
/// hook (if any) is called with the new capacity.
pub struct Emitter<'a> {
    code: Vec<u8>,
    progress: Option<&'a mut dyn FnMut(usize)>,
}

impl<'a> Emitter<'a> {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            progress: None,
        }
    }

    pub fn with_progress(progress: &'a mut dyn FnMut(usize)) -> Self {
        Self {
            code: Vec::new(),
            progress: Some(progress),
        }
    }

    /// Appends one byte
    pub fn emit(&mut self, byte: u8) {
        if self.code.len() == self.code.capacity() {
            self.code.reserve_exact(GROW_BY);
            let capacity = self.code.capacity();
            if let Some(progress) = self.progress.as_mut() {
                progress(capacity);
            }
        }
        self.code.push(byte);
    }

    /// Appends a little-endian 16-bit word
    pub fn emit_word(&mut self, word: u16) {
        for byte in &word.to_le_bytes() {
            self.emit(*byte);
        }
    }

    /// Appends the load address of `offset`
    pub fn emit_address(&mut self, offset: usize) {
        self.emit_word(cpm::address(offset));
    }

    /// Overwrites an already emitted byte
    pub fn patch(&mut self, offset: usize, byte: u8) {
        assert!(
            offset < self.code.len(),
            "patch at {} past end of code ({} bytes)",
            offset,
            self.code.len()
        );
        self.code[offset] = byte;
    }

    /// Overwrites an already emitted little-endian word
    pub fn patch_word(&mut self, offset: usize, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.patch(offset, lo);
        self.patch(offset + 1, hi);
    }

    /// Overwrites an already emitted word with the load address of `target`
    pub fn patch_address(&mut self, offset: usize, target: usize) {
        let address: Address = cpm::address(target);
        self.patch_word(offset, address);
    }

    /// Number of bytes emitted so far, which is also the offset of the next one
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_code(self) -> Vec<u8> {
        self.code
    }
}

impl Default for Emitter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_appends_in_order() {
        let mut code = Emitter::new();
        code.emit(0x21);
        code.emit_word(0x1234);
        assert_eq!(code.offset(), 3);
        assert_eq!(code.code(), &[0x21, 0x34, 0x12]);
    }

    #[test]
    fn patch_overwrites_in_place() {
        let mut code = Emitter::new();
        code.emit(0xca);
        code.emit_word(0);
        code.patch_address(1, 0x20);
        assert_eq!(code.into_code(), vec![0xca, 0x20, 0x01]);
    }

    #[test]
    #[should_panic]
    fn patch_past_end_panics() {
        let mut code = Emitter::new();
        code.emit(0);
        code.patch(1, 0);
    }

    #[test]
    fn progress_called_once_per_growth() {
        let mut grown: Vec<usize> = Vec::new();
        let mut record = |capacity: usize| grown.push(capacity);
        {
            let mut code = Emitter::with_progress(&mut record);
            for _ in 0..(GROW_BY * 2 + 1) {
                code.emit(0);
            }
            assert_eq!(code.offset(), GROW_BY * 2 + 1);
        }
        assert_eq!(grown.len(), 3);
        assert!(grown.iter().all(|capacity| *capacity >= GROW_BY));
    }
}
