/// Default number of loops that may be open at once
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// An open loop: where its branch target gets patched, and where it came
/// from in the source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Offset of the loop's first instruction in the image. The jump back
    /// from the end of the loop goes here, and the exit address is patched
    /// into the conditional jump a fixed distance after it.
    pub target: usize,
    /// Byte offset of the `[` in the source
    pub pos: usize,
}

/// Compile-time stack of branch targets, one frame per open loop
#[derive(Debug)]
pub struct LoopStack {
    frames: Vec<Frame>,
    capacity: usize,
}

impl LoopStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            capacity,
        }
    }

    /// Pushes a frame, handing it back if the stack is already full
    pub fn push(&mut self, frame: Frame) -> Result<(), Frame> {
        if self.frames.len() >= self.capacity {
            return Err(frame);
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Innermost open loop
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for LoopStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
