use std::error::Error;
use std::fmt;
use std::io;
use unicode_width::UnicodeWidthStr;

/// Reasons a translation is abandoned. None of these leave a usable image.
#[derive(Debug)]
pub enum CompileError {
    /// More loops open at once than the branch target stack holds
    StackOverflow { pos: usize, capacity: usize },
    /// `]` with no open loop to close
    ExtraCloseLoop { pos: usize },
    /// End of input reached with the loop started at `pos` still open
    UnclosedLoop { pos: usize },
    /// The image would not leave room for even one cell below the top of memory
    ImageTooLarge { size: usize },
    /// The tape does not fit between the end of the image and the top of
    /// memory. A size of 0 would mean all 64K.
    TapeTooLarge { size: usize, tape_size: u16 },
    Io(io::Error),
}

impl CompileError {
    /// Source offset the error refers to, if any
    pub fn pos(&self) -> Option<usize> {
        match *self {
            CompileError::StackOverflow { pos, .. }
            | CompileError::ExtraCloseLoop { pos }
            | CompileError::UnclosedLoop { pos } => Some(pos),
            CompileError::ImageTooLarge { .. }
            | CompileError::TapeTooLarge { .. }
            | CompileError::Io(_) => None,
        }
    }

    /// Attaches the source text, for reporting with line and column
    pub fn in_source<'a>(&'a self, code: &'a [u8]) -> Diagnostic<'a> {
        Diagnostic { err: self, code }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::StackOverflow { capacity, .. } => {
                write!(f, "stack overflow: loops nested more than {} deep", capacity)
            }
            CompileError::ExtraCloseLoop { .. } => {
                write!(f, "stack underflow: ] found when not in a loop")
            }
            CompileError::UnclosedLoop { .. } => write!(f, "reached EOF with unterminated loop"),
            CompileError::ImageTooLarge { size } => {
                write!(f, "generated code is too large ({} bytes)", size)
            }
            CompileError::TapeTooLarge { size, tape_size: 0 } => {
                write!(f, "tape of 65536 cells does not fit after {} bytes of code", size)
            }
            CompileError::TapeTooLarge { size, tape_size } => write!(
                f,
                "tape of {} cells does not fit after {} bytes of code",
                tape_size, size
            ),
            CompileError::Io(err) => write!(f, "failed to read source: {}", err),
        }
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CompileError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> Self {
        CompileError::Io(err)
    }
}

/// A compile error shown against the line of source it occurred on
pub struct Diagnostic<'a> {
    err: &'a CompileError,
    code: &'a [u8],
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.err)?;

        let pos = match self.err.pos() {
            Some(pos) if pos < self.code.len() => pos,
            _ => return Ok(()),
        };
        let (line, linenum, offset) = find_line(self.code, pos);
        let line = String::from_utf8_lossy(line);
        // Lossy decoding may have moved the offset off a char boundary
        let width = line.get(0..offset).map(|s| UnicodeWidthStr::width(s));

        write!(f, " at {}:{}\n", linenum, offset + 1)?;
        write!(f, "{}", line)?;
        if let Some(width) = width {
            write!(f, "\n{}^", " ".repeat(width))?;
        }

        Ok(())
    }
}

/// Finds the line containing byte `i`: returns the line, its 1-based number,
/// and the offset of `i` within it
fn find_line(code: &[u8], i: usize) -> (&[u8], usize, usize) {
    let offset = code[0..i].iter().rev().take_while(|x| **x != b'\n').count();
    let end = i + code[i..].iter().take_while(|x| **x != b'\n').count();
    let linenum = code[0..(i - offset)]
        .iter()
        .filter(|x| **x == b'\n')
        .count();
    (&code[(i - offset)..end], linenum + 1, offset)
}
