use std::fmt;
use std::io::{self, Bytes, Read};

/// The eight Brainfuck commands; everything else is a comment
const COMMANDS: &[u8] = b"+-<>.,[]";

/// A folded Brainfuck command
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Net change to the current cell, modulo 256
    Add(u8),
    /// Net change to the cell pointer, modulo 65536
    Move(i16),
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Add(value) => write!(f, "Add(value={})", value as i8),
            Token::Move(offset) => write!(f, "Move(offset={})", offset),
            Token::Output => write!(f, "Output"),
            Token::Input => write!(f, "Input"),
            Token::LoopStart => write!(f, "LoopStart"),
            Token::LoopEnd => write!(f, "LoopEnd"),
        }
    }
}

/// Reads Brainfuck source one byte at a time, skipping comments and folding
/// runs of `+`/`-` and `>`/`<` into a single token.
///
/// Yields each token with the source offset of its first byte. Comments
/// between the commands of a run do not break it up.
pub struct Tokenizer<R> {
    bytes: Bytes<R>,
    peeked: Option<u8>,
    eof: bool,
    pos: usize,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(source: R) -> Self {
        Self {
            bytes: source.bytes(),
            peeked: None,
            eof: false,
            pos: 0,
        }
    }

    /// The next byte of the source, reading it if necessary
    fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.peeked.is_none() && !self.eof {
            match self.bytes.next() {
                Some(byte) => self.peeked = Some(byte?),
                None => self.eof = true,
            }
        }
        Ok(self.peeked)
    }

    fn discard(&mut self) {
        if self.peeked.take().is_some() {
            self.pos += 1;
        }
    }

    /// The next command byte, skipping over comments
    fn peek_command(&mut self) -> io::Result<Option<u8>> {
        while let Some(c) = self.peek()? {
            if COMMANDS.contains(&c) {
                return Ok(Some(c));
            }
            self.discard();
        }
        Ok(None)
    }

    fn fold_add(&mut self) -> io::Result<Token> {
        let mut value = 0u8;
        while let Some(c) = self.peek_command()? {
            match c {
                b'+' => value = value.wrapping_add(1),
                b'-' => value = value.wrapping_sub(1),
                _ => break,
            }
            self.discard();
        }
        Ok(Token::Add(value))
    }

    fn fold_move(&mut self) -> io::Result<Token> {
        let mut offset = 0i16;
        while let Some(c) = self.peek_command()? {
            match c {
                b'>' => offset = offset.wrapping_add(1),
                b'<' => offset = offset.wrapping_sub(1),
                _ => break,
            }
            self.discard();
        }
        Ok(Token::Move(offset))
    }

    fn next_token(&mut self) -> io::Result<Option<(usize, Token)>> {
        let c = match self.peek_command()? {
            Some(c) => c,
            None => return Ok(None),
        };
        let pos = self.pos;

        let token = match c {
            b'+' | b'-' => return self.fold_add().map(|t| Some((pos, t))),
            b'>' | b'<' => return self.fold_move().map(|t| Some((pos, t))),
            b'.' => Token::Output,
            b',' => Token::Input,
            b'[' => Token::LoopStart,
            _ => Token::LoopEnd,
        };
        self.discard();
        Ok(Some((pos, token)))
    }
}

impl<R: Read> Iterator for Tokenizer<R> {
    type Item = io::Result<(usize, Token)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Tokenizes a whole in-memory program
pub fn tokenize(code: &[u8]) -> io::Result<Vec<(usize, Token)>> {
    Tokenizer::new(code).collect()
}
