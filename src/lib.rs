mod codegen;
mod compiler;
pub mod cpm;
mod emitter;
mod error;
pub mod listing;
pub mod machine;
pub mod opcodes;
mod stack;
mod token;

pub use compiler::{
    compile, compile_with_progress, max_tape_size, tape_address, Compiler, Config,
    DEFAULT_TAPE_SIZE, EMPTY_IMAGE_LEN,
};
pub use emitter::Emitter;
pub use error::{CompileError, Diagnostic};
pub use stack::{Frame, LoopStack, DEFAULT_MAX_DEPTH};
pub use token::{tokenize, Token, Tokenizer};
