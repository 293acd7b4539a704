use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use clap::{App, Arg, ArgGroup};

use bfcpm::{listing, tokenize, CompileError, Config, Token, DEFAULT_MAX_DEPTH};

enum Action {
    Compile,
    Listing,
    DumpIr,
}

struct Options {
    action: Action,
    output: Option<String>,
    input: String,
    tape_size: u16,
}

/// Accepts tape sizes that fit after the smallest possible image. Whether
/// one fits after the actual program is only known once it is compiled.
fn is_tape_size(value: String) -> Result<(), String> {
    let max = bfcpm::max_tape_size(bfcpm::EMPTY_IMAGE_LEN);
    match value.parse::<usize>() {
        Ok(n) if n >= 1 && n <= max => Ok(()),
        _ => Err(format!("must be a number from 1 to {}", max)),
    }
}

enum Failure {
    Compile(CompileError),
    Write(io::Error),
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        Failure::Write(err)
    }
}

impl Options {
    fn match_options() -> Self {
        let matches = App::new("bfcpm")
            .version("0.1.0")
            .about("Brainfuck compiler for CP/M")
            .arg(
                Arg::with_name("listing")
                    .short("S")
                    .help("Write an assembly listing instead of the program"),
            )
            .arg(
                Arg::with_name("dump_ir")
                    .long("dump-ir")
                    .help("Dump folded tokens; for debugging"),
            )
            .group(ArgGroup::with_name("actions").args(&["listing", "dump_ir"]))
            .arg(
                Arg::with_name("out_name")
                    .short("o")
                    .help("Output file name")
                    .takes_value(true)
                    .empty_values(false)
                    .value_name("file"),
            )
            .arg(
                Arg::with_name("tape_size")
                    .long("tape-size")
                    .help("Number of cells zeroed at startup")
                    .takes_value(true)
                    .empty_values(false)
                    .default_value("30000")
                    .validator(is_tape_size)
                    .value_name("bytes"),
            )
            .arg(
                Arg::with_name("FILENAME")
                    .help("Source file to compile")
                    .required(true)
                    .index(1),
            )
            .get_matches();

        let action = if matches.is_present("dump_ir") {
            Action::DumpIr
        } else if matches.is_present("listing") {
            Action::Listing
        } else {
            Action::Compile
        };

        // Validated by clap
        let tape_size = matches
            .value_of("tape_size")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(bfcpm::DEFAULT_TAPE_SIZE);

        Options {
            action,
            output: matches.value_of("out_name").map(str::to_string),
            input: matches.value_of("FILENAME").unwrap_or_default().to_string(),
            tape_size,
        }
    }

    fn get_output<'a>(&'a self, default: &'a str) -> &'a str {
        match self.output.as_ref() {
            Some(output) => output,
            None => default,
        }
    }
}

fn main() -> io::Result<()> {
    let options = Options::match_options();

    let mut file = File::open(&options.input)?;
    let mut code = Vec::new();
    file.read_to_end(&mut code)?;

    let config = Config {
        tape_size: options.tape_size,
        max_depth: DEFAULT_MAX_DEPTH,
    };

    match options.action {
        Action::DumpIr => {
            let tokens = tokenize(&code)?;
            let mut irfile = open_output_file(options.get_output("-"))?;
            dump_ir(&tokens, &mut irfile)?;
        }
        Action::Listing => {
            let image = compile(&code, config).unwrap_or_else(|err| fail(&code, &err));
            let def_name = output_name(&options.input, "LST");
            let out_name = options.get_output(&def_name);
            let mut lstfile = open_output_file(out_name)?;
            lstfile.write_all(listing::listing(&image).as_bytes())?;
        }
        Action::Compile => {
            let def_name = output_name(&options.input, "COM");
            let out_name = options.get_output(&def_name);
            match build(&code, config, out_name) {
                Ok(len) => println!("Wrote {} ({} bytes)", out_name, len),
                Err(Failure::Compile(err)) => fail(&code, &err),
                Err(Failure::Write(err)) => return Err(err),
            }
        }
    }

    Ok(())
}

/// Compiles, printing a `+` each time the code buffer grows
fn compile(code: &[u8], config: Config) -> Result<Vec<u8>, CompileError> {
    println!("Compiling...");
    let mut progress = |_: usize| {
        print!("+");
        let _ = io::stdout().flush();
    };
    let result = bfcpm::compile_with_progress(code, config, &mut progress);
    println!();
    result
}

/// Compiles and saves the image, returning its length. The output file is
/// only created once compiling has succeeded.
fn build(code: &[u8], config: Config, out_name: &str) -> Result<usize, Failure> {
    let image = compile(code, config).map_err(Failure::Compile)?;
    save(out_name, &image)?;
    Ok(image.len())
}

fn fail(code: &[u8], err: &CompileError) -> ! {
    eprintln!("error: {}", err.in_source(code));
    process::exit(1);
}

/// The input file name with its extension replaced
fn output_name(input: &str, extension: &str) -> String {
    Path::new(input)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

/// Writes the image in one go, removing the file again if that fails
fn save(out_name: &str, image: &[u8]) -> io::Result<()> {
    let mut file = File::create(out_name)?;
    let result = file.write_all(image).and_then(|_| file.sync_all());
    if result.is_err() {
        drop(file);
        let _ = fs::remove_file(out_name);
    }
    result
}

fn dump_ir(tokens: &[(usize, Token)], output: &mut dyn Write) -> io::Result<()> {
    let mut level = 0usize;
    for (_, token) in tokens {
        if *token == Token::LoopEnd {
            level = level.saturating_sub(1);
        }
        writeln!(output, "{}{:?}", " ".repeat(level * 4), token)?;
        if *token == Token::LoopStart {
            level += 1;
        }
    }
    Ok(())
}

fn open_output_file(name: &str) -> io::Result<Box<dyn Write>> {
    if name == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(File::create(&name)?))
    }
}
