// Runs a compiled .COM file on the built-in machine, with stdin and stdout
// as the console. It exists mainly for debugging: the machine only knows
// the instructions the compiler generates.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use clap::{App, Arg};

use bfcpm::machine::{Console, Machine};

struct StdConsole {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Console for StdConsole {
    fn read(&mut self) -> Option<u8> {
        let _ = self.stdout.flush();
        let mut buffer = [0; 1];
        match self.stdin.read(&mut buffer) {
            Ok(1) => Some(buffer[0]),
            _ => None,
        }
    }

    fn write(&mut self, byte: u8) {
        let _ = self.stdout.write_all(&[byte]);
    }
}

fn main() -> io::Result<()> {
    let matches = App::new("cpmrun")
        .version("0.1.0")
        .about("Runs a CP/M program compiled by bfcpm")
        .arg(
            Arg::with_name("max_steps")
                .long("max-steps")
                .help("Give up after this many instructions")
                .takes_value(true)
                .validator(|s| s.parse::<u64>().map(|_| ()).map_err(|e| e.to_string()))
                .value_name("n"),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Program to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let max_steps = matches.value_of("max_steps").and_then(|s| s.parse::<u64>().ok());
    let path = matches.value_of("FILENAME").unwrap_or_default();

    let mut image = Vec::new();
    File::open(path)?.read_to_end(&mut image)?;

    let mut console = StdConsole {
        stdin: io::stdin(),
        stdout: io::stdout(),
    };
    let result =
        Machine::load(&image, 0).and_then(|mut machine| machine.run(&mut console, max_steps));
    console.stdout.flush()?;

    if let Err(err) = result {
        eprintln!("error: {}", err);
        process::exit(1);
    }
    Ok(())
}
