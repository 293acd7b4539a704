use bfcpm::machine::{run_image, Machine, MachineError};
use bfcpm::{compile, max_tape_size, tape_address, CompileError, Config};

const STEPS: Option<u64> = Some(5_000_000);

fn build(code: &str) -> Vec<u8> {
    compile(code.as_bytes(), Config::default()).unwrap()
}

/// Compiles and runs `code`, returning the machine, the tape address and
/// the program's output
fn run(code: &str, input: &[u8]) -> (Machine, u16, Vec<u8>) {
    let image = build(code);
    let tape = tape_address(&image);
    let (machine, output) = run_image(&image, input, STEPS).unwrap();
    (machine, tape, output)
}

#[test]
fn prints_three() {
    let (_, _, output) = run("+++.", b"");
    assert_eq!(output, vec![3]);
}

#[test]
fn cell_arithmetic_wraps() {
    for &n in &[0usize, 1, 2, 3, 127, 255, 256, 257, 300, 511] {
        let code = format!("{}.{}.", "+".repeat(n), "-".repeat(n + 1));
        let (_, _, output) = run(&code, b"");
        assert_eq!(output, vec![(n % 256) as u8, 0xff], "n = {}", n);
    }
}

#[test]
fn pointer_moves_by_net_displacement() {
    let (machine, tape, _) = run(">>><<", b"");
    assert_eq!(machine.hl(), tape + 1);

    for &n in &[3usize, 4, 10, 300] {
        let code = format!("{}{}", ">".repeat(n + 2), "<".repeat(2));
        let (machine, tape, _) = run(&code, b"");
        assert_eq!(machine.hl(), tape + n as u16, "n = {}", n);
    }

    // Long backwards moves wrap the same way the short ones do
    let (machine, tape, _) = run(">>>>>>>>>><<<<<<<<", b"");
    assert_eq!(machine.hl(), tape + 2);
}

#[test]
fn pointer_wraps_below_zero() {
    let code = "<".repeat(4);
    let image = build(&code);
    let tape = tape_address(&image);
    let (machine, _) = run_image(&image, b"", STEPS).unwrap();
    assert_eq!(machine.hl(), tape.wrapping_sub(4));
}

#[test]
fn cells_are_independent() {
    let (machine, tape, output) = run("+++>++>+<<.>.>.", b"");
    assert_eq!(output, vec![3, 2, 1]);
    assert_eq!(machine.peek(tape), 3);
    assert_eq!(machine.peek(tape + 3), 0);
}

#[test]
fn tape_is_zeroed() {
    // Memory outside the image starts out as $ff
    let (machine, tape, _) = run("", b"");
    assert_eq!(machine.peek(tape), 0);
    assert_eq!(machine.peek(tape + 29999), 0);
    assert_eq!(machine.peek(tape + 30000), 0xff);
}

#[test]
fn clear_loop_runs_to_zero() {
    let (machine, tape, output) = run("+++++[-].", b"");
    assert_eq!(output, vec![0]);
    assert_eq!(machine.peek(tape), 0);
    assert_eq!(machine.hl(), tape);
}

#[test]
fn loop_skipped_when_cell_is_zero() {
    let (_, _, output) = run("[+++.]++.", b"");
    assert_eq!(output, vec![2]);
}

#[test]
fn nested_and_sibling_loops() {
    // 3 * 4 = 12, then a sibling loop moves it over
    let (machine, tape, output) = run("+++[>++++[>+<-]<-]>>[<<+>>-]<<.", b"");
    assert_eq!(output, vec![12]);
    assert_eq!(machine.peek(tape + 1), 0);
    assert_eq!(machine.peek(tape + 2), 0);
}

#[test]
fn deep_nesting_round_trips() {
    let code = format!("+{}-{}.", "[".repeat(50), "]".repeat(50));
    let (_, _, output) = run(&code, b"");
    assert_eq!(output, vec![0]);
}

#[test]
fn echoes_input() {
    let (_, _, output) = run(",.", b"A");
    assert_eq!(output, b"A");
}

#[test]
fn input_skips_carriage_returns() {
    let (machine, tape, output) = run(",.", b"\r\rz");
    assert_eq!(output, b"z");
    assert_eq!(machine.peek(tape), b'z');
}

#[test]
fn newline_output_gets_carriage_return() {
    let (_, _, output) = run("++++++++++.", b"");
    assert_eq!(output, b"\r\n");
}

#[test]
fn input_line_ending_round_trips() {
    let (_, _, output) = run(",.,.", b"a\r\n");
    assert_eq!(output, b"a\r\n");
}

#[test]
fn hello_world() {
    let code = concat!(
        "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]",
        ">>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.",
    );
    let (_, _, output) = run(code, b"");
    assert_eq!(output, b"Hello World!\r\n");
}

#[test]
fn large_tape_is_zeroed() {
    // Ends just below the machine's stack at $fe00
    let code = ">+.";
    let small = build(code);
    let tape = tape_address(&small);
    let tape_size = 0xfdf0 - tape;
    let config = Config {
        tape_size,
        ..Config::default()
    };
    let image = compile(code.as_bytes(), config).unwrap();
    let (machine, output) = run_image(&image, b"", STEPS).unwrap();
    assert_eq!(output, vec![1]);
    assert_eq!(machine.peek(tape + tape_size - 1), 0);
    assert_eq!(machine.peek(tape + tape_size), 0xff);
    assert!((tape_size as usize) < max_tape_size(small.len()));
}

#[test]
fn tape_past_top_of_memory_is_rejected() {
    let len = build("+++.").len();
    let config = |tape_size: u16| Config {
        tape_size,
        ..Config::default()
    };
    for &tape_size in &[max_tape_size(len) as u16 + 1, 65535, 0] {
        assert!(matches!(
            compile(&b"+++."[..], config(tape_size)),
            Err(CompileError::TapeTooLarge { .. })
        ));
    }
    assert!(compile(&b"+++."[..], config(max_tape_size(len) as u16)).is_ok());
}

#[test]
fn cat_until_zero() {
    let (_, _, output) = run(",[.,]", b"hi\x00");
    assert_eq!(output, b"hi");
}

#[test]
fn comments_do_not_change_code() {
    assert_eq!(build("+ + [ - ] ."), build("++[-]."));
    assert_eq!(build("this is > a comment <"), build("><"));
}

#[test]
fn empty_program_has_patched_size_fields() {
    let image = build("just words");
    assert_eq!(image.len(), 21);
    let size = (image.len() as u16 + 0x100).to_le_bytes();
    assert_eq!(&image[1..3], &size);
    assert_eq!(&image[16..18], &size);
    let (machine, _) = run_image(&image, b"", STEPS).unwrap();
    assert_eq!(machine.hl(), tape_address(&image));
}

#[test]
fn unbalanced_programs_produce_no_image() {
    assert!(matches!(
        compile(&b"+]"[..], Config::default()),
        Err(CompileError::ExtraCloseLoop { pos: 1 })
    ));
    assert!(matches!(
        compile(&b"[+"[..], Config::default()),
        Err(CompileError::UnclosedLoop { pos: 0 })
    ));
}

#[test]
fn running_out_of_input_is_reported() {
    let image = build(",,");
    assert!(matches!(
        run_image(&image, b"x", STEPS),
        Err(MachineError::InputExhausted)
    ));
}
