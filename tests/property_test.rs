use gwbasic::lang::{crunch, detokenize};
use gwbasic::mach::{Mbf32, Mbf64, Operation, Program, Val};
use quickcheck::{QuickCheck, TestResult};

#[test]
fn prop_mbf32_holds_normal_singles() {
    fn property(value: f32) -> TestResult {
        if !value.is_normal() || value.abs() >= 1.0e38 {
            return TestResult::discard();
        }
        TestResult::from_bool(Mbf32::from_f32(value).to_f32() == value)
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(f32) -> TestResult);
}

#[test]
fn prop_mbf64_holds_doubles_in_range() {
    fn property(value: f64) -> TestResult {
        if !value.is_normal() || value.abs() >= 1.0e38 || value.abs() <= 1.0e-38 {
            return TestResult::discard();
        }
        TestResult::from_bool(Mbf64::from_f64(value).to_f64() == value)
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(f64) -> TestResult);
}

#[test]
fn prop_widening_single_is_lossless() {
    fn property(value: f32) -> TestResult {
        if !value.is_normal() || value.abs() >= 1.0e38 {
            return TestResult::discard();
        }
        let single = Mbf32::from_f32(value);
        TestResult::from_bool(single.to_mbf64().to_mbf32() == single)
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(f32) -> TestResult);
}

#[test]
fn prop_program_lines_stay_ordered() {
    fn property(numbers: Vec<u16>) -> bool {
        let mut program = Program::new();
        for n in &numbers {
            program.insert(*n, crunch("END").unwrap());
        }
        let listed = program.numbers();
        let mut expected = numbers.clone();
        expected.sort_unstable();
        expected.dedup();
        listed == expected
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(property as fn(Vec<u16>) -> bool);
}

#[test]
fn prop_listing_crunches_back_to_the_same_bytes() {
    fn property(lhs: u16, rhs: u16) -> bool {
        let bytes = crunch(&format!("A={}+{}", lhs, rhs)).unwrap();
        crunch(&detokenize(&bytes)).unwrap() == bytes
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(u16, u16) -> bool);
}

const WORDS: &[&str] = &[
    "PRINT", "GOTO", "GOSUB", "FOR", "TO", "STEP", "NEXT", "IF", "THEN", "ELSE", "LET", "DIM",
    "END", "RETURN", "WHILE", "WEND", "INPUT", "POKE", "ON", "LEFT$(", "MID$(", "CHR$(", "SQR(",
    "INT(", "RND", "LEN(", "INSTR(", "STRING$(",
];

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "^", "\\", "=", "<", ">", "<=", ">=", "<>", "=<", "=>", "AND", "OR",
    "MOD", "XOR", "NOT", "(", ")", ",", ";", ":",
];

const OPERANDS: &[&str] = &[
    "A", "B$", "X%", "Y#", "Z!", "N1", "1", "0", "10", "65535", "3.5", ".5", "1E10", "&H1F",
    "&O17", "123456789", "\"HELLO\"", "\"a:b'c\"", "\"\"", "\"REM GOTO 10\"",
];

const TAILS: &[&str] = &[
    "",
    "",
    ":REM if then goto 10",
    "' print \"x\": NEXT",
    ":DATA 1, two ,\"three\",4",
    "REM",
];

/// A statement line assembled from keywords, operators, literals, and
/// one optional REM or DATA tail.
fn statement(choices: &[u8], spaced: bool, tail: u8) -> String {
    let pieces: Vec<&str> = choices
        .iter()
        .take(12)
        .map(|&c| {
            let table = match c % 3 {
                0 => WORDS,
                1 => OPERATORS,
                _ => OPERANDS,
            };
            table[(c / 3) as usize % table.len()]
        })
        .collect();
    let mut src = pieces.join(if spaced { " " } else { "" });
    src.push_str(TAILS[tail as usize % TAILS.len()]);
    src
}

#[test]
fn prop_listing_is_stable_under_recrunch() {
    fn property(choices: Vec<u8>, spaced: bool, tail: u8) -> TestResult {
        let src = statement(&choices, spaced, tail);
        let listed = match crunch(&src) {
            Ok(bytes) => detokenize(&bytes),
            Err(_) => return TestResult::discard(),
        };
        match crunch(&listed) {
            Ok(bytes) => TestResult::from_bool(detokenize(&bytes) == listed),
            Err(_) => TestResult::failed(),
        }
    }
    QuickCheck::new()
        .tests(500)
        .quickcheck(property as fn(Vec<u8>, bool, u8) -> TestResult);
}

#[test]
fn prop_comparison_is_minus_one_or_zero() {
    fn property(lhs: i16, rhs: i16) -> bool {
        let less = Operation::less(Val::Integer(lhs), Val::Integer(rhs)).unwrap();
        let greater_equal =
            Operation::greater_equal(Val::Integer(lhs), Val::Integer(rhs)).unwrap();
        match (less, greater_equal) {
            (Val::Integer(-1), Val::Integer(0)) => lhs < rhs,
            (Val::Integer(0), Val::Integer(-1)) => lhs >= rhs,
            _ => false,
        }
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(i16, i16) -> bool);
}
