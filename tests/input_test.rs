mod common;
use common::*;

#[test]
fn test_input_redo_from_start() {
    let mut b = Basic::new();
    b.program(&["10 INPUT A", "20 PRINT A*2"]);
    b.reply("X");
    b.reply("21");
    b.enter("RUN");
    assert_eq!(exec(&mut b), "? X\n?Redo from start\n? 21\n 42 \n");
}

#[test]
fn test_input_wrong_field_count() {
    let mut b = Basic::new();
    b.reply("1");
    b.reply("1,2");
    b.enter("INPUT A,B:PRINT A+B");
    assert_eq!(exec(&mut b), "? 1\n?Redo from start\n? 1,2\n 3 \n");
}

#[test]
fn test_input_prompt() {
    let mut b = Basic::new();
    b.program(&[r#"10 INPUT "NAME";N$"#, r#"20 PRINT "HI ";N$"#]);
    b.reply("BOB");
    b.enter("RUN");
    assert_eq!(exec(&mut b), "NAME? BOB\nHI BOB\n");
}

#[test]
fn test_input_prompt_without_question_mark() {
    let mut b = Basic::new();
    b.reply("5");
    b.enter(r#"INPUT "N=",A:PRINT A"#);
    assert_eq!(exec(&mut b), "N=5\n 5 \n");
}

#[test]
fn test_input_quoted_string() {
    let mut b = Basic::new();
    b.reply(r#""A, B",C"#);
    b.enter(r#"INPUT X$,Y$:PRINT X$;"|";Y$"#);
    assert_eq!(exec(&mut b), "? \"A, B\",C\nA, B|C\n");
}

#[test]
fn test_break_during_input_and_cont() {
    let mut b = Basic::new();
    b.program(&["10 INPUT A", "20 PRINT A"]);
    b.enter("RUN");
    assert_eq!(exec(&mut b), "? Break in 10\n");
    b.reply("3");
    b.enter("CONT");
    assert_eq!(exec(&mut b), "? 3\n 3 \n");
}

#[test]
fn test_line_input() {
    let mut b = Basic::new();
    b.reply("a, \"b\"");
    b.enter(r#"LINE INPUT "L: ";A$:PRINT A$"#);
    assert_eq!(exec(&mut b), "L: a, \"b\"\na, \"b\"\n");
    b.enter(r#"LINE INPUT A"#);
    assert_eq!(exec(&mut b), "Error: Type mismatch\n");
}

#[test]
fn test_inkey() {
    let mut b = Basic::new();
    b.key(b'Z');
    b.enter(r#"PRINT INKEY$;INKEY$;".""#);
    assert_eq!(exec(&mut b), "Z.\n");
}

#[test]
fn test_input_dollar_from_keyboard() {
    let mut b = Basic::new();
    b.key(b'a');
    b.key(b'b');
    b.key(b'c');
    b.enter(r#"A$=INPUT$(2):PRINT A$"#);
    assert_eq!(exec(&mut b), "ab\n");
}
