mod common;
use common::*;
use gwbasic::mach::Event;

#[test]
fn test_on_error_resume_next() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 A=SQR(-1)"#,
        r#"30 PRINT "AFTER": END"#,
        r#"100 PRINT "ERR";ERR;"AT";ERL"#,
        r#"110 RESUME NEXT"#,
    ]);
    assert_eq!(out, "ERR 5 AT 20 \nAFTER\n");
}

#[test]
fn test_resume_retries_statement() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 N=0"#,
        r#"30 PRINT MID$("ABC",N)"#,
        r#"40 END"#,
        r#"100 N=1: RESUME"#,
    ]);
    assert_eq!(out, "ABC\n");
}

#[test]
fn test_resume_line() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 ERROR 200"#,
        r#"30 END"#,
        r#"100 PRINT ERR: RESUME 30"#,
    ]);
    assert_eq!(out, " 200 \n");
}

#[test]
fn test_resume_without_error() {
    let mut b = Basic::new();
    b.enter("RESUME");
    assert_eq!(exec(&mut b), "Error: RESUME without error\n");
}

#[test]
fn test_handler_without_resume() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 ERROR 5"#,
        r#"100 PRINT "H""#,
    ]);
    assert_eq!(out, "H\nError in line 100: No RESUME\n");
}

#[test]
fn test_on_error_goto_zero_in_handler() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 ERROR 13"#,
        r#"100 ON ERROR GOTO 0"#,
    ]);
    assert_eq!(out, "Error in line 20: Type mismatch\n");
}

#[test]
fn test_error_in_handler_is_fatal() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 ERROR 5"#,
        r#"100 X=1/0"#,
    ]);
    assert_eq!(out, "Error in line 100: Division by zero\n");
}

#[test]
fn test_unprintable_error() {
    let mut b = Basic::new();
    b.enter("ERROR 200");
    assert_eq!(exec(&mut b), "Error: Unprintable error\n");
}

#[test]
fn test_error_code_range() {
    let mut b = Basic::new();
    b.enter("ERROR 0");
    assert_eq!(exec(&mut b), "Error: Illegal function call\n");
}

#[test]
fn test_errored_event() {
    let mut b = Basic::new();
    b.program(&["10 PRINT 1/0"]);
    b.enter("RUN");
    match last_event(&mut b) {
        Event::Errored(error) => {
            assert_eq!(error.code(), 11);
            assert_eq!(error.line_number(), Some(10));
        }
        event => panic!("{:?}", event),
    }
}

#[test]
fn test_error_ends_pending_direct_statements() {
    let mut b = Basic::new();
    b.enter("PRINT 1/0");
    b.enter(r#"PRINT "NEXT""#);
    assert_eq!(exec(&mut b), "Error: Division by zero\n");
}

#[test]
fn test_output_column_reset_before_error() {
    let mut b = Basic::new();
    b.enter(r#"PRINT "A";:ERROR 5"#);
    assert_eq!(exec(&mut b), "A\nError: Illegal function call\n");
}

#[test]
fn test_trapped_division_by_zero() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 A = 1/0"#,
        r#"30 PRINT "SKIPPED""#,
        r#"100 PRINT "ERR=";ERR;" LINE=";ERL"#,
        r#"110 END"#,
    ]);
    assert_eq!(out, "ERR= 11  LINE= 20 \n");
}

#[test]
fn test_resume_in_if_branch_retries_the_line() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 A=A+1: IF A<3 THEN ERROR 5"#,
        r#"30 PRINT A: END"#,
        r#"100 RESUME"#,
    ]);
    assert_eq!(out, " 3 \n");
}

#[test]
fn test_resume_next_in_if_branch_skips_the_line() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 IF 1 THEN ERROR 5: PRINT "x" ELSE PRINT "z""#,
        r#"30 PRINT "y": END"#,
        r#"100 RESUME NEXT"#,
    ]);
    assert_eq!(out, "y\n");
}

#[test]
fn test_resume_next_after_if_condition_error() {
    let out = run(&[
        r#"10 ON ERROR GOTO 100"#,
        r#"20 IF SQR(-1) THEN PRINT "x""#,
        r#"30 PRINT "y": END"#,
        r#"100 PRINT ERR: RESUME NEXT"#,
    ]);
    assert_eq!(out, " 5 \ny\n");
}
