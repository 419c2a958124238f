mod common;
use common::*;
use gwbasic::mach::Event;

fn path_of(name: &str) -> String {
    let path = temp_path(name);
    std::fs::remove_file(&path).ok();
    path.display().to_string()
}

fn error_code(b: &mut Basic) -> u16 {
    match last_event(b) {
        Event::Errored(error) => error.code(),
        event => panic!("{:?}", event),
    }
}

#[test]
fn test_sequential_write_and_read() {
    let path = path_of("seq.txt");
    let out = run(&[
        format!(r#"10 OPEN "{}" FOR OUTPUT AS #1"#, path).as_str(),
        r#"20 PRINT #1, "HELLO"; 42"#,
        r#"30 WRITE #1, "A", 1"#,
        r#"40 CLOSE #1"#,
        format!(r#"50 OPEN "{}" FOR INPUT AS #1"#, path).as_str(),
        r#"60 LINE INPUT #1, L$"#,
        r#"70 INPUT #1, A$, N"#,
        r#"80 PRINT L$: PRINT A$; N"#,
        r#"90 PRINT EOF(1)"#,
        r#"100 CLOSE"#,
    ]);
    assert_eq!(out, "HELLO 42 \nA 1 \n-1 \n");
    assert_eq!(std::fs::read(&path).unwrap(), b"HELLO 42 \r\n\"A\",1\r\n".to_vec());
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_append_and_letter_modes() {
    let path = path_of("append.txt");
    let out = run(&[
        format!(r#"10 OPEN "O", #1, "{}""#, path).as_str(),
        r#"20 PRINT #1, "ONE": CLOSE #1"#,
        format!(r#"30 OPEN "{}" FOR APPEND AS #2"#, path).as_str(),
        r#"40 PRINT #2, "TWO": CLOSE #2"#,
        format!(r#"50 OPEN "I", #1, "{}""#, path).as_str(),
        r#"60 WHILE NOT EOF(1): LINE INPUT #1, A$: PRINT A$: WEND"#,
        r#"70 CLOSE"#,
    ]);
    assert_eq!(out, "ONE\nTWO\n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_random_records() {
    let path = path_of("random.dat");
    let out = run(&[
        format!(r#"10 OPEN "{}" AS #1 LEN=32"#, path).as_str(),
        r#"20 FIELD #1, 8 AS N$, 8 AS V$"#,
        r#"30 LSET N$="BOB": RSET V$="42""#,
        r#"40 PUT #1, 1"#,
        r#"50 LSET N$="": RSET V$="""#,
        r#"60 GET #1, 1"#,
        r#"70 PRINT N$;"|";V$"#,
        r#"80 PRINT LOC(1);LOF(1)"#,
        r#"90 CLOSE #1"#,
    ]);
    assert_eq!(out, "BOB     |      42\n 1  32 \n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_field_overflow() {
    let path = path_of("overflow.dat");
    let out = run(&[
        format!(r#"10 OPEN "{}" AS #1 LEN=10"#, path).as_str(),
        r#"20 FIELD #1, 8 AS A$, 8 AS B$"#,
    ]);
    assert_eq!(out, "Error in line 20: FIELD overflow\n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_bad_file_number() {
    assert_eq!(run(&[r#"10 PRINT #3, "X""#]), "Error in line 10: Bad file number\n");
}

#[test]
fn test_file_already_open() {
    let path = path_of("twice.txt");
    let mut b = Basic::new();
    b.enter(&format!(r#"OPEN "{}" FOR OUTPUT AS #1"#, path));
    b.enter(&format!(r#"OPEN "{}" FOR OUTPUT AS #1"#, path));
    assert_eq!(error_code(&mut b), 52);
    b.enter("CLOSE");
    exec(&mut b);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_file_not_found() {
    let path = path_of("missing.txt");
    let mut b = Basic::new();
    b.enter(&format!(r#"OPEN "{}" FOR INPUT AS #1"#, path));
    assert_eq!(error_code(&mut b), 53);
}

#[test]
fn test_bad_file_mode_and_past_end() {
    let path = path_of("mode.txt");
    let mut b = Basic::new();
    b.enter(&format!(r#"OPEN "{}" FOR OUTPUT AS #1"#, path));
    b.enter("INPUT #1, A");
    assert_eq!(error_code(&mut b), 54);
    b.enter("CLOSE");
    b.enter(&format!(r#"OPEN "{}" FOR INPUT AS #1"#, path));
    b.enter("INPUT #1, A");
    assert_eq!(error_code(&mut b), 62);
    b.enter("CLOSE");
    exec(&mut b);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_end_closes_files() {
    let path = path_of("end.txt");
    let mut b = Basic::new();
    b.program(&[
        format!(r#"10 OPEN "{}" FOR OUTPUT AS #1"#, path).as_str(),
        r#"20 PRINT #1, "X""#,
        r#"30 END"#,
    ]);
    b.enter("RUN");
    exec(&mut b);
    b.enter(r#"PRINT #1, "Y""#);
    assert_eq!(exec(&mut b), "Error: Bad file number\n");
    assert_eq!(std::fs::read(&path).unwrap(), b"X\r\n".to_vec());
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_field_views_overlap() {
    let path = path_of("views.dat");
    let out = run(&[
        format!(r#"10 OPEN "{}" AS #1 LEN=10"#, path).as_str(),
        r#"20 FIELD #1, 10 AS W$"#,
        r#"30 FIELD #1, 5 AS A$, 5 AS B$"#,
        r#"40 LSET W$="0123456789""#,
        r#"50 PRINT A$;"|";B$"#,
        r#"60 PUT #1, 1"#,
        r#"70 RSET B$="X": PRINT W$"#,
        r#"80 GET #1, 1"#,
        r#"90 PRINT W$;"|";A$;"|";B$"#,
        r#"100 CLOSE #1"#,
    ]);
    assert_eq!(
        out,
        "01234|56789\n01234    X\n0123456789|01234|56789\n"
    );
    assert_eq!(std::fs::read(&path).unwrap(), b"0123456789".to_vec());
    std::fs::remove_file(&path).ok();
}
