mod common;
use common::*;
use gwbasic::mach::Event;

fn path_of(name: &str) -> String {
    let path = temp_path(name);
    std::fs::remove_file(&path).ok();
    path.display().to_string()
}

#[test]
fn test_list() {
    let mut b = Basic::new();
    b.program(&["20 end", "10 print 1"]);
    b.enter("LIST");
    assert_eq!(exec(&mut b), "10 PRINT 1\n20 END\n");
    b.enter("LIST 20");
    assert_eq!(exec(&mut b), "20 END\n");
    b.enter("LIST -10");
    assert_eq!(exec(&mut b), "10 PRINT 1\n");
}

#[test]
fn test_line_replace_and_delete() {
    let mut b = Basic::new();
    b.program(&["10 PRINT 1", "20 PRINT 2", "30 PRINT 3"]);
    b.enter("20 PRINT 22");
    b.enter("30");
    b.enter("LIST");
    assert_eq!(exec(&mut b), "10 PRINT 1\n20 PRINT 22\n");
    assert_eq!(b.runtime.program().numbers(), vec![10, 20]);
}

#[test]
fn test_delete_statement() {
    let mut b = Basic::new();
    b.program(&["10 A=1", "20 A=2", "30 A=3", "40 A=4"]);
    b.enter("DELETE 20-30");
    b.enter("LIST");
    assert_eq!(exec(&mut b), "10 A=1\n40 A=4\n");
    b.enter("DELETE");
    assert_eq!(exec(&mut b), "Error: Illegal function call\n");
}

#[test]
fn test_new() {
    let mut b = Basic::new();
    b.program(&["10 PRINT 1"]);
    b.enter("NEW");
    b.enter("LIST");
    assert_eq!(exec(&mut b), "");
    assert!(b.runtime.program().is_empty());
}

#[test]
fn test_renum() {
    let mut b = Basic::new();
    b.program(&["10 GOTO 20", "20 END"]);
    b.enter("RENUM 100,,10");
    b.enter("LIST");
    assert_eq!(exec(&mut b), "100 GOTO 110\n110 END\n");
}

#[test]
fn test_renum_defaults() {
    let mut b = Basic::new();
    b.program(&["5 GOSUB 7", "7 RETURN"]);
    b.enter("RENUM");
    b.enter("LIST");
    assert_eq!(exec(&mut b), "10 GOSUB 20\n20 RETURN\n");
}

#[test]
fn test_save_and_load() {
    let path = path_of("prog.bas");
    let mut b = Basic::new();
    b.program(&[r#"10 PRINT "SAVED""#]);
    b.enter(&format!(r#"SAVE "{}""#, path));
    b.enter("NEW");
    b.enter(&format!(r#"LOAD "{}""#, path));
    b.enter("LIST");
    assert_eq!(exec(&mut b), "10 PRINT \"SAVED\"\n");
    assert_eq!(std::fs::read(&path).unwrap()[0], 0xFF);
    b.enter("RUN");
    assert_eq!(exec(&mut b), "SAVED\n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_save_too_large_for_links() {
    let path = path_of("huge.bas");
    let mut b = Basic::new();
    let lines: Vec<String> = (1..=300)
        .map(|n| format!("{} REM {}", n, "X".repeat(240)))
        .collect();
    let lines: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    b.program(&lines);
    b.enter(&format!(r#"SAVE "{}""#, path));
    assert_eq!(exec(&mut b), "Error: Out of memory\n");
    assert!(std::fs::metadata(&path).is_err());
}

#[test]
fn test_save_ascii_and_run_file() {
    let path = path_of("ascii.bas");
    let mut b = Basic::new();
    b.program(&["10 PRINT 1", "20 END"]);
    b.enter(&format!(r#"SAVE "{}",A"#, path));
    exec(&mut b);
    assert_eq!(std::fs::read(&path).unwrap(), b"10 PRINT 1\r\n20 END\r\n".to_vec());
    let mut fresh = Basic::new();
    fresh.enter(&format!(r#"RUN "{}""#, path));
    assert_eq!(exec(&mut fresh), " 1 \n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_merge() {
    let path = path_of("merge.bas");
    std::fs::write(&path, b"20 PRINT 2\r\n30 PRINT 3\r\n").unwrap();
    let mut b = Basic::new();
    b.program(&["10 PRINT 1", "20 PRINT 0"]);
    b.enter(&format!(r#"MERGE "{}""#, path));
    b.enter("LIST");
    assert_eq!(exec(&mut b), "10 PRINT 1\n20 PRINT 2\n30 PRINT 3\n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_malformed_program() {
    let path = path_of("broken.bas");
    std::fs::write(&path, [0xFF, 1, 2]).unwrap();
    let mut b = Basic::new();
    b.enter(&format!(r#"LOAD "{}""#, path));
    match last_event(&mut b) {
        Event::Errored(error) => assert_eq!(error.code(), 54),
        event => panic!("{:?}", event),
    }
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_direct_statement() {
    let path = path_of("direct.bas");
    std::fs::write(&path, b"10 PRINT 1\r\nPRINT 2\r\n").unwrap();
    let mut b = Basic::new();
    b.enter(&format!(r#"LOAD "{}""#, path));
    assert_eq!(exec(&mut b), "Error: Direct statement in file\n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_list_inside_program_continues() {
    let out = run(&["10 LIST 10", r#"20 PRINT "X""#]);
    assert_eq!(out, "10 LIST 10\nX\n");
}
