mod common;
use common::*;

fn graphics(lines: &[&str]) -> String {
    let mut b = Basic::with_graphics();
    for line in lines {
        b.enter(line);
    }
    exec(&mut b)
}

#[test]
fn test_pset_preset_point() {
    assert_eq!(graphics(&["PSET (10,10):PRINT POINT(10,10)"]), " 3 \n");
    assert_eq!(graphics(&["PSET (10,10),2:PRINT POINT(10,10)"]), " 2 \n");
    assert_eq!(
        graphics(&["PSET (10,10),2:PRESET (10,10):PRINT POINT(10,10)"]),
        " 0 \n"
    );
    assert_eq!(graphics(&["PRINT POINT(500,10)"]), "-1 \n");
}

#[test]
fn test_pen_position_and_step() {
    assert_eq!(
        graphics(&["PSET (10,20):PRINT POINT(0);POINT(1)"]),
        " 10  20 \n"
    );
    assert_eq!(
        graphics(&["PSET (10,10):PSET STEP (5,5),1:PRINT POINT(15,15)"]),
        " 1 \n"
    );
}

#[test]
fn test_line_box_and_fill() {
    assert_eq!(
        graphics(&["LINE (0,0)-(10,0),1:PRINT POINT(5,0)"]),
        " 1 \n"
    );
    assert_eq!(
        graphics(&["LINE (20,20)-(30,30),2,B:PRINT POINT(25,20);POINT(25,25)"]),
        " 2  0 \n"
    );
    assert_eq!(
        graphics(&["LINE (40,40)-(50,50),4,BF:PRINT POINT(45,45)"]),
        " 4 \n"
    );
    assert_eq!(
        graphics(&["PSET (5,5):LINE -(5,9),1:PRINT POINT(5,7)"]),
        " 1 \n"
    );
}

#[test]
fn test_circle() {
    assert_eq!(
        graphics(&["CIRCLE (100,100),10,5:PRINT POINT(110,100);POINT(100,100)"]),
        " 5  0 \n"
    );
    assert_eq!(graphics(&["CIRCLE (100,100),10,5,7"]), "Error: Illegal function call\n");
}

#[test]
fn test_paint() {
    assert_eq!(
        graphics(&[
            "LINE (60,60)-(80,80),1,B",
            "PAINT (70,70),2,1",
            "PRINT POINT(70,70);POINT(60,70);POINT(85,85)",
        ]),
        " 2  1  0 \n"
    );
}

#[test]
fn test_draw() {
    assert_eq!(
        graphics(&[r#"DRAW "BM10,150 C1 R5":PRINT POINT(10,150);POINT(15,150);POINT(16,150)"#]),
        " 1  1  0 \n"
    );
    assert_eq!(
        graphics(&[r#"S$="D3":DRAW "BM30,30 C2 XS$;":PRINT POINT(30,33)"#]),
        " 2 \n"
    );
}

#[test]
fn test_get_and_put() {
    assert_eq!(
        graphics(&[
            "LINE (0,190)-(1,191),6,BF",
            "DIM A%(20)",
            "GET (0,190)-(1,191),A%",
            "PRINT A%(0);A%(1)",
            "PUT (100,190),A%,PSET",
            "PRINT POINT(101,191)",
            "PUT (100,190),A%",
            "PRINT POINT(101,191)",
        ]),
        " 2  2 \n 6 \n 0 \n"
    );
}

#[test]
fn test_graphics_need_a_screen() {
    let mut b = Basic::new();
    b.enter("PSET (1,1)");
    assert_eq!(exec(&mut b), "Error: Illegal function call\n");
    b.enter("SCREEN 1");
    assert_eq!(exec(&mut b), "Error: Illegal function call\n");
    let mut b = Basic::with_graphics();
    b.enter("SCREEN 1:PSET (1,1):CLS:PRINT POINT(1,1)");
    assert_eq!(exec(&mut b), " 0 \n");
}
