mod common;
use common::*;

fn rounded(sounds: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    sounds
        .into_iter()
        .map(|(f, ms)| (f.round(), ms.round()))
        .collect()
}

#[test]
fn test_sound() {
    let mut b = Basic::new();
    b.enter("SOUND 440,18.2");
    assert_eq!(exec(&mut b), "");
    assert_eq!(rounded(b.sounds()), vec![(440.0, 1000.0)]);
}

#[test]
fn test_sound_range() {
    let mut b = Basic::new();
    b.enter("SOUND 20,1");
    assert_eq!(exec(&mut b), "Error: Illegal function call\n");
    assert!(b.sounds().is_empty());
}

#[test]
fn test_beep() {
    let mut b = Basic::new();
    b.enter("BEEP");
    exec(&mut b);
    assert_eq!(b.sounds(), vec![(800.0, 250.0)]);
}

#[test]
fn test_play() {
    let mut b = Basic::new();
    b.enter(r#"PLAY "ML C""#);
    exec(&mut b);
    assert_eq!(rounded(b.sounds()), vec![(523.0, 500.0)]);
}

#[test]
fn test_play_settings_persist() {
    let mut b = Basic::new();
    b.enter(r#"PLAY "ML O3 L8""#);
    b.enter(r#"PLAY "A""#);
    exec(&mut b);
    assert_eq!(rounded(b.sounds()), vec![(440.0, 250.0)]);
}

#[test]
fn test_play_variable_substring() {
    let mut b = Basic::new();
    b.enter(r#"T$="ML O3 A":PLAY "XT$;""#);
    exec(&mut b);
    assert_eq!(rounded(b.sounds()), vec![(440.0, 500.0)]);
}
