use super::Val;
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

const MAX_NESTING: usize = 16;

/// PLAY settings that persist from one PLAY statement to the next.
#[derive(Debug, Clone)]
pub struct Music {
    octave: i32,
    length: f64,
    tempo: f64,
    legato: f64,
}

impl Default for Music {
    fn default() -> Music {
        Music {
            octave: 4,
            length: 4.0,
            tempo: 120.0,
            legato: 7.0 / 8.0,
        }
    }
}

/// Frequency of note `n`, 1 to 84; note 46 is the A at 440 Hz.
pub fn frequency(n: i32) -> f64 {
    440.0 * 2f64.powf((n - 46) as f64 / 12.0)
}

/// Milliseconds for a note of the given length at `tempo` quarter
/// notes per minute.
pub fn duration(tempo: f64, length: f64) -> f64 {
    240_000.0 / (tempo * length)
}

/// ## PLAY
///
/// Each tone goes to `sound` as (Hz, ms); silences are sent with a
/// frequency of zero.
pub fn play(
    commands: &[u8],
    music: &mut Music,
    lookup: &mut dyn FnMut(&[u8]) -> Result<Val>,
    sound: &mut dyn FnMut(f64, f64),
) -> Result<()> {
    run(commands, music, lookup, sound, 0)
}

struct Scan<'s> {
    src: &'s [u8],
    pos: usize,
}

impl<'s> Scan<'s> {
    fn at(&self) -> Option<u8> {
        self.src.get(self.pos).map(u8::to_ascii_uppercase)
    }

    fn skip(&mut self) {
        while matches!(self.at(), Some(b' ') | Some(b';')) {
            self.pos += 1;
        }
    }

    fn next(&mut self) -> Option<u8> {
        self.skip();
        let c = self.at()?;
        self.pos += 1;
        Some(c)
    }

    fn name(&mut self) -> Result<Vec<u8>> {
        let start = self.pos;
        while !matches!(self.at(), Some(b';') | None) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(error!(IllegalFunctionCall));
        }
        let name = self.src[start..self.pos].to_ascii_uppercase();
        self.pos += 1;
        Ok(name)
    }

    fn number(
        &mut self,
        lookup: &mut dyn FnMut(&[u8]) -> Result<Val>,
    ) -> Result<Option<f64>> {
        if self.at() == Some(b'=') {
            self.pos += 1;
            let name = self.name()?;
            return Ok(Some(f64::try_from(lookup(&name)?)?));
        }
        let start = self.pos;
        while matches!(self.at(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        Ok(std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .and_then(|t| t.parse().ok()))
    }

    fn required(&mut self, lookup: &mut dyn FnMut(&[u8]) -> Result<Val>) -> Result<f64> {
        self.number(lookup)?
            .ok_or_else(|| error!(IllegalFunctionCall))
    }

    fn dots(&mut self) -> f64 {
        let mut k = 1.0;
        let mut add = 0.5;
        while self.at() == Some(b'.') {
            k += add;
            add /= 2.0;
            self.pos += 1;
        }
        k
    }
}

fn in_range(n: f64, lo: f64, hi: f64) -> Result<f64> {
    if n < lo || n > hi {
        Err(error!(IllegalFunctionCall))
    } else {
        Ok(n)
    }
}

fn tone(music: &Music, note: i32, ms: f64, sound: &mut dyn FnMut(f64, f64)) {
    if note == 0 {
        sound(0.0, ms);
        return;
    }
    let on = ms * music.legato;
    sound(frequency(note), on);
    if ms - on > 0.0 {
        sound(0.0, ms - on);
    }
}

fn run(
    commands: &[u8],
    music: &mut Music,
    lookup: &mut dyn FnMut(&[u8]) -> Result<Val>,
    sound: &mut dyn FnMut(f64, f64),
    depth: usize,
) -> Result<()> {
    let mut s = Scan {
        src: commands,
        pos: 0,
    };
    while let Some(c) = s.next() {
        match c {
            b'A'..=b'G' => {
                let mut semitone = match c {
                    b'C' => 0,
                    b'D' => 2,
                    b'E' => 4,
                    b'F' => 5,
                    b'G' => 7,
                    b'A' => 9,
                    _ => 11,
                };
                match s.at() {
                    Some(b'#') | Some(b'+') => {
                        semitone += 1;
                        s.pos += 1;
                    }
                    Some(b'-') => {
                        semitone -= 1;
                        s.pos += 1;
                    }
                    _ => {}
                }
                let length = match s.number(lookup)? {
                    Some(n) => in_range(n, 1.0, 64.0)?,
                    None => music.length,
                };
                let ms = duration(music.tempo, length) * s.dots();
                let note = music.octave * 12 + semitone + 1;
                tone(music, note.max(1).min(84), ms, sound);
            }
            b'N' => {
                let note = in_range(s.required(lookup)?, 0.0, 84.0)? as i32;
                let ms = duration(music.tempo, music.length) * s.dots();
                tone(music, note, ms, sound);
            }
            b'P' => {
                let length = in_range(s.required(lookup)?, 1.0, 64.0)?;
                sound(0.0, duration(music.tempo, length) * s.dots());
            }
            b'O' => music.octave = in_range(s.required(lookup)?, 0.0, 6.0)? as i32,
            b'<' => music.octave = (music.octave - 1).max(0),
            b'>' => music.octave = (music.octave + 1).min(6),
            b'L' => music.length = in_range(s.required(lookup)?, 1.0, 64.0)?,
            b'T' => music.tempo = in_range(s.required(lookup)?, 32.0, 255.0)?,
            b'M' => match s.next() {
                Some(b'N') => music.legato = 7.0 / 8.0,
                Some(b'L') => music.legato = 1.0,
                Some(b'S') => music.legato = 3.0 / 4.0,
                Some(b'F') | Some(b'B') => {}
                _ => return Err(error!(IllegalFunctionCall)),
            },
            b'X' => {
                let name = s.name()?;
                let sub = Vec::<u8>::try_from(lookup(&name)?)?;
                if depth >= MAX_NESTING {
                    return Err(error!(IllegalFunctionCall));
                }
                run(&sub, music, lookup, sound, depth + 1)?;
            }
            _ => return Err(error!(IllegalFunctionCall)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tones(commands: &str, music: &mut Music) -> Result<Vec<(f64, f64)>> {
        let mut out = vec![];
        let mut lookup = |name: &[u8]| -> Result<Val> {
            match name {
                b"TUNE$" => Ok(Val::from("CDE")),
                _ => Ok(Val::Integer(8)),
            }
        };
        play(commands.as_bytes(), music, &mut lookup, &mut |f: f64, ms: f64| {
            out.push((f.round(), ms.round()))
        })?;
        Ok(out)
    }

    #[test]
    fn test_frequency_and_duration() {
        assert_eq!(frequency(46), 440.0);
        assert_eq!(frequency(58).round(), 880.0);
        assert_eq!(duration(120.0, 4.0), 500.0);
    }

    #[test]
    fn test_legato_and_rests() {
        let mut music = Music::default();
        assert_eq!(
            tones("O3 ML A P8", &mut music).unwrap(),
            vec![(440.0, 500.0), (0.0, 250.0)]
        );
        assert_eq!(
            tones("MS T60 L2 N46", &mut music).unwrap(),
            vec![(440.0, 1500.0), (0.0, 500.0)]
        );
    }

    #[test]
    fn test_dots_sharps_and_substrings() {
        let mut music = Music::default();
        let out = tones("ML O2 A#4.", &mut music).unwrap();
        assert_eq!(out, vec![(frequency(35).round(), 750.0)]);
        let out = tones("ML L=N; XTUNE$;", &mut music).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].1, 250.0);
        assert_eq!(tones("O9", &mut music).unwrap_err().code(), 5);
        assert_eq!(tones("Z", &mut music).unwrap_err().code(), 5);
    }
}
