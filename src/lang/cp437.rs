//! BASIC strings are bytes in code page 437. Hosts speak Unicode.

static HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Control characters pass through untouched so the host sees line
/// feeds and bells as such.
pub fn decode(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        HIGH[(byte - 0x80) as usize]
    }
}

pub fn encode(ch: char) -> u8 {
    if (ch as u32) < 0x80 {
        ch as u8
    } else {
        match HIGH.iter().position(|&c| c == ch) {
            Some(i) => 0x80 + i as u8,
            None => b'?',
        }
    }
}

pub fn to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(encode).collect()
}

pub fn to_string(bytes: &[u8]) -> String {
    bytes.iter().copied().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_high_half() {
        for b in 0x80..=0xFFu8 {
            assert_eq!(encode(decode(b)), b);
        }
        assert_eq!(to_bytes("é"), vec![0x82]);
        assert_eq!(to_string(b"A\n"), "A\n");
    }
}
