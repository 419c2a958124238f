use super::token::{self, tok};
use super::{cp437, Column, Error, LineNumber, MaxValue};
use crate::mach::{format, Mbf32, Mbf64};

type Result<T> = std::result::Result<T, Error>;

/// One lexical token: the source text it came from and its crunched
/// byte encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub bytes: Vec<u8>,
    pub column: Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LineNumber,
    LineRef,
    Integer,
    Single,
    Double,
    String,
    Reserved,
    Identifier,
    Remark,
    Data,
    Char,
}

pub fn tokenize(s: &str) -> Result<Vec<Token>> {
    BasicLexer::new(s).collect()
}

/// Source to token bytes, terminated with 0x00.
pub fn crunch(s: &str) -> Result<Vec<u8>> {
    let mut bytes: Vec<u8> = vec![];
    for t in tokenize(s)? {
        bytes.extend(t.bytes);
    }
    bytes.push(token::EOL);
    Ok(bytes)
}

/// Continuations (`_` at a physical line end) become a single space;
/// anything after a remaining line break is not part of this line.
fn join_continuations(s: &str) -> Vec<u8> {
    let src = cp437::to_bytes(s);
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        let c = src[i];
        if c == b'_' && matches!(src.get(i + 1), Some(b'\r') | Some(b'\n')) {
            i += 1;
            if src[i] == b'\r' && src.get(i + 1) == Some(&b'\n') {
                i += 1;
            }
            i += 1;
            out.push(b' ');
            continue;
        }
        if c == b'\r' || c == b'\n' {
            break;
        }
        out.push(if c < 0x20 { b' ' } else { c });
        i += 1;
    }
    out
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.'
}

/// Words after which bare digits are line numbers.
fn takes_line_numbers(code: token::Code) -> bool {
    use token::Code::Byte;
    matches!(
        code,
        Byte(tok::GOTO)
            | Byte(tok::GOSUB)
            | Byte(tok::THEN)
            | Byte(tok::ELSE)
            | Byte(tok::RESTORE)
            | Byte(tok::RESUME)
            | Byte(tok::RUN)
            | Byte(tok::LIST)
            | Byte(tok::LLIST)
            | Byte(tok::DELETE)
            | Byte(tok::RENUM)
            | Byte(tok::EDIT)
            | Byte(tok::AUTO)
            | Byte(tok::RETURN)
    )
}

struct BasicLexer {
    src: Vec<u8>,
    pos: usize,
    line_refs: bool,
    done: bool,
    error: bool,
}

impl BasicLexer {
    fn new(s: &str) -> BasicLexer {
        let mut lexer = BasicLexer {
            src: join_continuations(s),
            pos: 0,
            line_refs: false,
            done: false,
            error: false,
        };
        while lexer.src.last() == Some(&b' ') {
            lexer.src.pop();
        }
        lexer
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn text(&self, start: usize) -> String {
        cp437::to_string(&self.src[start..self.pos])
    }

    fn token(&self, kind: TokenKind, start: usize, bytes: Vec<u8>) -> Token {
        Token {
            kind,
            text: self.text(start),
            bytes,
            column: start..self.pos,
        }
    }

    fn line_number(&mut self) -> Option<Result<Token>> {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            self.pos = 0;
            return None;
        }
        let column = start..self.pos;
        let text = self.text(start);
        let number = match text.parse::<u32>() {
            Ok(n) if n <= LineNumber::max_value() as u32 => n as u16,
            _ => return Some(Err(error!(SyntaxError, ..&column; "INVALID LINE NUMBER"))),
        };
        let mut bytes = vec![token::LINE_REF];
        bytes.extend_from_slice(&number.to_le_bytes());
        let t = Token {
            kind: TokenKind::LineNumber,
            text,
            bytes,
            column,
        };
        if self.peek() == Some(b' ') {
            self.pos += 1;
        }
        Some(Ok(t))
    }

    fn line_ref(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        let column = start..self.pos;
        let number = match self.text(start).parse::<u32>() {
            Ok(n) if n <= LineNumber::max_value() as u32 => n as u16,
            _ => return Err(error!(SyntaxError, ..&column; "INVALID LINE NUMBER")),
        };
        let mut bytes = vec![token::LINE_REF];
        bytes.extend_from_slice(&number.to_le_bytes());
        Ok(self.token(TokenKind::LineRef, start, bytes))
    }

    fn number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut digits = 0;
        let mut leading = true;
        let mut decimal = false;
        let mut exp: Option<u8> = None;
        let mut suffix: Option<u8> = None;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                if exp.is_none() && (c != b'0' || !leading) {
                    digits += 1;
                    leading = false;
                }
                self.pos += 1;
            } else if c == b'.' && !decimal && exp.is_none() {
                decimal = true;
                self.pos += 1;
            } else if matches!(c, b'E' | b'e' | b'D' | b'd') && exp.is_none() {
                let next = self.peek_at(1);
                let exp_digits = match next {
                    Some(d) if d.is_ascii_digit() => true,
                    Some(b'+') | Some(b'-') => {
                        self.peek_at(2).map_or(false, |d| d.is_ascii_digit())
                    }
                    _ => false,
                };
                if !exp_digits {
                    if matches!(next, Some(b'+') | Some(b'-')) {
                        self.pos += 2;
                        let column = start..self.pos;
                        return Err(error!(SyntaxError, ..&column; "MALFORMED NUMBER"));
                    }
                    break;
                }
                exp = Some(c.to_ascii_uppercase());
                self.pos += 2;
            } else if matches!(c, b'%' | b'!' | b'#') {
                suffix = Some(c);
                self.pos += 1;
                break;
            } else {
                break;
            }
        }
        let column = start..self.pos;
        let text = self.text(start);
        let mut numeric: String = text
            .chars()
            .filter(|c| !matches!(c, '%' | '!' | '#'))
            .map(|c| if c == 'D' || c == 'd' { 'E' } else { c })
            .collect();
        if numeric.starts_with('.') {
            numeric.insert(0, '0');
        }
        let value = match numeric.parse::<f64>() {
            Ok(v) => v,
            Err(_) => return Err(error!(SyntaxError, ..&column; "MALFORMED NUMBER")),
        };
        let kind = match suffix {
            Some(b'%') => TokenKind::Integer,
            Some(b'!') => TokenKind::Single,
            Some(b'#') => TokenKind::Double,
            _ => {
                if exp == Some(b'D') || digits > 7 {
                    TokenKind::Double
                } else if exp.is_some() || decimal {
                    TokenKind::Single
                } else if value <= i16::max_value() as f64 {
                    TokenKind::Integer
                } else {
                    TokenKind::Single
                }
            }
        };
        let bytes = encode_number(kind, value).map_err(|e| e.in_column(&column))?;
        Ok(self.token(kind, start, bytes))
    }

    fn radix(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let radix = match self.peek() {
            Some(b'H') | Some(b'h') => {
                self.pos += 1;
                16
            }
            Some(b'O') | Some(b'o') => {
                self.pos += 1;
                8
            }
            _ => 8,
        };
        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() {
                break;
            }
            self.pos += 1;
        }
        let column = start..self.pos;
        let digits = self.text(digits_start);
        if digits.is_empty() {
            return Err(error!(SyntaxError, ..&column; "MISSING DIGITS"));
        }
        let value = match u32::from_str_radix(&digits, radix) {
            Ok(v) if v <= 0xFFFF => v,
            Ok(_) => return Err(error!(Overflow, ..&column)),
            Err(_) => return Err(error!(SyntaxError, ..&column; "INVALID DIGIT")),
        };
        let (kind, bytes) = if value <= i16::max_value() as u32 {
            (
                TokenKind::Integer,
                encode_number(TokenKind::Integer, value as f64)?,
            )
        } else {
            (
                TokenKind::Single,
                encode_number(TokenKind::Single, value as f64)?,
            )
        };
        Ok(self.token(kind, start, bytes))
    }

    fn string(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == b'"' {
                break;
            }
        }
        let bytes = self.src[start..self.pos].to_vec();
        self.token(TokenKind::String, start, bytes)
    }

    fn rest_of_line(&mut self, kind: TokenKind, start: usize, lead: Vec<u8>) -> Token {
        let mut bytes = lead;
        bytes.extend_from_slice(&self.src[self.pos..]);
        self.pos = self.src.len();
        self.token(kind, start, bytes)
    }

    fn data(&mut self, start: usize) -> Token {
        let mut bytes = vec![tok::DATA];
        let mut quoted = false;
        while let Some(c) = self.peek() {
            if c == b'"' {
                quoted = !quoted;
            } else if c == b':' && !quoted {
                break;
            }
            bytes.push(c);
            self.pos += 1;
        }
        self.token(TokenKind::Data, start, bytes)
    }

    fn alphabetic(&mut self) -> Token {
        let start = self.pos;
        if let Some(word) = token::keyword_at(&self.src[self.pos..]) {
            self.pos += word.name.len();
            let bytes = word.code.bytes();
            match word.code {
                token::Code::Byte(tok::REM) => {
                    return self.rest_of_line(TokenKind::Remark, start, bytes);
                }
                token::Code::Byte(tok::DATA) => return self.data(start),
                _ => {}
            }
            self.line_refs = takes_line_numbers(word.code);
            return self.token(TokenKind::Reserved, start, bytes);
        }
        let mut digit = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() && digit {
                break;
            }
            if !is_ident_char(c) {
                break;
            }
            if c.is_ascii_digit() {
                digit = true;
            }
            self.pos += 1;
        }
        if let Some(c) = self.peek() {
            if matches!(c, b'$' | b'%' | b'!' | b'#') {
                self.pos += 1;
            }
        }
        let bytes = self.src[start..self.pos].to_ascii_uppercase();
        self.line_refs = false;
        self.token(TokenKind::Identifier, start, bytes)
    }

    fn minutia(&mut self) -> Token {
        let start = self.pos;
        let c = self.src[self.pos];
        self.pos += 1;
        if let Some(next) = self.peek() {
            if let Some(op) = token::relational_for(c, next) {
                self.pos += 1;
                self.line_refs = false;
                return self.token(TokenKind::Reserved, start, vec![op]);
            }
        }
        if let Some(op) = token::operator_for(c) {
            if c != b'-' {
                self.line_refs = false;
            }
            return self.token(TokenKind::Reserved, start, vec![op]);
        }
        match c {
            b'\'' => self.rest_of_line(TokenKind::Remark, start, vec![tok::APOSTROPHE]),
            b'?' => {
                self.line_refs = false;
                self.token(TokenKind::Reserved, start, vec![tok::PRINT])
            }
            b' ' | b',' => self.token(TokenKind::Char, start, vec![c]),
            _ => {
                self.line_refs = false;
                self.token(TokenKind::Char, start, vec![c])
            }
        }
    }
}

impl Iterator for BasicLexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.error {
            return None;
        }
        if self.pos == 0 {
            if let Some(t) = self.line_number() {
                self.error = t.is_err();
                return Some(t);
            }
        }
        let pk = match self.peek() {
            Some(pk) => pk,
            None => {
                self.done = true;
                return None;
            }
        };
        let result = if pk.is_ascii_digit() && self.line_refs {
            self.line_ref()
        } else if pk.is_ascii_digit() || (pk == b'.' && self.peek_at(1).map_or(false, |c| c.is_ascii_digit())) {
            self.line_refs = false;
            self.number()
        } else if pk == b'&' {
            self.line_refs = false;
            self.radix()
        } else if pk == b'"' {
            self.line_refs = false;
            Ok(self.string())
        } else if pk.is_ascii_alphabetic() {
            Ok(self.alphabetic())
        } else {
            Ok(self.minutia())
        };
        self.error = result.is_err();
        Some(result)
    }
}

/// The crunched form of a numeric literal of the given kind.
pub fn encode_number(kind: TokenKind, value: f64) -> Result<Vec<u8>> {
    let mut bytes = vec![];
    match kind {
        TokenKind::Integer => {
            if value > i16::max_value() as f64 || value < i16::min_value() as f64 {
                return Err(error!(Overflow));
            }
            bytes.push(token::INT_LIT);
            bytes.extend_from_slice(&(value as i16).to_le_bytes());
        }
        TokenKind::Double => {
            if value.abs() > crate::mach::mbf::max_magnitude() {
                return Err(error!(Overflow));
            }
            bytes.push(token::DBL_LIT);
            bytes.extend_from_slice(&Mbf64::from_f64(value).to_le_bytes());
        }
        _ => {
            if value.abs() > crate::mach::mbf::max_magnitude() {
                return Err(error!(Overflow));
            }
            bytes.push(token::SNG_LIT);
            bytes.extend_from_slice(&Mbf32::from_f32(value as f32).to_le_bytes());
        }
    }
    Ok(bytes)
}

/// Token bytes back to source text. A space goes between neighbours
/// that would otherwise run together into a different crunch.
pub fn detokenize(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut pos = 0;
    if bytes.first() == Some(&token::LINE_REF) && bytes.len() >= 3 {
        out.push_str(&u16::from_le_bytes([bytes[1], bytes[2]]).to_string());
        out.push(' ');
        pos = 3;
    }
    while pos < bytes.len() && bytes[pos] != token::EOL {
        let next = token::skip(bytes, pos);
        let (piece, next) = piece_at(bytes, pos, next);
        append(&mut out, &piece);
        pos = next.max(pos + 1);
    }
    out
}

fn append(out: &mut String, piece: &str) {
    let joins = |c: char| c.is_ascii_alphanumeric() || c == '$' || c == '.';
    if let (Some(last), Some(first)) = (out.chars().last(), piece.chars().next()) {
        if joins(last) && (first.is_ascii_alphanumeric() || first == '.') {
            out.push(' ');
        }
    }
    out.push_str(piece);
}

fn piece_at(bytes: &[u8], pos: usize, next: usize) -> (String, usize) {
    let b = bytes[pos];
    let operand = |n: usize| &bytes[(pos + 1).min(bytes.len())..(pos + 1 + n).min(bytes.len())];
    match b {
        token::LINE_REF => {
            let o = operand(2);
            if o.len() < 2 {
                return (String::new(), next);
            }
            (u16::from_le_bytes([o[0], o[1]]).to_string(), next)
        }
        token::INT_LIT => {
            let o = operand(2);
            if o.len() < 2 {
                return (String::new(), next);
            }
            (i16::from_le_bytes([o[0], o[1]]).to_string(), next)
        }
        token::SNG_LIT => {
            let o = operand(4);
            if o.len() < 4 {
                return (String::new(), next);
            }
            let m = Mbf32::from_le_bytes([o[0], o[1], o[2], o[3]]);
            (format::single_literal(m.to_f32()), next)
        }
        token::DBL_LIT => {
            let o = operand(8);
            if o.len() < 8 {
                return (String::new(), next);
            }
            let mut a = [0u8; 8];
            a.copy_from_slice(o);
            (format::double_literal(Mbf64::from_le_bytes(a).to_f64()), next)
        }
        b'"' => (cp437::to_string(&bytes[pos..next]), next),
        tok::REM | tok::APOSTROPHE | tok::DATA => {
            let name = token::name_of(token::Code::Byte(b)).unwrap_or("");
            let mut s = name.to_string();
            s.push_str(&cp437::to_string(&bytes[pos + 1..next]));
            (s, next)
        }
        token::PREFIX_FN | token::PREFIX_XFN | token::PREFIX_XSTMT => {
            let code = token::Code::Prefixed(b, bytes.get(pos + 1).copied().unwrap_or(0));
            (token::name_of(code).unwrap_or("").to_string(), next)
        }
        _ if b >= 0x80 => (
            token::name_of(token::Code::Byte(b)).unwrap_or("").to_string(),
            next,
        ),
        _ if is_ident_char(b) => {
            let mut end = pos;
            while end < bytes.len() && is_ident_char(bytes[end]) {
                end += 1;
            }
            if end < bytes.len() && matches!(bytes[end], b'$' | b'%' | b'!' | b'#') {
                end += 1;
            }
            (cp437::to_string(&bytes[pos..end]), end)
        }
        _ => (cp437::to_string(&bytes[pos..next]), next),
    }
}
