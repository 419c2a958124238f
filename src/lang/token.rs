//! The token canon: byte values of every keyword, operator and literal
//! marker, plus token-aware scanning over crunched lines.

use std::collections::HashMap;

pub const EOL: u8 = 0x00;
pub const LINE_REF: u8 = 0x0D;
pub const INT_LIT: u8 = 0x11;
pub const SNG_LIT: u8 = 0x1D;
pub const DBL_LIT: u8 = 0x1F;
pub const PREFIX_XFN: u8 = 0xFD;
pub const PREFIX_XSTMT: u8 = 0xFE;
pub const PREFIX_FN: u8 = 0xFF;

/// Single-byte tokens.
pub mod tok {
    pub const END: u8 = 0x80;
    pub const FOR: u8 = 0x81;
    pub const NEXT: u8 = 0x82;
    pub const DATA: u8 = 0x83;
    pub const INPUT: u8 = 0x84;
    pub const DIM: u8 = 0x85;
    pub const READ: u8 = 0x86;
    pub const LET: u8 = 0x87;
    pub const GOTO: u8 = 0x88;
    pub const RUN: u8 = 0x89;
    pub const IF: u8 = 0x8A;
    pub const RESTORE: u8 = 0x8B;
    pub const GOSUB: u8 = 0x8C;
    pub const RETURN: u8 = 0x8D;
    pub const REM: u8 = 0x8E;
    pub const STOP: u8 = 0x8F;
    pub const PRINT: u8 = 0x90;
    pub const CLEAR: u8 = 0x91;
    pub const LIST: u8 = 0x92;
    pub const NEW: u8 = 0x93;
    pub const ON: u8 = 0x94;
    pub const WAIT: u8 = 0x95;
    pub const DEF: u8 = 0x96;
    pub const POKE: u8 = 0x97;
    pub const CONT: u8 = 0x98;
    pub const OUT: u8 = 0x99;
    pub const LPRINT: u8 = 0x9A;
    pub const LLIST: u8 = 0x9B;
    pub const WIDTH: u8 = 0x9C;
    pub const ELSE: u8 = 0x9D;
    pub const TRON: u8 = 0x9E;
    pub const TROFF: u8 = 0x9F;
    pub const SWAP: u8 = 0xA0;
    pub const ERASE: u8 = 0xA1;
    pub const EDIT: u8 = 0xA2;
    pub const ERROR: u8 = 0xA3;
    pub const RESUME: u8 = 0xA4;
    pub const DELETE: u8 = 0xA5;
    pub const AUTO: u8 = 0xA6;
    pub const RENUM: u8 = 0xA7;
    pub const DEFSTR: u8 = 0xA8;
    pub const DEFINT: u8 = 0xA9;
    pub const DEFSNG: u8 = 0xAA;
    pub const DEFDBL: u8 = 0xAB;
    pub const LINE: u8 = 0xAC;
    pub const WHILE: u8 = 0xAD;
    pub const WEND: u8 = 0xAE;
    pub const CALL: u8 = 0xAF;
    pub const WRITE: u8 = 0xB0;
    pub const OPTION: u8 = 0xB1;
    pub const RANDOMIZE: u8 = 0xB2;
    pub const OPEN: u8 = 0xB3;
    pub const CLOSE: u8 = 0xB4;
    pub const LOAD: u8 = 0xB5;
    pub const MERGE: u8 = 0xB6;
    pub const SAVE: u8 = 0xB7;
    pub const COLOR: u8 = 0xB8;
    pub const CLS: u8 = 0xB9;
    pub const MOTOR: u8 = 0xBA;
    pub const BSAVE: u8 = 0xBB;
    pub const BLOAD: u8 = 0xBC;
    pub const SOUND: u8 = 0xBD;
    pub const BEEP: u8 = 0xBE;
    pub const PSET: u8 = 0xBF;
    pub const PRESET: u8 = 0xC0;
    pub const SCREEN: u8 = 0xC1;
    pub const KEY: u8 = 0xC2;
    pub const LOCATE: u8 = 0xC3;

    pub const TO: u8 = 0xC4;
    pub const THEN: u8 = 0xC5;
    pub const TAB: u8 = 0xC6;
    pub const STEP: u8 = 0xC7;
    pub const USR: u8 = 0xC8;
    pub const FN: u8 = 0xC9;
    pub const SPC: u8 = 0xCA;
    pub const NOT: u8 = 0xCB;
    pub const ERL: u8 = 0xCC;
    pub const ERR: u8 = 0xCD;
    pub const STRING: u8 = 0xCE;
    pub const USING: u8 = 0xCF;
    pub const INSTR: u8 = 0xD0;
    pub const APOSTROPHE: u8 = 0xD1;
    pub const VARPTR: u8 = 0xD2;
    pub const CSRLIN: u8 = 0xD3;
    pub const POINT: u8 = 0xD4;
    pub const OFF: u8 = 0xD5;
    pub const INKEY: u8 = 0xD6;

    pub const GREATER: u8 = 0xE6;
    pub const EQUAL: u8 = 0xE7;
    pub const LESS: u8 = 0xE8;
    pub const PLUS: u8 = 0xE9;
    pub const MINUS: u8 = 0xEA;
    pub const MULTIPLY: u8 = 0xEB;
    pub const DIVIDE: u8 = 0xEC;
    pub const POWER: u8 = 0xED;
    pub const AND: u8 = 0xEE;
    pub const OR: u8 = 0xEF;
    pub const XOR: u8 = 0xF0;
    pub const GREATER_EQUAL: u8 = 0xF1;
    pub const LESS_EQUAL: u8 = 0xF2;
    pub const NOT_EQUAL: u8 = 0xF3;
    pub const EQV: u8 = 0xF4;
    pub const IMP: u8 = 0xF5;
    pub const MOD: u8 = 0xF6;
    pub const IDIV: u8 = 0xF7;
}

/// Extended statements, after the 0xFE prefix.
pub mod xstmt {
    pub const FILES: u8 = 0x81;
    pub const FIELD: u8 = 0x82;
    pub const SYSTEM: u8 = 0x83;
    pub const NAME: u8 = 0x84;
    pub const LSET: u8 = 0x85;
    pub const RSET: u8 = 0x86;
    pub const KILL: u8 = 0x87;
    pub const PUT: u8 = 0x88;
    pub const GET: u8 = 0x89;
    pub const RESET: u8 = 0x8A;
    pub const COMMON: u8 = 0x8B;
    pub const CHAIN: u8 = 0x8C;
    pub const DATE: u8 = 0x8D;
    pub const TIME: u8 = 0x8E;
    pub const PAINT: u8 = 0x8F;
    pub const COM: u8 = 0x90;
    pub const CIRCLE: u8 = 0x91;
    pub const DRAW: u8 = 0x92;
    pub const PLAY: u8 = 0x93;
    pub const TIMER: u8 = 0x94;
    pub const ERDEV: u8 = 0x95;
    pub const IOCTL: u8 = 0x96;
    pub const CHDIR: u8 = 0x97;
    pub const MKDIR: u8 = 0x98;
    pub const RMDIR: u8 = 0x99;
    pub const SHELL: u8 = 0x9A;
    pub const ENVIRON: u8 = 0x9B;
    pub const VIEW: u8 = 0x9C;
    pub const WINDOW: u8 = 0x9D;
    pub const PMAP: u8 = 0x9E;
    pub const PALETTE: u8 = 0x9F;
    pub const LCOPY: u8 = 0xA0;
    pub const CALLS: u8 = 0xA1;
    pub const PCOPY: u8 = 0xA2;
    pub const LOCK: u8 = 0xA3;
    pub const UNLOCK: u8 = 0xA4;
}

/// Standard functions, after the 0xFF prefix.
pub mod func {
    pub const LEFT: u8 = 0x81;
    pub const RIGHT: u8 = 0x82;
    pub const MID: u8 = 0x83;
    pub const SGN: u8 = 0x84;
    pub const INT: u8 = 0x85;
    pub const ABS: u8 = 0x86;
    pub const SQR: u8 = 0x87;
    pub const RND: u8 = 0x88;
    pub const SIN: u8 = 0x89;
    pub const LOG: u8 = 0x8A;
    pub const EXP: u8 = 0x8B;
    pub const COS: u8 = 0x8C;
    pub const TAN: u8 = 0x8D;
    pub const ATN: u8 = 0x8E;
    pub const FRE: u8 = 0x8F;
    pub const INP: u8 = 0x90;
    pub const POS: u8 = 0x91;
    pub const LEN: u8 = 0x92;
    pub const STR: u8 = 0x93;
    pub const VAL: u8 = 0x94;
    pub const ASC: u8 = 0x95;
    pub const CHR: u8 = 0x96;
    pub const PEEK: u8 = 0x97;
    pub const SPACE: u8 = 0x98;
    pub const OCT: u8 = 0x99;
    pub const HEX: u8 = 0x9A;
    pub const LPOS: u8 = 0x9B;
    pub const CINT: u8 = 0x9C;
    pub const CSNG: u8 = 0x9D;
    pub const CDBL: u8 = 0x9E;
    pub const FIX: u8 = 0x9F;
    pub const PEN: u8 = 0xA0;
    pub const STICK: u8 = 0xA1;
    pub const STRIG: u8 = 0xA2;
    pub const EOF: u8 = 0xA3;
    pub const LOC: u8 = 0xA4;
    pub const LOF: u8 = 0xA5;
}

/// Extended functions, after the 0xFD prefix.
pub mod xfunc {
    pub const CVI: u8 = 0x81;
    pub const CVS: u8 = 0x82;
    pub const CVD: u8 = 0x83;
    pub const MKI: u8 = 0x84;
    pub const MKS: u8 = 0x85;
    pub const MKD: u8 = 0x86;
    pub const INPUT: u8 = 0x87;
    pub const EXTERR: u8 = 0x88;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Statement,
    Keyword,
    Operator,
    Function,
    ExtStatement,
    ExtFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Byte(u8),
    Prefixed(u8, u8),
}

impl Code {
    pub fn bytes(self) -> Vec<u8> {
        match self {
            Code::Byte(b) => vec![b],
            Code::Prefixed(p, i) => vec![p, i],
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Reserved {
    pub name: &'static str,
    pub kind: Kind,
    pub code: Code,
}

macro_rules! reserved {
    ($($kind:ident $code:expr => $name:expr),* $(,)?) => {
        &[$(Reserved { name: $name, kind: Kind::$kind, code: $code }),*]
    };
}

use Code::{Byte as B, Prefixed as P};

static WORDS: &[Reserved] = reserved! {
    Statement B(tok::END) => "END",
    Statement B(tok::FOR) => "FOR",
    Statement B(tok::NEXT) => "NEXT",
    Statement B(tok::DATA) => "DATA",
    Statement B(tok::INPUT) => "INPUT",
    Statement B(tok::DIM) => "DIM",
    Statement B(tok::READ) => "READ",
    Statement B(tok::LET) => "LET",
    Statement B(tok::GOTO) => "GOTO",
    Statement B(tok::RUN) => "RUN",
    Statement B(tok::IF) => "IF",
    Statement B(tok::RESTORE) => "RESTORE",
    Statement B(tok::GOSUB) => "GOSUB",
    Statement B(tok::RETURN) => "RETURN",
    Statement B(tok::REM) => "REM",
    Statement B(tok::STOP) => "STOP",
    Statement B(tok::PRINT) => "PRINT",
    Statement B(tok::CLEAR) => "CLEAR",
    Statement B(tok::LIST) => "LIST",
    Statement B(tok::NEW) => "NEW",
    Statement B(tok::ON) => "ON",
    Statement B(tok::WAIT) => "WAIT",
    Statement B(tok::DEF) => "DEF",
    Statement B(tok::POKE) => "POKE",
    Statement B(tok::CONT) => "CONT",
    Statement B(tok::OUT) => "OUT",
    Statement B(tok::LPRINT) => "LPRINT",
    Statement B(tok::LLIST) => "LLIST",
    Statement B(tok::WIDTH) => "WIDTH",
    Statement B(tok::ELSE) => "ELSE",
    Statement B(tok::TRON) => "TRON",
    Statement B(tok::TROFF) => "TROFF",
    Statement B(tok::SWAP) => "SWAP",
    Statement B(tok::ERASE) => "ERASE",
    Statement B(tok::EDIT) => "EDIT",
    Statement B(tok::ERROR) => "ERROR",
    Statement B(tok::RESUME) => "RESUME",
    Statement B(tok::DELETE) => "DELETE",
    Statement B(tok::AUTO) => "AUTO",
    Statement B(tok::RENUM) => "RENUM",
    Statement B(tok::DEFSTR) => "DEFSTR",
    Statement B(tok::DEFINT) => "DEFINT",
    Statement B(tok::DEFSNG) => "DEFSNG",
    Statement B(tok::DEFDBL) => "DEFDBL",
    Statement B(tok::LINE) => "LINE",
    Statement B(tok::WHILE) => "WHILE",
    Statement B(tok::WEND) => "WEND",
    Statement B(tok::CALL) => "CALL",
    Statement B(tok::WRITE) => "WRITE",
    Statement B(tok::OPTION) => "OPTION",
    Statement B(tok::RANDOMIZE) => "RANDOMIZE",
    Statement B(tok::OPEN) => "OPEN",
    Statement B(tok::CLOSE) => "CLOSE",
    Statement B(tok::LOAD) => "LOAD",
    Statement B(tok::MERGE) => "MERGE",
    Statement B(tok::SAVE) => "SAVE",
    Statement B(tok::COLOR) => "COLOR",
    Statement B(tok::CLS) => "CLS",
    Statement B(tok::MOTOR) => "MOTOR",
    Statement B(tok::BSAVE) => "BSAVE",
    Statement B(tok::BLOAD) => "BLOAD",
    Statement B(tok::SOUND) => "SOUND",
    Statement B(tok::BEEP) => "BEEP",
    Statement B(tok::PSET) => "PSET",
    Statement B(tok::PRESET) => "PRESET",
    Statement B(tok::SCREEN) => "SCREEN",
    Statement B(tok::KEY) => "KEY",
    Statement B(tok::LOCATE) => "LOCATE",
    Keyword B(tok::TO) => "TO",
    Keyword B(tok::THEN) => "THEN",
    Keyword B(tok::TAB) => "TAB(",
    Keyword B(tok::STEP) => "STEP",
    Keyword B(tok::USR) => "USR",
    Keyword B(tok::FN) => "FN",
    Keyword B(tok::SPC) => "SPC(",
    Operator B(tok::NOT) => "NOT",
    Keyword B(tok::ERL) => "ERL",
    Keyword B(tok::ERR) => "ERR",
    Keyword B(tok::STRING) => "STRING$",
    Keyword B(tok::USING) => "USING",
    Keyword B(tok::INSTR) => "INSTR",
    Keyword B(tok::APOSTROPHE) => "'",
    Keyword B(tok::VARPTR) => "VARPTR",
    Keyword B(tok::CSRLIN) => "CSRLIN",
    Keyword B(tok::POINT) => "POINT",
    Keyword B(tok::OFF) => "OFF",
    Keyword B(tok::INKEY) => "INKEY$",
    Operator B(tok::GREATER) => ">",
    Operator B(tok::EQUAL) => "=",
    Operator B(tok::LESS) => "<",
    Operator B(tok::PLUS) => "+",
    Operator B(tok::MINUS) => "-",
    Operator B(tok::MULTIPLY) => "*",
    Operator B(tok::DIVIDE) => "/",
    Operator B(tok::POWER) => "^",
    Operator B(tok::AND) => "AND",
    Operator B(tok::OR) => "OR",
    Operator B(tok::XOR) => "XOR",
    Operator B(tok::GREATER_EQUAL) => ">=",
    Operator B(tok::LESS_EQUAL) => "<=",
    Operator B(tok::NOT_EQUAL) => "<>",
    Operator B(tok::EQV) => "EQV",
    Operator B(tok::IMP) => "IMP",
    Operator B(tok::MOD) => "MOD",
    Operator B(tok::IDIV) => "\\",
    ExtStatement P(PREFIX_XSTMT, xstmt::FILES) => "FILES",
    ExtStatement P(PREFIX_XSTMT, xstmt::FIELD) => "FIELD",
    ExtStatement P(PREFIX_XSTMT, xstmt::SYSTEM) => "SYSTEM",
    ExtStatement P(PREFIX_XSTMT, xstmt::NAME) => "NAME",
    ExtStatement P(PREFIX_XSTMT, xstmt::LSET) => "LSET",
    ExtStatement P(PREFIX_XSTMT, xstmt::RSET) => "RSET",
    ExtStatement P(PREFIX_XSTMT, xstmt::KILL) => "KILL",
    ExtStatement P(PREFIX_XSTMT, xstmt::PUT) => "PUT",
    ExtStatement P(PREFIX_XSTMT, xstmt::GET) => "GET",
    ExtStatement P(PREFIX_XSTMT, xstmt::RESET) => "RESET",
    ExtStatement P(PREFIX_XSTMT, xstmt::COMMON) => "COMMON",
    ExtStatement P(PREFIX_XSTMT, xstmt::CHAIN) => "CHAIN",
    ExtStatement P(PREFIX_XSTMT, xstmt::DATE) => "DATE$",
    ExtStatement P(PREFIX_XSTMT, xstmt::TIME) => "TIME$",
    ExtStatement P(PREFIX_XSTMT, xstmt::PAINT) => "PAINT",
    ExtStatement P(PREFIX_XSTMT, xstmt::COM) => "COM",
    ExtStatement P(PREFIX_XSTMT, xstmt::CIRCLE) => "CIRCLE",
    ExtStatement P(PREFIX_XSTMT, xstmt::DRAW) => "DRAW",
    ExtStatement P(PREFIX_XSTMT, xstmt::PLAY) => "PLAY",
    ExtStatement P(PREFIX_XSTMT, xstmt::TIMER) => "TIMER",
    ExtStatement P(PREFIX_XSTMT, xstmt::ERDEV) => "ERDEV",
    ExtStatement P(PREFIX_XSTMT, xstmt::IOCTL) => "IOCTL",
    ExtStatement P(PREFIX_XSTMT, xstmt::CHDIR) => "CHDIR",
    ExtStatement P(PREFIX_XSTMT, xstmt::MKDIR) => "MKDIR",
    ExtStatement P(PREFIX_XSTMT, xstmt::RMDIR) => "RMDIR",
    ExtStatement P(PREFIX_XSTMT, xstmt::SHELL) => "SHELL",
    ExtStatement P(PREFIX_XSTMT, xstmt::ENVIRON) => "ENVIRON",
    ExtStatement P(PREFIX_XSTMT, xstmt::VIEW) => "VIEW",
    ExtStatement P(PREFIX_XSTMT, xstmt::WINDOW) => "WINDOW",
    ExtStatement P(PREFIX_XSTMT, xstmt::PMAP) => "PMAP",
    ExtStatement P(PREFIX_XSTMT, xstmt::PALETTE) => "PALETTE",
    ExtStatement P(PREFIX_XSTMT, xstmt::LCOPY) => "LCOPY",
    ExtStatement P(PREFIX_XSTMT, xstmt::CALLS) => "CALLS",
    ExtStatement P(PREFIX_XSTMT, xstmt::PCOPY) => "PCOPY",
    ExtStatement P(PREFIX_XSTMT, xstmt::LOCK) => "LOCK",
    ExtStatement P(PREFIX_XSTMT, xstmt::UNLOCK) => "UNLOCK",
    Function P(PREFIX_FN, func::LEFT) => "LEFT$",
    Function P(PREFIX_FN, func::RIGHT) => "RIGHT$",
    Function P(PREFIX_FN, func::MID) => "MID$",
    Function P(PREFIX_FN, func::SGN) => "SGN",
    Function P(PREFIX_FN, func::INT) => "INT",
    Function P(PREFIX_FN, func::ABS) => "ABS",
    Function P(PREFIX_FN, func::SQR) => "SQR",
    Function P(PREFIX_FN, func::RND) => "RND",
    Function P(PREFIX_FN, func::SIN) => "SIN",
    Function P(PREFIX_FN, func::LOG) => "LOG",
    Function P(PREFIX_FN, func::EXP) => "EXP",
    Function P(PREFIX_FN, func::COS) => "COS",
    Function P(PREFIX_FN, func::TAN) => "TAN",
    Function P(PREFIX_FN, func::ATN) => "ATN",
    Function P(PREFIX_FN, func::FRE) => "FRE",
    Function P(PREFIX_FN, func::INP) => "INP",
    Function P(PREFIX_FN, func::POS) => "POS",
    Function P(PREFIX_FN, func::LEN) => "LEN",
    Function P(PREFIX_FN, func::STR) => "STR$",
    Function P(PREFIX_FN, func::VAL) => "VAL",
    Function P(PREFIX_FN, func::ASC) => "ASC",
    Function P(PREFIX_FN, func::CHR) => "CHR$",
    Function P(PREFIX_FN, func::PEEK) => "PEEK",
    Function P(PREFIX_FN, func::SPACE) => "SPACE$",
    Function P(PREFIX_FN, func::OCT) => "OCT$",
    Function P(PREFIX_FN, func::HEX) => "HEX$",
    Function P(PREFIX_FN, func::LPOS) => "LPOS",
    Function P(PREFIX_FN, func::CINT) => "CINT",
    Function P(PREFIX_FN, func::CSNG) => "CSNG",
    Function P(PREFIX_FN, func::CDBL) => "CDBL",
    Function P(PREFIX_FN, func::FIX) => "FIX",
    Function P(PREFIX_FN, func::PEN) => "PEN",
    Function P(PREFIX_FN, func::STICK) => "STICK",
    Function P(PREFIX_FN, func::STRIG) => "STRIG",
    Function P(PREFIX_FN, func::EOF) => "EOF",
    Function P(PREFIX_FN, func::LOC) => "LOC",
    Function P(PREFIX_FN, func::LOF) => "LOF",
    ExtFunction P(PREFIX_XFN, xfunc::CVI) => "CVI",
    ExtFunction P(PREFIX_XFN, xfunc::CVS) => "CVS",
    ExtFunction P(PREFIX_XFN, xfunc::CVD) => "CVD",
    ExtFunction P(PREFIX_XFN, xfunc::MKI) => "MKI$",
    ExtFunction P(PREFIX_XFN, xfunc::MKS) => "MKS$",
    ExtFunction P(PREFIX_XFN, xfunc::MKD) => "MKD$",
    ExtFunction P(PREFIX_XFN, xfunc::INPUT) => "INPUT$",
    ExtFunction P(PREFIX_XFN, xfunc::EXTERR) => "EXTERR",
};

/// Words that appear in statements but are never crunched. They are
/// checked before the keyword buckets so `OUTPUT` is not read as `OUT`.
static PLAIN_WORDS: &[&str] = &["OUTPUT"];

thread_local!(
    static BUCKETS: Vec<Vec<&'static Reserved>> = {
        let mut buckets: Vec<Vec<&'static Reserved>> = vec![vec![]; 26];
        for word in WORDS.iter() {
            let first = word.name.as_bytes()[0];
            if first.is_ascii_uppercase() {
                buckets[(first - b'A') as usize].push(word);
            }
        }
        for bucket in buckets.iter_mut() {
            bucket.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
        }
        buckets
    };
    static DECODE: HashMap<Code, &'static Reserved> =
        WORDS.iter().map(|w| (w.code, w)).collect();
);

/// The longest reserved word that `src` begins with, matched without
/// regard to case. Only called at the start of an alphabetic run.
pub fn keyword_at(src: &[u8]) -> Option<&'static Reserved> {
    let first = src.first()?.to_ascii_uppercase();
    if !first.is_ascii_uppercase() {
        return None;
    }
    if plain_word_at(src).is_some() {
        return None;
    }
    BUCKETS.with(|buckets| {
        buckets[(first - b'A') as usize]
            .iter()
            .find(|w| {
                let name = w.name.as_bytes();
                src.len() >= name.len() && src[..name.len()].eq_ignore_ascii_case(name)
            })
            .copied()
    })
}

fn plain_word_at(src: &[u8]) -> Option<&'static str> {
    PLAIN_WORDS.iter().copied().find(|w| {
        let name = w.as_bytes();
        src.len() >= name.len()
            && src[..name.len()].eq_ignore_ascii_case(name)
            && !src
                .get(name.len())
                .map_or(false, |c| c.is_ascii_alphanumeric())
    })
}

pub fn lookup(code: Code) -> Option<&'static Reserved> {
    DECODE.with(|decode| decode.get(&code).copied())
}

pub fn name_of(code: Code) -> Option<&'static str> {
    lookup(code).map(|r| r.name)
}

/// The operator for a punctuation character, if it is one.
pub fn operator_for(ch: u8) -> Option<u8> {
    match ch {
        b'>' => Some(tok::GREATER),
        b'=' => Some(tok::EQUAL),
        b'<' => Some(tok::LESS),
        b'+' => Some(tok::PLUS),
        b'-' => Some(tok::MINUS),
        b'*' => Some(tok::MULTIPLY),
        b'/' => Some(tok::DIVIDE),
        b'^' => Some(tok::POWER),
        b'\\' => Some(tok::IDIV),
        _ => None,
    }
}

/// Two-character relationals collapse into their own tokens; both
/// orders of each pair are accepted.
pub fn relational_for(a: u8, b: u8) -> Option<u8> {
    match (a, b) {
        (b'>', b'=') | (b'=', b'>') => Some(tok::GREATER_EQUAL),
        (b'<', b'=') | (b'=', b'<') => Some(tok::LESS_EQUAL),
        (b'<', b'>') | (b'>', b'<') => Some(tok::NOT_EQUAL),
        _ => None,
    }
}

pub fn is_statement(byte: u8) -> bool {
    (tok::END..=tok::LOCATE).contains(&byte)
}

/// Bytes of operand that follow a marker byte.
pub fn operand_len(byte: u8) -> usize {
    match byte {
        LINE_REF | INT_LIT => 2,
        SNG_LIT => 4,
        DBL_LIT => 8,
        PREFIX_XFN | PREFIX_XSTMT | PREFIX_FN => 1,
        _ => 0,
    }
}

/// Position just past the token at `pos`. String literals, remarks and
/// DATA bodies are stepped over whole because their raw bytes may look
/// like token markers. Never moves past a line terminator.
pub fn skip(bytes: &[u8], pos: usize) -> usize {
    let at = |p: usize| bytes.get(p).copied().unwrap_or(EOL);
    match at(pos) {
        EOL => pos,
        b'"' => {
            let mut p = pos + 1;
            loop {
                match at(p) {
                    EOL => return p,
                    b'"' => return p + 1,
                    _ => p += 1,
                }
            }
        }
        tok::REM | tok::APOSTROPHE => {
            let mut p = pos + 1;
            while at(p) != EOL {
                p += 1;
            }
            p
        }
        tok::DATA => data_end(bytes, pos + 1),
        b => (pos + 1 + operand_len(b)).min(bytes.len()),
    }
}

/// End of a DATA body starting at `pos`: the next `:` outside quotes, or
/// the line terminator.
pub fn data_end(bytes: &[u8], pos: usize) -> usize {
    let mut p = pos;
    let mut quoted = false;
    while let Some(&b) = bytes.get(p) {
        match b {
            EOL => break,
            b'"' => quoted = !quoted,
            b':' if !quoted => break,
            _ => {}
        }
        p += 1;
    }
    p
}

/// Position of the terminator of the line that starts at `pos`.
pub fn line_end(bytes: &[u8], pos: usize) -> usize {
    let mut p = pos;
    while p < bytes.len() && bytes[p] != EOL {
        p = skip(bytes, p);
    }
    p
}
