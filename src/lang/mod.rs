/*!
# Rust Language Module

This Rust module turns BASIC source text into the token byte stream the
machine executes, and back again.

*/

pub type LineNumber = Option<u16>;
pub type Column = std::ops::Range<usize>;

pub trait MaxValue<T> {
    fn max_value() -> T;
}

impl MaxValue<u16> for LineNumber {
    fn max_value() -> u16 {
        65529
    }
}

#[macro_use]
mod error;
pub mod cp437;
mod ident;
mod lex;
mod line;
pub mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use ident::Type;
pub use lex::{crunch, detokenize, tokenize, Token, TokenKind};
pub use line::Line;
