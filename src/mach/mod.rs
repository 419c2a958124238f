/*!
## Rust Machine Module

This Rust module runs crunched BASIC programs. Statements are executed
straight from their token bytes; there is no separate compile step.

*/

mod array;
mod config;
mod cursor;
mod data;
mod draw;
mod event;
mod expr;
mod file;
pub mod format;
mod function;
mod graphics;
mod heap;
mod host;
pub mod mbf;
mod memory;
mod operation;
mod play;
mod program;
mod runtime;
mod stack;
mod userfn;
mod using;
mod val;
mod var;

pub use config::Config;
pub use event::{Trap, TrapState};
pub use function::Function;
pub use graphics::{PixelBuffer, PutAction};
pub use host::Host;
pub use mbf::{Mbf32, Mbf64};
pub use operation::Operation;
pub use program::Program;
pub use runtime::Event;
pub use runtime::Runtime;
pub use stack::Stack;
pub use val::Val;
pub use var::Var;
