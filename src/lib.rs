//! # GW-BASIC
//!
//! A GW-BASIC compatible interpreter core. Source lines are crunched into
//! the same token bytes GW-BASIC keeps in memory, numbers follow Microsoft
//! Binary Format rounding, and the runtime executes statements straight
//! from those bytes.
//!
//! The core does no I/O of its own apart from files opened by the program.
//! Everything else goes through [`mach::Host`]:
//! ```
//! use gwbasic::mach::{Event, Host, Runtime};
//!
//! struct Console;
//! impl Host for Console {
//!     fn print(&mut self, text: &str) {
//!         print!("{}", text);
//!     }
//! }
//!
//! let mut runtime = Runtime::new(Box::new(Console));
//! runtime.enter("10 PRINT \"HELLO\"");
//! runtime.enter("RUN");
//! while runtime.execute(5000) == Event::Running {}
//! ```

pub mod lang;
pub mod mach;
