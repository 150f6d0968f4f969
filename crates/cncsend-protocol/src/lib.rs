//! # cncsend Protocol
//!
//! Response line parsing for GRBL and grblHAL controllers.
//! Raw serial lines go in, typed [`ParsedLine`] events come out; the
//! controller state machine consuming those events lives elsewhere.
//!
//! Parsing is pure and stateless: the rule registry is fixed when the
//! [`LineParser`] is built and a line that matches no rule is simply
//! reported as unrecognized (`None`), never as an error.

pub mod decoder;
pub mod parser;
pub mod rules;
pub mod status;

pub use parser::{LineParser, ParsedLine};
pub use rules::LineRule;
pub use status::{BufferFill, Overrides, Position, StatusReport};
