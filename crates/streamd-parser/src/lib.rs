//! Line-to-intent translation.
//!
//! Both wire protocols funnel into [`parse_cmd`], which recognizes two
//! grammars with identical behavior: the URI form
//! (`<verb> <path> [<name>] [<operand…>]`) and the shorthand form
//! (`pipeline_create p0 fakesrc ! fakesink`), expanded through a fixed
//! dispatch table. The parser never executes side effects itself; it
//! resolves the target node and dispatches the verb.

pub mod parser;

pub use parser::parse_cmd;
