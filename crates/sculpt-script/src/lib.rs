//! Sculpt Script - a line-oriented language for building CSG trees
//!
//! Every line binds or edits a named node. Using a name on the right-hand
//! side moves that node into the statement's target, so each subtree ends up
//! with exactly one owner.
//!
//! ## Example Script
//!
//! ```text
//! # a snowman with a carved mouth
//! body = sphere 0 0 0 1
//! head = sphere 0 1.4 0 0.6
//! body += 1 0.3 head          # smooth union, softness 0.3
//! body -= cube 0 1.3 0.55 0.1 # hard subtraction
//! ```
//!
//! Modifiers after `+=`/`-=` are `blend` then `softness`; both are optional
//! and default to `1` and `0`. `-=` negates the blend as written.
//!
//! `c = b` does not copy. It moves `b`'s subtree under the name `c`, and `b`
//! is consumed like any other operand, so a later `a += b` fails.
//!
//! Operators need no surrounding spaces: `a+=b` reads as `a += b`.
//!
//! ```rust
//! let tree = sculpt_script::parse_str("a = sphere 0 0 0 2\nb = sphere 0 0 0 1\na -= b")?;
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.evaluate(glam::Vec3::ZERO), 1.0);
//! # Ok::<(), sculpt_script::Error>(())
//! ```

mod error;
mod lexer;
mod parser;

#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use error::{Error, ParseErrorKind, Result};
pub use parser::{ScriptParser, load_file, parse_lines, parse_reader, parse_str};

#[cfg(feature = "file-watcher")]
pub use watcher::{LiveScript, ScriptWatcher, WatchEvent};

pub use sculpt_csg::Tree;
