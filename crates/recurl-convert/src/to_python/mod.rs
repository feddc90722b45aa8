//! Brace-to-indent conversion: C/C++ and TypeScript to Python.

pub mod c;
pub mod engine;
pub mod typescript;

pub use c::CToPython;
pub use engine::{Dialect, Engine};
pub use typescript::TypescriptToPython;
