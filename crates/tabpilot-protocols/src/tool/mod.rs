//! Tool protocol definitions.
//!
//! Tools are how the model acts on the browser. The catalog is declared once,
//! calls are executed through a [`ToolExecutor`].

mod definition;
mod executor;
mod result;

pub use definition::*;
pub use executor::*;
pub use result::*;
