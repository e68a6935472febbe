//! Value and object model for expression evaluation and diffing

mod object;
mod value;

pub use object::{FieldValue, ObjectBuilder, ObjectRecord};
pub use value::Value;
