pub mod formula;
pub use formula::{CompileContext, Compiled, Generator};

pub mod serializer;
pub use serializer::{Params, Placeholder, Serializer};

pub mod stmt;
pub use stmt::Statement;
