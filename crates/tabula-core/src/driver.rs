mod capability;
pub use capability::{Capability, Flavor};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::async_trait;

use std::fmt::Debug;

/// The storage query surface the engine runs against.
///
/// One connection is used for the whole of a mutation, so every statement of
/// a propagation run shares the caller's transaction.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Describes the backend's dialect and capabilities.
    fn capability(&self) -> &'static Capability;

    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;
}

#[async_trait]
impl Connection for Box<dyn Connection> {
    fn capability(&self) -> &'static Capability {
        (**self).capability()
    }

    async fn exec(&mut self, op: Operation) -> crate::Result<Response> {
        (**self).exec(op).await
    }
}
