//! Domain model (commands, ids, lifecycle, errors).

pub mod command;
pub mod errors;
pub mod ids;
pub mod state;
pub(crate) mod unwind;

pub use self::command::{Command, CommandOutput, CommandResult};
pub use self::errors::{ActiveObjectError, BoxError, CommandError, PanicSite};
pub use self::ids::{ActiveObjectId, CommandSeq};
pub use self::state::Lifecycle;
