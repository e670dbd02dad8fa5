// ABOUTME: Command module aggregator for the roughneck CLI.
// ABOUTME: Re-exports one handler per subcommand plus the shared context.

mod context;
mod deploy;
mod destroy;
mod list;
mod manage;
mod new;

pub use context::Context;
pub use deploy::deploy;
pub use destroy::destroy;
pub use list::list;
pub use manage::{edit, provision, ssh, update, validate};
pub use new::new;
