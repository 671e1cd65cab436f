mod invoice;
mod project;
mod user;

pub use invoice::*;
pub use project::*;
pub use user::*;
