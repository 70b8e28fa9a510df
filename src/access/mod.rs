pub mod acl;
pub mod gate;
pub mod net;

pub use acl::{Allowlist, AllowlistError};
pub use gate::AccessGate;
