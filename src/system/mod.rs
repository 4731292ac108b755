//! Host requirements validation.
//!
//! PRoot runs entirely in user space but relies on `ptrace`, and the default
//! release asset only exists for one architecture. These checks catch both
//! before anything is downloaded.

mod requirements;

pub use requirements::{
    HostRequirements, PTRACE_SCOPE_PATH, PTRACE_SCOPE_DISABLED, check_all, check_architecture,
    check_ptrace_scope,
};
