//!
//! Process exit codes, following the teacher's Ruff-derived convention. Conversion
//! itself never "fails" structurally (ambiguous input always resolves
//! deterministically), so there is no violations-found tier here — only success
//! and tool error.

pub const SUCCESS: i32 = 0;
pub const TOOL_ERROR: i32 = 2;

pub mod exit {
    use super::{SUCCESS, TOOL_ERROR};

    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
