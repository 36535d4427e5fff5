//! Process exit codes

use std::process::ExitCode;

/// The command ran, or help was shown
pub const EXIT_SUCCESS: i32 = 0;

/// A fatal error escaped the command
pub const EXIT_ERROR: i32 = 1;

/// The command line was wrong or a command signalled a usage error
pub const EXIT_USAGE: i32 = 2;

/// Convert one of the codes above into an [`ExitCode`]
pub fn to_exit_code(code: i32) -> ExitCode {
    u8::try_from(code)
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
}
