//! Process exit codes.
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Any other failure |
//! | 2 | Usage error (reported by clap) |
//! | 3 | Already running, already stopped, or another start in progress |
//! | 4 | Port held by an unrelated process |
//! | 5 | Runtime environment not built |

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const ALREADY_IN_STATE: i32 = 3;
pub const PORT_CONFLICT: i32 = 4;
pub const MISSING_ENVIRONMENT: i32 = 5;
