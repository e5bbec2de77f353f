//! Compositor status codes.
//!
//! Every compositor call reports a signed 32-bit status. The numeric values
//! follow the platform's `status_t` convention (negated errno values plus a
//! handful of codes packed near `i32::MIN`), so codes read from logs or from a
//! native backend line up with the names below.

use std::fmt;

/// Signed status code returned by a compositor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    pub const NO_ERROR: Self = Self(0);
    pub const OK: Self = Self::NO_ERROR;
    pub const UNKNOWN_ERROR: Self = Self(i32::MIN);
    pub const NO_MEMORY: Self = Self(-12);
    pub const INVALID_OPERATION: Self = Self(-38);
    pub const BAD_VALUE: Self = Self(-22);
    pub const BAD_TYPE: Self = Self(i32::MIN + 1);
    pub const NAME_NOT_FOUND: Self = Self(-2);
    pub const PERMISSION_DENIED: Self = Self(-1);
    pub const NO_INIT: Self = Self(-19);
    pub const ALREADY_EXISTS: Self = Self(-17);
    pub const DEAD_OBJECT: Self = Self(-32);
    pub const FAILED_TRANSACTION: Self = Self(i32::MIN + 2);
    pub const BAD_INDEX: Self = Self(-75);
    pub const NOT_ENOUGH_DATA: Self = Self(-61);
    pub const WOULD_BLOCK: Self = Self(-11);
    pub const TIMED_OUT: Self = Self(-110);
    pub const UNKNOWN_TRANSACTION: Self = Self(-74);
    pub const FDS_NOT_ALLOWED: Self = Self(i32::MIN + 7);

    /// Symbolic name used in diagnostics, `UNMAPPED_ERROR` for unknown codes.
    pub fn name(self) -> &'static str {
        STATUS_NAMES
            .iter()
            .find(|(status, _)| *status == self)
            .map(|(_, name)| *name)
            .unwrap_or("UNMAPPED_ERROR")
    }
}

/// Code → name lookup, in the order the platform headers declare them.
static STATUS_NAMES: &[(Status, &str)] = &[
    (Status::NO_ERROR,            "NO_ERROR"),
    (Status::UNKNOWN_ERROR,       "UNKNOWN_ERROR"),
    (Status::NO_MEMORY,           "NO_MEMORY"),
    (Status::INVALID_OPERATION,   "INVALID_OPERATION"),
    (Status::BAD_VALUE,           "BAD_VALUE"),
    (Status::BAD_TYPE,            "BAD_TYPE"),
    (Status::NAME_NOT_FOUND,      "NAME_NOT_FOUND"),
    (Status::PERMISSION_DENIED,   "PERMISSION_DENIED"),
    (Status::NO_INIT,             "NO_INIT"),
    (Status::ALREADY_EXISTS,      "ALREADY_EXISTS"),
    (Status::DEAD_OBJECT,         "DEAD_OBJECT"),
    (Status::FAILED_TRANSACTION,  "FAILED_TRANSACTION"),
    (Status::BAD_INDEX,           "BAD_INDEX"),
    (Status::NOT_ENOUGH_DATA,     "NOT_ENOUGH_DATA"),
    (Status::WOULD_BLOCK,         "WOULD_BLOCK"),
    (Status::TIMED_OUT,           "TIMED_OUT"),
    (Status::UNKNOWN_TRANSACTION, "UNKNOWN_TRANSACTION"),
    (Status::FDS_NOT_ALLOWED,     "FDS_NOT_ALLOWED"),
];

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}
