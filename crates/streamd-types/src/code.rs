use serde::{Deserialize, Serialize};

/// Closed set of outcomes returned by every core operation.
///
/// The integer value and description are part of the wire protocol: every
/// response envelope carries both, so clients can branch without parsing
/// free text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnCode {
    Ok,
    NullArgument,
    BadCommand,
    NoResource,
    ExistingResource,
    BadValue,
    NoConnection,
    NoUpdate,
    Timeout,
}

impl ReturnCode {
    /// Wire integer for the response envelope.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::NullArgument => 1,
            Self::BadCommand => 2,
            Self::NoResource => 3,
            Self::ExistingResource => 4,
            Self::BadValue => 5,
            Self::NoConnection => 6,
            Self::NoUpdate => 7,
            Self::Timeout => 8,
        }
    }

    /// Fixed human-readable description for the response envelope.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "Success",
            Self::NullArgument => "Required argument is NULL",
            Self::BadCommand => "Unknown command",
            Self::NoResource => "Resource not found",
            Self::ExistingResource => "Resource already exists",
            Self::BadValue => "Bad value",
            Self::NoConnection => "Could not establish connection",
            Self::NoUpdate => "State did not change",
            Self::Timeout => "Operation timed out",
        }
    }

    /// HTTP status the REST surface maps this code onto.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadCommand | Self::NoResource => 404,
            Self::ExistingResource => 409,
            Self::BadValue => 204,
            _ => 400,
        }
    }
}
