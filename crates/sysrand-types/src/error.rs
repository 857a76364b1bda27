//! Error types and the C-compatible DRBG status-code taxonomy.

/// Errors produced by the RNG core.
#[derive(Debug, thiserror::Error)]
pub enum RngError {
    #[error("generator not initialized")]
    NotInitialized,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("memory allocation failed")]
    OutOfMemory,
    #[error("entropy source failed")]
    EntropySourceFailed,
    #[error("drbg: reseed required")]
    DrbgReseedRequired,
    #[error("internal primitive failure")]
    InternalPrimitiveFailure,
}

/// Operation completed successfully.
pub const STATUS_SUCCESS: i32 = 0;
/// The state has not been instantiated.
pub const STATUS_NOT_INIT: i32 = -1;
/// A required input was absent.
pub const STATUS_NULL_PTR: i32 = -2;
/// An input length was out of range.
pub const STATUS_BAD_ARGS: i32 = -3;
/// The underlying hash or cipher library failed.
pub const STATUS_INTERNAL: i32 = -4;
/// Memory allocation failed.
pub const STATUS_MEM_FAIL: i32 = -5;
/// The reseed interval was exceeded; reseed and retry.
pub const STATUS_DO_RESEED: i32 = -6;

impl RngError {
    /// Map to the numeric status-code taxonomy.
    ///
    /// `STATUS_NULL_PTR` has no producing variant: absent inputs are
    /// unrepresentable through the slice-based API.
    pub fn status_code(&self) -> i32 {
        match self {
            RngError::NotInitialized => STATUS_NOT_INIT,
            RngError::InvalidArgument => STATUS_BAD_ARGS,
            RngError::OutOfMemory => STATUS_MEM_FAIL,
            RngError::EntropySourceFailed => STATUS_INTERNAL,
            RngError::DrbgReseedRequired => STATUS_DO_RESEED,
            RngError::InternalPrimitiveFailure => STATUS_INTERNAL,
        }
    }
}

/// Human-readable message for a status code.
pub fn err_string(code: i32) -> &'static str {
    match code {
        STATUS_SUCCESS => "Success",
        STATUS_NOT_INIT => "Uninstantiated state",
        STATUS_NULL_PTR => "Null pointer input",
        STATUS_BAD_ARGS => "Bad input arguments",
        STATUS_INTERNAL => "Internal library failure",
        STATUS_MEM_FAIL => "Memory allocation failure",
        STATUS_DO_RESEED => "Reseed required",
        _ => "Unknown error",
    }
}
