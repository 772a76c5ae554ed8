pub const DEFAULT_MAX_USERNAME_LENGTH: usize = 16;
pub const DEFAULT_MAX_PASSWORD_LENGTH: usize = 64;
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Deployment-wide credential policy, fixed at startup.
///
/// The KDF iteration count is not stored per record, so changing it after users
/// exist makes their stored hashes unverifiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    max_username_length: usize,
    max_password_length: usize,
    kdf_iterations: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_username_length: DEFAULT_MAX_USERNAME_LENGTH,
            max_password_length: DEFAULT_MAX_PASSWORD_LENGTH,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl Policy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_max_username_length(mut self, length: usize) -> Self {
        self.max_username_length = length;
        self
    }

    #[must_use]
    pub const fn with_max_password_length(mut self, length: usize) -> Self {
        self.max_password_length = length;
        self
    }

    /// Zero is not a valid iteration count and is clamped to one.
    #[must_use]
    pub const fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = if iterations == 0 { 1 } else { iterations };
        self
    }

    #[must_use]
    pub const fn max_username_length(&self) -> usize {
        self.max_username_length
    }

    #[must_use]
    pub const fn max_password_length(&self) -> usize {
        self.max_password_length
    }

    #[must_use]
    pub const fn kdf_iterations(&self) -> u32 {
        self.kdf_iterations
    }
}
