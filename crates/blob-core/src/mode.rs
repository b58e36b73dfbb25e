//! Access mode flags for stream opens.

use crate::error::{Result, StoreError};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Intent of a stream open: a set of `READ`, `WRITE` and `APPEND` flags.
///
/// - `WRITE` alone creates the element or truncates existing content.
/// - `APPEND` keeps existing content and positions the stream at its end.
/// - `READ | WRITE` keeps existing content positioned at the start.
///
/// Backends validate the combinations they support and fail otherwise.
///
/// # Examples
///
/// ```
/// use blob_core::AccessMode;
///
/// let mode = AccessMode::READ | AccessMode::WRITE;
/// assert!(mode.contains(AccessMode::READ));
/// assert!(mode.allows_write());
/// assert!(!AccessMode::READ.allows_write());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMode(u8);

impl AccessMode {
    /// Open for reading.
    pub const READ: Self = Self(0b001);
    /// Open for writing, truncating existing content.
    pub const WRITE: Self = Self(0b010);
    /// Open for writing at the end of existing content.
    pub const APPEND: Self = Self(0b100);

    /// Returns the mode with no flags set. Never valid for an open.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` if every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the mode permits reading.
    #[must_use]
    pub const fn allows_read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns `true` if the mode permits any kind of write.
    #[must_use]
    pub const fn allows_write(self) -> bool {
        self.0 & (Self::WRITE.0 | Self::APPEND.0) != 0
    }

    /// Returns `true` if existing content must be discarded on open.
    ///
    /// That is the case for `WRITE` without `READ` or `APPEND`.
    #[must_use]
    pub const fn truncates(self) -> bool {
        self.contains(Self::WRITE) && !self.contains(Self::READ) && !self.contains(Self::APPEND)
    }

    /// Rejects the empty mode.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidAccessMode`] if no flag is set.
    pub fn validate(self) -> Result<Self> {
        if self.is_empty() {
            return Err(StoreError::InvalidAccessMode { mode: self });
        }
        Ok(self)
    }
}

impl BitOr for AccessMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = [
            (Self::READ, "read"),
            (Self::WRITE, "write"),
            (Self::APPEND, "append"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessMode({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let mode = AccessMode::READ | AccessMode::APPEND;
        assert!(mode.allows_read());
        assert!(mode.allows_write());
        assert!(mode.contains(AccessMode::APPEND));
        assert!(!mode.contains(AccessMode::WRITE));
    }

    #[test]
    fn test_truncates_only_for_plain_write() {
        assert!(AccessMode::WRITE.truncates());
        assert!(!(AccessMode::READ | AccessMode::WRITE).truncates());
        assert!(!AccessMode::APPEND.truncates());
        assert!(!AccessMode::READ.truncates());
    }

    #[test]
    fn test_validate_rejects_empty() {
        let err = AccessMode::empty().validate().unwrap_err();
        assert!(matches!(err, StoreError::InvalidAccessMode { .. }));
        assert!(AccessMode::READ.validate().is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(AccessMode::empty().to_string(), "none");
        assert_eq!((AccessMode::READ | AccessMode::WRITE).to_string(), "read|write");
        assert_eq!(format!("{:?}", AccessMode::APPEND), "AccessMode(append)");
    }

    #[test]
    fn test_bitor_assign() {
        let mut mode = AccessMode::READ;
        mode |= AccessMode::WRITE;
        assert_eq!(mode, AccessMode::READ | AccessMode::WRITE);
    }
}
