//! Per-call option sets for copy and test

use crate::error::FileError;
use std::str::FromStr;

/// A single copy option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyOption {
    /// Overwrite existing target files
    ReplaceExisting,
    /// Carry permissions and timestamps over to the copy
    CopyAttributes,
    /// Copy symbolic links as links instead of their targets
    NoFollowLinks,
}

impl CopyOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceExisting => "REPLACE_EXISTING",
            Self::CopyAttributes => "COPY_ATTRIBUTES",
            Self::NoFollowLinks => "NO_FOLLOW_LINKS",
        }
    }
}

impl FromStr for CopyOption {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REPLACE_EXISTING" => Ok(Self::ReplaceExisting),
            "COPY_ATTRIBUTES" => Ok(Self::CopyAttributes),
            "NO_FOLLOW_LINKS" => Ok(Self::NoFollowLinks),
            _ => Err(FileError::InvalidOperation("Invalid copy option.".to_string())),
        }
    }
}

/// Resolved set of copy options for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    pub replace_existing: bool,
    pub copy_attributes: bool,
    pub no_follow_links: bool,
}

impl CopyOptions {
    /// Parse option names; any unknown name rejects the whole set.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, FileError> {
        let options = names
            .iter()
            .map(|n| n.as_ref().parse::<CopyOption>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from(options.as_slice()))
    }
}

impl From<&[CopyOption]> for CopyOptions {
    fn from(options: &[CopyOption]) -> Self {
        let mut resolved = Self::default();
        for option in options {
            match option {
                CopyOption::ReplaceExisting => resolved.replace_existing = true,
                CopyOption::CopyAttributes => resolved.copy_attributes = true,
                CopyOption::NoFollowLinks => resolved.no_follow_links = true,
            }
        }
        resolved
    }
}

/// Side-effect free predicate evaluated by `test`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestPredicate {
    Exists,
    IsDirectory,
    IsSymlink,
    Readable,
    Writable,
}

impl FromStr for TestPredicate {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXISTS" => Ok(Self::Exists),
            "IS_DIR" => Ok(Self::IsDirectory),
            "IS_SYMLINK" => Ok(Self::IsSymlink),
            "READABLE" => Ok(Self::Readable),
            "WRITABLE" => Ok(Self::Writable),
            _ => Err(FileError::InvalidOperation("Unsupported test option.".to_string())),
        }
    }
}
