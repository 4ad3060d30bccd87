//! Image Path Value Object
//!
//! Reference to a user's profile image as returned by the image store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Image assigned to accounts that never uploaded one
pub const DEFAULT_IMAGE_PATH: &str = "uploads/default.png";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePath(String);

impl ImagePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn default_image() -> Self {
        Self(DEFAULT_IMAGE_PATH.to_string())
    }

    /// The shared default image must never be deleted. Compared by file name
    /// because that is what the image store resolves.
    pub fn is_default(&self) -> bool {
        self.same_file(&Self::default_image())
    }

    /// Final path component
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.0).file_name().and_then(|n| n.to_str())
    }

    pub fn same_file(&self, other: &ImagePath) -> bool {
        self.file_name().is_some() && self.file_name() == other.file_name()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ImagePath {
    fn default() -> Self {
        Self::default_image()
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
