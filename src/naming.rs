//! Identifier sanitization for generated paths and resource names.

use std::sync::LazyLock;

use regex::Regex;

/// Characters allowed verbatim in both sanitized forms.
const UNSAFE_CHAR_PATTERN: &str = r"[^A-Za-z0-9_-]";

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(UNSAFE_CHAR_PATTERN).unwrap());

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_filesystem_name(raw: &str) -> String {
    UNSAFE_CHARS.replace_all(raw, "_").into_owned()
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `-`.
///
/// Used for container image and deployment resource names.
pub fn sanitize_resource_name(raw: &str) -> String {
    UNSAFE_CHARS.replace_all(raw, "-").into_owned()
}

/// The canonical identifier of a script.
///
/// Both sanitized forms are derived from the same name, so a script can never
/// end up with a file stem and a resource name that were edited separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptName<'a>(&'a str);

impl<'a> ScriptName<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// Stem used for `scripts/<stem>.py` and `dockerfiles/<stem>/`.
    pub fn file_stem(&self) -> String {
        sanitize_filesystem_name(self.0)
    }

    /// Name used for images and deployment resources.
    pub fn resource_name(&self) -> String {
        sanitize_resource_name(self.0)
    }
}
