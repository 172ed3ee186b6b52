//! The structured form a clangd hover markdown blob is parsed into.

use std::fmt;

/// Access specifier under which a member was declared, if the hover text
/// carried one. `None` means the hover gave no access context (free
/// functions, namespaces, or clangd simply omitting it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Public,
    Protected,
    Private,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessLevel::Public => "public",
            AccessLevel::Protected => "protected",
            AccessLevel::Private => "private",
        };
        f.write_str(s)
    }
}

/// One modifier drawn from the multi-set clangd's hover text names. Declaration
/// order here is display order for `signature`'s "Modifiers:" line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Const,
    Virtual,
    Static,
    Override,
    Inline,
    Explicit,
    Noexcept,
    PureVirtual,
    Deleted,
    Defaulted,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Const => "const",
            Modifier::Virtual => "virtual",
            Modifier::Static => "static",
            Modifier::Override => "override",
            Modifier::Inline => "inline",
            Modifier::Explicit => "explicit",
            Modifier::Noexcept => "noexcept",
            Modifier::PureVirtual => "pure virtual",
            Modifier::Deleted => "deleted",
            Modifier::Defaulted => "defaulted",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parsed form of a clangd hover response.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocumentation {
    pub raw: String,
    pub signature: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub return_type: Option<String>,
    pub type_: Option<String>,
    pub parameters_text: Option<String>,
    pub template_params: Option<String>,
    pub modifiers: Vec<Modifier>,
    pub description: Option<String>,
}

impl ParsedDocumentation {
    /// A documentation record that carries only the raw text, used as the
    /// degrade-gracefully fallback when parsing can't extract a code block
    /// (the *Parse* error kind).
    pub fn raw_only(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Default::default()
        }
    }

    pub fn has_modifier(&self, m: Modifier) -> bool {
        self.modifiers.contains(&m)
    }
}
