//! Language recognition and lexical keyword highlighting for kvim
//!
//! This crate provides:
//! - The set of languages the session core recognizes
//! - A registry mapping file extensions to language descriptors
//! - A whole-text keyword scanner producing highlight spans

use std::fmt;

pub mod highlight;
pub mod registry;

pub use highlight::{HighlightStyle, KeywordSpan, scan, scan_keywords};
pub use registry::{LanguageDescriptor, LanguageRegistry, PLAIN_TEXT};

/// Languages the editor can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    PlainText,
    Rust,
    C,
    Cpp,
    Java,
    Kotlin,
    CSharp,
    Go,
    Python,
    Ruby,
    Php,
    JavaScript,
    TypeScript,
    Lua,
    Sql,
    Shell,
}

impl Language {
    /// Human friendly label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::PlainText => "Plain Text",
            Self::Rust => "Rust",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::Java => "Java",
            Self::Kotlin => "Kotlin",
            Self::CSharp => "C#",
            Self::Go => "Go",
            Self::Python => "Python",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Lua => "Lua",
            Self::Sql => "SQL",
            Self::Shell => "Shell",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
