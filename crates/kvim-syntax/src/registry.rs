use crate::Language;
use std::collections::HashMap;
use std::path::Path;

/// Static description of a recognized language.
///
/// Keyword literals carry their trailing boundary (usually a space) so that a
/// literal search for `"for "` never lands inside `"formula"`.
#[derive(Debug, PartialEq, Eq)]
pub struct LanguageDescriptor {
    pub language: Language,
    /// Canonical extension, lowercase and without the leading dot.
    pub extension: &'static str,
    /// Additional extensions mapping to the same language.
    pub aliases: &'static [&'static str],
    pub icon: Option<&'static str>,
    /// Keyword literals in scan order.
    pub keywords: &'static [&'static str],
}

impl LanguageDescriptor {
    pub fn name(&self) -> &'static str {
        self.language.display_name()
    }

    /// Plain text and unknown extensions have nothing to highlight.
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }

    fn extensions(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.extension).chain(self.aliases.iter().copied())
    }
}

/// Fallback for untitled buffers and unrecognized extensions.
pub static PLAIN_TEXT: LanguageDescriptor = LanguageDescriptor {
    language: Language::PlainText,
    extension: "txt",
    aliases: &[],
    icon: None,
    keywords: &[],
};

static BUILTIN: &[LanguageDescriptor] = &[
    LanguageDescriptor {
        language: Language::Rust,
        extension: "rs",
        aliases: &[],
        icon: Some("icons/rust.png"),
        keywords: &[
            "fn ", "let ", "mut ", "pub ", "struct ", "enum ", "impl ", "trait ", "use ", "mod ",
            "match ", "if ", "else ", "for ", "while ", "loop ", "return ", "const ", "static ",
            "where ", "type ", "in ",
        ],
    },
    LanguageDescriptor {
        language: Language::C,
        extension: "c",
        aliases: &["h"],
        icon: Some("icons/c.png"),
        keywords: &[
            "int ", "char ", "void ", "struct ", "typedef ", "return ", "if ", "else ", "for ",
            "while ", "switch ", "case ", "static ", "const ", "unsigned ", "#include ",
            "#define ",
        ],
    },
    LanguageDescriptor {
        language: Language::Cpp,
        extension: "cpp",
        aliases: &["cc", "cxx", "hpp", "hh", "hxx"],
        icon: Some("icons/cpp.png"),
        keywords: &[
            "class ", "namespace ", "template ", "typename ", "public:", "private:",
            "protected:", "virtual ", "auto ", "int ", "void ", "return ", "if ", "else ",
            "for ", "while ", "const ", "static ", "#include ",
        ],
    },
    LanguageDescriptor {
        language: Language::Java,
        extension: "java",
        aliases: &[],
        icon: Some("icons/java.png"),
        keywords: &[
            "public ", "private ", "protected ", "class ", "interface ", "extends ",
            "implements ", "static ", "final ", "void ", "new ", "return ", "if ", "else ",
            "for ", "while ", "import ", "package ", "try ", "catch ",
        ],
    },
    LanguageDescriptor {
        language: Language::Kotlin,
        extension: "kt",
        aliases: &["kts"],
        icon: Some("icons/kotlin.png"),
        keywords: &[
            "fun ", "val ", "var ", "class ", "object ", "interface ", "return ", "if ",
            "else ", "for ", "while ", "when ", "import ", "package ",
        ],
    },
    LanguageDescriptor {
        language: Language::CSharp,
        extension: "cs",
        aliases: &[],
        icon: Some("icons/csharp.png"),
        keywords: &[
            "using ", "namespace ", "public ", "private ", "class ", "static ", "void ",
            "var ", "new ", "return ", "if ", "else ", "for ", "foreach ", "while ",
        ],
    },
    LanguageDescriptor {
        language: Language::Go,
        extension: "go",
        aliases: &[],
        icon: Some("icons/go.png"),
        keywords: &[
            "package ", "import ", "func ", "var ", "const ", "type ", "struct ", "interface ",
            "return ", "if ", "else ", "for ", "range ", "go ", "defer ",
        ],
    },
    LanguageDescriptor {
        language: Language::Python,
        extension: "py",
        aliases: &["pyw"],
        icon: Some("icons/python.png"),
        keywords: &[
            "def ", "class ", "import ", "from ", "return ", "if ", "elif ", "else ", "for ",
            "while ", "in ", "with ", "as ", "lambda ", "yield ", "not ", "and ", "or ",
        ],
    },
    LanguageDescriptor {
        language: Language::Ruby,
        extension: "rb",
        aliases: &[],
        icon: Some("icons/ruby.png"),
        keywords: &[
            "def ", "class ", "module ", "end ", "if ", "elsif ", "else ", "unless ", "while ",
            "do ", "require ", "return ",
        ],
    },
    LanguageDescriptor {
        language: Language::Php,
        extension: "php",
        aliases: &[],
        icon: Some("icons/php.png"),
        keywords: &[
            "function ", "class ", "public ", "private ", "echo ", "return ", "if ", "else ",
            "foreach ", "while ", "new ", "use ",
        ],
    },
    LanguageDescriptor {
        language: Language::JavaScript,
        extension: "js",
        aliases: &["mjs", "cjs", "jsx"],
        icon: Some("icons/javascript.png"),
        keywords: &[
            "function ", "const ", "let ", "var ", "return ", "if ", "else ", "for ", "while ",
            "class ", "new ", "import ", "export ", "async ", "await ",
        ],
    },
    LanguageDescriptor {
        language: Language::TypeScript,
        extension: "ts",
        aliases: &["tsx", "mts", "cts"],
        icon: Some("icons/typescript.png"),
        keywords: &[
            "function ", "const ", "let ", "interface ", "type ", "enum ", "return ", "if ",
            "else ", "for ", "while ", "class ", "import ", "export ", "async ", "await ",
        ],
    },
    LanguageDescriptor {
        language: Language::Lua,
        extension: "lua",
        aliases: &[],
        icon: Some("icons/lua.png"),
        keywords: &[
            "function ", "local ", "return ", "if ", "then ", "elseif ", "else ", "end ", "for ",
            "while ", "do ", "repeat ", "until ",
        ],
    },
    LanguageDescriptor {
        language: Language::Sql,
        extension: "sql",
        aliases: &[],
        icon: Some("icons/sql.png"),
        keywords: &[
            "SELECT ", "FROM ", "WHERE ", "INSERT ", "INTO ", "UPDATE ", "DELETE ", "CREATE ",
            "TABLE ", "JOIN ", "ORDER ", "GROUP ", "BY ",
        ],
    },
    LanguageDescriptor {
        language: Language::Shell,
        extension: "sh",
        aliases: &["bash", "zsh"],
        icon: Some("icons/shell.png"),
        keywords: &[
            "if ", "then ", "else ", "fi ", "for ", "while ", "do ", "done ", "case ", "esac ",
            "function ", "export ", "local ",
        ],
    },
];

/// Extension-to-language lookup, built once per process and shared by reference.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    descriptors: &'static [LanguageDescriptor],
    by_extension: HashMap<String, usize>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageRegistry {
    /// Registry over the built-in language table.
    pub fn builtin() -> Self {
        Self::from_table(BUILTIN)
    }

    /// Build a registry over an arbitrary static table. The first descriptor
    /// declaring an extension wins.
    pub fn from_table(descriptors: &'static [LanguageDescriptor]) -> Self {
        let mut by_extension = HashMap::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            for extension in descriptor.extensions() {
                by_extension
                    .entry(extension.to_ascii_lowercase())
                    .or_insert(index);
            }
        }
        Self {
            descriptors,
            by_extension,
        }
    }

    /// Resolve an extension (with or without the leading dot, any case).
    /// Unknown extensions resolve to [`PLAIN_TEXT`].
    pub fn resolve(&self, extension: &str) -> &'static LanguageDescriptor {
        let key = extension.strip_prefix('.').unwrap_or(extension);
        self.by_extension
            .get(&key.to_ascii_lowercase())
            .map(|&index| &self.descriptors[index])
            .unwrap_or(&PLAIN_TEXT)
    }

    pub fn resolve_path(&self, path: impl AsRef<Path>) -> &'static LanguageDescriptor {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.resolve(ext))
            .unwrap_or(&PLAIN_TEXT)
    }

    pub fn descriptors(&self) -> &'static [LanguageDescriptor] {
        self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_extension_has_keywords() {
        let registry = LanguageRegistry::builtin();
        for descriptor in registry.descriptors() {
            for extension in descriptor.extensions() {
                let resolved = registry.resolve(extension);
                assert!(!resolved.name().is_empty());
                assert!(resolved.has_keywords(), "{extension} has no keywords");
            }
        }
    }

    #[test]
    fn unknown_extension_falls_back_to_plain_text() {
        let registry = LanguageRegistry::builtin();
        for extension in ["", "xyz", "txt", "md", "rs2"] {
            let resolved = registry.resolve(extension);
            assert_eq!(resolved.language, Language::PlainText);
            assert!(!resolved.has_keywords());
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_exact() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.resolve("RS").language, Language::Rust);
        assert_eq!(registry.resolve(".Py").language, Language::Python);
        assert_eq!(registry.resolve("hpp").language, Language::Cpp);
        assert_eq!(registry.resolve("r").language, Language::PlainText);
    }

    #[test]
    fn resolve_path_uses_extension() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.resolve_path("/tmp/main.go").language, Language::Go);
        assert_eq!(
            registry.resolve_path("/tmp/Makefile").language,
            Language::PlainText
        );
        assert_eq!(
            registry.resolve_path("/tmp/archive.tar.GZ").language,
            Language::PlainText
        );
    }

    #[test]
    fn first_declaration_of_an_extension_wins() {
        static TABLE: &[LanguageDescriptor] = &[
            LanguageDescriptor {
                language: Language::C,
                extension: "h",
                aliases: &[],
                icon: None,
                keywords: &["int "],
            },
            LanguageDescriptor {
                language: Language::Cpp,
                extension: "cpp",
                aliases: &["h"],
                icon: None,
                keywords: &["class "],
            },
        ];

        let registry = LanguageRegistry::from_table(TABLE);
        assert_eq!(registry.resolve("h").language, Language::C);
        assert_eq!(registry.resolve("cpp").language, Language::Cpp);
    }
}
