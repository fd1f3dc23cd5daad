use kvim_syntax::{HighlightStyle, KeywordSpan, LanguageDescriptor, LanguageRegistry, PLAIN_TEXT};
use kvim_workspace::{WorkspaceInfo, WorkspaceResolver};
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::info;

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Process-unique identity of a document, independent of its tab position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An open buffer, either backed by a file or untitled.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    /// Absolute path if the buffer has a backing file
    path: Option<PathBuf>,
    content: String,
    /// Content as of the last load or successful save
    snapshot: String,
    language: &'static LanguageDescriptor,
    workspace: WorkspaceInfo,
    /// Incremented on every content change
    revision: u64,
    highlights: Vec<KeywordSpan>,
    highlighted_revision: Option<u64>,
    /// Fingerprint for file identification (computed from path)
    fingerprint: Option<u64>,
}

impl Document {
    /// Assemble a document from already-derived parts.
    pub fn new(
        path: Option<PathBuf>,
        content: impl Into<String>,
        language: &'static LanguageDescriptor,
        workspace: WorkspaceInfo,
    ) -> Self {
        let content = content.into();
        let fingerprint = path.as_deref().map(compute_fingerprint);
        Self {
            id: DocumentId::next(),
            path,
            snapshot: content.clone(),
            content,
            language,
            workspace,
            revision: 0,
            highlights: Vec::new(),
            highlighted_revision: None,
            fingerprint,
        }
    }

    /// A new empty buffer with no file, no language and no workspace.
    pub fn untitled() -> Self {
        Self::new(None, String::new(), &PLAIN_TEXT, WorkspaceInfo::standalone())
    }

    /// Load a file, resolving its language and workspace once.
    pub fn open(
        path: impl AsRef<Path>,
        registry: &LanguageRegistry,
        resolver: &WorkspaceResolver,
    ) -> Result<Self> {
        let path = normalize_path(path.as_ref())?;
        let content = read_text(&path)?;
        let language = registry.resolve_path(&path);
        let workspace = resolver.resolve(&path);
        info!(?path, language = language.name(), "opened document");
        Ok(Self::new(Some(path), content, language, workspace))
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> &'static LanguageDescriptor {
        self.language
    }

    pub fn workspace(&self) -> &WorkspaceInfo {
        &self.workspace
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn fingerprint(&self) -> Option<u64> {
        self.fingerprint
    }

    /// The fingerprint a document opened from `path` would carry. Symlinked
    /// spellings of one file share a fingerprint.
    pub fn fingerprint_for(path: &Path) -> u64 {
        compute_fingerprint(path)
    }

    pub fn display_name(&self) -> &str {
        match &self.path {
            Some(path) => path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("(unnamed)"),
            None => "(untitled)",
        }
    }

    /// Whether the content differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.content != self.snapshot
    }

    /// Record the current content as persisted. Call only after the content
    /// has actually been written.
    pub fn mark_saved(&mut self) {
        self.snapshot.clone_from(&self.content);
    }

    /// Replace the whole content. Returns `false` when nothing changed.
    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.content {
            return false;
        }
        self.content = content;
        self.touch();
        true
    }

    /// Insert `text` at byte `offset`, which must be a char boundary.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        if !self.content.is_char_boundary(offset) {
            return Err(DocumentError::InvalidState(format!(
                "offset {offset} is not a character boundary"
            )));
        }
        if !text.is_empty() {
            self.content.insert_str(offset, text);
            self.touch();
        }
        Ok(())
    }

    /// Remove the byte `range`, returning the removed text.
    pub fn delete(&mut self, range: Range<usize>) -> Result<String> {
        if range.start > range.end
            || !self.content.is_char_boundary(range.start)
            || !self.content.is_char_boundary(range.end)
        {
            return Err(DocumentError::InvalidState(format!(
                "range {range:?} is not a valid character range"
            )));
        }
        let removed: String = self.content.drain(range).collect();
        if !removed.is_empty() {
            self.touch();
        }
        Ok(removed)
    }

    /// Re-read the backing file. Refuses to discard unsaved changes; callers
    /// that have confirmed the loss use [`Document::reload_unconditional`].
    pub fn reload(&mut self) -> Result<()> {
        if self.is_dirty() {
            return Err(DocumentError::InvalidState(
                "document has unsaved changes".into(),
            ));
        }
        self.reload_unconditional()
    }

    /// Re-read the backing file, replacing content and snapshot.
    pub fn reload_unconditional(&mut self) -> Result<()> {
        let path = self.require_path()?.to_path_buf();
        let content = read_text(&path)?;
        self.snapshot.clone_from(&content);
        if content != self.content {
            self.content = content;
            self.touch();
        }
        Ok(())
    }

    /// Write the content to the backing file and mark it saved.
    pub fn save(&mut self) -> Result<()> {
        let path = self.require_path()?;
        fs::write(path, &self.content).map_err(|source| io_error(path, source))?;
        info!(?path, bytes = self.content.len(), "saved document");
        self.mark_saved();
        Ok(())
    }

    /// Point the document at a new file and save it there. Language and
    /// workspace stay as they were; see [`Document::refresh_language`] and
    /// [`Document::refresh_workspace`].
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = normalize_path(path.as_ref())?;
        self.fingerprint = Some(compute_fingerprint(&path));
        self.path = Some(path);
        self.save()
    }

    /// Re-derive the language from the current path. Returns `true` if it changed.
    pub fn refresh_language(&mut self, registry: &LanguageRegistry) -> bool {
        let language = match &self.path {
            Some(path) => registry.resolve_path(path),
            None => &PLAIN_TEXT,
        };
        if std::ptr::eq(language, self.language) {
            return false;
        }
        self.language = language;
        self.highlights.clear();
        self.highlighted_revision = None;
        true
    }

    /// Re-run workspace resolution for the current path.
    pub fn refresh_workspace(&mut self, resolver: &WorkspaceResolver) {
        self.workspace = match &self.path {
            Some(path) => resolver.resolve(path),
            None => WorkspaceInfo::standalone(),
        };
    }

    pub fn highlights(&self) -> &[KeywordSpan] {
        &self.highlights
    }

    /// Spans paired with the style the UI should paint them in.
    pub fn styled_spans(&self) -> impl Iterator<Item = (KeywordSpan, HighlightStyle)> + '_ {
        self.highlights
            .iter()
            .map(|&span| (span, HighlightStyle::Keyword))
    }

    /// Whether the spans are out of date with the content.
    pub fn needs_highlight(&self) -> bool {
        self.language.has_keywords() && self.highlighted_revision != Some(self.revision)
    }

    /// Rescan the whole content for the language's keywords.
    pub fn rehighlight(&mut self) {
        self.highlights = kvim_syntax::scan(&self.content, self.language);
        self.highlighted_revision = Some(self.revision);
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn require_path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| DocumentError::InvalidState("untitled document has no backing file".into()))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::untitled()
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid document operation: {0}")]
    InvalidState(String),
}

fn io_error(path: &Path, source: io::Error) -> DocumentError {
    if source.kind() == io::ErrorKind::NotFound {
        DocumentError::NotFound(path.to_path_buf())
    } else {
        DocumentError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Absolute form of `path` with `.` and `..` folded away, so every ancestor
/// of the result is a real parent directory of the file.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|source| io_error(path, source))?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    String::from_utf8(bytes).map_err(|err| DocumentError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::InvalidData,
            format!("File contains invalid UTF-8: {err}"),
        ),
    })
}

fn compute_fingerprint(path: &Path) -> u64 {
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    resolved.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvim_syntax::Language;
    use tempfile::tempdir;

    fn open(path: &Path) -> Result<Document> {
        Document::open(path, &LanguageRegistry::builtin(), &WorkspaceResolver::default())
    }

    #[test]
    fn untitled_dirty_lifecycle() {
        let mut doc = Document::untitled();
        assert!(!doc.is_dirty());
        assert!(doc.is_untitled());
        assert_eq!(doc.display_name(), "(untitled)");

        doc.set_content("hello");
        assert!(doc.is_dirty());

        doc.mark_saved();
        assert!(!doc.is_dirty());

        doc.insert(5, "!").unwrap();
        assert!(doc.is_dirty());
        doc.delete(5..6).unwrap();
        assert!(!doc.is_dirty());
    }

    #[test]
    fn untitled_has_no_context() {
        let doc = Document::untitled();
        assert_eq!(doc.language().language, Language::PlainText);
        assert!(doc.workspace().is_standalone());
        assert_eq!(doc.workspace().project_root, None);
        assert_eq!(doc.workspace().vcs_root, None);
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.rs");
        assert!(matches!(open(&missing), Err(DocumentError::NotFound(path)) if path == missing));
    }

    #[test]
    fn open_reads_content_and_derives_context() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".kvim")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        let file = root.join("src").join("main.rs");
        fs::write(&file, "fn main() {}\n").unwrap();

        let doc = open(&file).unwrap();
        assert_eq!(doc.content(), "fn main() {}\n");
        assert!(!doc.is_dirty());
        assert_eq!(doc.language().language, Language::Rust);
        assert_eq!(doc.display_name(), "main.rs");
        assert!(doc.workspace().is_project_member);
        assert_eq!(doc.workspace().project_root.as_deref(), Some(root));
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("binary.txt");
        fs::write(&file, [0x48, 0xFF, 0xFE]).unwrap();

        match open(&file) {
            Err(DocumentError::Io { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn edits_reject_non_boundary_offsets() {
        let mut doc = Document::untitled();
        doc.set_content("héllo");
        let revision = doc.revision();

        assert!(matches!(doc.insert(2, "x"), Err(DocumentError::InvalidState(_))));
        assert!(matches!(doc.delete(0..2), Err(DocumentError::InvalidState(_))));
        assert!(matches!(doc.delete(0..99), Err(DocumentError::InvalidState(_))));
        assert_eq!(doc.revision(), revision);

        assert_eq!(doc.delete(1..3).unwrap(), "é");
        assert_eq!(doc.content(), "hllo");
    }

    #[test]
    fn reload_refuses_to_drop_unsaved_changes() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "one").unwrap();
        let mut doc = open(&file).unwrap();

        doc.set_content("local edit");
        fs::write(&file, "two").unwrap();

        assert!(matches!(doc.reload(), Err(DocumentError::InvalidState(_))));
        assert_eq!(doc.content(), "local edit");

        doc.reload_unconditional().unwrap();
        assert_eq!(doc.content(), "two");
        assert!(!doc.is_dirty());
    }

    #[test]
    fn reload_clean_document_picks_up_disk_changes() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "one").unwrap();
        let mut doc = open(&file).unwrap();

        fs::write(&file, "two").unwrap();
        doc.reload().unwrap();
        assert_eq!(doc.content(), "two");

        fs::remove_file(&file).unwrap();
        assert!(matches!(doc.reload(), Err(DocumentError::NotFound(_))));
    }

    #[test]
    fn untitled_cannot_reload_or_save() {
        let mut doc = Document::untitled();
        assert!(matches!(
            doc.reload_unconditional(),
            Err(DocumentError::InvalidState(_))
        ));
        assert!(matches!(doc.save(), Err(DocumentError::InvalidState(_))));
    }

    #[test]
    fn save_as_keeps_language_until_refreshed() {
        let dir = tempdir().unwrap();
        let mut doc = Document::untitled();
        doc.set_content("def run():\n    pass\n");

        let target = dir.path().join("script.py");
        doc.save_as(&target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), doc.content());
        assert!(!doc.is_dirty());
        assert_eq!(doc.language().language, Language::PlainText);

        assert!(doc.refresh_language(&LanguageRegistry::builtin()));
        assert_eq!(doc.language().language, Language::Python);
        assert!(!doc.refresh_language(&LanguageRegistry::builtin()));
    }

    #[test]
    fn highlights_track_revisions() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("lib.rs");
        fs::write(&file, "pub fn a() {}").unwrap();
        let mut doc = open(&file).unwrap();

        assert!(doc.needs_highlight());
        doc.rehighlight();
        assert!(!doc.needs_highlight());
        assert_eq!(
            doc.highlights(),
            &[KeywordSpan::new(0, 4), KeywordSpan::new(4, 3)]
        );
        assert!(doc.styled_spans().all(|(_, style)| style == HighlightStyle::Keyword));

        doc.insert(0, "let x = 1;\n").unwrap();
        assert!(doc.needs_highlight());
    }

    #[test]
    fn plain_text_never_needs_highlight() {
        let mut doc = Document::untitled();
        doc.set_content("for while if fn let ");
        assert!(!doc.needs_highlight());
        doc.rehighlight();
        assert!(doc.highlights().is_empty());
    }

    #[test]
    fn fingerprint_identifies_the_same_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "").unwrap();

        let first = open(&file).unwrap();
        let second = open(&dir.path().join(".").join("a.txt")).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_ne!(first.id(), second.id());
        assert_eq!(Document::untitled().fingerprint(), None);
    }

    #[test]
    fn parent_components_are_folded_before_resolving() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b").join(".kvim")).unwrap();
        fs::create_dir_all(root.join("c")).unwrap();
        let file = root.join("c").join("f.txt");
        fs::write(&file, "text").unwrap();

        let doc = open(&root.join("b").join("..").join("c").join("f.txt")).unwrap();
        assert_eq!(doc.path(), Some(file.as_path()));
        assert!(!doc.workspace().is_project_member);
        assert_eq!(doc.workspace().project_root, None);
    }

    #[test]
    fn normalize_path_drops_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c/d.txt")).unwrap(),
            PathBuf::from("/a/c/d.txt")
        );
        assert_eq!(
            normalize_path(Path::new("/../x")).unwrap(),
            PathBuf::from("/x")
        );
    }
}
