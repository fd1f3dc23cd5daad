use crate::error::{Result, SessionError};
use crate::highlight::{HighlightQueue, PumpReport};
use kvim_config::{
    AnnotationStore, HighlightMode, RecentEntry, RecentFiles, SessionConfig, SessionPaths,
    SessionProperties, StoreOptions, TodoItem, WindowGeometry,
};
use kvim_document::{Document, normalize_path};
use kvim_syntax::LanguageRegistry;
use kvim_workspace::{Markers, WorkspaceResolver};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Editor session: the ordered tabs plus everything they share.
///
/// Tabs are addressed by index. Closing a tab renumbers the ones after it, so
/// indices must not be held across a `close`.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    registry: LanguageRegistry,
    resolver: WorkspaceResolver,
    documents: Vec<Document>,
    active_index: Option<usize>,
    highlights: HighlightQueue,
    stores: HashMap<PathBuf, AnnotationStore>,
    recent: Option<RecentFiles>,
    properties: Option<SessionProperties>,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(SessionConfig::default())
    }
}

impl Session {
    /// A session with no per-user persistence attached.
    pub fn new(
        config: SessionConfig,
        registry: LanguageRegistry,
        resolver: WorkspaceResolver,
    ) -> Self {
        Self {
            config,
            registry,
            resolver,
            documents: Vec::new(),
            active_index: None,
            highlights: HighlightQueue::new(),
            stores: HashMap::new(),
            recent: None,
            properties: None,
        }
    }

    /// Builtin languages and a filesystem resolver using the configured markers.
    pub fn from_config(config: SessionConfig) -> Self {
        let markers = Markers {
            project: config.markers.project.clone(),
            vcs: config.markers.vcs.clone(),
        };
        Self::new(config, LanguageRegistry::builtin(), WorkspaceResolver::new(markers))
    }

    /// Read `config.toml` (defaults when absent) and attach the recent-files
    /// ring and session properties stored next to it.
    pub fn load(paths: &SessionPaths) -> Result<Self> {
        let config = SessionConfig::load_or_default(paths.config_file())?;
        Self::from_config(config).with_persistence(paths)
    }

    pub fn with_persistence(mut self, paths: &SessionPaths) -> Result<Self> {
        self.recent = Some(RecentFiles::load(paths.recent_file())?);
        self.properties = Some(SessionProperties::load(paths.session_file())?);
        Ok(self)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &WorkspaceResolver {
        &self.resolver
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active_index.and_then(|index| self.documents.get(index))
    }

    /// Returns `false` and leaves the active tab alone for an unknown index.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.documents.len() {
            self.active_index = Some(index);
            true
        } else {
            false
        }
    }

    /// Open an empty untitled tab and make it active.
    pub fn new_untitled(&mut self) -> usize {
        self.push(Document::untitled())
    }

    /// Open `path` in a new tab, or focus the tab already showing it.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if let Some(index) = self.position_of(path) {
            debug!(?path, index, "focusing already open document");
            self.active_index = Some(index);
            return Ok(index);
        }

        let document = Document::open(path, &self.registry, &self.resolver)?;
        let opened = document.path().map(Path::to_path_buf);
        let index = self.push(document);
        if let Some(opened) = opened {
            self.record_open(&opened);
        }
        Ok(index)
    }

    /// Remove a tab. Later tabs shift down by one.
    pub fn close(&mut self, index: usize) -> Result<Document> {
        if index >= self.documents.len() {
            return Err(SessionError::no_document(index));
        }
        let document = self.documents.remove(index);
        let remaining = self.documents.len();

        self.active_index = match self.active_index {
            _ if remaining == 0 => None,
            Some(active) if active > index => Some(active - 1),
            Some(active) if active == index => Some(index.min(remaining - 1)),
            other => other,
        };
        self.release_unused_stores();

        info!(name = document.display_name(), index, "closed document");
        Ok(document)
    }

    /// Swap `document` in at `index`, returning the one it displaced.
    pub fn replace(&mut self, index: usize, document: Document) -> Result<Document> {
        let slot = self
            .documents
            .get_mut(index)
            .ok_or_else(|| SessionError::no_document(index))?;
        let previous = std::mem::replace(slot, document);
        self.content_changed(index);
        self.release_unused_stores();
        Ok(previous)
    }

    /// Load `path` into the tab at `index`, e.g. after the file was moved.
    pub fn replace_with_path(&mut self, index: usize, path: impl AsRef<Path>) -> Result<Document> {
        if index >= self.documents.len() {
            return Err(SessionError::no_document(index));
        }
        let document = Document::open(path, &self.registry, &self.resolver)?;
        self.replace(index, document)
    }

    /// Returns `false` if the content was already `content`.
    pub fn set_content(&mut self, index: usize, content: impl Into<String>) -> Result<bool> {
        let changed = self.document_mut(index)?.set_content(content);
        if changed {
            self.content_changed(index);
        }
        Ok(changed)
    }

    pub fn insert(&mut self, index: usize, offset: usize, text: &str) -> Result<()> {
        self.document_mut(index)?.insert(offset, text)?;
        self.content_changed(index);
        Ok(())
    }

    pub fn delete(&mut self, index: usize, range: Range<usize>) -> Result<String> {
        let removed = self.document_mut(index)?.delete(range)?;
        self.content_changed(index);
        Ok(removed)
    }

    pub fn mark_saved(&mut self, index: usize) -> Result<()> {
        self.document_mut(index)?.mark_saved();
        Ok(())
    }

    /// Write the tab to its file and record it as recently used. Failing to
    /// update the recent list is logged and does not fail the save.
    pub fn save(&mut self, index: usize) -> Result<()> {
        let document = self.document_mut(index)?;
        document.save()?;
        if let Some(path) = document.path().map(Path::to_path_buf) {
            self.record_save(&path);
        }
        Ok(())
    }

    /// Save the tab under a new path. Language and workspace are not
    /// re-derived; see [`Session::refresh_language`] and
    /// [`Session::refresh_workspace`].
    pub fn save_as(&mut self, index: usize, path: impl AsRef<Path>) -> Result<()> {
        let document = self.document_mut(index)?;
        document.save_as(path)?;
        if let Some(path) = document.path().map(Path::to_path_buf) {
            self.record_save(&path);
        }
        Ok(())
    }

    /// Re-read the tab's file; refuses while it has unsaved changes.
    pub fn reload(&mut self, index: usize) -> Result<()> {
        let document = self.document_mut(index)?;
        let before = document.revision();
        document.reload()?;
        if document.revision() != before {
            self.content_changed(index);
        }
        Ok(())
    }

    pub fn reload_unconditional(&mut self, index: usize) -> Result<()> {
        let document = self.document_mut(index)?;
        let before = document.revision();
        document.reload_unconditional()?;
        if document.revision() != before {
            self.content_changed(index);
        }
        Ok(())
    }

    /// Re-derive the tab's language from its path. Returns `true` if it changed.
    pub fn refresh_language(&mut self, index: usize) -> Result<bool> {
        let registry = &self.registry;
        let document = self
            .documents
            .get_mut(index)
            .ok_or_else(|| SessionError::no_document(index))?;
        let changed = document.refresh_language(registry);
        if changed {
            self.content_changed(index);
        }
        Ok(changed)
    }

    pub fn refresh_workspace(&mut self, index: usize) -> Result<()> {
        let resolver = &self.resolver;
        self.documents
            .get_mut(index)
            .ok_or_else(|| SessionError::no_document(index))?
            .refresh_workspace(resolver);
        Ok(())
    }

    /// Rescan every tab with a pending highlight request.
    pub fn pump_highlights(&mut self) -> PumpReport {
        let report = self.highlights.pump(&mut self.documents);
        if report.superseded > 0 {
            debug!(?report, "pumped highlight queue");
        }
        report
    }

    pub fn pending_highlights(&self) -> usize {
        self.highlights.pending()
    }

    pub fn highlight_queue(&self) -> &HighlightQueue {
        &self.highlights
    }

    /// The annotation store of the project the tab belongs to, loaded on
    /// first use and shared by every tab under the same project root.
    pub fn todos(&mut self, index: usize) -> Result<&mut AnnotationStore> {
        let document = self
            .documents
            .get(index)
            .ok_or_else(|| SessionError::no_document(index))?;
        let Some(root) = document.workspace().project_root.clone() else {
            return Err(SessionError::InvalidState(format!(
                "{} is not part of a project",
                document.display_name()
            )));
        };

        let options = StoreOptions {
            reconcile: self.config.store.reconcile,
        };
        let store = match self.stores.entry(root) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let store = AnnotationStore::load(entry.key().clone(), options)?;
                info!(root = ?entry.key(), items = store.len(), "loaded annotation store");
                entry.insert(store)
            }
        };
        Ok(store)
    }

    /// Add an annotation for the tab's own file.
    pub fn annotate(
        &mut self,
        index: usize,
        name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Result<&TodoItem> {
        let file = self
            .documents
            .get(index)
            .ok_or_else(|| SessionError::no_document(index))?
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                SessionError::InvalidState("untitled documents cannot be annotated".into())
            })?;
        Ok(self.todos(index)?.add(name, file, contents)?)
    }

    /// Project roots whose annotation stores are currently loaded.
    pub fn open_workspaces(&self) -> impl Iterator<Item = &Path> {
        self.stores.keys().map(PathBuf::as_path)
    }

    pub fn recent_files(&self) -> Option<&RecentFiles> {
        self.recent.as_ref()
    }

    pub fn session_properties(&self) -> Option<&SessionProperties> {
        self.properties.as_ref()
    }

    /// Store the window geometry. A no-op without attached persistence.
    pub fn set_geometry(&mut self, geometry: WindowGeometry) -> Result<()> {
        if let Some(properties) = &mut self.properties {
            properties.set_geometry(geometry);
            properties.save()?;
        }
        Ok(())
    }

    /// Human-friendly summary of the active tab.
    pub fn status_line(&self) -> String {
        match self.active_document() {
            Some(doc) => {
                let dirty = if doc.is_dirty() { "*" } else { "" };
                format!("{}{} [{}]", doc.display_name(), dirty, doc.language().name())
            }
            None => "No document".to_string(),
        }
    }

    fn document_mut(&mut self, index: usize) -> Result<&mut Document> {
        self.documents
            .get_mut(index)
            .ok_or_else(|| SessionError::no_document(index))
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        let path = normalize_path(path).ok()?;
        let fingerprint = Document::fingerprint_for(&path);
        self.documents
            .iter()
            .position(|doc| doc.fingerprint() == Some(fingerprint))
    }

    fn push(&mut self, document: Document) -> usize {
        self.documents.push(document);
        let index = self.documents.len() - 1;
        self.active_index = Some(index);
        self.content_changed(index);
        index
    }

    fn content_changed(&mut self, index: usize) {
        if let Some(document) = self.documents.get(index) {
            self.highlights.request(document);
        }
        if self.config.highlight.mode == HighlightMode::Immediate {
            self.pump_highlights();
        }
    }

    fn release_unused_stores(&mut self) {
        let documents = &self.documents;
        self.stores.retain(|root, _| {
            let in_use = documents
                .iter()
                .any(|doc| doc.workspace().project_root.as_deref() == Some(root.as_path()));
            if !in_use {
                debug!(?root, "releasing annotation store");
            }
            in_use
        });
    }

    // The document itself is already open or written when these run, so a
    // failure to persist the bookkeeping is only logged.
    fn record_open(&mut self, path: &Path) {
        self.push_recent(path);
        if let Some(properties) = &mut self.properties {
            properties.set_last_open_file(path);
            if let Err(err) = properties.save() {
                warn!(?path, %err, "failed to record last opened file");
            }
        }
    }

    fn record_save(&mut self, path: &Path) {
        self.push_recent(path);
        if let Some(properties) = &mut self.properties {
            properties.set_last_save_file(path);
            if let Err(err) = properties.save() {
                warn!(?path, %err, "failed to record last saved file");
            }
        }
    }

    fn push_recent(&mut self, path: &Path) {
        if let (Some(recent), Some(entry)) = (&mut self.recent, RecentEntry::from_path(path)) {
            if let Err(err) = recent.push(entry) {
                warn!(?path, %err, "failed to update recent files");
            }
        }
    }
}
