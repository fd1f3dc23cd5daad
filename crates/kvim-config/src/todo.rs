//! TODO annotations scoped to a project root.
//!
//! Items live in `<root>/.kvim/todo.kvim` as a versioned JSON envelope. The
//! in-memory list (newest first) and its name index are always replaced
//! together, and only after the new state has been written to disk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const STORE_DIR: &str = ".kvim";
const STORE_FILE: &str = "todo.kvim";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub name: String,
    /// Absolute path of the annotated file.
    pub file: PathBuf,
    /// Directory chain from the project root to the file's parent, joined by `/`.
    pub relative_path: String,
    #[serde(default)]
    pub contents: String,
}

#[derive(Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    items: Vec<TodoItem>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    items: &'a [TodoItem],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Re-read the file before `edit` and after `remove` to pick up changes
    /// made by other editor instances.
    pub reconcile: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { reconcile: true }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationStore {
    root: PathBuf,
    options: StoreOptions,
    items: Vec<TodoItem>,
    by_name: HashMap<String, usize>,
}

impl AnnotationStore {
    /// Load the store for `root`. A missing file yields an empty store.
    pub fn load(root: impl Into<PathBuf>, options: StoreOptions) -> Result<Self, StoreError> {
        let root = root.into();
        let items = read_items(&store_path(&root))?;
        let by_name = index_by_name(&items).map_err(|name| duplicate_name(&root, &name))?;
        Ok(Self {
            root,
            options,
            items,
            by_name,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> PathBuf {
        store_path(&self.root)
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&TodoItem> {
        self.by_name.get(name).map(|&index| &self.items[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items_for_file<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a TodoItem> {
        self.items.iter().filter(move |item| item.file == file)
    }

    /// Replace the in-memory list with the file's contents. On error the
    /// current list is kept as is.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let items = read_items(&self.path())?;
        let by_name = index_by_name(&items).map_err(|name| duplicate_name(&self.root, &name))?;
        self.items = items;
        self.by_name = by_name;
        Ok(())
    }

    /// Write the current list to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        write_items(&self.path(), &self.items)
    }

    /// Annotate `file` with a new item at the front of the list.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Result<&TodoItem, StoreError> {
        let name = name.into();
        let file = file.into();
        if name.is_empty() {
            return Err(StoreError::InvalidState("item name must not be empty".into()));
        }
        if self.contains(&name) {
            return Err(StoreError::InvalidState(format!(
                "an item named {name:?} already exists"
            )));
        }

        let relative_path = relative_path(&self.root, &file)?;
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(TodoItem {
            name,
            file,
            relative_path,
            contents: contents.into(),
        });
        items.extend(self.items.iter().cloned());

        self.commit(items)?;
        Ok(&self.items[0])
    }

    /// Rename and/or rewrite an item. The edited item keeps its file and moves
    /// to the front of the list.
    pub fn edit(
        &mut self,
        old_name: &str,
        new_name: impl Into<String>,
        new_contents: impl Into<String>,
    ) -> Result<&TodoItem, StoreError> {
        let new_name = new_name.into();
        if new_name.is_empty() {
            return Err(StoreError::InvalidState("item name must not be empty".into()));
        }
        let old = self
            .get(old_name)
            .cloned()
            .ok_or_else(|| StoreError::InvalidState(format!("no item named {old_name:?}")))?;

        let mut items = if self.options.reconcile {
            read_items(&self.path())?
        } else {
            self.items.clone()
        };
        items.retain(|item| item.name != old_name);
        if items.iter().any(|item| item.name == new_name) {
            return Err(StoreError::InvalidState(format!(
                "an item named {new_name:?} already exists"
            )));
        }

        items.insert(
            0,
            TodoItem {
                name: new_name,
                file: old.file,
                relative_path: old.relative_path,
                contents: new_contents.into(),
            },
        );

        self.commit(items)?;
        Ok(&self.items[0])
    }

    pub fn remove(&mut self, name: &str) -> Result<TodoItem, StoreError> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| StoreError::InvalidState(format!("no item named {name:?}")))?;

        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(items)?;

        if self.options.reconcile {
            self.reload()?;
        }
        Ok(removed)
    }

    fn commit(&mut self, items: Vec<TodoItem>) -> Result<(), StoreError> {
        let by_name = index_by_name(&items).map_err(|name| {
            StoreError::InvalidState(format!("an item named {name:?} already exists"))
        })?;
        write_items(&self.path(), &items)?;
        self.items = items;
        self.by_name = by_name;
        Ok(())
    }
}

/// `<root>/.kvim/todo.kvim`
pub fn store_path(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(STORE_DIR).join(STORE_FILE)
}

/// Names of the directories between `root` (exclusive) and `file`
/// (exclusive), outermost first, joined by `/`. Empty for a file that sits
/// directly in `root`.
pub fn relative_path(root: &Path, file: &Path) -> Result<String, StoreError> {
    let mut names = Vec::new();
    let mut current = file.parent();
    loop {
        match current {
            Some(dir) if dir == root => break,
            Some(dir) => {
                let name = dir.file_name().ok_or_else(|| outside_root(root, file))?;
                names.push(name.to_string_lossy().into_owned());
                current = dir.parent();
            }
            None => return Err(outside_root(root, file)),
        }
    }
    names.reverse();
    Ok(names.join("/"))
}

fn outside_root(root: &Path, file: &Path) -> StoreError {
    StoreError::InvalidState(format!("{file:?} is not inside {root:?}"))
}

fn duplicate_name(root: &Path, name: &str) -> StoreError {
    StoreError::CorruptStore {
        path: store_path(root),
        reason: format!("duplicate item name {name:?}"),
    }
}

/// Returns the first duplicated name on failure.
fn index_by_name(items: &[TodoItem]) -> Result<HashMap<String, usize>, String> {
    let mut by_name = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if by_name.insert(item.name.clone(), index).is_some() {
            return Err(item.name.clone());
        }
    }
    Ok(by_name)
}

fn read_items(path: &Path) -> Result<Vec<TodoItem>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let file: StoreFile = serde_json::from_slice(&bytes).map_err(|err| {
        warn!(?path, %err, "annotation store is unreadable");
        StoreError::CorruptStore {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    })?;

    if file.version != SCHEMA_VERSION {
        warn!(?path, version = file.version, "unsupported annotation schema");
        return Err(StoreError::CorruptStore {
            path: path.to_path_buf(),
            reason: format!("unsupported schema version {}", file.version),
        });
    }
    Ok(file.items)
}

fn write_items(path: &Path, items: &[TodoItem]) -> Result<(), StoreError> {
    let envelope = StoreFileRef {
        version: SCHEMA_VERSION,
        items,
    };
    let io_error = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let contents = serde_json::to_vec_pretty(&envelope).map_err(|err| io_error(err.into()))?;
    crate::write_atomic(path, &contents).map_err(io_error)?;
    info!(?path, count = items.len(), "annotation store saved");
    Ok(())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Annotation store {path:?} is corrupt: {reason}")]
    CorruptStore { path: PathBuf, reason: String },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid annotation operation: {0}")]
    InvalidState(String),
}
