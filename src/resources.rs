//! Named resource bodies referenced by `$redirect=` and
//! `+js(name, ...)` / `script:inject(name, ...)` filters.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{FilterCoreError, Result};

#[derive(Debug, Default, Clone)]
pub struct ResourceStore {
    bodies: HashMap<String, String>,
    content_types: HashMap<String, String>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the body for `name`, or the empty string if the
    /// resource is unknown (spec.md §7: a missing resource makes the
    /// referencing filter inert rather than an error).
    pub fn get(&self, name: &str) -> &str {
        self.bodies.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn content_type(&self, name: &str) -> &str {
        self.content_types
            .get(name)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    /// Parses one resource file: blocks of `<name> <mime-type>` header
    /// followed by body lines, terminated by a blank line. `#`-prefixed
    /// and blank lines between blocks are skipped. Javascript-typed
    /// bodies keep their newlines; other bodies are concatenated.
    pub fn load_str(&mut self, text: &str) {
        let mut lines = text.lines();
        let mut current_key: Option<String> = None;
        let mut current_mime = String::new();
        let mut current_value = String::new();

        let flush = |store: &mut ResourceStore,
                     key: &Option<String>,
                     mime: &str,
                     value: &str| {
            if let Some(k) = key {
                store.bodies.insert(k.clone(), value.to_string());
                store.content_types.insert(k.clone(), mime.to_string());
            }
        };

        loop {
            let line = match lines.next() {
                Some(l) => l,
                None => break,
            };
            if current_key.is_none() {
                if line.trim().is_empty() || line.starts_with('#') {
                    continue;
                }
                let mut parts = line.splitn(2, ' ');
                let name = parts.next().unwrap_or("").trim().to_string();
                let mime = parts.next().unwrap_or("").trim().to_string();
                if name.is_empty() {
                    continue;
                }
                current_key = Some(name);
                current_mime = mime;
                current_value.clear();
            } else if line.trim().is_empty() {
                flush(self, &current_key, &current_mime, &current_value);
                current_key = None;
            } else if current_mime.contains("javascript") {
                current_value.push_str(line);
                current_value.push('\n');
            } else {
                current_value.push_str(line);
            }
        }
        flush(self, &current_key, &current_mime, &current_value);
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|source| FilterCoreError::ResourceIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&text);
        Ok(())
    }

    /// Loads every file in a directory the way uBO resource bundles
    /// ship them (one resource, or a handful, per file).
    pub fn load_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|source| FilterCoreError::ResourceIo {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| FilterCoreError::ResourceIo {
                path: dir.to_path_buf(),
                source,
            })?;
            if entry.path().is_file() {
                self.load_file(&entry.path())?;
            }
        }
        Ok(())
    }
}
