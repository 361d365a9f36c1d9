use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves resource names to byte streams.
///
/// Contract: return a readable stream, or `None` when the resource does not
/// exist. Implementations must not panic on unknown names.
pub trait ResourceLoader: Send + Sync {
    fn open(&self, name: &str) -> Option<Box<dyn Read + Send>>;
}

/// Looks a name up under a list of root directories; the first hit wins.
///
/// Absolute names are opened directly.
#[derive(Debug, Clone, Default)]
pub struct FileResourceLoader {
    roots: Vec<PathBuf>,
}

impl FileResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let path = Path::new(name);
        let direct = (path.is_absolute() || self.roots.is_empty()).then(|| path.to_path_buf());
        direct
            .into_iter()
            .chain(self.roots.iter().map(move |root| root.join(name)))
    }
}

impl ResourceLoader for FileResourceLoader {
    fn open(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        for candidate in self.candidates(name) {
            match File::open(&candidate) {
                Ok(file) => {
                    log::trace!("resource [{name}] resolved to {}", candidate.display());
                    return Some(Box::new(BufReader::new(file)));
                }
                Err(_) => continue,
            }
        }
        None
    }
}

/// In-memory resource table.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceLoader {
    entries: HashMap<String, Arc<[u8]>>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn open(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        let bytes = self.entries.get(name)?.clone();
        Some(Box::new(Cursor::new(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_loader_round_trip() {
        let loader = MemoryResourceLoader::new().with("a.txt", b"hello".to_vec());
        let mut out = String::new();
        loader.open("a.txt").unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert!(loader.open("b.txt").is_none());
    }

    #[test]
    fn file_loader_searches_roots_in_order() {
        let dir = std::env::temp_dir().join(format!("tessel-loader-{}", std::process::id()));
        let first = dir.join("first");
        let second = dir.join("second");
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        std::fs::write(second.join("only-here.txt"), b"second").unwrap();

        let loader = FileResourceLoader::new().with_root(&first).with_root(&second);
        let mut out = String::new();
        loader.open("only-here.txt").unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "second");
        assert!(loader.open("missing.txt").is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
