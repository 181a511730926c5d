// src/host/loader.rs

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::LoadError;
use crate::host::instance::AppInstance;

/// Default exported constructor symbol emitted by the route generator.
pub const DEFAULT_ENTRY_SYMBOL: &str = "hotserve_entry";

/// Identifies what to load from an artifact directory: `[library:]symbol`.
///
/// `library` is the bare crate/library name (`app` for `libapp.so`,
/// `app.dll`, ...); `symbol` is the exported constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryPointId {
    library: Option<String>,
    symbol: String,
}

impl EntryPointId {
    pub fn new(library: Option<String>, symbol: impl Into<String>) -> Self {
        Self {
            library,
            symbol: symbol.into(),
        }
    }

    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fill in the library name if the id did not carry one.
    pub fn or_library(mut self, library: Option<&str>) -> Self {
        if self.library.is_none() {
            self.library = library.map(str::to_string);
        }
        self
    }
}

impl Default for EntryPointId {
    fn default() -> Self {
        Self::new(None, DEFAULT_ENTRY_SYMBOL)
    }
}

impl fmt::Display for EntryPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.library {
            Some(lib) => write!(f, "{lib}:{}", self.symbol),
            None => f.write_str(&self.symbol),
        }
    }
}

impl FromStr for EntryPointId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (library, symbol) = match s.split_once(':') {
            Some((lib, sym)) => (Some(lib), sym),
            None => (None, s),
        };

        if !is_identifier(symbol) {
            return Err(format!(
                "invalid entry point '{s}': symbol '{symbol}' is not an identifier"
            ));
        }
        if let Some(lib) = library {
            if lib.is_empty() || lib.contains(['/', '\\', ':']) {
                return Err(format!(
                    "invalid entry point '{s}': library must be a bare name like 'app'"
                ));
            }
        }

        Ok(Self::new(library.map(str::to_string), symbol))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Builds application instances in a fresh loading boundary.
///
/// Every call must produce an instance that shares no loaded code or
/// static state with the instances of earlier calls.
pub trait AppLoader: Send + Sync {
    fn load(
        &self,
        artifact_root: &Path,
        entry_point: &EntryPointId,
        generation: u64,
    ) -> Result<AppInstance, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbol_with_and_without_library() {
        let plain: EntryPointId = "hotserve_entry".parse().unwrap();
        assert_eq!(plain.library(), None);
        assert_eq!(plain.symbol(), "hotserve_entry");

        let qualified: EntryPointId = "hello_app:make_app".parse().unwrap();
        assert_eq!(qualified.library(), Some("hello_app"));
        assert_eq!(qualified.symbol(), "make_app");
        assert_eq!(qualified.to_string(), "hello_app:make_app");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("".parse::<EntryPointId>().is_err());
        assert!("app:".parse::<EntryPointId>().is_err());
        assert!(":entry".parse::<EntryPointId>().is_err());
        assert!("1entry".parse::<EntryPointId>().is_err());
        assert!("dir/app:entry".parse::<EntryPointId>().is_err());
        assert!("com.example.Main".parse::<EntryPointId>().is_err());
    }

    #[test]
    fn config_library_only_fills_a_gap() {
        let id: EntryPointId = "entry".parse().unwrap();
        assert_eq!(id.or_library(Some("app")).library(), Some("app"));
        let id: EntryPointId = "mine:entry".parse().unwrap();
        assert_eq!(id.or_library(Some("app")).library(), Some("mine"));
    }
}
