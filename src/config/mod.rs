//
//  bugz-cli
//  config/mod.rs
//

//! Layered configuration store.
//!
//! Configuration lives in INI-style files (TOML syntax) organized into named
//! sections: a `[default]` section carrying fallback values plus the name of
//! the active connection, and one `[<connection>]` section per Bugzilla
//! instance. Files are merged in a fixed precedence order:
//!
//! 1. packaged defaults (`/usr/share/bugz/bugzrc`),
//! 2. the system override directory (`/etc/bugz.d/*.bugzrc`, sorted),
//! 3. the user's own file (`~/.bugzrc`, or the `--config` path).
//!
//! Later files override earlier ones key-by-key within the same section.
//! Missing files are skipped silently, except a file the user explicitly
//! requested with `--config`, whose absence is fatal. Any parse failure is
//! fatal and names the offending file; nothing network-related can happen
//! with a broken configuration.
//!
//! ## Example
//!
//! ```toml
//! [default]
//! connection = "gentoo"
//!
//! [gentoo]
//! base = "https://bugs.gentoo.org/xmlrpc.cgi"
//! user = "liquidx@gentoo.org"
//! columns = 120
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::{BugzError, Result};

/// User configuration file name, looked up in the home directory.
pub const USER_CONFIG_FILE: &str = ".bugzrc";

/// Packaged default configuration shipped with the distribution.
pub const PACKAGED_CONFIG_FILE: &str = "/usr/share/bugz/bugzrc";

/// Directory for system-wide override snippets.
pub const SYSTEM_CONFIG_DIR: &str = "/etc/bugz.d";

/// A queryable, section-scoped key/value store built from the merged
/// configuration files.
///
/// Typed getters distinguish "key absent" (`Ok(None)`) from "key present but
/// empty or of the wrong type" (`Err`), and transparently fall back to the
/// `[default]` section for keys the requested section does not define.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    sections: BTreeMap<String, toml::Table>,
}

impl ConfigStore {
    /// Loads and merges the standard file set.
    ///
    /// `user_file` is the `--config` override; when given, the file must
    /// exist. Without it, `~/.bugzrc` is used if present.
    pub fn load(user_file: Option<&Path>) -> Result<Self> {
        let mut store = Self::default();
        for (path, required) in Self::sources(user_file) {
            match std::fs::read_to_string(&path) {
                Ok(text) => store.merge_text(&path.display().to_string(), &text)?,
                Err(_) if !required => continue,
                Err(e) => {
                    return Err(BugzError::config(format!(
                        "Can't read configuration file {}: {e}",
                        path.display()
                    )));
                }
            }
        }
        Ok(store)
    }

    /// The ordered file list, lowest precedence first.
    fn sources(user_file: Option<&Path>) -> Vec<(PathBuf, bool)> {
        let mut sources = vec![(PathBuf::from(PACKAGED_CONFIG_FILE), false)];

        if let Ok(entries) = std::fs::read_dir(SYSTEM_CONFIG_DIR) {
            let mut overrides: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "bugzrc"))
                .collect();
            overrides.sort();
            sources.extend(overrides.into_iter().map(|p| (p, false)));
        }

        match user_file {
            Some(path) => sources.push((path.to_path_buf(), true)),
            None => {
                if let Some(dirs) = BaseDirs::new() {
                    sources.push((dirs.home_dir().join(USER_CONFIG_FILE), false));
                }
            }
        }
        sources
    }

    /// Merges one file's contents into the store; `origin` names the file in
    /// error messages.
    ///
    /// Every top-level entry must be a section table. Duplicate sections or
    /// options within one file, and malformed headers, are parse errors.
    pub fn merge_text(&mut self, origin: &str, text: &str) -> Result<()> {
        let table: toml::Table = text.parse().map_err(|e| {
            BugzError::config(format!("Can't parse configuration file {origin}: {e}"))
        })?;

        for (name, value) in table {
            let toml::Value::Table(options) = value else {
                return Err(BugzError::config(format!(
                    "Can't parse configuration file {origin}: \
                     option {name:?} appears outside of a section"
                )));
            };
            let section = self.sections.entry(name).or_default();
            for (key, option) in options {
                section.insert(key, option);
            }
        }
        Ok(())
    }

    /// Names of all configured sections, `[default]` included.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Names of the connection sections (everything except `[default]`).
    pub fn connections(&self) -> Vec<String> {
        self.sections
            .keys()
            .filter(|name| *name != "default")
            .cloned()
            .collect()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Whether `key` is set in `section` itself (no `[default]` fallback).
    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|s| s.contains_key(key))
    }

    /// Section lookup with `[default]` fallback.
    fn find(&self, section: &str, key: &str) -> Option<&toml::Value> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.sections.get("default").and_then(|s| s.get(key)))
    }

    fn wrong_format(section: &str, key: &str, expected: &str) -> BugzError {
        BugzError::config(format!(
            "option {key:?} in section [{section}] is not in the right format: \
             expected {expected}"
        ))
    }

    /// String getter. An empty string counts as "present but not set" and is
    /// an error, mirroring the original client's behavior.
    pub fn get_str(&self, section: &str, key: &str) -> Result<Option<String>> {
        match self.find(section, key) {
            None => Ok(None),
            Some(toml::Value::String(s)) if s.is_empty() => Err(BugzError::config(format!(
                "option {key:?} in section [{section}] is not set"
            ))),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(Self::wrong_format(section, key, "a string")),
        }
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>> {
        match self.find(section, key) {
            None => Ok(None),
            Some(toml::Value::Integer(v)) => Ok(Some(*v)),
            Some(_) => Err(Self::wrong_format(section, key, "an integer")),
        }
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.find(section, key) {
            None => Ok(None),
            Some(toml::Value::Boolean(v)) => Ok(Some(*v)),
            Some(_) => Err(Self::wrong_format(section, key, "a boolean")),
        }
    }

    /// List getter for keys like `search_statuses`: accepts either an array
    /// of strings or one string split on commas and whitespace.
    pub fn get_str_list(&self, section: &str, key: &str) -> Result<Option<Vec<String>>> {
        match self.find(section, key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            Some(toml::Value::Array(items)) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        toml::Value::String(s) => list.push(s.clone()),
                        _ => {
                            return Err(Self::wrong_format(
                                section,
                                key,
                                "a list of strings",
                            ));
                        }
                    }
                }
                Ok(Some(list))
            }
            Some(_) => Err(Self::wrong_format(section, key, "a list of strings")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store(text: &str) -> ConfigStore {
        let mut store = ConfigStore::default();
        store.merge_text("test", text).unwrap();
        store
    }

    #[test]
    fn test_sections_and_options() {
        let store = store(
            r#"
            [default]
            connection = "gentoo"

            [gentoo]
            base = "https://bugs.gentoo.org/xmlrpc.cgi"
            columns = 120
            quiet = true
            "#,
        );
        assert!(store.has_section("gentoo"));
        assert!(store.has_option("gentoo", "base"));
        assert!(!store.has_option("gentoo", "connection"));
        assert_eq!(store.connections(), vec!["gentoo".to_string()]);
        assert_eq!(
            store.get_str("gentoo", "base").unwrap().as_deref(),
            Some("https://bugs.gentoo.org/xmlrpc.cgi")
        );
        assert_eq!(store.get_int("gentoo", "columns").unwrap(), Some(120));
        assert_eq!(store.get_bool("gentoo", "quiet").unwrap(), Some(true));
    }

    #[test]
    fn test_default_section_fallback() {
        let store = store(
            r#"
            [default]
            user = "fallback@example.com"

            [gentoo]
            base = "https://example/xmlrpc.cgi"
            "#,
        );
        assert_eq!(
            store.get_str("gentoo", "user").unwrap().as_deref(),
            Some("fallback@example.com")
        );
    }

    #[test]
    fn test_later_files_override_earlier_ones() {
        let mut store = store(
            r#"
            [gentoo]
            base = "https://old.example/xmlrpc.cgi"
            user = "keep@example.com"
            "#,
        );
        store
            .merge_text(
                "override",
                r#"
                [gentoo]
                base = "https://new.example/xmlrpc.cgi"
                "#,
            )
            .unwrap();
        assert_eq!(
            store.get_str("gentoo", "base").unwrap().as_deref(),
            Some("https://new.example/xmlrpc.cgi")
        );
        assert_eq!(
            store.get_str("gentoo", "user").unwrap().as_deref(),
            Some("keep@example.com")
        );
    }

    #[test]
    fn test_typed_getter_errors() {
        let store = store(
            r#"
            [gentoo]
            base = ""
            columns = "wide"
            "#,
        );
        // Present but empty is an error, not "absent".
        assert!(matches!(
            store.get_str("gentoo", "base"),
            Err(BugzError::Config(_))
        ));
        assert!(matches!(
            store.get_int("gentoo", "columns"),
            Err(BugzError::Config(_))
        ));
        // Absent is not an error.
        assert_eq!(store.get_str("gentoo", "user").unwrap(), None);
    }

    #[test]
    fn test_search_statuses_string_and_array_forms() {
        let store = store(
            r#"
            [a]
            search_statuses = "NEW, ASSIGNED REOPENED"

            [b]
            search_statuses = ["CONFIRMED", "IN_PROGRESS"]
            "#,
        );
        assert_eq!(
            store.get_str_list("a", "search_statuses").unwrap().unwrap(),
            vec!["NEW", "ASSIGNED", "REOPENED"]
        );
        assert_eq!(
            store.get_str_list("b", "search_statuses").unwrap().unwrap(),
            vec!["CONFIRMED", "IN_PROGRESS"]
        );
    }

    #[test]
    fn test_parse_failure_names_the_file() {
        let mut store = ConfigStore::default();
        let err = store
            .merge_text("/home/me/.bugzrc", "[broken\nbase=")
            .unwrap_err();
        assert!(err.to_string().contains("/home/me/.bugzrc"));
    }

    #[test]
    fn test_option_outside_section_is_fatal() {
        let mut store = ConfigStore::default();
        let err = store
            .merge_text("test", "connection = \"gentoo\"")
            .unwrap_err();
        assert!(matches!(err, BugzError::Config(_)));
    }

    #[test]
    fn test_explicit_missing_user_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bugzrc");
        let err = ConfigStore::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, BugzError::Config(_)));
    }

    #[test]
    fn test_explicit_user_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.bugzrc");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[gentoo]\nbase = \"https://example/xmlrpc.cgi\"").unwrap();

        let store = ConfigStore::load(Some(&path)).unwrap();
        assert!(store.has_option("gentoo", "base"));
    }
}
