//! Reading policy documents and request contexts from disk.
//!
//! `.json` files go through serde_json; anything else is read as YAML (a
//! superset of JSON, so a JSON file with another extension still loads).

use std::path::Path;

use anyhow::{Context, Result};
use policy_dsl::{DslPolicyContext, DslPolicyDocument};
use serde::de::DeserializeOwned;
use tracing::{Level, debug, instrument};

/// Path meaning "read from stdin".
pub const STDIN: &str = "-";

#[instrument(level = Level::TRACE)]
pub fn load_document(path: &Path) -> Result<DslPolicyDocument> {
    let doc: DslPolicyDocument = read_structured(path)
        .with_context(|| format!("failed to load policy document {}", path.display()))?;
    debug!(name = %doc.name, version = %doc.version, rules = doc.rules.len(), "loaded policy");
    Ok(doc)
}

/// Load a context; [`STDIN`] reads JSON from standard input.
#[instrument(level = Level::TRACE)]
pub fn load_context(path: &Path) -> Result<DslPolicyContext> {
    if path.as_os_str() == STDIN {
        return serde_json::from_reader(std::io::stdin().lock())
            .context("failed to parse context JSON from stdin");
    }
    read_structured(path).with_context(|| format!("failed to load context {}", path.display()))
}

fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    parse_structured(&text, is_json(path))
}

fn parse_structured<T: DeserializeOwned>(text: &str, json: bool) -> Result<T> {
    if json {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn file(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn yaml_document() {
        let f = file(
            ".yaml",
            "version: '1'\nname: p\ndefaultAction: {type: deny}\nrules:\n  - id: r\n    name: R\n    conditions: \"action == 'read'\"\n    action: {type: allow}\n",
        );
        let doc = load_document(f.path()).unwrap();
        assert_eq!(doc.name, "p");
        assert_eq!(doc.rules[0].conditions.len(), 1);
    }

    #[test]
    fn json_context() {
        let f = file(
            ".JSON",
            r#"{"actor": {"id": "a", "type": "user"}, "action": "read", "resource": {"type": "doc"}}"#,
        );
        let ctx = load_context(f.path()).unwrap();
        assert_eq!(ctx.action, "read");
    }

    #[test]
    fn errors_name_the_file() {
        let f = file(".yml", "version: [unclosed");
        let err = load_document(f.path()).unwrap_err();
        assert!(err.to_string().contains(&f.path().display().to_string()));

        let err = load_document(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read"));
    }

    #[test]
    fn bad_dsl_condition_fails_the_load() {
        let f = file(
            ".yaml",
            "version: '1'\nname: p\ndefaultAction: {type: deny}\nrules:\n  - id: r\n    name: R\n    conditions: \"action = 'read'\"\n    action: {type: allow}\n",
        );
        let err = load_document(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid condition"));
    }
}
