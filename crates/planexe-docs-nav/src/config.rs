//! Site configuration (mkdocs.yml) loading and saving.
//!
//! serde_yaml resolves `!!` (secondary handle) tags itself and silently drops
//! the ones it does not know, which would turn
//! `emoji_index: !!python/name:material.extensions.emoji.twemoji` into
//! `emoji_index: ''`. Non-core `!!` tags are therefore rewritten to a local
//! tag under [`SECONDARY_TAG_PREFIX`] before parsing and restored when
//! writing. On save, top-level entries that were not changed are copied from
//! the source text verbatim, so comments and formatting survive as well.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

/// Local tag prefix standing in for the `!!` handle while loaded.
pub const SECONDARY_TAG_PREFIX: &str = "yaml.org/2002/";

/// `!!` tags serde_yaml understands natively.
const CORE_TAGS: &[&str] = &[
    "binary",
    "bool",
    "float",
    "int",
    "map",
    "merge",
    "null",
    "omap",
    "pairs",
    "seq",
    "set",
    "str",
    "timestamp",
    "value",
];

/// Decides what an unrecognized YAML tag becomes once loaded.
///
/// mkdocs configs routinely carry Python-specific tags such as
/// `!!python/name:material.extensions.emoji.twemoji` or `!ENV SITE_URL`.
/// The loader never fails on them; the strategy chooses their in-memory shape.
/// Entries the build does not modify are written back exactly as loaded
/// whatever the strategy.
pub trait TagStrategy {
    /// Resolve a tagged node whose inner value has already been resolved.
    fn resolve(&self, tagged: TaggedValue) -> Value;
}

/// Keep tags as they are so they are written back on save.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveTags;

impl TagStrategy for PreserveTags {
    fn resolve(&self, tagged: TaggedValue) -> Value {
        Value::Tagged(Box::new(tagged))
    }
}

/// Drop the tag and keep its value as a plain, opaque node.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueScalar;

impl TagStrategy for OpaqueScalar {
    fn resolve(&self, tagged: TaggedValue) -> Value {
        tracing::debug!("Dropping YAML tag {}", display_tag(&tagged.tag));
        tagged.value
    }
}

/// Render a tag the way it is spelled in the file, `!!` handle included.
pub fn display_tag(tag: &Tag) -> String {
    let text = tag.to_string();
    match text.strip_prefix('!').and_then(|t| t.strip_prefix(SECONDARY_TAG_PREFIX)) {
        Some(name) => format!("!!{}", name),
        None => text,
    }
}

/// Errors that can occur when reading or writing the site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Site configuration not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid YAML in {path}: {message}")]
    InvalidYaml { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

/// An mkdocs site configuration held as an ordered YAML tree.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    source: String,
    original: Value,
    root: Value,
}

impl PartialEq for SiteConfig {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl SiteConfig {
    /// Load a configuration file, resolving tags with `tags`.
    pub fn load(path: &Path, tags: &dyn TagStrategy) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let source = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::parse(&source, tags).map_err(|e| match e {
            ConfigError::InvalidYaml { message, .. } => ConfigError::InvalidYaml {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse configuration source text.
    pub fn parse(source: &str, tags: &dyn TagStrategy) -> Result<Self, ConfigError> {
        let root: Value = if source.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            serde_yaml::from_str(&protect_secondary_tags(source)).map_err(|e| {
                ConfigError::InvalidYaml {
                    path: "<string>".to_string(),
                    message: e.to_string(),
                }
            })?
        };

        let root = resolve_tags(root, tags);

        Ok(Self {
            source: source.to_string(),
            original: root.clone(),
            root,
        })
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Mutable access to a top-level key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.root.get_mut(key)
    }

    /// Serialize back to YAML, keeping key order as loaded.
    ///
    /// An unchanged document is returned as it was read. Otherwise unchanged
    /// top-level entries keep their source text and changed ones are
    /// re-emitted; documents whose top level cannot be split line by line
    /// are re-emitted whole.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        if self.root == self.original {
            return Ok(self.source.clone());
        }

        match self.splice() {
            Some(yaml) => Ok(yaml),
            None => emit(&self.root),
        }
    }

    /// Write the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml_string()?;
        fs::write(path, yaml).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Rebuild the document from source blocks, re-emitting changed entries.
    fn splice(&self) -> Option<String> {
        let (Value::Mapping(root), Value::Mapping(original)) = (&self.root, &self.original) else {
            return None;
        };

        let (preamble, blocks) = split_top_level(&self.source)?;

        let block_keys: Vec<&str> = blocks.iter().map(|(k, _)| k.as_str()).collect();
        let original_keys: Vec<&str> = original
            .keys()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>()?;
        if block_keys != original_keys {
            return None;
        }

        let texts: HashMap<&str, &str> = blocks
            .iter()
            .map(|(k, text)| (k.as_str(), text.as_str()))
            .collect();

        let mut out = preamble;
        for (key, value) in root {
            let name = key.as_str()?;
            let text = match texts.get(name) {
                Some(text) if original.get(key) == Some(value) => text.to_string(),
                _ => {
                    let mut entry = Mapping::new();
                    entry.insert(key.clone(), value.clone());
                    emit(&Value::Mapping(entry)).ok()?
                }
            };
            push_line_block(&mut out, &text);
        }

        Some(out)
    }
}

fn push_line_block(out: &mut String, text: &str) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(text);
}

fn emit(value: &Value) -> Result<String, ConfigError> {
    let yaml = serde_yaml::to_string(value).map_err(|e| ConfigError::Write {
        path: "<string>".to_string(),
        message: e.to_string(),
    })?;
    Ok(restore_secondary_tags(&yaml))
}

fn secondary_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(^|[\s\[\{,])!!([^\s,\[\]\{\}]+)").expect("valid secondary tag regex")
    })
}

fn protected_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?m)!{}([^\s,\[\]\{{\}}]+)(?: (?:null|~|''))?$|!{}([^\s,\[\]\{{\}}]+)",
            regex::escape(SECONDARY_TAG_PREFIX),
            regex::escape(SECONDARY_TAG_PREFIX)
        );
        Regex::new(&pattern).expect("valid protected tag regex")
    })
}

/// Rewrite non-core `!!name` tags to `!<prefix>name`.
fn protect_secondary_tags(source: &str) -> String {
    secondary_tag_re()
        .replace_all(source, |caps: &Captures| {
            let name = &caps[2];
            if CORE_TAGS.contains(&name) {
                caps[0].to_string()
            } else {
                format!("{}!{}{}", &caps[1], SECONDARY_TAG_PREFIX, name)
            }
        })
        .into_owned()
}

/// Undo [`protect_secondary_tags`] on emitted YAML.
///
/// An empty value after the tag (`null`, `~`, `''`) is dropped, matching the
/// bare `!!python/name:...` form Python YAML loaders expect.
fn restore_secondary_tags(yaml: &str) -> String {
    protected_tag_re()
        .replace_all(yaml, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            format!("!!{}", name)
        })
        .into_owned()
}

/// Split a block-style document into its preamble and top-level entries.
///
/// Returns `None` when a column-0 line cannot be read as a plain key, e.g.
/// flow mappings or multiple documents.
fn split_top_level(source: &str) -> Option<(String, Vec<(String, String)>)> {
    let mut preamble = String::new();
    let mut blocks: Vec<(String, String)> = Vec::new();

    for line in source.split_inclusive('\n') {
        let continues = line.trim().is_empty()
            || line.starts_with([' ', '\t', '#'])
            || (line.starts_with('-') && !line.starts_with("---"));

        if continues {
            match blocks.last_mut() {
                Some((_, text)) => text.push_str(line),
                None => preamble.push_str(line),
            }
            continue;
        }

        if line.starts_with("---") && blocks.is_empty() {
            preamble.push_str(line);
            continue;
        }

        let key = top_level_key(line)?;
        blocks.push((key, line.to_string()));
    }

    Some((preamble, blocks))
}

fn top_level_key(line: &str) -> Option<String> {
    let line = line.trim_end();

    if let Some(quote) = line.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let rest = &line[1..];
        let end = rest.find(quote)?;
        let key = &rest[..end];
        if key.contains('\\') || !rest[end + 1..].starts_with(':') {
            return None;
        }
        return Some(key.to_string());
    }

    if line.starts_with(['{', '[', '?', '&', '*', '!', '|', '>', '%', '@', '`']) {
        return None;
    }

    let colon = line
        .match_indices(':')
        .map(|(i, _)| i)
        .find(|&i| line[i + 1..].is_empty() || line[i + 1..].starts_with(' '))?;
    Some(line[..colon].trim_end().to_string())
}

/// Walk the tree bottom-up, handing every tagged node to the strategy.
fn resolve_tags(value: Value, tags: &dyn TagStrategy) -> Value {
    match value {
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| resolve_tags(item, tags))
                .collect(),
        ),
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(k, v)| (resolve_tags(k, tags), resolve_tags(v, tags)))
                .collect(),
        ),
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            tags.resolve(TaggedValue {
                tag,
                value: resolve_tags(value, tags),
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const MKDOCS: &str = r#"site_name: PlanExe
site_url: !ENV SITE_URL
theme:
  name: material
markdown_extensions:
  - pymdownx.emoji:
      emoji_index: !!python/name:material.extensions.emoji.twemoji
nav:
  - Home: index.md
"#;

    const TWEMOJI: &str = "!!python/name:material.extensions.emoji.twemoji";

    /// The site configuration shipped at the workspace root.
    const REPO_MKDOCS: &str = include_str!("../../../mkdocs.yml");

    fn emoji_index(config: &SiteConfig) -> &Value {
        &config.get("markdown_extensions").unwrap()[0]["pymdownx.emoji"]["emoji_index"]
    }

    #[test]
    fn loads_config_with_unknown_tags() {
        let config = SiteConfig::parse(MKDOCS, &PreserveTags).unwrap();

        assert_eq!(config.get("site_name"), Some(&Value::from("PlanExe")));
        assert!(config.get("markdown_extensions").is_some());
        assert!(config.get("nav").is_some());
    }

    #[test]
    fn secondary_tags_reach_the_strategy() {
        let config = SiteConfig::parse(MKDOCS, &PreserveTags).unwrap();

        match emoji_index(&config) {
            Value::Tagged(tagged) => assert_eq!(display_tag(&tagged.tag), TWEMOJI),
            other => panic!("expected tagged emoji_index, got {:?}", other),
        }
    }

    #[test]
    fn core_secondary_tags_are_resolved_normally() {
        let config = SiteConfig::parse("port: !!str 8000\n", &PreserveTags).unwrap();

        assert_eq!(config.get("port"), Some(&Value::from("8000")));
    }

    #[test]
    fn repo_config_survives_unchanged_save() {
        for tags in [&PreserveTags as &dyn TagStrategy, &OpaqueScalar] {
            let config = SiteConfig::parse(REPO_MKDOCS, tags).unwrap();

            let yaml = config.to_yaml_string().unwrap();

            assert_eq!(yaml, REPO_MKDOCS);
            assert!(yaml.contains(TWEMOJI));
        }
    }

    #[test]
    fn editing_nav_keeps_secondary_tags_in_other_entries() {
        for tags in [&PreserveTags as &dyn TagStrategy, &OpaqueScalar] {
            let mut config = SiteConfig::parse(REPO_MKDOCS, tags).unwrap();
            if let Some(Value::Sequence(nav)) = config.get_mut("nav") {
                nav.push(Value::from("extra.md"));
            }

            let yaml = config.to_yaml_string().unwrap();

            assert!(yaml.contains(TWEMOJI));
            assert!(yaml.contains("!!python/name:material.extensions.emoji.to_svg"));
            assert!(yaml.contains("extra.md"));
            assert!(yaml.starts_with("site_name: PlanExe\n"));
        }
    }

    #[test]
    fn re_emitted_entries_restore_secondary_tags() {
        let source = "{site_name: PlanExe, emoji: !!python/name:pkg.twemoji '', nav: []}\n";
        let mut config = SiteConfig::parse(source, &PreserveTags).unwrap();
        config.get_mut("nav").unwrap().as_sequence_mut().unwrap().push(Value::from("a.md"));

        let yaml = config.to_yaml_string().unwrap();

        assert!(yaml.contains("!!python/name:pkg.twemoji"));
        assert!(!yaml.contains(SECONDARY_TAG_PREFIX));
        let reloaded = SiteConfig::parse(&yaml, &PreserveTags).unwrap();
        match reloaded.get("emoji") {
            Some(Value::Tagged(tagged)) => {
                assert_eq!(display_tag(&tagged.tag), "!!python/name:pkg.twemoji")
            }
            other => panic!("expected tagged emoji, got {:?}", other),
        }
        assert_eq!(reloaded.get("nav"), config.get("nav"));
    }

    #[test]
    fn preserve_keeps_local_tags_through_save() {
        let mut config = SiteConfig::parse(MKDOCS, &PreserveTags).unwrap();
        if let Some(Value::Mapping(theme)) = config.get_mut("theme") {
            theme.insert(Value::from("language"), Value::from("en"));
        }
        let yaml = config.to_yaml_string().unwrap();
        let reloaded = SiteConfig::parse(&yaml, &PreserveTags).unwrap();

        match reloaded.get("site_url") {
            Some(Value::Tagged(tagged)) => {
                assert_eq!(tagged.tag, Tag::new("ENV"));
                assert_eq!(tagged.value, Value::from("SITE_URL"));
            }
            other => panic!("expected tagged site_url, got {:?}", other),
        }
    }

    #[test]
    fn opaque_scalar_drops_tags() {
        let config = SiteConfig::parse(MKDOCS, &OpaqueScalar).unwrap();

        assert_eq!(config.get("site_url"), Some(&Value::from("SITE_URL")));
        assert!(!matches!(emoji_index(&config), Value::Tagged(_)));
    }

    #[test]
    fn keeps_key_order_on_save() {
        let source = "site_name: Docs\nzeta: 1\nalpha: 2\nnav: []\n";
        let mut config = SiteConfig::parse(source, &PreserveTags).unwrap();
        config.get_mut("nav").unwrap().as_sequence_mut().unwrap().push(Value::from("a.md"));
        let yaml = config.to_yaml_string().unwrap();

        let keys: Vec<&str> = yaml
            .lines()
            .filter(|l| !l.starts_with([' ', '-']))
            .filter_map(|l| l.split(':').next())
            .collect();
        assert_eq!(keys, vec!["site_name", "zeta", "alpha", "nav"]);
    }

    #[test]
    fn splits_top_level_entries() {
        let source = "# comment\nsite_name: Docs\nnav:\n- Home: index.md\n  # note\n\"odd key\": 1\n";

        let (preamble, blocks) = split_top_level(source).unwrap();

        assert_eq!(preamble, "# comment\n");
        assert_eq!(
            blocks,
            vec![
                ("site_name".to_string(), "site_name: Docs\n".to_string()),
                (
                    "nav".to_string(),
                    "nav:\n- Home: index.md\n  # note\n".to_string()
                ),
                ("odd key".to_string(), "\"odd key\": 1\n".to_string()),
            ]
        );
        assert!(split_top_level("{a: 1}\n").is_none());
    }

    #[test]
    fn errors_on_missing_file() {
        let temp = tempdir().unwrap();

        let result = SiteConfig::load(&temp.path().join("mkdocs.yml"), &PreserveTags);

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let result = SiteConfig::parse("nav: [unclosed", &PreserveTags);

        assert!(matches!(result, Err(ConfigError::InvalidYaml { .. })));
    }

    #[test]
    fn round_trips_through_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mkdocs.yml");
        fs::write(&path, MKDOCS).unwrap();

        let config = SiteConfig::load(&path, &PreserveTags).unwrap();
        config.save(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), MKDOCS);
    }
}
