//! Configuration sections.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use skein_graph::{LoaderSpec, ModuleResolver, NoParseSet, Pattern, PatternSet, Rule, RuleSet};

use crate::error::{ConfigError, Result};

/// A value that may be written either alone or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

/// Output location and naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Output directory, relative to the config file's directory
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Bundle filename template (`[name]`, `[contenthash]`)
    #[serde(default = "default_output_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_output_filename(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("dist")
}

fn default_output_filename() -> String {
    "[name].js".to_string()
}

/// One item of a rule's `use` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UseEntry {
    /// `"loader"` or `"loader?query"`
    Shorthand(String),
    Full {
        loader: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        options: Map<String, Value>,
    },
}

impl UseEntry {
    pub fn to_spec(&self) -> skein_graph::Result<LoaderSpec> {
        match self {
            UseEntry::Shorthand(raw) => LoaderSpec::parse(raw),
            UseEntry::Full { loader, options } => {
                let mut spec = LoaderSpec::parse(loader)?;
                spec.options
                    .extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(spec)
            }
        }
    }
}

/// A rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub test: String,

    #[serde(default, skip_serializing_if = "OneOrMany::is_empty")]
    pub exclude: OneOrMany<String>,

    #[serde(default, rename = "use", skip_serializing_if = "OneOrMany::is_empty")]
    pub use_: OneOrMany<UseEntry>,

    /// Single-loader form, used when `use` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,

    /// Options for the single-loader form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl RuleConfig {
    /// Loader specs in declaration order.
    pub fn loader_specs(&self) -> skein_graph::Result<Vec<LoaderSpec>> {
        if !self.use_.is_empty() {
            return self.use_.iter().map(UseEntry::to_spec).collect();
        }

        match &self.loader {
            Some(loader) => {
                let entry = UseEntry::Full {
                    loader: loader.clone(),
                    options: self.options.clone().unwrap_or_default(),
                };
                Ok(vec![entry.to_spec()?])
            }
            None => Ok(Vec::new()),
        }
    }

    /// Compile into a graph rule. `index` names the rule in errors.
    pub fn to_rule(&self, index: usize) -> Result<Rule> {
        let invalid = |e: skein_graph::Error| ConfigError::InvalidRule {
            index,
            message: e.to_string(),
        };

        let test = Pattern::new(&self.test).map_err(invalid)?;
        let exclude = PatternSet::compile(self.exclude.iter().cloned()).map_err(invalid)?;
        let loaders = self.loader_specs().map_err(invalid)?;

        Ok(Rule::new(test).exclude(exclude).loaders(loaders))
    }
}

/// `module` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Modules used as-is, never scanned for imports
    #[serde(default, skip_serializing_if = "OneOrMany::is_empty")]
    pub no_parse: OneOrMany<String>,
}

impl ModuleConfig {
    pub fn rule_set(&self) -> Result<RuleSet> {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| rule.to_rule(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(RuleSet::new(rules))
    }

    pub fn no_parse_set(&self) -> Result<NoParseSet> {
        PatternSet::compile(self.no_parse.iter().cloned()).map_err(|e| ConfigError::InvalidValue {
            field: "module.noParse".to_string(),
            hint: Some(e.to_string()),
        })
    }
}

/// `resolve` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directories searched for bare specifiers
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            modules: default_modules(),
        }
    }
}

impl ResolveConfig {
    pub fn to_resolver(&self) -> ModuleResolver {
        ModuleResolver::new()
            .with_extensions(self.extensions.iter())
            .with_module_dirs(self.modules.iter())
    }
}

fn default_extensions() -> Vec<String> {
    skein_graph::resolver::DEFAULT_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_modules() -> Vec<String> {
    skein_graph::resolver::DEFAULT_MODULE_DIRS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// An external command registered as a loader.
///
/// The command receives the stage input on stdin and must write the stage
/// output to stdout. `{path}` in `args` expands to the resource path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLoaderConfig {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Working directory, relative to the build context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_accepts_webpack_shapes() {
        let rules: Vec<RuleConfig> = serde_json::from_value(json!([
            {
                "test": "\\.elm$",
                "exclude": ["elm-stuff", "node_modules"],
                "use": { "loader": "elm-webpack-loader", "options": { "cwd": "src" } }
            },
            {
                "test": "\\.s[ca]ss$",
                "exclude": "node_modules",
                "use": ["style-loader", "css-loader", "sass-loader"]
            },
            {
                "test": "\\.html$",
                "exclude": "node_modules",
                "loader": "file-loader?name=[name].[ext]"
            }
        ]))
        .unwrap();

        let elm = rules[0].loader_specs().unwrap();
        assert_eq!(elm[0].identifier, "elm-webpack-loader");
        assert_eq!(elm[0].options["cwd"], json!("src"));
        assert_eq!(rules[0].exclude.len(), 2);

        let sass: Vec<_> = rules[1]
            .loader_specs()
            .unwrap()
            .into_iter()
            .map(|s| s.identifier)
            .collect();
        assert_eq!(sass, vec!["style-loader", "css-loader", "sass-loader"]);
        assert_eq!(rules[1].exclude.as_slice(), ["node_modules".to_string()]);

        let html = rules[2].loader_specs().unwrap();
        assert_eq!(html[0].identifier, "file-loader");
        assert_eq!(html[0].options["name"], json!("[name].[ext]"));
    }

    #[test]
    fn full_entry_options_override_query() {
        let entry = UseEntry::Full {
            loader: "file?name=a".to_string(),
            options: serde_json::from_value(json!({ "name": "b" })).unwrap(),
        };
        assert_eq!(entry.to_spec().unwrap().options["name"], json!("b"));
    }

    #[test]
    fn invalid_rule_names_index() {
        let rule = RuleConfig {
            test: "(".to_string(),
            exclude: OneOrMany::default(),
            use_: OneOrMany::default(),
            loader: None,
            options: None,
        };
        let err = rule.to_rule(3).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { index: 3, .. }));
    }
}
