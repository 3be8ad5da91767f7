//! Loader specifications as they appear in rule declarations.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Opaque loader options. Never interpreted by the composer.
pub type LoaderOptions = Map<String, Value>;

/// Identifies an external transform and the options it is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSpec {
    pub identifier: String,
    pub options: LoaderOptions,
}

impl LoaderSpec {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            options: LoaderOptions::new(),
        }
    }

    pub fn with_options(identifier: impl Into<String>, options: LoaderOptions) -> Self {
        Self {
            identifier: identifier.into(),
            options,
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Parse the string shorthand `identifier?query`.
    ///
    /// The query is either a JSON object (`css?{"modules":true}`) or
    /// `key=value` pairs separated by `&`. A key without `=` is `true`.
    ///
    /// ```
    /// use skein_graph::LoaderSpec;
    ///
    /// let spec = LoaderSpec::parse("file-loader?name=[name].[ext]").unwrap();
    /// assert_eq!(spec.identifier, "file-loader");
    /// assert_eq!(spec.options["name"], "[name].[ext]");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (identifier, query) = match raw.split_once('?') {
            Some((identifier, query)) => (identifier.trim(), Some(query)),
            None => (raw, None),
        };

        if identifier.is_empty() {
            return Err(Error::InvalidLoaderSpec {
                spec: raw.to_string(),
                reason: "loader identifier is empty".to_string(),
            });
        }

        let options = match query {
            None => LoaderOptions::new(),
            Some(query) => parse_query(raw, query)?,
        };

        Ok(Self::with_options(identifier, options))
    }

    /// Registry key for this loader: the identifier without a `-loader` suffix.
    pub fn key(&self) -> &str {
        loader_key(&self.identifier)
    }
}

pub(crate) fn loader_key(identifier: &str) -> &str {
    identifier.strip_suffix("-loader").unwrap_or(identifier)
}

fn parse_query(raw: &str, query: &str) -> Result<LoaderOptions> {
    let query = query.trim();
    if query.starts_with('{') {
        return match serde_json::from_str::<Value>(query) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::InvalidLoaderSpec {
                spec: raw.to_string(),
                reason: "query must be a JSON object".to_string(),
            }),
            Err(e) => Err(Error::InvalidLoaderSpec {
                spec: raw.to_string(),
                reason: e.to_string(),
            }),
        };
    }

    let mut options = LoaderOptions::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) => {
                options.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => {
                options.insert(pair.to_string(), Value::Bool(true));
            }
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_identifier() {
        let spec = LoaderSpec::parse("sass-loader").unwrap();
        assert_eq!(spec.identifier, "sass-loader");
        assert_eq!(spec.key(), "sass");
        assert!(spec.options.is_empty());
    }

    #[test]
    fn key_value_query() {
        let spec = LoaderSpec::parse("file-loader?name=[name].[ext]&emit").unwrap();
        assert_eq!(spec.key(), "file");
        assert_eq!(spec.options["name"], json!("[name].[ext]"));
        assert_eq!(spec.options["emit"], json!(true));
    }

    #[test]
    fn json_query() {
        let spec = LoaderSpec::parse(r#"css?{"modules":true,"depth":2}"#).unwrap();
        assert_eq!(spec.options["modules"], json!(true));
        assert_eq!(spec.options["depth"], json!(2));
    }

    #[test]
    fn rejects_empty_identifier_and_bad_json() {
        assert!(LoaderSpec::parse("?name=x").is_err());
        assert!(LoaderSpec::parse("css?{oops").is_err());
        assert!(LoaderSpec::parse("css?[1,2]").is_err());
    }
}
