//! Placeholder substitution over [MergedValues]
//!
//! The resolver walks the merged lines once, front to back. Lines with a placeholder are
//! rewritten in place. Lines swallowed by an `ssm-path-prefix` block are only marked as
//! deleted so indices stay stable while scanning. They are dropped when the result is written.
use crate::placeholder::{self, Kind};
use crate::store::{Connector, ParameterStore, StoreError};
use crate::values::{MergedValues, Source};
use std::collections::BTreeMap;

/// Parameters below a path, keyed relative to that path
pub type Mapping = BTreeMap<String, String>;

pub struct Resolver<'c> {
    /// Created on first use through `connect`, then kept for the rest of the run
    store: Option<Box<dyn ParameterStore>>,
    connect: Connector<'c>,
}

impl<'c> Resolver<'c> {
    pub fn new(connect: Connector<'c>) -> Self {
        Self {
            store: None,
            connect,
        }
    }

    /// Substitutes every placeholder in `values`
    ///
    /// Fails on the first malformed placeholder or store error. Nothing is returned in that case.
    pub fn resolve(&mut self, values: &MergedValues) -> Result<Resolved, ResolveError> {
        let mut lines: Vec<Option<String>> = values
            .lines()
            .map(|(_, _, line)| Some(line.to_string()))
            .collect();
        let mut changed = false;

        let mut index = 0;
        while index < values.len() {
            let (_, source, line) = values.get_line(index);

            let Some(token) = placeholder::find(line) else {
                index += 1;
                continue;
            };

            let Some(argument) = token.argument(line) else {
                return Err(ResolveError::format(source, line, FormatIssue::MissingArgument));
            };

            tracing::debug!(index, kind = %token.kind, argument, "placeholder found");

            let (value, consumed) = match token.kind {
                Kind::Single => (self.parameter(argument)?, 0),
                Kind::PathTree => {
                    let mapping = self.mapping(Kind::PathTree, argument)?;
                    (encode(argument, &mapping)?, 0)
                }
                Kind::PathPrefixList => {
                    let block = ExpansionBlock::scan(values, index, argument)?;
                    let mut mappings = Vec::with_capacity(block.paths.len());
                    for path in &block.paths {
                        mappings.push(self.mapping(Kind::PathPrefixList, path)?);
                    }
                    (encode(argument, &mappings)?, block.consumed)
                }
            };

            lines[index] = Some(placeholder::replace_token(line, &token, &value));
            for deleted in &mut lines[index + 1..=index + consumed] {
                *deleted = None;
            }

            changed = true;
            index += 1 + consumed;
        }

        Ok(Resolved { lines, changed })
    }

    fn store(&mut self) -> Result<&dyn ParameterStore, StoreError> {
        let store = match self.store.take() {
            Some(store) => store,
            None => {
                tracing::debug!("opening parameter store connection");
                (self.connect)()?
            }
        };

        Ok(&**self.store.insert(store))
    }

    fn parameter(&mut self, name: &str) -> Result<String, ResolveError> {
        self.store()
            .and_then(|store| store.get_parameter(name))
            .map_err(|source| ResolveError::Resolution {
                kind: Kind::Single,
                key: name.to_string(),
                source,
            })
    }

    fn mapping(&mut self, kind: Kind, path: &str) -> Result<Mapping, ResolveError> {
        let parameters = self
            .store()
            .and_then(|store| store.get_parameters_by_path(path))
            .map_err(|source| ResolveError::Resolution {
                kind,
                key: path.to_string(),
                source,
            })?;

        Ok(parameters
            .into_iter()
            .map(|parameter| (relative_key(&parameter.name, path).to_string(), parameter.value))
            .collect())
    }
}

/// `name` without the leading `path` and its separator
fn relative_key<'n>(name: &'n str, path: &str) -> &'n str {
    name.strip_prefix(path)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(name)
}

fn encode(path: &str, value: &impl serde::Serialize) -> Result<String, ResolveError> {
    serde_json::to_string(value).map_err(|source| ResolveError::Serialization {
        path: path.to_string(),
        source,
    })
}

/// The lines following an `ssm-path-prefix` placeholder, up to and including `{{end}}`
#[derive(Debug, PartialEq)]
struct ExpansionBlock {
    /// prefix + suffix of every list item
    paths: Vec<String>,
    /// number of lines after the trigger line that belong to the block
    consumed: usize,
}

impl ExpansionBlock {
    fn scan(values: &MergedValues, trigger: usize, prefix: &str) -> Result<Self, ResolveError> {
        let mut paths = vec![];

        for (index, source, line) in values.lines().skip(trigger + 1) {
            if placeholder::is_end_marker(line) {
                tracing::trace!(trigger, end = index, ?paths, "expansion block");
                return Ok(Self {
                    paths,
                    consumed: index - trigger,
                });
            }

            let Some(suffix) = placeholder::list_item(line) else {
                return Err(ResolveError::format(source, line, FormatIssue::NotAListItem));
            };
            paths.push(format!("{prefix}{suffix}"));
        }

        let (_, source, line) = values.get_line(trigger);
        Err(ResolveError::format(source, line, FormatIssue::NoEndMarker))
    }
}

/// Outcome of [Resolver::resolve]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// one entry per merged line, [None] for lines consumed by an expansion block
    lines: Vec<Option<String>>,
    changed: bool,
}

impl Resolved {
    /// `true` if at least one placeholder was substituted
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// The lines that end up in the values file
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flatten().map(String::as_str)
    }

    pub fn write_to(&self, mut writer: impl std::io::Write) -> std::io::Result<()> {
        for line in self.lines() {
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()
    }
}

impl std::fmt::Display for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.lines().try_for_each(|line| f.write_str(line))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("format error in line `{}`{}: {issue}", line.trim_end(), in_file(file))]
    Format {
        file: Source,
        line: String,
        issue: FormatIssue,
    },
    #[error("error resolving {kind} placeholder for {key}")]
    Resolution {
        kind: Kind,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("error serializing parameters of {path}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ResolveError {
    fn format(file: &Source, line: &str, issue: FormatIssue) -> Self {
        ResolveError::Format {
            file: file.clone(),
            line: line.to_string(),
            issue,
        }
    }
}

fn in_file(file: &Source) -> String {
    file.as_ref()
        .map(|path| format!(" of {}", path.display()))
        .unwrap_or_default()
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatIssue {
    #[error("placeholder without key")]
    MissingArgument,
    #[error("no end marker found")]
    NoEndMarker,
    #[error("expected a `- <suffix>` list item or {{{{end}}}}")]
    NotAListItem,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::merged_values;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn store() -> MemoryStore {
        MemoryStore::from_iter([
            ("/configmgmt/my/parameter", "test-param-value"),
            ("/app/db/primary/host", "primary.example"),
            ("/app/db/primary/port", "5432"),
            ("/app/db/replica/host", "replica.example"),
            ("/app/flags/beta", "true"),
            ("/app/flags/nested/alpha", "false"),
        ])
    }

    fn counting(connects: &Cell<usize>) -> Connector<'_> {
        Box::new(move || -> Result<Box<dyn ParameterStore>, StoreError> {
            connects.set(connects.get() + 1);
            Ok(Box::new(store()))
        })
    }

    fn resolve(values: &MergedValues) -> Result<Resolved, ResolveError> {
        Resolver::new(counting(&Cell::new(0))).resolve(values)
    }

    #[test]
    fn untouched_lines_are_identical() {
        let values = merged_values! {"image:\n  tag: latest\nargs: [\"{{ not ssm }}\"]\n"};
        let connects = Cell::new(0);
        let resolved = Resolver::new(counting(&connects))
            .resolve(&values)
            .unwrap();

        assert!(!resolved.changed());
        assert_eq!(resolved.to_string(), "image:\n  tag: latest\nargs: [\"{{ not ssm }}\"]\n");
        assert_eq!(connects.get(), 0);
    }

    #[test]
    fn single() {
        let values = merged_values! {"
test-values-key: {{ssm /configmgmt/my/parameter}}
nested:
    test-values-key: {{ssm /configmgmt/my/parameter}}
"};
        let resolved = resolve(&values).unwrap();

        assert!(resolved.changed());
        assert_eq!(
            resolved.lines().collect::<Vec<_>>(),
            vec![
                "test-values-key: test-param-value\n",
                "nested:\n",
                "    test-values-key: test-param-value\n",
            ]
        );
    }

    #[test]
    fn path_tree() {
        let values = merged_values! {"flags: {{ssm-path /app/flags}}"};
        let resolved = resolve(&values).unwrap();

        assert_eq!(
            resolved.to_string(),
            "flags: {\"beta\":\"true\",\"nested/alpha\":\"false\"}\n"
        );
    }

    #[test]
    fn path_prefix_list() {
        let values = merged_values! {"
databases: {{ssm-path-prefix /app/db/}}
  - primary
  - replica
  {{end}}
replicas: 2
"};
        let resolved = resolve(&values).unwrap();

        assert_eq!(
            resolved.to_string(),
            "databases: [{\"host\":\"primary.example\",\"port\":\"5432\"},{\"host\":\"replica.example\"}]\nreplicas: 2\n"
        );
    }

    #[test]
    fn empty_path_prefix_list() {
        let values = merged_values! {"databases: {{ssm-path-prefix /app/db/}}\n{{end}}\nlast: true"};
        let resolved = resolve(&values).unwrap();

        assert_eq!(resolved.to_string(), "databases: []\nlast: true\n");
    }

    #[test]
    fn missing_end_marker() {
        let values = merged_values! {"databases: {{ssm-path-prefix /app/db/}}\n  - primary\n"};
        let connects = Cell::new(0);
        let err = Resolver::new(counting(&connects))
            .resolve(&values)
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Format {
                issue: FormatIssue::NoEndMarker,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "format error in line `databases: {{ssm-path-prefix /app/db/}}`: no end marker found"
        );
        assert_eq!(connects.get(), 0);
    }

    #[test]
    fn path_prefix_list_on_last_line() {
        let values = merged_values! {"replicas: 2\ndatabases: {{ssm-path-prefix /app/db/}}"};
        let err = resolve(&values).unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Format {
                issue: FormatIssue::NoEndMarker,
                ..
            }
        ));
    }

    #[test]
    fn unexpected_line_in_block() {
        let values = merged_values! {
            "values.yaml" => "databases: {{ssm-path-prefix /app/db/}}\n  - primary\nkey: value\n{{end}}"
        };
        let err = resolve(&values).unwrap_err();

        assert_eq!(
            err.to_string(),
            "format error in line `key: value` of values.yaml: expected a `- <suffix>` list item or {{end}}"
        );
    }

    #[test]
    fn missing_parameter() {
        let values = merged_values! {"key: {{ssm /does/not/exist}}"};
        let err = resolve(&values).unwrap_err();

        match err {
            ResolveError::Resolution { kind, key, source } => {
                assert_eq!(kind, Kind::Single);
                assert_eq!(key, "/does/not/exist");
                assert!(matches!(source, StoreError::NotFound(_)));
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }

    #[test]
    fn store_is_connected_once() {
        let values = merged_values! {"
a: {{ssm /configmgmt/my/parameter}}
b: {{ssm-path /app/flags}}
c: {{ssm /configmgmt/my/parameter}}
"};
        let connects = Cell::new(0);
        Resolver::new(counting(&connects))
            .resolve(&values)
            .unwrap();

        assert_eq!(connects.get(), 1);
    }

    #[test]
    fn connect_failure_names_the_key() {
        let values = merged_values! {"a: {{ssm /configmgmt/my/parameter}}"};
        let err = Resolver::new(Box::new(|| -> Result<Box<dyn ParameterStore>, StoreError> {
            Err(StoreError::Connect(std::io::Error::other("no credentials")))
        }))
        .resolve(&values)
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "error resolving ssm placeholder for /configmgmt/my/parameter"
        );
    }

    #[test]
    fn relative_keys() {
        assert_eq!(relative_key("/app/db/host", "/app/db"), "host");
        assert_eq!(relative_key("/app/db/host", "/app/db/"), "host");
        assert_eq!(relative_key("/app/db/nested/host", "/app/db"), "nested/host");
        assert_eq!(relative_key("/other", "/app"), "/other");
    }

    #[test]
    fn overlapping_prefixes_stay_separate() {
        // each list item gets its own object, nothing is merged across items
        let values = merged_values! {"
dbs: {{ssm-path-prefix /app/}}
  - db
  - db/primary
{{end}}
"};
        let resolved = resolve(&values).unwrap();

        assert_eq!(
            resolved.to_string(),
            "dbs: [{\"primary/host\":\"primary.example\",\"primary/port\":\"5432\",\"replica/host\":\"replica.example\"},{\"host\":\"primary.example\",\"port\":\"5432\"}]\n"
        );
    }
}
