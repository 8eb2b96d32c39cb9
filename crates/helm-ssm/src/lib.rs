//! # helm-ssm - helm with parameters from AWS SSM
//!
//! `helm-ssm` is used in place of `helm`. Values files may reference parameters stored in the
//! AWS Systems Manager Parameter Store. Before helm runs, those references are replaced with
//! the current values.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `helm-ssm` works internally.
//!
//! ### Placeholders
//!
//! Placeholders live in values files, one per line. Everything from the placeholder to the end
//! of the line is replaced, everything before it stays as is.
//!
//! ```yaml
//! # a single parameter
//! password: {{ssm /app/prod/db/password}}
//!
//! # all parameters below a path, as an object keyed by the remaining path
//! database: {{ssm-path /app/prod/db}}
//!
//! # several paths sharing a prefix, as an array of objects
//! replicas: {{ssm-path-prefix /app/prod/db/}}
//!   - replica-a
//!   - replica-b
//! {{end}}
//! ```
//!
//! Objects and arrays are written as compact JSON, which YAML accepts as flow style:
//!
//! ```yaml
//! password: hunter2
//! database: {"host":"db.example","password":"hunter2"}
//! replicas: [{"host":"a.example"},{"host":"b.example"}]
//! ```
//!
//! See [placeholder] for the exact grammar.
//!
//! ### Arguments
//!
//! see [args::Invocation::parse]
//!
//! Only `install`, `upgrade` and `template` are preprocessed, everything else goes straight to
//! helm. For those commands every `-f`/`--values` file is taken out of the argument list.
//!
//! ### Merging
//!
//! All values files are read into one [values::MergedValues], in the order they were given.
//! Comments and blank lines are dropped on the way in. Every line gets a stable index.
//!
//! ### Resolving
//!
//! see [resolver::Resolver::resolve]
//!
//! A single pass over the merged lines. A line with a placeholder is rewritten in place.
//! The list items and the `{{end}}` line of an `ssm-path-prefix` block are marked as deleted
//! and left out when the result is written, so indices never shift during the pass.
//!
//! The parameter store ([store::ParameterStore]) is only connected when the first placeholder
//! is found. Runs without placeholders never talk to AWS.
//!
//! ### Running helm
//!
//! see [pipeline::run]
//!
//! If nothing was substituted helm gets the original arguments. Otherwise the result is written
//! to a [runner::TempValuesFile] which is passed to helm as the only values file and deleted
//! afterwards.
//!
pub mod args;
pub mod pipeline;
pub mod placeholder;
pub mod resolver;
pub mod runner;
pub mod store;
pub mod values;
