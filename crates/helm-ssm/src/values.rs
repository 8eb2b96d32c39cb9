//! merged collection of values files
//!
//! [MergedValues] tracks
//! - the source path of each values file
//! - every relevant line of every file, in argument order
//!
//! Blank lines and comment lines are dropped when a file is loaded. Each remaining line
//! gets an index which is stable once added (removal is not possible).
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Default, Debug)]
pub struct MergedValues {
    sources: Vec<Source>,
    lines: Vec<(usize, String)>,
}

impl MergedValues {
    /// Appends the relevant lines of a values document
    ///
    /// Every stored line ends with exactly one `\n`, whatever line ending the input used.
    pub fn insert(&mut self, document: &str, path: impl Into<Source>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for line in document.lines() {
            self.push_line(source_index, line);
        }
    }

    fn push_line(&mut self, source_index: usize, line: &str) {
        if is_skipped(line) {
            return;
        }

        self.lines.push((source_index, format!("{line}\n")));
    }

    pub fn get_line(&self, index: usize) -> SourceLine {
        let (source_index, line) = &self.lines[index];
        (index, &self.sources[*source_index], line)
    }

    pub fn lines(&self) -> impl Iterator<Item = SourceLine> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, (source_index, line))| (index, &self.sources[*source_index], line.as_str()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl MergedValues {
    /// Loads and merges all files in the given order
    pub fn load(paths: &[PathBuf]) -> Result<Self, LoadError> {
        let mut values = MergedValues::default();
        for path in paths {
            values.load_file(path)?;
        }
        Ok(values)
    }

    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        tracing::info!(path=%file_path.display(), "loading values file");

        let read_error = |source| LoadError::Read {
            path: file_path.to_owned(),
            source,
        };

        let file = std::fs::File::open(file_path).map_err(read_error)?;

        let source_index = self.sources.len();
        self.sources.push(Some(file_path.to_owned()));

        for line in std::io::BufReader::new(file).lines() {
            let line = line.map_err(read_error)?;
            self.push_line(source_index, &line);
        }

        Ok(())
    }
}

/// Blank, whitespace-only and `#` comment lines carry nothing to substitute
fn is_skipped(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("error reading values file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<&str> for MergedValues {
    fn from(value: &str) -> Self {
        let mut values = MergedValues::default();
        values.insert(value, None);
        values
    }
}

/// Utility macro to create [MergedValues]
///
/// Create from a single document
/// ```
/// # use helm_ssm::merged_values;
/// let values = merged_values!("key: value");
/// assert_eq!(values.len(), 1);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use helm_ssm::merged_values;
/// let values = merged_values! {
///   "one.yaml" => "one: 1",
///   "two.yaml" => "two: 2"
/// };
/// assert_eq!(values.source_count(), 2);
/// ```
#[macro_export]
macro_rules! merged_values {
    // single document without source
    { $expr:expr } => {
        $crate::values::MergedValues::from($expr)
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut values = $crate::values::MergedValues::default();
        $(
            values.insert($expr, Some(std::path::PathBuf::from($source)));
        )+

        values
    }};
}

pub type Source = Option<PathBuf>;
pub type SourceLine<'a> = (usize, &'a Source, &'a str);
