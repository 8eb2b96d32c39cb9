//! helm argument partitioning
//!
//! Splits the argument vector meant for helm into
//! - whether the invocation installs something (and therefore needs values preprocessing)
//! - the values files referenced via `-f`/`--values`
//! - the remaining arguments that get forwarded to helm
use std::path::PathBuf;

/// Subcommands that accept values files and are worth preprocessing
pub const INSTALL_COMMANDS: [&str; 3] = ["install", "upgrade", "template"];

/// Flags that take a values file as the next argument
pub const VALUES_FLAGS: [&str; 2] = ["-f", "--values"];

pub const NAMESPACE_FLAGS: [&str; 2] = ["-n", "--namespace"];

/// Keep the generated values file after helm ran. Never forwarded to helm.
pub const KEEP_VALUES_FILE_FLAG: &str = "--keep-values-file";

/// A helm invocation split into the parts the preprocessor cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Arguments as passed by the user, minus [KEEP_VALUES_FILE_FLAG] which helm does not know
    pub original: Vec<String>,
    /// Values files in the order they were given
    pub values_files: Vec<PathBuf>,
    /// `original` without the values flags and their values
    pub residual: Vec<String>,
    pub keep_values_file: bool,
}

impl Invocation {
    /// Partitions `args`
    ///
    /// [KEEP_VALUES_FILE_FLAG] is taken out before the command is detected, so it may appear
    /// anywhere. Returns [None] when the command is not one of [INSTALL_COMMANDS]. In that case
    /// the arguments should be handed to helm via [forwarded].
    pub fn parse(args: Vec<String>) -> Option<Self> {
        let (keep_values_file, original) = pull_flag(args, KEEP_VALUES_FILE_FLAG);
        if !is_install(&original) {
            return None;
        }

        let (values_files, residual) = pull_values_files(&original);

        Some(Self {
            original,
            values_files,
            residual,
            keep_values_file,
        })
    }
}

/// Checks if the helm subcommand is one of [INSTALL_COMMANDS]
///
/// The subcommand is the first argument, or the third one if the invocation starts
/// with a namespace flag and its value (`-n <ns> install ...`).
pub fn is_install(args: &[String]) -> bool {
    let command_index = match args.first() {
        None => return false,
        Some(first) if NAMESPACE_FLAGS.contains(&first.as_str()) => 2,
        Some(_) => 0,
    };

    args.get(command_index)
        .is_some_and(|command| INSTALL_COMMANDS.contains(&command.as_str()))
}

/// Removes all values flags and their values from `args`
///
/// A values flag in last position has no value. It is dropped without contributing a file.
pub fn pull_values_files(args: &[String]) -> (Vec<PathBuf>, Vec<String>) {
    let mut values_files = vec![];
    let mut residual = vec![];

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUES_FLAGS.contains(&arg.as_str()) {
            match iter.next() {
                Some(file) => values_files.push(PathBuf::from(file)),
                None => tracing::debug!(flag = %arg, "values flag without a file, dropping it"),
            }
            continue;
        }

        residual.push(arg.clone());
    }

    (values_files, residual)
}

/// `args` without the flags only this wrapper understands
pub fn forwarded(args: Vec<String>) -> Vec<String> {
    pull_flag(args, KEEP_VALUES_FILE_FLAG).1
}

/// Removes every occurrence of a boolean `flag`, reports whether it was present
fn pull_flag(args: Vec<String>, flag: &str) -> (bool, Vec<String>) {
    let before = args.len();
    let args: Vec<String> = args.into_iter().filter(|arg| arg != flag).collect();
    (args.len() != before, args)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn install_detection() {
        assert!(is_install(&args(&["install", "release", "chart"])));
        assert!(is_install(&args(&["upgrade", "release", "chart"])));
        assert!(is_install(&args(&["template", "chart"])));
        assert!(is_install(&args(&["-n", "kube-system", "template", "chart"])));
        assert!(is_install(&args(&["--namespace", "apps", "install"])));

        assert!(!is_install(&args(&[])));
        assert!(!is_install(&args(&["lint", "chart"])));
        assert!(!is_install(&args(&["dependency-update"])));
        assert!(!is_install(&args(&["-n", "apps", "lint"])));
        // namespace flag without a command after it
        assert!(!is_install(&args(&["-n", "apps"])));
        // only the leading position counts
        assert!(!is_install(&args(&["status", "install"])));
    }

    #[test]
    fn values_files_are_pulled_in_order() {
        let (files, residual) = pull_values_files(&args(&[
            "install", "-f", "a.yaml", "release", "--values", "b.yaml", "chart", "--wait",
        ]));

        assert_eq!(files, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
        assert_eq!(residual, args(&["install", "release", "chart", "--wait"]));
    }

    #[test]
    fn trailing_values_flag_is_dropped() {
        let (files, residual) = pull_values_files(&args(&["install", "release", "chart", "-f"]));

        assert!(files.is_empty());
        assert_eq!(residual, args(&["install", "release", "chart"]));
    }

    #[test]
    fn keep_flag_is_extracted() {
        let invocation = Invocation::parse(args(&[
            "upgrade",
            "--keep-values-file",
            "release",
            "chart",
            "-f",
            "values.yaml",
        ]))
        .expect("is an install command");

        assert!(invocation.keep_values_file);
        assert_eq!(invocation.values_files, vec![PathBuf::from("values.yaml")]);
        assert_eq!(invocation.residual, args(&["upgrade", "release", "chart"]));
        assert_eq!(invocation.original.len(), 5);
    }

    #[test]
    fn keep_flag_before_the_command() {
        let invocation = Invocation::parse(args(&[
            "--keep-values-file",
            "install",
            "release",
            "./chart",
            "-f",
            "values.yaml",
        ]))
        .expect("is an install command");

        assert!(invocation.keep_values_file);
        assert_eq!(
            invocation.original,
            args(&["install", "release", "./chart", "-f", "values.yaml"])
        );
        assert_eq!(invocation.residual, args(&["install", "release", "./chart"]));
    }

    #[test]
    fn keep_flag_is_never_forwarded() {
        assert_eq!(
            forwarded(args(&["lint", "--keep-values-file", "./chart"])),
            args(&["lint", "./chart"])
        );
    }

    #[test]
    fn non_install_is_not_partitioned() {
        assert_eq!(Invocation::parse(args(&["lint", "-f", "values.yaml"])), None);
    }
}
