//! helm-ssm cli interface

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// helm with values resolved from AWS SSM Parameter Store
///
/// All arguments are passed on to helm. For install, upgrade and template the values files
/// (-f/--values) are scanned for {{ssm ...}}, {{ssm-path ...}} and {{ssm-path-prefix ...}}
/// placeholders first. Add --keep-values-file to keep the generated values file.
///
/// Wrapper options have to come before the helm arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about, disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// helm binary to run
    #[arg(long = "helm-bin", env = "HELM_SSM_HELM_BIN", default_value = "helm")]
    pub helm: PathBuf,

    /// AWS region of the parameter store
    #[arg(long, env = "HELM_SSM_AWS_REGION")]
    pub aws_region: Option<String>,

    /// AWS profile used to authenticate
    #[arg(long, env = "HELM_SSM_AWS_PROFILE")]
    pub aws_profile: Option<String>,

    /// Print help
    ///
    /// --help is passed to helm
    #[arg(long = "ssm-help", action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Arguments for helm
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub helm_args: Vec<String>,
}
