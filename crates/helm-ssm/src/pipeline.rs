//! One run: partition arguments, merge values, resolve placeholders, run helm
use crate::args::{self, Invocation};
use crate::resolver::Resolver;
use crate::runner::{CommandRunner, HelmRunner, TempValuesFile};
use crate::store::ssm::{SsmParameterStore, SsmSettings};
use crate::store::{Connector, ParameterStore, StoreError};
use crate::values::MergedValues;
use anyhow::Context;
use std::path::PathBuf;

/// Settings for a single run, fixed once the command line is parsed
#[derive(Debug, Clone, derive_new::new)]
pub struct RunOptions {
    /// helm binary to invoke
    pub helm: PathBuf,
    pub ssm: SsmSettings,
    /// Directory the generated values file is written to
    pub work_dir: PathBuf,
}

/// Runs helm with `args`, resolving parameters from AWS SSM when needed
pub fn run(args: Vec<String>, options: &RunOptions) -> anyhow::Result<()> {
    let runner = HelmRunner::new(options.helm.clone());
    let connect: Connector = Box::new(|| -> Result<Box<dyn ParameterStore>, StoreError> {
        Ok(Box::new(SsmParameterStore::connect(&options.ssm)?))
    });

    run_with(args, &runner, connect, options)
}

/// [run] with the store and the runner provided by the caller
pub fn run_with(
    args: Vec<String>,
    runner: &dyn CommandRunner,
    connect: Connector,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let Some(invocation) = Invocation::parse(args.clone()) else {
        tracing::debug!("no install command, passing arguments through");
        runner.run(&args::forwarded(args))?;
        return Ok(());
    };

    let values = MergedValues::load(&invocation.values_files)?;
    let resolved = Resolver::new(connect)
        .resolve(&values)
        .context("error resolving parameters")?;

    if !resolved.changed() {
        tracing::debug!("no placeholders found, running helm with the original arguments");
        runner.run(&invocation.original)?;
        return Ok(());
    }

    let values_file =
        TempValuesFile::create(&options.work_dir, &resolved, invocation.keep_values_file)?;

    let mut helm_args = invocation.residual;
    helm_args.push("-f".to_string());
    helm_args.push(values_file.path().display().to_string());

    let run_result = runner.run(&helm_args);
    let path = values_file.path().to_owned();
    let cleanup_result = values_file.cleanup();

    match (run_result, cleanup_result) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(cleanup)) => Err(cleanup.into()),
        (Err(run), Ok(())) => Err(run.into()),
        (Err(run), Err(cleanup)) => {
            tracing::warn!(error = %cleanup, "cleanup after failed helm run failed");
            Err(anyhow::Error::new(run).context(format!(
                "error running helm command, and could not delete temp values file {}",
                path.display()
            )))
        }
    }
}
