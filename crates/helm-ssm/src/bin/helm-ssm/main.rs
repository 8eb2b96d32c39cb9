mod cli;

use helm_ssm::pipeline::RunOptions;
use helm_ssm::store::ssm::SsmSettings;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HELM_SSM_LOG"))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        for error in e.chain() {
            println!("{error}")
        }
        std::process::exit(1);
    }
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let options = RunOptions::new(
        cli.helm,
        SsmSettings::new(cli.aws_region, cli.aws_profile),
        std::env::current_dir()?,
    );

    helm_ssm::pipeline::run(cli.helm_args, &options)
}
