use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use qypi::cli::{Cli, execute};
use qypi::version::registries::PypiRegistry;
use qypi::version::resolver::PackageResolver;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    qypi::logging::init(cli.verbose, cli.log_json);

    let config = cli.config();
    let resolver = PackageResolver::new(Arc::new(PypiRegistry::new(&config.index_url)));

    let all_resolved = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(execute(
            cli.command,
            &resolver,
            &mut io::stdout(),
            &mut io::stderr(),
        ))?;

    Ok(if all_resolved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
