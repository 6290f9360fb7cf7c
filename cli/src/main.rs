use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use vss::{Builder, Config};

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds static sites from Markdown.
        cmd vss {
            /// Configuration file. Defaults to `vss.toml` in the working directory.
            optional -c, --config path: PathBuf

            /// Renders the project into its dist directory.
            cmd build {
                /// Overrides `base_url` from the configuration.
                optional --base-url url: String
                /// Number of rendering workers.
                optional -j, --jobs n: usize
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

fn build(config: Option<std::path::PathBuf>, build: flags::Build) -> vss::error::Result<()> {
    let mut config = match config {
        Some(path) => Config::load(path)?,
        None => Config::discover(".")?,
    };

    if let Some(base_url) = build.base_url {
        config.set_base_url(base_url);
    }

    if build.jobs.is_some() {
        config.build.jobs = build.jobs;
    }

    let summary = Builder::new(config).run()?;
    println!("built {} pages, copied {} static files", summary.pages, summary.assets);
    Ok(())
}

pub fn main() -> ExitCode {
    init_tracing();

    let flags = flags::Vss::from_env_or_exit();
    let result = match flags.subcommand {
        flags::VssCmd::Build(cmd) => build(flags.config, cmd),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
