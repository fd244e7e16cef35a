use std::io;
use std::sync::Arc;

use urlchecker::config::Config;
use urlchecker::core::error::{CheckerError, Result};
use urlchecker::notify::{RecordTypeDirectory, SmtpMailer};
use urlchecker::pipeline::{Pipeline, persist_input, read_input_lines};
use urlchecker::reporting::logging;
use urlchecker::ui::{Cli, parse_args};
use urlchecker::validation::{ExclusionSet, ReqwestProbe};

#[tokio::main]
async fn main() {
    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(exit_code) => std::process::exit(exit_code),
    };

    logging::init_logger(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli).await {
        logging::log_error("urlchecker aborted", Some(&e));
        std::process::exit(1);
    }
}

/// Load everything the run needs, then hand over to the pipeline.
async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load_from_file(&cli.config)?;
    logging::log_config_info(&config);

    let lines = read_input_lines(io::stdin().lock())?;
    persist_input(config.in_file()?, &lines)?;
    if lines.is_empty() {
        return Err(CheckerError::EmptyInput);
    }

    let directory = RecordTypeDirectory::load_from_file(config.mailing_list()?)?;
    let exclusion = ExclusionSet::load_optional(config.exclude.as_deref());
    log::debug!(
        "{} mailing list entr(ies), {} exclusion(s)",
        directory.len(),
        exclusion.len()
    );

    let http = Arc::new(ReqwestProbe::from_config(&config)?);
    let mailer = Arc::new(SmtpMailer::default());

    Pipeline::new(config, http, mailer)
        .run(lines, &directory, exclusion)
        .await?;
    Ok(())
}

