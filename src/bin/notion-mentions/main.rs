use anyhow::Result;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_checkpoint;
mod cmd_page;
mod cmd_run;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт info.
    // Пример: RUST_LOG=debug notion-mentions run
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        // Цепочка контекстов содержит последний сохранённый курсор.
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse_args();
    match cli.cmd {
        cli::Cmd::Run {
            checkpoint,
            dry_run,
            on_missing,
            interval_ms,
            page_size,
            json,
        } => cmd_run::exec(
            cli::overrides(checkpoint, dry_run, on_missing, interval_ms, page_size),
            json,
        ),

        cli::Cmd::Page {
            id,
            dry_run,
            on_missing,
            interval_ms,
            json,
        } => cmd_page::exec(
            cli::overrides(None, dry_run, on_missing, interval_ms, None),
            id,
            json,
        ),

        cli::Cmd::Checkpoint { action } => match action {
            cli::CheckpointCmd::Status { checkpoint, json } => {
                cmd_checkpoint::exec_status(cli::overrides(checkpoint, false, None, None, None), json)
            }
            cli::CheckpointCmd::Reset { checkpoint } => {
                cmd_checkpoint::exec_reset(cli::overrides(checkpoint, false, None, None, None))
            }
        },
    }
}
