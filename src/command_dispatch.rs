//! Purpose: Hold top-level CLI command dispatch for `polyarray`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command reads one input and writes one JSON document.

use super::*;

pub(super) fn dispatch_command(command: Command, pretty: bool) -> Result<(), Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "polyarray", &mut io::stdout());
            Ok(())
        }
        Command::Tags { input } => {
            let raw = read_input(input.as_ref())?;
            emit_json(&tags_json(&raw)?, pretty);
            Ok(())
        }
        Command::Group {
            input,
            slots,
            strict,
            reject_missing,
            reject_unknown,
        } => {
            let layout = parse_layout(&slots)?;
            let options = decode_options(strict, reject_missing, reject_unknown);
            let raw = read_input(input.as_ref())?;
            emit_json(&group_json(&raw, layout, &options)?, pretty);
            Ok(())
        }
        Command::Ungroup { input, slots } => {
            let layout = parse_layout(&slots)?;
            let raw = read_input(input.as_ref())?;
            emit_json(&ungroup_json(&raw, layout)?, pretty);
            Ok(())
        }
    }
}
