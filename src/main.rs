//! Purpose: `polyarray` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout (pretty on a TTY or with --pretty).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `polyarray::to_exit_code`.
use std::error::Error as StdError;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use polyarray::grouped::{GroupLayout, Grouped, SlotSpec};
use polyarray::{
    DecodeOptions, DefaultDiscriminator, Error, ErrorKind, TagPolicy, probe_tags, to_exit_code,
};

mod command_dispatch;

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

/// Returns the process exit code; only help output exits without running a command.
fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let bare = err.kind() == ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand;
                return Ok(if bare { 2 } else { 0 });
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `polyarray --help`."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command, cli.pretty)
        .map(|()| 0)
        .map_err(add_parse_hint)
        .map_err(add_io_hint)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "polyarray",
    version,
    about = "Group tagged JSON array elements into named slots, and flatten them back",
    long_about = None,
    after_help = r#"EXAMPLES
  $ polyarray tags residence.json
  $ polyarray group residence.json --slot location:single --slot people=person --slot pets=pet
  $ polyarray group residence.json --slot people=person | polyarray ungroup --slot people=person

NOTES
  - Tags are read from `type`, `@type`, `Type`, `@Type` (first non-empty wins)
  - Slot specs are name[=tag][:single|:many]; the tag defaults to the name
  - Set RUST_LOG=debug to see decode summaries on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List the discriminator tag of every element")]
    Tags {
        #[arg(help = "Input file with a JSON array (default: stdin; - for stdin)")]
        input: Option<PathBuf>,
    },
    #[command(
        about = "Group array elements into slots by tag",
        after_help = r#"EXAMPLES
  $ polyarray group in.json --slot owner:single --slot pets=pet
  $ polyarray group in.json --slot pets=pet --strict"#
    )]
    Group {
        #[arg(help = "Input file with a JSON array (default: stdin; - for stdin)")]
        input: Option<PathBuf>,
        #[arg(long = "slot", required = true, help = "Repeatable slot spec name[=tag][:single|:many]")]
        slots: Vec<String>,
        #[arg(long, help = "Fail on untagged or unmatched elements")]
        strict: bool,
        #[arg(long, help = "Fail on elements without a tag")]
        reject_missing: bool,
        #[arg(long, help = "Fail on elements whose tag has no slot")]
        reject_unknown: bool,
    },
    #[command(about = "Flatten a grouped object back into an array")]
    Ungroup {
        #[arg(help = "Input file with a grouped JSON object (default: stdin; - for stdin)")]
        input: Option<PathBuf>,
        #[arg(long = "slot", required = true, help = "Repeatable slot spec name[=tag][:single|:many]")]
        slots: Vec<String>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn decode_options(strict: bool, reject_missing: bool, reject_unknown: bool) -> DecodeOptions {
    let policy = |reject: bool| {
        if strict || reject {
            TagPolicy::Reject
        } else {
            TagPolicy::Skip
        }
    };
    DecodeOptions::new()
        .with_missing_tag(policy(reject_missing))
        .with_unknown_tag(policy(reject_unknown))
}

fn parse_layout(slots: &[String]) -> Result<GroupLayout, Error> {
    let specs = slots
        .iter()
        .map(|slot| slot.parse::<SlotSpec>())
        .collect::<Result<Vec<_>, _>>()?;
    GroupLayout::new(specs)
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>, Error> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input file")
                .with_path(path.clone())
                .with_source(err)
        }),
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(buf)
        }
    }
}

fn tags_json(raw: &[u8]) -> Result<Value, Error> {
    let tags = probe_tags::<DefaultDiscriminator>(raw)?;
    let entries = tags
        .into_iter()
        .enumerate()
        .map(|(index, tag)| {
            let tag = if tag.is_empty() { Value::Null } else { Value::String(tag) };
            json!({ "index": index, "tag": tag })
        })
        .collect();
    Ok(Value::Array(entries))
}

fn group_json(raw: &[u8], layout: GroupLayout, options: &DecodeOptions) -> Result<Value, Error> {
    let mut grouped = Grouped::new(layout);
    grouped.decode::<DefaultDiscriminator>(raw, options)?;
    Ok(grouped.to_json())
}

fn ungroup_json(raw: &[u8], layout: GroupLayout) -> Result<Value, Error> {
    let value: Value = serde_json::from_slice(raw).map_err(|err| {
        Error::new(ErrorKind::Parse)
            .with_message("grouped input is not valid JSON")
            .with_hint(polyarray::json::parse::hint_for_error(&err, "ungroup"))
            .with_source(err)
    })?;
    let grouped = Grouped::from_json(layout, &value)?;
    let items = grouped
        .flatten()
        .iter()
        .map(|item| item.to_json())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            Error::new(ErrorKind::Encode)
                .with_message("failed to encode flattened array")
                .with_source(err)
        })?;
    Ok(Value::Array(items))
}

fn emit_json(value: &Value, pretty: bool) {
    let pretty = pretty || io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!(
        "{}",
        json.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    );
}

fn add_parse_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::MissingTag => err.with_hint(
            "Element has no type/@type/Type/@Type field. Drop --strict/--reject-missing to skip it.",
        ),
        ErrorKind::UnknownTag => {
            err.with_hint("Add a --slot for this tag, or drop --strict/--reject-unknown to skip it.")
        }
        _ => err,
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() || err.kind() != ErrorKind::Io {
        return err;
    }
    err.with_hint("I/O error. Check the path and permissions.")
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Config\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Config => "invalid configuration".to_string(),
        ErrorKind::Parse => "parse error".to_string(),
        ErrorKind::Decode => "decode error".to_string(),
        ErrorKind::Encode => "encode error".to_string(),
        ErrorKind::MissingTag => "missing tag".to_string(),
        ErrorKind::UnknownTag => "unknown tag".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    std::iter::successors(err.source(), |&source| source.source())
        .map(ToString::to_string)
        .collect()
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    if let Some(tag) = err.tag() {
        inner.insert("tag".to_string(), json!(tag));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(index) = err.index() {
        lines.push(format!("index: {index}"));
    }
    if let Some(tag) = err.tag() {
        lines.push(format!("tag: {tag}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

/// First non-blank line of clap's rendering, without the `error:` prefix.
fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, clap_error_summary, decode_options, error_causes, error_json, parse_layout,
        tags_json, ungroup_json,
    };
    use clap::Parser;
    use polyarray::{Error, ErrorKind, TagPolicy};
    use serde_json::json;

    #[test]
    fn strict_flag_rejects_both_tag_outcomes() {
        let options = decode_options(true, false, false);
        assert_eq!(options.missing_tag, TagPolicy::Reject);
        assert_eq!(options.unknown_tag, TagPolicy::Reject);
        let options = decode_options(false, false, true);
        assert_eq!(options.missing_tag, TagPolicy::Skip);
        assert_eq!(options.unknown_tag, TagPolicy::Reject);
    }

    #[test]
    fn tags_marks_untagged_elements_null() {
        let value = tags_json(br#"[{"type":"a"},{}]"#).expect("tags");
        assert_eq!(
            value,
            json!([{"index": 0, "tag": "a"}, {"index": 1, "tag": null}])
        );
    }

    #[test]
    fn ungroup_uses_declaration_order() {
        let layout = parse_layout(&["pets=pet".to_string(), "owner:single".to_string()])
            .expect("layout");
        let value = ungroup_json(br#"{"owner":{"n":"o"},"pets":[{"n":"p"}]}"#, layout)
            .expect("ungroup");
        assert_eq!(value, json!([{"n": "p"}, {"n": "o"}]));
    }

    #[test]
    fn causes_follow_the_source_chain() {
        let io = std::io::Error::other("disk gone");
        let err = Error::new(ErrorKind::Io).with_source(io);
        assert_eq!(error_causes(&err), ["disk gone"]);
        assert!(error_causes(&Error::new(ErrorKind::Io)).is_empty());
    }

    #[test]
    fn clap_summary_drops_the_error_prefix() {
        let err = Cli::try_parse_from(["polyarray", "group"])
            .err()
            .expect("missing --slot");
        let summary = clap_error_summary(&err);
        assert!(!summary.starts_with("error:"));
        assert!(summary.contains("required"));
    }

    #[test]
    fn error_json_carries_element_context() {
        let err = Error::new(ErrorKind::UnknownTag)
            .with_message("no slot accepts this tag")
            .with_index(2)
            .with_tag("fish");
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "UnknownTag");
        assert_eq!(value["error"]["index"], 2);
        assert_eq!(value["error"]["tag"], "fish");
    }
}
