//! Purpose: `handoff` CLI entry point: parse files and print their results.
//! Role: Binary crate root; parses args, runs commands, emits JSON (or s-expressions) on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Logging goes to stderr so stdout stays a single document.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod result_json;

use handoff::api::{
    ByteList, Decoder, DecoderResult, Error, ErrorKind, InputError, ParserOptions, SourceRef,
    StringPtr, debug_level, parse_source, to_exit_code,
};
use result_json::{result_json, token_rows};

#[derive(Parser, Debug)]
#[command(
    name = "handoff",
    version,
    about = "Parse Ruby-like source and print the result that crosses the C boundary",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Parse a file and print its AST, tokens, diagnostics and comments")]
    Parse {
        #[arg(help = "Source file, or - for stdin")]
        input: String,
        #[arg(long, help = "Buffer name used in diagnostics (default: the file path)")]
        buffer_name: Option<String>,
        #[arg(long, help = "Do not record tokens")]
        no_tokens: bool,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Debug categories to log on stderr: parser,lexer,buffer"
        )]
        debug: Vec<String>,
        #[arg(long, default_value = "json", value_enum, help = "Output format: json|sexp")]
        format: OutputFormat,
        #[arg(long, help = "Decode ISO-8859-1 input (and invalid UTF-8) as Latin-1")]
        latin1: bool,
    },
    #[command(about = "Print the token stream of a file as JSON")]
    Tokens {
        #[arg(help = "Source file, or - for stdin")]
        input: String,
        #[arg(long, help = "Decode ISO-8859-1 input (and invalid UTF-8) as Latin-1")]
        latin1: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Sexp,
}

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
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
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(clap_error_summary(&err)));
            }
        },
    };

    match cli.command {
        Command::Parse {
            input,
            buffer_name,
            no_tokens,
            debug,
            format,
            latin1,
        } => {
            let debug = parse_debug_flags(&debug)?;
            init_tracing(debug != debug_level::NONE);
            let source = SourceRef::parse(&input);
            let mut options = ParserOptions::default()
                .with_buffer_name(buffer_name.unwrap_or_else(|| source.display_name()))
                .with_debug(debug)
                .with_record_tokens(!no_tokens);
            if latin1 {
                options = options.with_decoder(Decoder::new(latin1_decoder));
            }
            let result = parse_source(&source, options)?;
            match format {
                OutputFormat::Json => emit_json(result_json(&result)),
                OutputFormat::Sexp => {
                    println!("{}", result.ast().inspect());
                    for rendered in result.render_diagnostics() {
                        eprintln!("{rendered}");
                    }
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Tokens { input, latin1 } => {
            init_tracing(false);
            let source = SourceRef::parse(&input);
            let mut options = ParserOptions::default().with_buffer_name(source.display_name());
            if latin1 {
                options = options.with_decoder(Decoder::new(latin1_decoder));
            }
            let result = parse_source(&source, options)?;
            emit_json(json!(token_rows(result.tokens())));
            Ok(RunOutcome::ok())
        }
    }
}

fn parse_debug_flags(names: &[String]) -> Result<u8, Error> {
    names.iter().try_fold(debug_level::NONE, |bits, name| {
        debug_level::from_name(name).map(|bit| bits | bit).ok_or_else(|| {
            Error::new(ErrorKind::Usage).with_message(format!(
                "unknown debug category '{name}' (expected parser, lexer or buffer)"
            ))
        })
    })
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

const LATIN1_NAMES: [&str; 4] = ["ISO-8859-1", "ISO8859-1", "LATIN1", "US-ASCII"];

// Latin-1 maps each byte to the code point of the same value.
extern "C" fn latin1_decoder(encoding: StringPtr, input: ByteList) -> DecoderResult {
    let name = encoding.as_bytes();
    let known = name.eq_ignore_ascii_case(b"UTF-8")
        || LATIN1_NAMES
            .iter()
            .any(|latin1| latin1.as_bytes().eq_ignore_ascii_case(name));
    if !known {
        return DecoderResult::err(InputError::UnsupportedEncoding(encoding));
    }
    let decoded: String = input.iter().map(|byte| char::from(*byte)).collect();
    DecoderResult::ok(ByteList::from(decoded.into_bytes()))
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Decode => "could not decode input".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
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
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[cfg(test)]
mod tests {
    use super::{error_json, error_text, latin1_decoder, parse_debug_flags};
    use handoff::api::{ByteList, Error, ErrorKind, InputError, debug_level};
    use serde_json::json;

    #[test]
    fn debug_flags_combine() {
        let names = vec!["parser".to_string(), "buffer".to_string()];
        assert_eq!(
            parse_debug_flags(&names).expect("flags"),
            debug_level::PARSER | debug_level::BUFFER
        );
        let err = parse_debug_flags(&["verbose".to_string()]).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn error_json_has_kind_message_and_path() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("failed to read input")
            .with_path("/tmp/missing.rb");
        assert_eq!(
            error_json(&err),
            json!({"error": {"kind": "NotFound", "message": "failed to read input", "path": "/tmp/missing.rb"}})
        );
        assert_eq!(
            error_text(&err),
            "error: failed to read input\npath: /tmp/missing.rb"
        );
    }

    #[test]
    fn latin1_decoder_widens_high_bytes() {
        let result = latin1_decoder("ISO-8859-1".into(), ByteList::from(vec![b'a', 0xE9]));
        let bytes = result.into_result().expect("decoded");
        assert_eq!(bytes.as_slice(), "aé".as_bytes());

        let result = latin1_decoder("Shift_JIS".into(), ByteList::new());
        assert_eq!(
            result.into_result().expect_err("unsupported"),
            InputError::unsupported_encoding("Shift_JIS")
        );
    }
}
