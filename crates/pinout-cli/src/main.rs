use std::io::{self, Write};

use atty::Stream;
use clap::Parser;
use color_eyre::Result;
use pinout_core::{
    export_project, format_status_message, to_json_response, Config, ExecutionOutcome,
    GlobalOptions,
};
use serde_json::Value;

mod cli;
mod style;

use cli::{CommandKind, PinoutCli};
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = PinoutCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = cli.global_options();
    let config = Config::from_env();
    let outcome = match &cli.command {
        CommandKind::Export(args) => {
            export_project(&config, &args.to_request(cli.directory.clone()))
                .unwrap_or_else(|err| ExecutionOutcome::from_error(&err))
        }
    };
    let code = emit_output(&global, cli.command.name(), &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter =
        format!("pinout={level},pinout_cli={level},pinout_core={level},pinout_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(global: &GlobalOptions, command: &str, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.status.exit_code();

    if global.json {
        let payload = to_json_response(command, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    // exported text goes to stdout untouched
    if let Some(content) = exported_content(&outcome.details) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        return Ok(code);
    }

    let message = format_status_message(command, &outcome.message);
    if outcome.is_success() {
        if !global.quiet {
            let style = Style::new(global.no_color, atty::is(Stream::Stdout));
            println!("{}", style.status(&outcome.status, &message));
        }
    } else {
        let style = Style::new(global.no_color, atty::is(Stream::Stderr));
        eprintln!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = hint_from_details(&outcome.details) {
            eprintln!("{}", style.hint(hint));
        }
    }

    Ok(code)
}

fn exported_content(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("content"))
        .and_then(Value::as_str)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
