use std::io::{self, Read, Write};

use chat_dom::logging::init_from_config;
use chat_dom::{decode_lines, Engine, EngineConfig, Event, HandleReport};

const USAGE: &str = "usage: transcript_replay <events.jsonl|-> [--live] [--region <name>] [--snapshot]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    input: String,
    live: bool,
    region: String,
    snapshot: bool,
}

fn parse_args<I>(args: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut input = None;
    let mut live = false;
    let mut region = "transcript".to_string();
    let mut snapshot = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--live" => live = true,
            "--snapshot" => snapshot = true,
            "--region" => {
                region = args
                    .next()
                    .ok_or_else(|| "--region needs a value".to_string())?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{flag}'\n{USAGE}")),
            path => {
                if input.replace(path.to_string()).is_some() {
                    return Err(format!("only one input file is accepted\n{USAGE}"));
                }
            }
        }
    }

    Ok(Args {
        input: input.ok_or_else(|| USAGE.to_string())?,
        live,
        region,
        snapshot,
    })
}

fn read_input(path: &str) -> io::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path)
}

/// Delivers events one by one, letting the batch interval elapse after each.
fn run_live(engine: &mut Engine, input: &str) -> HandleReport {
    let batch_ms = engine.config().batch_ms;
    let mut report = HandleReport::default();
    for decoded in decode_lines(input) {
        match decoded {
            Ok(event) => match engine.handle(&event) {
                Ok(()) => report.handled += 1,
                Err(err) => {
                    tracing::warn!(event = event.kind_name(), error = %err, "event handling failed");
                    report.failed += 1;
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable event");
                report.decode_errors += 1;
            }
        }
        engine.advance(batch_ms);
    }
    engine.run_pending();
    report
}

fn run_replay(engine: &mut Engine, input: &str) -> HandleReport {
    let mut decode_errors = 0;
    let events: Vec<Event> = decode_lines(input)
        .filter_map(|decoded| match decoded {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable event");
                decode_errors += 1;
                None
            }
        })
        .collect();
    let mut report = engine.replay(&events);
    report.decode_errors += decode_errors;
    report
}

fn main() -> io::Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let config = EngineConfig::from_env();
    init_from_config(&config);

    let input = read_input(&args.input)?;
    let mut engine = Engine::with_config(config);
    let report = if args.live {
        run_live(&mut engine, &input)
    } else {
        run_replay(&mut engine, &input)
    };

    let mut stdout = io::stdout().lock();
    if args.snapshot {
        let json = serde_json::to_string_pretty(&engine.snapshot()).map_err(io::Error::other)?;
        writeln!(stdout, "{json}")?;
    } else {
        let html = engine.region_html(&args.region).map_err(io::Error::other)?;
        writeln!(stdout, "{html}")?;
    }

    if !report.is_clean() {
        eprintln!(
            "handled {} events, {} failed, {} undecodable",
            report.handled, report.failed, report.decode_errors
        );
    }
    Ok(())
}
