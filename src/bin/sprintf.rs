use std::env;
use std::process;

use insertnum::{FormatEngine, Value};

fn usage() {
    eprintln!(
        "Usage: sprintf [--json] <format> [args...]\n\n\
         Renders <format> against the arguments and prints the result.\n\
         Arguments are strings; with --json each argument is parsed as a JSON value\n\
         (so '%(user.name)s' can reach into '{{\"user\":{{\"name\":\"ada\"}}}}')."
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut json = false;
    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--json" => {
                json = true;
                idx += 1;
            }
            "--help" | "-h" => {
                usage();
                return;
            }
            "--" => {
                idx += 1;
                break;
            }
            _ => break,
        }
    }

    let Some(format) = args.get(idx) else {
        usage();
        process::exit(2);
    };

    let mut values = Vec::with_capacity(args.len() - idx - 1);
    for raw in &args[idx + 1..] {
        if json {
            match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(v) => values.push(Value::from(v)),
                Err(e) => {
                    eprintln!("error: argument {raw:?} is not valid JSON: {e}");
                    process::exit(2);
                }
            }
        } else {
            values.push(Value::from(raw.as_str()));
        }
    }

    let engine = FormatEngine::new();
    match engine.sprintf(format, &values) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    }
}
