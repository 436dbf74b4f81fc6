use std::env;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use insertnum::{Config, Error, Inserter, TextBuffer};
use regex::Regex;

const DEFAULT_PATTERN: &str = "(?m)^";

fn usage() {
    eprintln!(
        "Usage: insertnum [options] <file|->\n\n\
         Replaces every match of a pattern with the next value of a number sequence.\n\
         By default a number is inserted at the start of each line.\n\n\
         Options:\n\
         \x20 --format <fmt>      printf-style template (default %d)\n\
         \x20 --start <n>         first value (default 0)\n\
         \x20 --step <n>          increment (default 1)\n\
         \x20 --pattern <regex>   insertion points (default {DEFAULT_PATTERN})\n\
         \x20 --config <path>     TOML settings file (or $INSERTNUM_CONFIG)\n\
         \x20 --override <text>   second pass with `format` or `format:start:step`\n\
         \x20 --prompt            read the override from one line of stdin\n\
         \x20 --dry-run           print the result instead of writing <file>\n\
         \x20 --stdin             read text from stdin (<file> must be '-') and print the result\n"
    );
}

#[derive(Default)]
struct Options {
    dry_run: bool,
    stdin_mode: bool,
    prompt: bool,
    format: Option<String>,
    start: Option<f64>,
    step: Option<f64>,
    pattern: Option<String>,
    config: Option<PathBuf>,
    override_text: Option<String>,
    file: String,
}

fn fail(code: i32, msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {msg}");
    process::exit(code);
}

fn take_value(args: &[String], idx: &mut usize, flag: &str) -> String {
    *idx += 1;
    match args.get(*idx) {
        Some(v) => {
            *idx += 1;
            v.clone()
        }
        None => {
            usage();
            fail(2, format!("{flag} requires a value"));
        }
    }
}

fn take_number(args: &[String], idx: &mut usize, flag: &str) -> f64 {
    let raw = take_value(args, idx, flag);
    raw.parse::<f64>()
        .unwrap_or_else(|_| fail(2, format!("{flag} must be a number (got {raw:?})")))
}

fn parse_args(args: &[String]) -> Options {
    let mut opts = Options::default();
    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--dry-run" => {
                opts.dry_run = true;
                idx += 1;
            }
            "--stdin" => {
                opts.stdin_mode = true;
                idx += 1;
            }
            "--prompt" => {
                opts.prompt = true;
                idx += 1;
            }
            "--format" => opts.format = Some(take_value(args, &mut idx, "--format")),
            "--start" => opts.start = Some(take_number(args, &mut idx, "--start")),
            "--step" => opts.step = Some(take_number(args, &mut idx, "--step")),
            "--pattern" => opts.pattern = Some(take_value(args, &mut idx, "--pattern")),
            "--config" => opts.config = Some(PathBuf::from(take_value(args, &mut idx, "--config"))),
            "--override" => opts.override_text = Some(take_value(args, &mut idx, "--override")),
            "--help" | "-h" => {
                usage();
                process::exit(0);
            }
            s if s.starts_with('-') && s.len() > 1 => {
                eprintln!("error: unknown flag {s}");
                usage();
                process::exit(2);
            }
            _ => break,
        }
    }

    if idx + 1 != args.len() {
        usage();
        process::exit(2);
    }
    opts.file = args[idx].clone();
    opts
}

/// Write through a sibling temp file and rename it over `path`, keeping its permissions.
fn write_atomic(path: &Path, content: &str) -> Result<(), Error> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tag = path
        .file_name()
        .map_or_else(|| "file".to_string(), |s| s.to_string_lossy().into_owned());
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut tmp_path = None;
    for attempt in 0u32.. {
        let candidate = dir.join(format!(".{tag}.insertnum.{}.{attempt}", process::id()));
        match fs::OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut f) => {
                let written = f.write_all(content.as_bytes()).and_then(|()| f.sync_all());
                if let Err(e) = written {
                    let _ = fs::remove_file(&candidate);
                    return Err(write_err(e));
                }
                tmp_path = Some(candidate);
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(write_err(e)),
        }
    }
    let tmp_path = tmp_path.ok_or_else(|| write_err(io::ErrorKind::AlreadyExists.into()))?;

    if let Some(p) = perms {
        let _ = fs::set_permissions(&tmp_path, p);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_err(e)
    })
}

fn read_text_file(file: &str) -> String {
    let bytes = fs::read(file).unwrap_or_else(|e| fail(1, format!("failed to read {file}: {e}")));
    if bytes.contains(&0) {
        fail(1, "binary file rejected (NUL byte found)");
    }
    String::from_utf8(bytes).unwrap_or_else(|_| fail(1, "non-UTF8 file rejected"))
}

/// One-shot override input. `None` on EOF; an empty line cancels.
fn prompt_override() -> Option<String> {
    eprint!("Input format or format:start:step (default: %d:0:1): ");
    let _ = io::stderr().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Some(line)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let opts = parse_args(&args);

    if opts.stdin_mode && opts.file != "-" {
        fail(2, format!("with --stdin, file must be '-' (got '{}')", opts.file));
    }
    if opts.stdin_mode && opts.prompt {
        fail(2, "--prompt cannot be combined with --stdin (stdin carries the text)");
    }
    if opts.prompt && opts.override_text.is_some() {
        fail(2, "--prompt and --override are mutually exclusive");
    }

    let config_path = opts.config.clone().or_else(|| env::var_os("INSERTNUM_CONFIG").map(PathBuf::from));
    let config = match config_path {
        Some(path) => Config::load(&path).unwrap_or_else(|e| fail(2, e)),
        None => Config::default(),
    };
    let mut settings = config.settings();
    if let Some(format) = opts.format {
        settings.format_template = format;
    }
    if let Some(start) = opts.start {
        settings.start = start;
    }
    if let Some(step) = opts.step {
        settings.step = step;
    }

    let pattern = Regex::new(opts.pattern.as_deref().unwrap_or(DEFAULT_PATTERN))
        .unwrap_or_else(|e| fail(2, Error::Pattern(e)));

    let text = if opts.stdin_mode {
        let mut input = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut input) {
            fail(1, format!("failed to read stdin: {e}"));
        }
        input
    } else {
        read_text_file(&opts.file)
    };

    let inserter = Inserter::new(settings);
    let mut buffer = TextBuffer::with_matches(text, &pattern);

    if let Err(e) = inserter.apply_default_sequence(&mut buffer) {
        fail(2, e);
    }

    let override_text = if opts.prompt { prompt_override() } else { opts.override_text };
    match inserter.apply_override_if_provided(&mut buffer, override_text.as_deref()) {
        Ok(_) => {}
        Err(Error::Override(e)) => eprintln!("warning: {e}; keeping the default sequence"),
        Err(e) => fail(2, e),
    }

    if opts.stdin_mode || opts.dry_run {
        print!("{}", buffer.text());
        return;
    }

    if let Err(e) = write_atomic(Path::new(&opts.file), buffer.text()) {
        fail(1, e);
    }

    for inserted in buffer.selected() {
        println!("{inserted}");
    }
}
