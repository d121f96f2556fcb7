use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use mafia_core::core_api::{Engine, SaveFormat, Session};
use mafia_core::detect::{
    ProgramCandidate, detect_coord_layout, detect_program, read_program_names, read_program_vars,
};
use mafia_core::garage::GarageCatalog;
use mafia_core::profile::ProfileBlock;
use mafia_core::variants::MrSeg0Point;
use mafia_render::{
    JsonStyle, ProgramReport, TextRenderOptions, render_catalog_json, render_catalog_text,
    render_coord_layout_json, render_coord_layout_text, render_program_json,
    render_program_text, render_session_json, render_session_text,
};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Profile,
    MrProfile,
    MrTimes,
    MrSeg0,
}

impl FormatArg {
    fn to_core(self) -> SaveFormat {
        match self {
            Self::Profile => SaveFormat::Profile,
            Self::MrProfile => SaveFormat::MrProfile,
            Self::MrTimes => SaveFormat::MrTimes,
            Self::MrSeg0 => SaveFormat::MrSeg0,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    /// Show every field and debug logging. RUST_LOG takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Detect the save variant and summarize its contents.
    Info {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Detect the field layout of a raw actor payload.
    Actor {
        #[arg(value_name = "PAYLOAD")]
        path: PathBuf,
    },
    /// Locate the script program block among raw segment dumps.
    Program {
        #[arg(value_name = "FILE", required = true)]
        paths: Vec<PathBuf>,
        /// Position (0-based) of the FILE holding the game payload.
        #[arg(long, value_name = "N")]
        game_payload: Option<usize>,
    },
    /// List the garage car catalog.
    Garage {
        /// Read this catalog file instead of searching the game directory.
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
        #[arg(long, value_name = "DIR", env = "MAFIA_GAME_DIR")]
        game_dir: Option<PathBuf>,
    },
    /// Apply edits to a save and write the result.
    Edit {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
        /// mr-profile word: INDEX=VALUE
        #[arg(long = "set-word", value_name = "INDEX=VALUE", value_parser = parse_word_edit)]
        set_word: Vec<(usize, u32)>,
        /// mr-times record values: INDEX=A,B
        #[arg(long = "set-times", value_name = "INDEX=A,B", value_parser = parse_times_edit)]
        set_times: Vec<(usize, u32, u32)>,
        /// mr-times record name: INDEX=NAME
        #[arg(long = "set-name", value_name = "INDEX=NAME", value_parser = parse_name_edit)]
        set_name: Vec<(usize, String)>,
        /// mr-seg0 point: INDEX=X,Y,Z
        #[arg(
            long = "set-point",
            value_name = "INDEX=X,Y,Z",
            value_parser = parse_point_edit,
            allow_hyphen_values = true
        )]
        set_point: Vec<(usize, MrSeg0Point)>,
        /// Decrypted profile word: BLOCK:OFFSET=VALUE
        #[arg(
            long = "set-profile-u32",
            value_name = "BLOCK:OFFSET=VALUE",
            value_parser = parse_profile_edit
        )]
        set_profile_u32: Vec<(ProfileBlock, usize, u32)>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = TextRenderOptions {
        verbose: cli.verbose,
    };

    match cli.command {
        Command::Info { path, format } => {
            let session = open_session(&path, format);
            if cli.json {
                print_json(&render_session_json(&session, JsonStyle::CanonicalV1));
            } else {
                print!("{}", render_session_text(&session, options));
            }
        }
        Command::Actor { path } => {
            let payload = read_file(&path);
            let layout = detect_coord_layout(&payload);
            if cli.json {
                print_json(&render_coord_layout_json(&layout, &payload));
            } else {
                print!("{}", render_coord_layout_text(&layout, &payload, options));
            }
        }
        Command::Program {
            paths,
            game_payload,
        } => {
            let buffers: Vec<(String, Vec<u8>)> = paths
                .iter()
                .map(|p| (p.display().to_string(), read_file(p)))
                .collect();
            let candidates: Vec<ProgramCandidate<'_>> = buffers
                .iter()
                .enumerate()
                .map(|(index, (name, bytes))| ProgramCandidate {
                    segment: index,
                    name,
                    bytes,
                    is_game_payload: game_payload == Some(index),
                })
                .collect();

            let report = detect_program(&candidates).map(|location| {
                let bytes = &buffers[location.segment].1;
                ProgramReport {
                    vars: read_program_vars(bytes, &location.layout).unwrap_or_default(),
                    names: read_program_names(bytes, &location.layout),
                    location,
                }
            });
            if cli.json {
                print_json(&render_program_json(report.as_ref()));
            } else {
                print!("{}", render_program_text(report.as_ref(), options));
            }
        }
        Command::Garage { catalog, game_dir } => {
            let catalog = match catalog {
                Some(path) => GarageCatalog::from_file(&path).unwrap_or_else(|e| {
                    eprintln!("Error loading catalog {}:", path.display());
                    eprintln!("  {e}");
                    process::exit(1);
                }),
                None => GarageCatalog::load(game_dir.as_deref()),
            };
            if cli.json {
                print_json(&render_catalog_json(&catalog));
            } else {
                print!("{}", render_catalog_text(&catalog, options));
            }
        }
        Command::Edit {
            path,
            format,
            output,
            set_word,
            set_times,
            set_name,
            set_point,
            set_profile_u32,
        } => {
            let edit_count = set_word.len()
                + set_times.len()
                + set_name.len()
                + set_point.len()
                + set_profile_u32.len();
            if edit_count == 0 {
                eprintln!("edit requires at least one --set-* flag");
                process::exit(2);
            }

            let mut session = open_session(&path, format);
            for (index, value) in set_word {
                apply(session.set_mr_profile_word(index, value), "word");
            }
            for (index, a, b) in set_times {
                apply(session.set_mr_times_values(index, a, b), "times");
            }
            for (index, name) in set_name {
                apply(session.set_mr_times_name(index, &name), "name");
            }
            for (index, point) in set_point {
                apply(session.set_mr_seg0_point(index, point), "point");
            }
            for (block, offset, value) in set_profile_u32 {
                apply(session.set_profile_u32(block, offset, value), "profile word");
            }
            debug!(edits = edit_count, "edits applied");

            let edited = session.to_bytes_modified().unwrap_or_else(|e| {
                eprintln!("Error creating modified save bytes: {e}");
                process::exit(1);
            });
            fs::write(&output, edited).unwrap_or_else(|e| {
                eprintln!("Error writing {}: {e}", output.display());
                process::exit(1);
            });

            if cli.json {
                print_json(&render_session_json(&session, JsonStyle::CanonicalV1));
            } else {
                println!("Wrote edited save to {}", output.display());
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    })
}

fn open_session(path: &Path, format: Option<FormatArg>) -> Session {
    let bytes = read_file(path);
    Engine::new()
        .open_bytes(bytes, format.map(FormatArg::to_core))
        .unwrap_or_else(|e| {
            eprintln!("Error parsing save file: {}", path.display());
            eprintln!("  {e}");
            process::exit(1);
        })
}

fn apply(result: Result<(), mafia_core::core_api::CoreError>, what: &str) {
    if let Err(e) = result {
        eprintln!("Error applying {what} edit: {e}");
        process::exit(1);
    }
}

fn print_json(value: &JsonValue) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}

fn split_edit(value: &str) -> Result<(&str, &str), String> {
    value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {value:?}"))
}

fn parse_index(value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid index {value:?}"))
}

fn parse_u32_value(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| format!("invalid u32 value {value:?}"))
}

fn parse_word_edit(value: &str) -> Result<(usize, u32), String> {
    let (index, word) = split_edit(value)?;
    Ok((parse_index(index)?, parse_u32_value(word)?))
}

fn parse_times_edit(value: &str) -> Result<(usize, u32, u32), String> {
    let (index, values) = split_edit(value)?;
    let (a, b) = values
        .split_once(',')
        .ok_or_else(|| format!("expected INDEX=A,B, got {value:?}"))?;
    Ok((parse_index(index)?, parse_u32_value(a)?, parse_u32_value(b)?))
}

fn parse_name_edit(value: &str) -> Result<(usize, String), String> {
    let (index, name) = split_edit(value)?;
    Ok((parse_index(index)?, name.to_string()))
}

fn parse_point_edit(value: &str) -> Result<(usize, MrSeg0Point), String> {
    let (index, coords) = split_edit(value)?;
    let coords: Vec<f32> = coords
        .split(',')
        .map(|c| {
            c.trim()
                .parse::<f32>()
                .map_err(|_| format!("invalid coordinate {c:?}"))
        })
        .collect::<Result<_, _>>()?;
    let [x, y, z] = coords[..] else {
        return Err(format!("expected INDEX=X,Y,Z, got {value:?}"));
    };
    Ok((parse_index(index)?, MrSeg0Point { x, y, z }))
}

fn parse_profile_edit(value: &str) -> Result<(ProfileBlock, usize, u32), String> {
    let (target, word) = split_edit(value)?;
    let (block, offset) = target
        .split_once(':')
        .ok_or_else(|| format!("expected BLOCK:OFFSET=VALUE, got {value:?}"))?;
    let block = ProfileBlock::ALL
        .into_iter()
        .find(|b| b.name().eq_ignore_ascii_case(block.trim()))
        .ok_or_else(|| {
            format!("unknown profile block {block:?} (core, block720, block92, block156)")
        })?;
    let offset = parse_u32_value(offset)? as usize;
    Ok((block, offset, parse_u32_value(word)?))
}
