// src/main.rs
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};

use sigview::session::{load_config, GraphRequest, Session, SignalKind, ViewerConfig};
use sigview::SignalBuffer;

/// One line of input on stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Command {
    Ingest {
        kind: SignalKind,
        data: Vec<Vec<f64>>,
        fs: u32,
    },
    Upload {
        kind: SignalKind,
        text: String,
        fs: u32,
    },
    Demo {
        kind: SignalKind,
    },
    Graph(GraphRequest),
    Spectrogram {
        buffer_id: String,
    },
    Waveform {
        buffer_id: String,
        #[serde(default)]
        play_pos: f64,
    },
    Chunk {
        buffer_id: String,
        #[serde(default)]
        position: usize,
    },
    DopplerGenerate {
        buffer_id: String,
        v_start: f64,
        v_end: f64,
        f_source: Option<f64>,
    },
    DopplerSimulate {
        buffer_id: String,
        v_start: f64,
        v_end: f64,
        f_source: Option<f64>,
    },
    DopplerPredict {
        buffer_id: String,
    },
    Downsample {
        buffer_id: String,
        #[serde(default)]
        new_rate: i64,
    },
}

fn dispatch(session: &Session, command: Command) -> Result<Value> {
    let value = match command {
        Command::Ingest { kind, data, fs } => {
            serde_json::to_value(session.ingest(kind, SignalBuffer::new(data, fs)?)?)?
        }
        Command::Upload { kind, text, fs } => serde_json::to_value(session.upload(kind, text.as_bytes(), fs)?)?,
        Command::Demo { kind } => serde_json::to_value(session.demo(kind)?)?,
        Command::Graph(request) => serde_json::to_value(session.graph(&request)?)?,
        Command::Spectrogram { buffer_id } => serde_json::to_value(session.spectrogram(&buffer_id)?)?,
        Command::Waveform { buffer_id, play_pos } => {
            serde_json::to_value(session.waveform(&buffer_id, play_pos)?)?
        }
        Command::Chunk { buffer_id, position } => serde_json::to_value(session.chunk(&buffer_id, position)?)?,
        Command::DopplerGenerate {
            buffer_id,
            v_start,
            v_end,
            f_source,
        } => serde_json::to_value(session.doppler_generate(&buffer_id, v_start, v_end, f_source)?)?,
        Command::DopplerSimulate {
            buffer_id,
            v_start,
            v_end,
            f_source,
        } => serde_json::to_value(session.doppler_simulate(&buffer_id, v_start, v_end, f_source)?)?,
        Command::DopplerPredict { buffer_id } => serde_json::to_value(session.doppler_predict(&buffer_id)?)?,
        Command::Downsample { buffer_id, new_rate } => {
            serde_json::to_value(session.downsample(&buffer_id, new_rate)?)?
        }
    };
    Ok(value)
}

fn handle_line(session: &Session, line: &str) -> Value {
    let result = serde_json::from_str::<Command>(line)
        .context("malformed command")
        .and_then(|command| dispatch(session, command));
    match result {
        Ok(value) => value,
        Err(err) => {
            error!("command failed: {err:#}");
            json!({ "success": false, "error": format!("{err:#}") })
        }
    }
}

fn parse_config() -> Result<ViewerConfig> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => Ok(ViewerConfig::default()),
        Some("--config") => {
            let Some(path) = args.get(2) else {
                bail!("--config needs a path");
            };
            load_config(path).with_context(|| format!("loading config from {path}"))
        }
        Some(other) => bail!("unknown argument {other}; usage: sigview [--config <file.yaml>]"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let config = parse_config()?;
    let session = Session::new(config)?;
    info!("sigview ready, reading commands from stdin");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&session, &line);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}
