use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use precis_ipc::{
    Command, IpcError, RequestState, Response, SessionStatus, SubmitParams, SOCKET_PATH,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Parser)]
#[command(name = "precisctl")]
#[command(about = "Control a running precis session", long_about = None)]
struct Cli {
    /// Socket of the running precis instance
    #[arg(long, default_value = SOCKET_PATH)]
    socket: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the current timer phase
    Start,
    /// Pause the timer
    Pause,
    /// Reload the current phase's full duration
    Reset,
    /// Jump to the other phase
    Skip,
    /// Show timer, request and focus state
    Status,
    /// Submit text for summarization
    Submit {
        /// Text to summarize
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "40")]
        min_length: String,
        #[arg(long, default_value = "160")]
        max_length: String,
        #[arg(long, default_value = "6")]
        num_beams: String,
        #[arg(long, default_value = "2")]
        extractive_k: String,
    },
    /// Clear the summarization result
    Clear,
    /// Report that the user left
    Away,
    /// Report that the user came back
    Back,
    /// Hide the focus banner
    Dismiss,
    /// Turn the focus monitor on or off
    FocusAlerts {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Show, replace or clear the scratch notes
    Notes {
        #[arg(short, long, conflicts_with = "clear")]
        set: Option<String>,
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Convert CLI command to IPC command
    let command = match cli.command {
        Commands::Start => Command::Start,
        Commands::Pause => Command::Pause,
        Commands::Reset => Command::Reset,
        Commands::Skip => Command::Skip,
        Commands::Status => Command::Status,
        Commands::Submit {
            text,
            file,
            min_length,
            max_length,
            num_beams,
            extractive_k,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                (None, None) => bail!("pass --text or --file"),
            };
            Command::Submit(SubmitParams {
                text,
                min_length,
                max_length,
                num_beams,
                extractive_k,
            })
        }
        Commands::Clear => Command::ClearRequest,
        Commands::Away => Command::FocusLost,
        Commands::Back => Command::FocusGained,
        Commands::Dismiss => Command::Dismiss,
        Commands::FocusAlerts { state } => Command::SetFocusAlerts(state == "on"),
        Commands::Notes { set: Some(text), .. } => Command::SetNotes(text),
        Commands::Notes { clear: true, .. } => Command::ClearNotes,
        Commands::Notes { .. } => Command::GetNotes,
    };

    let response = send_command(&cli.socket, command).await?;

    match response {
        Response::Ok => println!("OK"),
        Response::Status(status) => print_status(&status),
        Response::Notes(notes) => println!("{}", notes),
        Response::Error(e) => bail!(e),
    }

    Ok(())
}

fn print_status(status: &SessionStatus) {
    let timer = &status.timer;
    println!(
        "Timer:   {} {:02}:{:02} / {:02}:{:02} ({})",
        timer.phase.label(),
        timer.remaining / 60,
        timer.remaining % 60,
        timer.total / 60,
        timer.total % 60,
        if timer.running { "running" } else { "paused" }
    );

    let request = &status.request;
    println!("Request: {:?}", request.state);
    if request.state == RequestState::Failed {
        if let Some(error) = &request.error {
            println!("Error:   {}", error);
        }
    }
    if let Some(summary) = &request.abstractive_summary {
        println!("\nAbstractive:\n{}", summary);
    }
    if let Some(summary) = &request.extractive_summary {
        println!("\nExtractive:\n{}", summary);
    }
    if let Some(note) = &request.note {
        println!("\nNote:    {}", note);
    }
    if let Some(params) = &request.used_generation_params {
        println!("Used generation params: {}", params);
    }

    let focus = &status.focus;
    println!(
        "Focus:   {} away, banner {}{}",
        focus.away_count,
        if focus.banner_visible { "shown" } else { "hidden" },
        if focus.enabled { "" } else { " (monitor off)" }
    );
}

async fn send_command(socket: &Path, cmd: Command) -> Result<Response, IpcError> {
    let mut stream = UnixStream::connect(socket).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound => {
            IpcError::ConnectionRefused
        }
        _ => IpcError::Io(e),
    })?;

    // Send command
    let mut msg = serde_json::to_vec(&cmd)?;
    msg.push(b'\n');
    stream.write_all(&msg).await?;

    // Read response
    let mut line = String::new();
    let n = BufReader::new(stream).read_line(&mut line).await?;
    if n == 0 {
        return Err(IpcError::NoResponse);
    }
    Ok(serde_json::from_str(&line)?)
}
