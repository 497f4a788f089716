//! Unix domain socket server for IPC

use std::path::Path;

use anyhow::Result;
use precis_ipc::{Command, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, info};

use crate::notes::NotesStore;
use crate::session::SessionHandle;

pub async fn start(
    socket_path: impl AsRef<Path>,
    session: SessionHandle,
    notes: NotesStore,
) -> Result<()> {
    let socket_path = socket_path.as_ref();
    // Remove old socket if it exists
    let _ = std::fs::remove_file(socket_path);

    let listener = UnixListener::bind(socket_path)?;
    info!("IPC server listening on {}", socket_path.display());
    serve(listener, session, notes).await;
    Ok(())
}

/// Accept connections until the session shuts down.
pub async fn serve(listener: UnixListener, session: SessionHandle, notes: NotesStore) {
    while session.is_connected() {
        match listener.accept().await {
            Ok((stream, _)) => {
                let session = session.clone();
                let notes = notes.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, session, notes).await {
                        error!("Error handling client: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    stream: UnixStream,
    session: SessionHandle,
    notes: NotesStore,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader.read_line(&mut line).await?;
    let response = match serde_json::from_str::<Command>(&line) {
        Ok(command) => dispatch(command, &session, &notes).await,
        Err(e) => Response::Error(format!("Unreadable command: {}", e)),
    };

    let mut response_json = serde_json::to_vec(&response)?;
    response_json.push(b'\n');
    writer.write_all(&response_json).await?;

    Ok(())
}

pub async fn dispatch(command: Command, session: &SessionHandle, notes: &NotesStore) -> Response {
    let applied = match command {
        Command::Start => session.start().await,
        Command::Pause => session.pause().await,
        Command::Reset => session.reset_timer().await,
        Command::Skip => session.skip().await,
        Command::Submit(params) => session.submit(params).await,
        Command::ClearRequest => session.clear_request().await,
        Command::FocusLost => session.focus_lost().await,
        Command::FocusGained => session.focus_gained().await,
        Command::Dismiss => session.dismiss().await,
        Command::SetFocusAlerts(enabled) => session.set_focus_alerts(enabled).await,
        Command::Status => return Response::Status(session.view().status()),
        Command::GetNotes => {
            return match notes.get() {
                Ok(text) => Response::Notes(text.unwrap_or_default()),
                Err(e) => Response::Error(e.to_string()),
            }
        }
        Command::SetNotes(text) => return notes_result(notes.set(&text)),
        Command::ClearNotes => return notes_result(notes.remove()),
    };
    match applied {
        Ok(view) => Response::Status(view.status()),
        Err(e) => Response::Error(e.to_string()),
    }
}

fn notes_result(result: Result<()>) -> Response {
    match result {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error(e.to_string()),
    }
}
