//! Terminal display surface
//!
//! Prints `SurfaceUpdate`s and turns typed lines into commands. Which
//! command a line becomes depends on the input controls the session
//! last enabled: a name while disconnected, a chat line while active.

use std::io::{BufRead, Write};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::ClientCommand;
use crate::config::OutputMode;
use crate::event::{Controls, RenderedEvent, SurfaceUpdate, UserIntent};

/// Typed command that always exits
pub const QUIT_COMMAND: &str = "/quit";

/// Typed command that closes the active session
pub const DISCONNECT_COMMAND: &str = "/disconnect";

pub struct TerminalSurface {
    output: OutputMode,
    color: bool,
    controls: Controls,
}

impl TerminalSurface {
    pub fn new(output: OutputMode, color: bool) -> Self {
        Self {
            output,
            color,
            controls: Controls::default(),
        }
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Apply an update, returning the line to print (if any)
    pub fn render(&mut self, update: &SurfaceUpdate) -> Option<String> {
        if let SurfaceUpdate::Controls { controls } = update {
            self.controls = *controls;
        }

        match self.output {
            OutputMode::Json => match serde_json::to_string(update) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!("Failed to serialize update: {}", e);
                    None
                }
            },
            OutputMode::Text => self.render_text(update),
        }
    }

    fn render_text(&self, update: &SurfaceUpdate) -> Option<String> {
        match update {
            SurfaceUpdate::Render { event } => Some(self.render_event(event)),
            SurfaceUpdate::Status { online, text } => {
                let indicator = if *online { "online" } else { "offline" };
                Some(format!("[{}] {}", indicator, text))
            }
            SurfaceUpdate::Controls { .. } => None,
        }
    }

    fn render_event(&self, event: &RenderedEvent) -> String {
        match event {
            RenderedEvent::System { text } => format!("* {}", text),
            RenderedEvent::User {
                sender,
                body,
                color,
            } if self.color => {
                let (r, g, b) = color.to_rgb();
                format!(
                    "\x1b[1;97;48;2;{};{};{}m {} \x1b[0m {}",
                    r, g, b, sender, body
                )
            }
            RenderedEvent::User { sender, body, .. } => format!("{}: {}", sender, body),
        }
    }

    /// Map a typed line to a client command
    pub fn route_input(&self, line: &str) -> Option<ClientCommand> {
        let trimmed = line.trim();
        if trimmed == QUIT_COMMAND {
            return Some(ClientCommand::Shutdown);
        }

        if self.controls.identity_input {
            // validation happens in the session so rejections are shown
            return Some(ClientCommand::Intent(UserIntent::Connect(line.to_string())));
        }

        if self.controls.message_input {
            if trimmed == DISCONNECT_COMMAND {
                return Some(ClientCommand::Intent(UserIntent::Disconnect));
            }
            if trimmed.is_empty() {
                return None;
            }
            return Some(ClientCommand::Intent(UserIntent::Send(trimmed.to_string())));
        }

        debug!("Input ignored while connecting");
        None
    }

    /// Bridge typed lines to the client and updates to `out`
    ///
    /// Input stops after `Shutdown` is sent (from `/quit` or end of input)
    /// or once the client is gone; updates are printed until every
    /// sender has been dropped, so nothing queued before exit is lost.
    pub async fn pump<W: Write>(
        mut self,
        mut input: mpsc::Receiver<String>,
        commands: mpsc::Sender<ClientCommand>,
        mut updates: mpsc::UnboundedReceiver<SurfaceUpdate>,
        out: &mut W,
    ) -> std::io::Result<()> {
        let mut commands = Some(commands);

        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(update) = update else {
                        break;
                    };
                    if let Some(text) = self.render(&update) {
                        writeln!(out, "{}", text)?;
                        out.flush()?;
                    }
                }
                line = input.recv(), if commands.is_some() => {
                    let command = match line {
                        Some(line) => self.route_input(&line),
                        None => {
                            debug!("Input closed");
                            Some(ClientCommand::Shutdown)
                        }
                    };
                    if let Some(command) = command {
                        let shutdown = matches!(command, ClientCommand::Shutdown);
                        let sent = match commands.as_ref() {
                            Some(tx) => tx.send(command).await.is_ok(),
                            None => false,
                        };
                        if !sent {
                            warn!("Client stopped, no longer reading input");
                        }
                        if !sent || shutdown {
                            commands = None;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Read lines on a plain thread and forward them to `tx`
///
/// Blocking reads stay off the runtime so exiting never waits on them.
/// The thread ends at end of input, on a read error, or once `tx`'s
/// receiver is dropped.
pub fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<String>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("Line reader finished");
    })
}
