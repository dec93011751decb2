//! Niri IPC window system.
//!
//! Protocol:
//! - Socket path from `$NIRI_SOCKET` environment variable
//! - One JSON request per connection, on a single line
//! - Response format: `{"Ok": ...}` or `{"Err": "message"}`
//! - `"EventStream"` turns the connection into a stream of JSON event lines
//!
//! The event reader keeps a shared snapshot up to date and forwards the
//! differences as [`WindowEvent`]s. Commands are queued to a writer task.

use futures_util::StreamExt;
use qmpanel_core::window::WindowSystem;
use qmpanel_types::{
    DesktopId, DesktopInfo, WindowCommand, WindowEvent, WindowHandle, WindowInfo, WindowProps,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct NiriWindow {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    workspace_id: Option<u64>,
    #[serde(default)]
    is_focused: bool,
    #[serde(default)]
    is_urgent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct NiriWorkspace {
    id: u64,
    #[serde(default)]
    idx: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    is_focused: bool,
}

/// Events of the Niri event stream the panel cares about. Anything else
/// fails to parse and is skipped.
#[derive(Debug, Clone, Deserialize)]
enum NiriEvent {
    WorkspacesChanged { workspaces: Vec<NiriWorkspace> },
    WorkspaceActivated { id: u64, focused: bool },
    WindowsChanged { windows: Vec<NiriWindow> },
    WindowOpenedOrChanged { window: NiriWindow },
    WindowClosed { id: u64 },
    WindowFocusChanged { id: Option<u64> },
    WindowUrgencyChanged { id: u64, urgent: bool },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NiriReply {
    Ok {
        #[serde(rename = "Ok")]
        _ok: serde_json::Value,
    },
    Err {
        #[serde(rename = "Err")]
        err: String,
    },
}

#[derive(Debug, Serialize)]
enum NiriRequest {
    Action(NiriAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
enum WorkspaceReference {
    Id(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
enum NiriAction {
    FocusWindow {
        id: u64,
    },
    CloseWindow {
        id: Option<u64>,
    },
    /// Acts on the focused column
    MaximizeColumn {},
    MoveWindowToWorkspace {
        window_id: Option<u64>,
        reference: WorkspaceReference,
        focus: bool,
    },
}

/// Niri actions carrying out `command`. Empty when Niri has no equivalent.
fn actions_for(command: &WindowCommand) -> Vec<NiriAction> {
    match *command {
        WindowCommand::Activate { handle } => vec![NiriAction::FocusWindow { id: handle.0 }],
        WindowCommand::Close { handle } => vec![NiriAction::CloseWindow {
            id: Some(handle.0),
        }],
        WindowCommand::Maximize { handle } | WindowCommand::DeMaximize { handle } => vec![
            NiriAction::FocusWindow { id: handle.0 },
            NiriAction::MaximizeColumn {},
        ],
        WindowCommand::MoveToDesktop { handle, desktop } => {
            vec![NiriAction::MoveWindowToWorkspace {
                window_id: Some(handle.0),
                reference: WorkspaceReference::Id(desktop.0),
                focus: false,
            }]
        }
        WindowCommand::Minimize { .. }
        | WindowCommand::Shade { .. }
        | WindowCommand::Unshade { .. }
        | WindowCommand::Move { .. }
        | WindowCommand::Resize { .. } => Vec::new(),
    }
}

fn changed_props(old: &NiriWindow, new: &NiriWindow) -> WindowProps {
    let mut props = WindowProps::empty();
    props.set(WindowProps::TITLE, old.title != new.title);
    props.set(WindowProps::ICON, old.app_id != new.app_id);
    props.set(
        WindowProps::DESKTOP | WindowProps::SCREEN,
        old.workspace_id != new.workspace_id,
    );
    props.set(WindowProps::STATE, old.is_urgent != new.is_urgent);
    props
}

/// Compositor state as last reported by the event stream.
#[derive(Debug, Default)]
struct NiriState {
    windows: Vec<NiriWindow>,
    workspaces: Vec<NiriWorkspace>,
    focused: Option<u64>,
}

impl NiriState {
    fn focused_workspace(&self) -> Option<&NiriWorkspace> {
        self.workspaces.iter().find(|w| w.is_focused)
    }

    fn current_desktop(&self) -> Option<DesktopId> {
        self.focused_workspace().map(|w| DesktopId(w.id))
    }

    fn current_screen(&self) -> Option<String> {
        self.focused_workspace().and_then(|w| w.output.clone())
    }

    fn output_of(&self, workspace_id: Option<u64>) -> Option<String> {
        let id = workspace_id?;
        self.workspaces
            .iter()
            .find(|w| w.id == id)
            .and_then(|w| w.output.clone())
    }

    fn window_info(&self, window: &NiriWindow) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(window.id),
            name: window
                .title
                .clone()
                .or_else(|| window.app_id.clone())
                .unwrap_or_default(),
            icon: window.app_id.clone(),
            is_urgent: window.is_urgent,
            desktop: window.workspace_id.map(DesktopId),
            screen: self.output_of(window.workspace_id),
            ..Default::default()
        }
    }

    fn desktops(&self) -> Vec<DesktopInfo> {
        let mut workspaces: Vec<&NiriWorkspace> = self.workspaces.iter().collect();
        workspaces.sort_by(|a, b| (&a.output, a.idx).cmp(&(&b.output, b.idx)));
        workspaces
            .into_iter()
            .map(|w| DesktopInfo {
                id: DesktopId(w.id),
                name: w.name.clone().unwrap_or_else(|| w.idx.to_string()),
            })
            .collect()
    }

    fn set_focused(&mut self, id: Option<u64>) -> Vec<WindowEvent> {
        for window in &mut self.windows {
            window.is_focused = Some(window.id) == id;
        }
        if self.focused == id {
            return Vec::new();
        }
        self.focused = id;
        vec![WindowEvent::ActiveChanged {
            handle: id.map(WindowHandle),
        }]
    }

    fn workspace_events(
        &self,
        desktop: Option<DesktopId>,
        screen: Option<String>,
    ) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        if self.current_desktop() != desktop {
            events.push(WindowEvent::CurrentDesktopChanged {
                desktop: self.current_desktop(),
            });
        }
        if self.current_screen() != screen {
            events.push(WindowEvent::CurrentScreenChanged {
                screen: self.current_screen(),
            });
        }
        events
    }

    /// Fold `event` into the snapshot and return what changed.
    fn apply(&mut self, event: NiriEvent) -> Vec<WindowEvent> {
        match event {
            NiriEvent::WindowsChanged { windows } => {
                let mut events: Vec<WindowEvent> = self
                    .windows
                    .iter()
                    .filter(|old| !windows.iter().any(|w| w.id == old.id))
                    .map(|old| WindowEvent::Removed {
                        handle: WindowHandle(old.id),
                    })
                    .collect();

                for new in &windows {
                    let handle = WindowHandle(new.id);
                    match self.windows.iter().find(|w| w.id == new.id) {
                        Some(old) => {
                            let props = changed_props(old, new);
                            if !props.is_empty() {
                                events.push(WindowEvent::Changed { handle, props });
                            }
                        }
                        None => events.push(WindowEvent::Added { handle }),
                    }
                }

                let focused = windows.iter().find(|w| w.is_focused).map(|w| w.id);
                self.windows = windows;
                events.extend(self.set_focused(focused));
                events
            }
            NiriEvent::WindowOpenedOrChanged { window } => {
                let handle = WindowHandle(window.id);
                let focused = window.is_focused.then_some(window.id);
                let mut events = Vec::new();

                if let Some(old) = self.windows.iter_mut().find(|w| w.id == window.id) {
                    let props = changed_props(old, &window);
                    *old = window;
                    if !props.is_empty() {
                        events.push(WindowEvent::Changed { handle, props });
                    }
                } else {
                    self.windows.push(window);
                    events.push(WindowEvent::Added { handle });
                }

                if focused.is_some() {
                    events.extend(self.set_focused(focused));
                }
                events
            }
            NiriEvent::WindowClosed { id } => {
                let before = self.windows.len();
                self.windows.retain(|w| w.id != id);
                if self.windows.len() == before {
                    return Vec::new();
                }

                let mut events = vec![WindowEvent::Removed {
                    handle: WindowHandle(id),
                }];
                if self.focused == Some(id) {
                    events.extend(self.set_focused(None));
                }
                events
            }
            NiriEvent::WindowFocusChanged { id } => self.set_focused(id),
            NiriEvent::WindowUrgencyChanged { id, urgent } => {
                match self.windows.iter_mut().find(|w| w.id == id) {
                    Some(window) if window.is_urgent != urgent => {
                        window.is_urgent = urgent;
                        vec![WindowEvent::Changed {
                            handle: WindowHandle(id),
                            props: WindowProps::STATE,
                        }]
                    }
                    _ => Vec::new(),
                }
            }
            NiriEvent::WorkspacesChanged { workspaces } => {
                let desktop = self.current_desktop();
                let screen = self.current_screen();
                self.workspaces = workspaces;
                self.workspace_events(desktop, screen)
            }
            NiriEvent::WorkspaceActivated { id, focused } => {
                let desktop = self.current_desktop();
                let screen = self.current_screen();
                let output = self
                    .workspaces
                    .iter()
                    .find(|w| w.id == id)
                    .map(|w| w.output.clone());

                let Some(output) = output else {
                    trace!("Activation of unknown workspace {}", id);
                    return Vec::new();
                };
                for workspace in &mut self.workspaces {
                    if workspace.output == output {
                        workspace.is_active = workspace.id == id;
                    }
                    if focused {
                        workspace.is_focused = workspace.id == id;
                    }
                }
                self.workspace_events(desktop, screen)
            }
        }
    }
}

/// [`WindowSystem`] backed by the Niri IPC socket.
pub struct NiriWindowSystem {
    state: Arc<Mutex<NiriState>>,
    actions: UnboundedSender<NiriAction>,
}

impl NiriWindowSystem {
    /// Start the event reader and command writer tasks. Window events are
    /// delivered on the returned receiver.
    pub fn connect(socket: PathBuf) -> (Self, UnboundedReceiver<WindowEvent>) {
        let state = Arc::new(Mutex::new(NiriState::default()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let reader_state = Arc::clone(&state);
        let reader_socket = socket.clone();
        tokio::spawn(async move {
            match read_events(&reader_socket, &reader_state, &event_tx).await {
                Ok(()) => info!("Niri event stream closed"),
                Err(e) => error!("Niri event stream failed: {}", e),
            }
        });
        tokio::spawn(write_actions(socket, action_rx));

        (
            Self {
                state,
                actions: action_tx,
            },
            event_rx,
        )
    }

    fn with_state<T: Default>(&self, f: impl FnOnce(&NiriState) -> T) -> T {
        match self.state.lock() {
            Ok(state) => f(&state),
            Err(_) => {
                error!("Niri state mutex poisoned");
                T::default()
            }
        }
    }
}

impl WindowSystem for NiriWindowSystem {
    fn enumerate_windows(&self) -> Vec<WindowHandle> {
        self.with_state(|s| s.windows.iter().map(|w| WindowHandle(w.id)).collect())
    }

    fn window_info(&self, handle: WindowHandle) -> Option<WindowInfo> {
        self.with_state(|s| {
            s.windows
                .iter()
                .find(|w| w.id == handle.0)
                .map(|w| s.window_info(w))
        })
    }

    fn active_window(&self) -> Option<WindowHandle> {
        self.with_state(|s| s.focused.map(WindowHandle))
    }

    fn current_desktop(&self) -> Option<DesktopId> {
        self.with_state(NiriState::current_desktop)
    }

    fn desktops(&self) -> Vec<DesktopInfo> {
        self.with_state(NiriState::desktops)
    }

    fn current_screen(&self) -> Option<String> {
        self.with_state(NiriState::current_screen)
    }

    fn send(&self, command: WindowCommand) {
        let actions = actions_for(&command);
        if actions.is_empty() {
            debug!("Niri has no equivalent of {:?}", command);
            return;
        }
        for action in actions {
            if self.actions.send(action).is_err() {
                warn!("Niri command writer is gone, dropping {:?}", command);
                return;
            }
        }
    }
}

async fn read_events(
    socket: &Path,
    state: &Mutex<NiriState>,
    tx: &UnboundedSender<WindowEvent>,
) -> std::io::Result<()> {
    let mut stream = UnixStream::connect(socket).await?;
    stream.write_all(b"\"EventStream\"\n").await?;
    debug!("Subscribed to Niri event stream at {:?}", socket);

    let mut lines = FramedRead::new(stream, LinesCodec::new());
    while let Some(line) = lines.next().await {
        let line = line.map_err(std::io::Error::other)?;
        trace!("Niri event: {}", line);

        let Ok(event) = serde_json::from_str::<NiriEvent>(&line) else {
            continue;
        };
        let events = {
            let Ok(mut state) = state.lock() else {
                error!("Niri state mutex poisoned, stopping event reader");
                return Ok(());
            };
            state.apply(event)
        };

        for event in events {
            if tx.send(event).is_err() {
                debug!("Window event receiver dropped");
                return Ok(());
            }
        }
    }
    Ok(())
}

async fn write_actions(socket: PathBuf, mut rx: UnboundedReceiver<NiriAction>) {
    while let Some(action) = rx.recv().await {
        if let Err(e) = send_action(&socket, &action).await {
            warn!("Niri action {:?} failed: {}", action, e);
        }
    }
}

async fn send_action(socket: &Path, action: &NiriAction) -> std::io::Result<()> {
    let request = serde_json::to_string(&NiriRequest::Action(action.clone()))?;
    trace!("Niri IPC request: {}", request);

    let mut stream = UnixStream::connect(socket).await?;
    stream.write_all(request.as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let mut lines = FramedRead::new(stream, LinesCodec::new());
    if let Some(reply) = lines.next().await {
        let reply = reply.map_err(std::io::Error::other)?;
        trace!("Niri IPC response: {}", reply);
        if let Ok(NiriReply::Err { err }) = serde_json::from_str::<NiriReply>(&reply) {
            warn!("Niri IPC error: {}", err);
        }
    }
    Ok(())
}
