//! The boundary towards a running external viewer.
//!
//! The viewer is a separate application; this module only pushes JSON
//! payloads over an established display channel. The transport is abstracted
//! behind [`DisplayChannel`] so embedders (notebook kernels, websockets) plug
//! in their own and tests use an in-memory one.

use crate::writer::OutputDocument;
use crate::{GgmetError, Result};
use serde_json::Value;

/// Event kinds the viewer listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Replace the rendered map with a new map document.
    LoadMap,
    /// Feed a new data document into the current map.
    LoadData,
}

impl ViewerEvent {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerEvent::LoadMap => "load_map",
            ViewerEvent::LoadData => "load_data",
        }
    }
}

impl std::fmt::Display for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transport that delivers events to a live viewer instance.
pub trait DisplayChannel {
    fn post(&mut self, event: ViewerEvent, payload: &str) -> Result<()>;
}

/// Handle on a (possibly not yet connected) viewer.
#[derive(Default)]
pub struct Viewer {
    channel: Option<Box<dyn DisplayChannel>>,
}

impl Viewer {
    /// A viewer handle with no channel yet; pushes fail until [`connect`] is
    /// called.
    ///
    /// [`connect`]: Viewer::connect
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a display channel.
    pub fn connect(&mut self, channel: Box<dyn DisplayChannel>) {
        self.channel = Some(channel);
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Push a map document into the running viewer.
    pub fn load_map(&mut self, map: &Value) -> Result<()> {
        let payload = serde_json::to_string(map)
            .map_err(|e| GgmetError::ViewerError(format!("failed to serialize map: {}", e)))?;
        self.post(ViewerEvent::LoadMap, &payload)
    }

    /// Push a data document into the running viewer.
    pub fn load_data(&mut self, document: &OutputDocument) -> Result<()> {
        let payload = serde_json::to_string(document)
            .map_err(|e| GgmetError::ViewerError(format!("failed to serialize data: {}", e)))?;
        self.post(ViewerEvent::LoadData, &payload)
    }

    fn post(&mut self, event: ViewerEvent, payload: &str) -> Result<()> {
        let channel = self.channel.as_mut().ok_or_else(|| {
            GgmetError::ViewerError(
                "no display channel established; connect a channel before pushing to the viewer"
                    .to_string(),
            )
        })?;
        channel.post(event, payload)
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("connected", &self.is_connected())
            .finish()
    }
}
