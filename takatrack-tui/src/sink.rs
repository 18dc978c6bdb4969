use takatrack_core::{
    model::{AlertEvent, RenderFrame},
    ports::{AlertSink, FetchError, RenderSink},
};
use tokio::sync::mpsc::UnboundedSender;

/// Messages forwarded from the refresh loop to the UI loop.
#[derive(Debug)]
pub(crate) enum UiEvent {
    Frame(RenderFrame),
    Alert(AlertEvent),
    FetchFailed(String),
}

/// Render surface and alert channel backed by an mpsc channel into the UI loop.
pub(crate) struct ChannelSink {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelSink {
    pub(crate) fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn forward(&self, event: UiEvent) {
        // The receiver only goes away while the UI is shutting down.
        if self.tx.send(event).is_err() {
            tracing::debug!("ui: event dropped after shutdown");
        }
    }
}

impl RenderSink for ChannelSink {
    fn render(&self, frame: &RenderFrame) {
        self.forward(UiEvent::Frame(frame.clone()));
    }

    fn fetch_failed(&self, error: &FetchError) {
        self.forward(UiEvent::FetchFailed(format!("Refresh failed: {error}")));
    }
}

impl AlertSink for ChannelSink {
    fn alert(&self, event: &AlertEvent) {
        self.forward(UiEvent::Alert(event.clone()));
    }
}
