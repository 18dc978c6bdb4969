use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};
use takatrack_core::model::{
    AlertEvent, ClassifiedEntity, FleetSummary, RenderFrame, Viewport, ViewportUpdate,
};

/// Alert log entries kept on screen.
pub(crate) const ALERT_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pane {
    Bins,
    Alerts,
}

pub(crate) struct LoggedAlert {
    pub received_at: DateTime<Local>,
    pub event: AlertEvent,
}

pub(crate) struct App {
    pub endpoint: String,
    pub focus: Pane,

    pub bins: Vec<ClassifiedEntity>,
    pub bin_index: usize,
    pub summary: FleetSummary,
    pub viewport: Option<Viewport>,
    pub dropped: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub cycle: Option<u64>,

    pub alerts: VecDeque<LoggedAlert>,
    pub alert_index: usize,

    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            focus: Pane::Bins,
            bins: Vec::new(),
            bin_index: 0,
            summary: FleetSummary::default(),
            viewport: None,
            dropped: 0,
            last_refresh: None,
            cycle: None,
            alerts: VecDeque::with_capacity(ALERT_LOG_CAPACITY),
            alert_index: 0,
            error_message: None,
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.last_refresh.is_none() && self.error_message.is_none()
    }

    /// Replace the displayed fleet with a freshly applied frame.
    pub(crate) fn apply_frame(&mut self, frame: RenderFrame) {
        if let ViewportUpdate::Fit(viewport) = frame.viewport {
            self.viewport = Some(viewport);
        }
        self.bins = frame.entities;
        self.summary = frame.summary;
        self.dropped = frame.dropped;
        self.last_refresh = Some(frame.refreshed_at);
        self.cycle = Some(frame.cycle);
        self.error_message = None;
        self.bin_index = self.bin_index.min(self.bins.len().saturating_sub(1));
    }

    /// Newest alerts go first; the oldest fall off past the capacity.
    ///
    /// A selection in the focused alert pane stays on the entry it was on.
    pub(crate) fn push_alert(&mut self, event: AlertEvent) {
        if self.focus == Pane::Alerts && !self.alerts.is_empty() {
            self.alert_index += 1;
        }
        self.alerts.push_front(LoggedAlert {
            received_at: Local::now(),
            event,
        });
        self.alerts.truncate(ALERT_LOG_CAPACITY);
        self.alert_index = self.alert_index.min(self.alerts.len().saturating_sub(1));
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        self.error_message = Some(message);
    }

    pub(crate) fn clear_alerts(&mut self) {
        self.alerts.clear();
        self.alert_index = 0;
    }

    pub(crate) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Bins => Pane::Alerts,
            Pane::Alerts => Pane::Bins,
        };
    }

    pub(crate) fn select_previous(&mut self) {
        let index = self.focused_index_mut();
        *index = index.saturating_sub(1);
    }

    pub(crate) fn select_next(&mut self) {
        let len = match self.focus {
            Pane::Bins => self.bins.len(),
            Pane::Alerts => self.alerts.len(),
        };
        let index = self.focused_index_mut();
        if *index + 1 < len {
            *index += 1;
        }
    }

    fn focused_index_mut(&mut self) -> &mut usize {
        match self.focus {
            Pane::Bins => &mut self.bin_index,
            Pane::Alerts => &mut self.alert_index,
        }
    }
}
