use sheed_api::ChannelState;

use crate::form::FormState;
use crate::render::ResultPanel;

pub const SUBMIT_LABEL: &str = "Submit";
pub const SUBMIT_BUSY_LABEL: &str = "Delineating...";

/// Append-only log area. Hidden until the first line arrives; the scroll
/// position follows the newest line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArea {
    lines: Vec<String>,
    visible: bool,
    scroll: usize,
}

impl LogArea {
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        self.visible = true;
        self.scroll = self.lines.len() - 1;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Index of the line scrolled into view.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn newest(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    enabled: bool,
    label: &'static str,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self {
            enabled: true,
            label: SUBMIT_LABEL,
        }
    }
}

impl SubmitControl {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub(crate) fn begin(&mut self) {
        self.enabled = false;
        self.label = SUBMIT_BUSY_LABEL;
    }

    pub(crate) fn restore(&mut self) {
        *self = Self::default();
    }
}

/// Everything the page shows. Only the UI runtime mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub form: FormState,
    session_id: String,
    channel_state: ChannelState,
    log: LogArea,
    submit: SubmitControl,
    result: Option<ResultPanel>,
}

impl PageView {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            session_id: String::new(),
            channel_state: ChannelState::Connecting,
            log: LogArea::default(),
            submit: SubmitControl::default(),
            result: None,
        }
    }

    /// Latest identifier issued by the channel; empty until the first one.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel_state
    }

    pub fn log(&self) -> &LogArea {
        &self.log
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.submit
    }

    pub fn result(&self) -> Option<&ResultPanel> {
        self.result.as_ref()
    }

    pub fn is_result_visible(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn set_session_id(&mut self, value: String) {
        self.session_id = value;
    }

    pub(crate) fn set_channel_state(&mut self, state: ChannelState) {
        self.channel_state = state;
    }

    pub(crate) fn log_mut(&mut self) -> &mut LogArea {
        &mut self.log
    }

    pub(crate) fn submit_mut(&mut self) -> &mut SubmitControl {
        &mut self.submit
    }

    pub(crate) fn show_result(&mut self, panel: ResultPanel) {
        self.result = Some(panel);
    }

    pub(crate) fn clear_result(&mut self) -> bool {
        self.result.take().is_some()
    }
}
