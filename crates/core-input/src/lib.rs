//! Terminal-backed event source.
//!
//! [`CrosstermSource`] blocks on `crossterm::event::poll` for at most the
//! requested timeout and translates the next terminal event. Events with no
//! meaning to the controller (mouse, focus, paste, unmapped keys) are reported
//! as a timeout so the caller's tick still runs.

mod key_token;

use anyhow::Result;
use core_events::{EventSource, InputEvent, KeyToken};
use crossterm::event::{self, Event as CEvent};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct CrosstermSource;

impl CrosstermSource {
    pub fn new() -> Self {
        Self
    }
}

#[inline]
pub(crate) fn log_key(token: &KeyToken) {
    tracing::trace!(target: "input", key = %token, "key");
}

#[inline]
pub(crate) fn log_ignored(kind: &'static str, len: usize) {
    tracing::trace!(target: "input", kind, len, "event_ignored");
}

/// Translate one crossterm event.
pub(crate) fn translate(ev: CEvent) -> Option<InputEvent> {
    match ev {
        CEvent::Key(key) => {
            let token = key_token::map_key_event(&key)?;
            log_key(&token);
            Some(InputEvent::Key(token))
        }
        CEvent::Resize(w, h) => {
            tracing::debug!(target: "input", width = w, height = h, "resize");
            Some(InputEvent::Resize(w, h))
        }
        CEvent::Paste(text) => {
            log_ignored("paste", text.len());
            None
        }
        CEvent::Mouse(_) => {
            log_ignored("mouse", 0);
            None
        }
        CEvent::FocusGained | CEvent::FocusLost => None,
    }
}

impl EventSource for CrosstermSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(translate(event::read()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::dispatcher::Dispatch;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::Registry;

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    #[derive(Clone, Debug)]
    struct CapturedEvent {
        target: String,
        fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<(String, String)>,
    }

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for Capture
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut collector = FieldCollector::default();
            event.record(&mut collector);
            let meta = event.metadata();
            self.events.lock().unwrap().push(CapturedEvent {
                target: meta.target().to_string(),
                fields: collector.fields,
            });
        }
    }

    fn captured<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
        let capture = Capture::default();
        let events = capture.events.clone();
        let dispatch = Dispatch::new(Registry::default().with(capture));
        tracing::dispatcher::with_default(&dispatch, f);
        let out = events.lock().unwrap().clone();
        out
    }

    #[test]
    fn translates_keys_and_resize() {
        let key = CEvent::Key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE));
        assert_eq!(
            translate(key),
            Some(InputEvent::Key(KeyToken::Char('k')))
        );
        assert_eq!(translate(CEvent::Resize(80, 24)), Some(InputEvent::Resize(80, 24)));
        assert_eq!(translate(CEvent::FocusGained), None);
    }

    #[test]
    fn paste_is_ignored_without_logging_content() {
        let events = captured(|| {
            assert_eq!(translate(CEvent::Paste("secret pasted note".into())), None);
        });
        let event = events
            .iter()
            .find(|e| e.target == "input")
            .expect("missing input event");
        assert!(event.fields.iter().any(|(name, v)| name == "len" && v == "18"));
        for (_, value) in &event.fields {
            assert!(!value.contains("secret"), "event leaked paste content: {value}");
        }
    }
}
