//! Live transcription session events.
//!
//! Streaming recognition produces interim hypotheses that are revised until
//! a final result lands. Consumers subscribe to a broadcast channel instead
//! of registering callbacks, so a session can feed any number of listeners
//! and drop them independently. The microphone wire protocol stays upstream.

use crate::error::{FieldscribeError, Result};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Default per-subscriber event buffer.
const EVENT_BUFFER: usize = 64;

/// One streaming recognition result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Partial hypothesis, superseded by later events.
    Interim(String),
    /// Finalized text for a completed utterance.
    Final(String),
}

/// A live transcription session fanning events out to subscribers.
///
/// Publishing after [`stop`](Self::stop) is an error; subscribers observe
/// the stop as a closed channel once they drain buffered events.
pub struct LiveSession {
    sender: Mutex<Option<broadcast::Sender<TranscriptEvent>>>,
}

impl LiveSession {
    /// Creates a session with the default event buffer.
    pub fn new() -> Self {
        Self::with_buffer(EVENT_BUFFER)
    }

    /// Creates a session buffering up to `capacity` events per subscriber.
    pub fn with_buffer(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Subscribes to this session's event stream.
    ///
    /// Events published before the subscription are not replayed.
    pub fn subscribe(&self) -> Result<broadcast::Receiver<TranscriptEvent>> {
        let guard = self
            .sender
            .lock()
            .map_err(|_| FieldscribeError::Other("live session lock poisoned".to_string()))?;
        match guard.as_ref() {
            Some(sender) => Ok(sender.subscribe()),
            None => Err(FieldscribeError::Other(
                "live session already stopped".to_string(),
            )),
        }
    }

    /// Publishes a partial hypothesis.
    pub fn publish_interim(&self, text: &str) -> Result<()> {
        self.publish(TranscriptEvent::Interim(text.to_string()))
    }

    /// Publishes a finalized utterance.
    pub fn publish_final(&self, text: &str) -> Result<()> {
        self.publish(TranscriptEvent::Final(text.to_string()))
    }

    /// Ends the session. Subscribers see the channel close after draining.
    pub fn stop(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }

    /// True once [`stop`](Self::stop) has run.
    pub fn is_stopped(&self) -> bool {
        self.sender.lock().map(|g| g.is_none()).unwrap_or(true)
    }

    fn publish(&self, event: TranscriptEvent) -> Result<()> {
        let guard = self
            .sender
            .lock()
            .map_err(|_| FieldscribeError::Other("live session lock poisoned".to_string()))?;
        let sender = guard.as_ref().ok_or_else(|| {
            FieldscribeError::Other("live session already stopped".to_string())
        })?;
        // A session with no subscribers yet is fine, events are just dropped
        let _ = sender.send(event);
        Ok(())
    }
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn test_subscriber_sees_interim_then_final() {
        let session = LiveSession::new();
        let mut events = session.subscribe().unwrap();

        session.publish_interim("kheti").unwrap();
        session.publish_interim("kheti mein").unwrap();
        session.publish_final("kheti mein paani lagta hai").unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            TranscriptEvent::Interim("kheti".to_string())
        );
        assert_eq!(
            events.recv().await.unwrap(),
            TranscriptEvent::Interim("kheti mein".to_string())
        );
        assert_eq!(
            events.recv().await.unwrap(),
            TranscriptEvent::Final("kheti mein paani lagta hai".to_string())
        );
    }

    #[tokio::test]
    async fn test_stop_closes_channel_after_drain() {
        let session = LiveSession::new();
        let mut events = session.subscribe().unwrap();

        session.publish_final("bas itna hi").unwrap();
        session.stop();

        assert_eq!(
            events.recv().await.unwrap(),
            TranscriptEvent::Final("bas itna hi".to_string())
        );
        assert!(matches!(events.recv().await, Err(RecvError::Closed)));
        assert!(session.is_stopped());
    }

    #[tokio::test]
    async fn test_publish_after_stop_is_error() {
        let session = LiveSession::new();
        session.stop();

        assert!(session.publish_interim("der ho gayi").is_err());
        assert!(session.subscribe().is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_see_events() {
        let session = LiveSession::new();
        let mut first = session.subscribe().unwrap();
        let mut second = session.subscribe().unwrap();

        session.publish_final("dono ko mila").unwrap();

        let expected = TranscriptEvent::Final("dono ko mila".to_string());
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let session = LiveSession::new();
        assert!(session.publish_interim("koi sun nahi raha").is_ok());
    }
}
