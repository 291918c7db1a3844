use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wiremock::{Request, Respond, ResponseTemplate};

use melody_learning::{MurekaClient, SunoClient};

/// A Suno client with timings short enough for tests.
pub fn suno_client(uri: &str) -> SunoClient {
    SunoClient::new_with_url("test_api_key".to_string(), uri)
        .unwrap()
        .with_timing(Duration::from_millis(10), Duration::from_millis(800))
        .with_retry(2, Duration::from_millis(20))
}

/// A Mureka client with timings short enough for tests.
pub fn mureka_client(uri: &str) -> MurekaClient {
    MurekaClient::new_with_url("test_api_key".to_string(), uri)
        .unwrap()
        .with_timing(Duration::from_millis(10), Duration::from_millis(800))
        .with_retry(2, Duration::from_millis(20))
}

/// Replays a fixed sequence of responses, repeating the last one once the
/// sequence is exhausted. Used to simulate a task moving through states
/// across successive polls.
pub struct SequenceResponder {
    responses: Vec<ResponseTemplate>,
    counter: AtomicUsize,
}

impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            counter: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        let index = count.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}
