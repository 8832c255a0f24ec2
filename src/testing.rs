//! Shared fixtures and fakes for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::agents::collector::build_aggregate;
use crate::error::LlmError;
use crate::football::{Envelope, FootballDataSource};
use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};

/// Botola Pro fixture 239625: Rapide Oued ZEM 1-2 Wydad AC.
pub fn sample_fixture() -> Value {
    json!({
        "fixture": {
            "id": 239625,
            "referee": null,
            "timezone": "UTC",
            "date": "2020-02-06T14:00:00+00:00",
            "timestamp": 1580997600,
            "venue": {"id": 1887, "name": "Stade Municipal", "city": "Oued Zem"},
            "status": {"long": "Match Finished", "short": "FT", "elapsed": 90}
        },
        "league": {
            "id": 200,
            "name": "Botola Pro",
            "country": "Morocco",
            "season": 2019,
            "round": "Regular Season - 14"
        },
        "teams": {
            "home": {"id": 967, "name": "Rapide Oued ZEM", "logo": "https://media.api-sports.io/football/teams/967.png", "winner": false},
            "away": {"id": 968, "name": "Wydad AC", "logo": "https://media.api-sports.io/football/teams/968.png", "winner": true}
        },
        "goals": {"home": 1, "away": 2},
        "score": {
            "halftime": {"home": 0, "away": 1},
            "fulltime": {"home": 1, "away": 2},
            "extratime": {"home": null, "away": null},
            "penalty": {"home": null, "away": null}
        },
        "events": [
            {
                "time": {"elapsed": 19, "extra": null},
                "team": {"id": 968, "name": "Wydad AC"},
                "player": {"id": 36549, "name": "Z. El-Moutaraji"},
                "assist": {"id": null, "name": null},
                "type": "Goal",
                "detail": "Normal Goal",
                "comments": null
            },
            {
                "time": {"elapsed": 60, "extra": null},
                "team": {"id": 967, "name": "Rapide Oued ZEM"},
                "player": {"id": 36704, "name": "B. El Bahraoui"},
                "assist": {"id": null, "name": null},
                "type": "Goal",
                "detail": "Normal Goal",
                "comments": null
            },
            {
                "time": {"elapsed": 90, "extra": 3},
                "team": {"id": 968, "name": "Wydad AC"},
                "player": {"id": 36544, "name": "Y. Jabrane"},
                "assist": {"id": null, "name": null},
                "type": "Goal",
                "detail": "Penalty",
                "comments": null
            }
        ],
        "lineups": [
            {
                "team": {"id": 967, "name": "Rapide Oued ZEM"},
                "coach": {"id": 1, "name": "M. Chebil"},
                "formation": "4-3-3",
                "startXI": [
                    {"player": {"id": 152492, "name": "A. Kadi", "number": 1, "pos": "G", "grid": "1:1"}},
                    {"player": {"id": 36704, "name": "B. El Bahraoui", "number": 9, "pos": "F", "grid": "4:2"}},
                    {"player": {"id": 152493, "name": "H. Ait Bella", "number": 5, "pos": "D", "grid": "2:2"}}
                ],
                "substitutes": [
                    {"player": {"id": 152494, "name": "O. Lamrani", "number": 14, "pos": "M", "grid": null}},
                    {"player": {"id": 152495, "name": "S. Nassiri", "number": 19, "pos": "F", "grid": null}}
                ]
            },
            {
                "team": {"id": 968, "name": "Wydad AC"},
                "coach": {"id": 2, "name": "S. Desabre"},
                "formation": "4-2-3-1",
                "startXI": [
                    {"player": {"id": 36549, "name": "Z. El-Moutaraji", "number": 7, "pos": "M", "grid": "3:1"}},
                    {"player": {"id": 36544, "name": "Y. Jabrane", "number": 6, "pos": "M", "grid": "2:1"}},
                    {"player": {"id": 36560, "name": "A. El Motie", "number": 31, "pos": "D", "grid": "1:2"}}
                ],
                "substitutes": [
                    {"player": {"id": 36570, "name": "W. Kaabi", "number": 11, "pos": "F", "grid": null}},
                    {"player": {"id": 36571, "name": "M. Nahiri", "number": 3, "pos": "D", "grid": null}}
                ]
            }
        ],
        "statistics": []
    })
}

/// The sample fixture wrapped in a successful `fixtures` envelope.
pub fn sample_fixture_envelope() -> Envelope {
    Envelope::success("fixtures", crate::football::params([("id", 239625)]), vec![sample_fixture()])
}

/// A `game_data` aggregate with the given fixture item and events list.
pub fn game_data_aggregate(fixture: Value, events: Value) -> Envelope {
    let events = events.as_array().cloned().unwrap_or_default();
    build_aggregate(
        "game_data",
        crate::football::params([("game_id", "239625")]),
        vec![
            ("fixture", Envelope::success("fixtures", Map::new(), vec![fixture])),
            ("events", Envelope::success("fixtures/events", Map::new(), events)),
            ("lineups", Envelope::success("fixtures/lineups", Map::new(), Vec::new())),
            ("statistics", Envelope::success("fixtures/statistics", Map::new(), Vec::new())),
        ],
    )
}

enum FakeReply {
    Items(Vec<Value>),
    Failure(String),
}

/// In-memory [`FootballDataSource`] keyed by endpoint.
///
/// Unregistered endpoints answer with `HTTP 404`. Every call is recorded,
/// and the peak number of concurrent calls is tracked.
#[derive(Default)]
pub struct FakeDataSource {
    replies: HashMap<String, FakeReply>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, endpoint: &str, items: Vec<Value>) -> Self {
        self.replies
            .insert(endpoint.to_string(), FakeReply::Items(items));
        self
    }

    pub fn with_failure(mut self, endpoint: &str, error: &str) -> Self {
        self.replies
            .insert(endpoint.to_string(), FakeReply::Failure(error.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock not poisoned").len()
    }

    pub fn calls_for(&self, endpoint: &str) -> Vec<Map<String, Value>> {
        self.calls
            .lock()
            .expect("lock not poisoned")
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FootballDataSource for FakeDataSource {
    async fn fetch(&self, endpoint: &str, params: Map<String, Value>) -> Envelope {
        self.calls
            .lock()
            .expect("lock not poisoned")
            .push((endpoint.to_string(), params.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.replies.get(endpoint) {
            Some(FakeReply::Items(items)) => Envelope::success(endpoint, params, items.clone()),
            Some(FakeReply::Failure(error)) => {
                Envelope::failure(endpoint, params, vec![error.clone()])
            }
            None => Envelope::failure(endpoint, params, vec!["HTTP 404".to_string()]),
        }
    }
}

/// Scripted [`LlmProvider`].
///
/// Replies are consumed in order; the last one repeats once the queue is
/// down to a single entry. A `None` reply fails the call.
pub struct MockLlmProvider {
    replies: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    call_count: AtomicUsize,
    delay: Option<Duration>,
}

impl MockLlmProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_replies(vec![Some(response.into())])
    }

    pub fn with_replies(replies: Vec<Option<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self::with_replies(vec![None])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("lock not poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("lock not poisoned")
            .push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = {
            let mut replies = self.replies.lock().expect("lock not poisoned");
            if replies.len() > 1 {
                replies.pop_front().flatten()
            } else {
                replies.front().cloned().flatten()
            }
        };

        let content =
            reply.ok_or_else(|| LlmError::RequestFailed("mock provider failure".to_string()))?;
        Ok(GenerationResponse {
            id: "mock-id".to_string(),
            model: "mock-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: Some("stop".to_string()),
            }],
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 200,
                total_tokens: 300,
            },
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
