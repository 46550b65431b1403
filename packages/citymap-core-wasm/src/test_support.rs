// Scripted transport and payload builders shared by the unit tests
use futures::channel::oneshot;
use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::FetchError;
use crate::fetcher::{HttpRequest, HttpResponse, Transport};

type Scripted = Result<HttpResponse, FetchError>;

enum Reply {
    Ready(Scripted),
    Deferred(oneshot::Receiver<Scripted>),
}

/// Transport that answers requests in the order they were scripted and
/// records every request it sees.
#[derive(Default)]
pub struct MockTransport {
    replies: RefCell<VecDeque<Reply>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: HttpResponse) {
        self.replies.borrow_mut().push_back(Reply::Ready(Ok(response)));
    }

    pub fn respond_status(&self, status: u16, body: &str) {
        self.respond(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn fail(&self, err: FetchError) {
        self.replies.borrow_mut().push_back(Reply::Ready(Err(err)));
    }

    /// Script a reply that stays pending until the returned sender fires.
    pub fn defer(&self) -> oneshot::Sender<Scripted> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(Reply::Deferred(rx));
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for MockTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.borrow_mut().push(request.clone());
        let reply = self.replies.borrow_mut().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("mock sender dropped".into()))),
            None => Err(FetchError::Network(format!("no scripted reply for {}", request.url))),
        }
    }
}

/// Square footprint of roughly 10 m centred near downtown, shifted by `i`.
pub fn square_ring(i: usize) -> Vec<[f64; 2]> {
    let x = -114.0650 + i as f64 * 0.0003;
    let y = 51.0470;
    vec![
        [x, y],
        [x + 0.0001, y],
        [x + 0.0001, y + 0.0001],
        [x, y + 0.0001],
        [x, y],
    ]
}

/// FeatureCollection body using the backend's snake_case properties.
pub fn feature_collection_body(buildings: &[(&str, f64)]) -> String {
    let features: Vec<_> = buildings
        .iter()
        .enumerate()
        .map(|(i, (id, height))| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [square_ring(i)] },
                "properties": {
                    "struct_id": id,
                    "height": height,
                    "assessed_value": 1_250_000,
                    "land_use_designation": "CC-X",
                    "year_of_construction": 1998,
                    "roll_number": format!("0{}", 100 + i),
                    "address": format!("{} 8 AV SW", 100 + i),
                }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}
