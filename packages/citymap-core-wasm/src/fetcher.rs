// Building requests: transport seam, request sequencing and normalization
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::feature_store::{Completion, InFlight, LoadMode, StoreHandle};
use crate::models::{ApiPayload, FeatureCollection};
use crate::{console_error, console_log};

/// A GET request against the building API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can perform a GET and hand back status + body.
///
/// A transport only fails for network-level problems (and timeouts); HTTP
/// error statuses come back as ordinary responses.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Browser `fetch` transport with an abortable timeout.
#[cfg(target_arch = "wasm32")]
pub struct HttpTransport {
    timeout_ms: u32,
}

#[cfg(target_arch = "wasm32")]
impl HttpTransport {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

#[cfg(target_arch = "wasm32")]
impl Transport for HttpTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        use futures::future::{select, Either};
        use gloo_net::http::Request;
        use gloo_timers::future::TimeoutFuture;
        use web_sys::AbortController;

        let controller = AbortController::new()
            .map_err(|e| FetchError::Network(format!("{:?}", e)))?;
        let signal = controller.signal();

        let built = Request::get(&request.url)
            .query(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .abort_signal(Some(&signal))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let exchange = async {
            let resp = built
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            Ok(HttpResponse { status, body })
        };
        let timeout = TimeoutFuture::new(self.timeout_ms);
        futures::pin_mut!(exchange, timeout);

        match select(exchange, timeout).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                controller.abort();
                Err(FetchError::Timeout(self.timeout_ms))
            }
        }
    }
}

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    All,
    Filtered(String),
}

impl LoadRequest {
    /// A filtered request, or `None` when the text is blank.
    pub fn filtered(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(LoadRequest::Filtered(text.to_string()))
        }
    }

    pub fn mode(&self) -> LoadMode {
        match self {
            LoadRequest::All => LoadMode::All,
            LoadRequest::Filtered(_) => LoadMode::Filtered,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The response was installed in the store.
    Applied { count: usize },
    /// The request failed and the store now holds the error.
    Failed(FetchError),
    /// A newer request was issued meanwhile; this result was discarded.
    Superseded,
    /// Blank filter text, nothing was sent.
    Skipped,
}

pub struct DataFetcher<T: Transport> {
    transport: T,
    buildings_endpoint: String,
    filter_endpoint: String,
}

impl<T: Transport> DataFetcher<T> {
    pub fn new(transport: T, config: &AppConfig) -> Self {
        Self {
            transport,
            buildings_endpoint: config.buildings_endpoint.clone(),
            filter_endpoint: config.filter_endpoint.clone(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn http_request(&self, request: &LoadRequest) -> HttpRequest {
        match request {
            LoadRequest::All => HttpRequest::get(&self.buildings_endpoint),
            LoadRequest::Filtered(text) => {
                HttpRequest::get(&self.filter_endpoint).with_query("query", text)
            }
        }
    }

    /// Issue `request` and apply its outcome to `store` if it is still the
    /// newest one when it completes.
    pub async fn load<H: StoreHandle>(&self, store: &H, request: LoadRequest) -> LoadOutcome {
        if let LoadRequest::Filtered(text) = &request {
            if text.trim().is_empty() {
                console_log!("Ignoring empty filter query");
                return LoadOutcome::Skipped;
            }
        }

        let http = self.http_request(&request);
        let guard = InFlight::begin(store, request.mode());
        match &request {
            LoadRequest::All => console_log!("Fetching buildings from: {}", http.url),
            LoadRequest::Filtered(text) => {
                console_log!("Fetching filtered buildings from: {} (query: {})", http.url, text)
            }
        }

        let result = self.transport.get(&http).await.and_then(interpret);

        let outcome = match &result {
            Ok(collection) => LoadOutcome::Applied {
                count: collection.len(),
            },
            Err(err) => LoadOutcome::Failed(err.clone()),
        };

        match guard.finish(result) {
            Completion::Stale => LoadOutcome::Superseded,
            Completion::Applied => {
                match &outcome {
                    LoadOutcome::Applied { count } => console_log!("Loaded {} buildings", count),
                    LoadOutcome::Failed(err) => console_error!("Error fetching buildings: {}", err),
                    _ => {}
                }
                outcome
            }
        }
    }
}

/// Turn a raw response into a collection or an HTTP error.
fn interpret(response: HttpResponse) -> Result<FeatureCollection, FetchError> {
    if !response.is_success() {
        return Err(FetchError::from_response(response.status, &response.body));
    }
    Ok(ApiPayload::parse(&response.body).normalize())
}
