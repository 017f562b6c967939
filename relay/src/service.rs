use crate::assets::Assets;
use crate::collector::Hit;
use crate::errors::{RelayError, Result};
use crate::identity::ClientIdentity;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS};
use crate::payload::Payload;
use crate::reporter::Reporter;
use crate::resolver::resolve;
use crate::selector::{self, BeaconBody, Decision};
use http::HeaderMap;
use http::header::{HeaderName, REFERER, USER_AGENT};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use rand::TryRngCore;
use rand::rngs::OsRng;
use shared::http::make_error_response;
use shared::{counter, histogram};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Answers beacon requests and hands pageviews to the reporter.
pub struct Beacon {
    assets: Arc<Assets>,
    reporter: Reporter,
    project_url: Url,
}

impl Beacon {
    pub fn new(assets: Arc<Assets>, reporter: Reporter, project_url: Url) -> Self {
        Beacon {
            assets,
            reporter,
            project_url,
        }
    }

    pub fn handle<B>(
        &self,
        request: &Request<B>,
        remote_addr: SocketAddr,
    ) -> Result<Response<BeaconBody>> {
        self.handle_with_rng(request, remote_addr, &mut OsRng)
    }

    fn handle_with_rng<B, R: TryRngCore>(
        &self,
        request: &Request<B>,
        remote_addr: SocketAddr,
        rng: &mut R,
    ) -> Result<Response<BeaconBody>> {
        let start = Instant::now();
        let headers = request.headers();
        let referer = header_string(headers, REFERER);
        let resolved = resolve(
            request.uri().path(),
            request.uri().query(),
            referer.as_deref(),
        );
        let decision = Decision::select(&resolved);

        let response = match decision {
            Decision::Redirect => selector::redirect(&self.project_url)?,
            Decision::InfoPage => {
                selector::info_page(&self.assets, &resolved.account, &resolved.referer)
            }
            Decision::Image(kind) => {
                let identity = ClientIdentity::resolve(headers, rng);

                if let (Some(cid), Some(page)) = (identity.client_id(), &resolved.page) {
                    let remote_addr = remote_addr.to_string();
                    let mut payload =
                        Payload::pageview(&resolved.account, cid, page, &remote_addr);
                    payload.overlay(&resolved.query);

                    self.reporter.report(Hit {
                        payload,
                        user_agent: header_string(headers, USER_AGENT).unwrap_or_default(),
                        remote_addr,
                        cid: cid.clone(),
                    });
                }

                let mut response = selector::image(&self.assets, kind);
                identity.apply(&resolved.account, response.headers_mut());
                response
            }
        };

        counter!(REQUESTS, "branch" => decision.branch()).increment(1);
        histogram!(REQUEST_DURATION, "branch" => decision.branch())
            .record(start.elapsed().as_secs_f64());

        Ok(response)
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Per-connection hyper service that knows the peer address.
#[derive(Clone)]
pub struct BeaconService {
    beacon: Arc<Beacon>,
    remote_addr: SocketAddr,
}

impl BeaconService {
    pub fn new(beacon: Arc<Beacon>, remote_addr: SocketAddr) -> Self {
        BeaconService {
            beacon,
            remote_addr,
        }
    }
}

impl Service<Request<Incoming>> for BeaconService {
    type Response = Response<BeaconBody>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let response = match self.beacon.handle(&req, self.remote_addr) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, path = %req.uri().path(), "Failed to handle request");
                make_error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
        Box::pin(async move { Ok(response) })
    }
}
