//! HTTP front end for a long-lived datastore-army module.
//!
//! One [`Module`] owns one provisioner and one [`DatastoreArmy`], so service
//! ids keep counting up across requests for as long as the process lives.
//! Execute requests are serialized through a mutex around the army.
//!
//! Routes:
//! - `POST /execute`: body is the request payload, response is the result payload
//! - `GET  /health`: liveness
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use datastore_army_core::{CoreError, DatastoreArmy};
use datastore_army_runtime::ServiceProvisioner;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

pub struct Module {
    provisioner: Box<dyn ServiceProvisioner>,
    army: Mutex<DatastoreArmy>,
}

impl Module {
    pub fn new(provisioner: Box<dyn ServiceProvisioner>) -> Self {
        Self {
            provisioner,
            army: Mutex::new(DatastoreArmy::new()),
        }
    }

    pub fn provisioner(&self) -> &dyn ServiceProvisioner {
        self.provisioner.as_ref()
    }

    /// Run one execute request. Returns the response payload together with
    /// the number of datastores added over the module's lifetime, read under
    /// the same lock as the batch.
    pub fn execute(&self, serialized_params: &str) -> Result<(String, usize), CoreError> {
        // A panic mid-batch leaves the counter at the last successful
        // creation, which is still a valid state to continue from.
        let mut army = self
            .army
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = army.execute(self.provisioner.as_ref(), serialized_params)?;
        Ok((result, army.num_datastores_added()))
    }

    pub fn num_datastores_added(&self) -> usize {
        self.army
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .num_datastores_added()
    }
}

/// HTTP status for a failed execute request.
pub fn status_for_error(err: &CoreError) -> u16 {
    match err {
        CoreError::MalformedRequest(_) => 400,
        CoreError::ProvisioningFailed { .. } => 502,
        CoreError::EncodingFailed(_) | CoreError::Config(_) | CoreError::Io(_) => 500,
    }
}

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid header")
}

fn respond_json(req: tiny_http::Request, code: u16, body: impl Into<Vec<u8>>) {
    let response = Response::from_data(body.into())
        .with_status_code(StatusCode(code))
        .with_header(json_header());
    let _ = req.respond(response);
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    let body = serde_json::json!({ "error": msg }).to_string();
    respond_json(req, code, body);
}

fn read_body(req: &mut tiny_http::Request) -> std::io::Result<String> {
    let mut body = String::new();
    req.as_reader().read_to_string(&mut body)?;
    Ok(body)
}

fn handle_execute(module: &Module, mut req: tiny_http::Request) {
    let body = match read_body(&mut req) {
        Ok(body) => body,
        Err(e) => {
            warn!("POST /execute: failed to read request body: {e}");
            respond_err(req, 400, &format!("failed to read request body: {e}"));
            return;
        }
    };
    match module.execute(&body) {
        Ok((result, total)) => {
            info!("POST /execute: {total} datastore(s) in enclave");
            respond_json(req, 200, result);
        }
        Err(e) => {
            let code = status_for_error(&e);
            if code >= 500 {
                error!("POST /execute: {e}");
            } else {
                warn!("POST /execute: {e}");
            }
            respond_err(req, code, &e.to_string());
        }
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(module: &Module, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    match (url.as_str(), method) {
        ("/execute", Method::Post) => handle_execute(module, req),
        ("/health", Method::Get) => respond_json(req, 200, r#"{"status":"ok"}"#),
        ("/execute" | "/health", _) => respond_err(req, 405, "method not allowed"),
        _ => respond_err(req, 404, "not found"),
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(module: &Arc<Module>, addr: &str) -> Result<(), String> {
    let server = Server::http(addr).map_err(|e| format!("failed to bind {addr}: {e}"))?;
    for request in server.incoming_requests() {
        handle_request(module, request);
    }
    Ok(())
}

/// A test helper that serves a [`Module`] on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`. Drop the `TestServer` to stop it.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub module: Arc<Module>,
    server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    pub fn start(provisioner: Box<dyn ServiceProvisioner>) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let module = Arc::new(Module::new(provisioner));
        let srv = Arc::clone(&server);
        let m = Arc::clone(&module);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&m, request);
            }
        });

        Self {
            url,
            port,
            module,
            server,
            _handle: handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastore_army_runtime::{MockProvisioner, ProvisionerError, ServiceId};

    #[test]
    fn module_counter_spans_requests() {
        let module = Module::new(Box::new(MockProvisioner::new()));
        let (_, total) = module.execute(r#"{"numDatastores": 2}"#).unwrap();
        assert_eq!(total, 2);
        let (second, total) = module.execute(r#"{"numDatastores": 1}"#).unwrap();
        assert!(second.contains("datastore-2"));
        assert_eq!(total, 3);
        assert_eq!(module.num_datastores_added(), 3);
        assert_eq!(module.provisioner().name(), "mock");
    }

    #[test]
    fn error_statuses() {
        let malformed = CoreError::MalformedRequest(serde_json::from_str::<u32>("x").unwrap_err());
        assert_eq!(status_for_error(&malformed), 400);

        let failed = CoreError::ProvisioningFailed {
            service_id: ServiceId::new("datastore-0"),
            attempt: 1,
            source: ProvisionerError::Rejected("boom".to_owned()),
        };
        assert_eq!(status_for_error(&failed), 502);

        let encoding = CoreError::EncodingFailed(serde_json::from_str::<u32>("x").unwrap_err());
        assert_eq!(status_for_error(&encoding), 500);
    }
}
