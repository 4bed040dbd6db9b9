use std::time::Duration;
use reqwest::header::HeaderMap;
use crate::request::RequestDescriptor;
use crate::response::RawResponse;

pub(crate) fn log_request(request: &RequestDescriptor) {
    log::info!("---> {} {}", request.verb, request.url);
    log_headers(&request.headers);
    match &request.body {
        Some(body) => {
            log::debug!("{}", String::from_utf8_lossy(body));
            log::info!("---> END {} ({}-byte body)", request.verb, body.len());
        }
        None => log::info!("---> END {}", request.verb),
    }
}

pub(crate) fn log_response(response: &RawResponse, elapsed: Duration) {
    log::info!(
        "<--- {} {} ({}ms)",
        response.status,
        response.url,
        elapsed.as_millis()
    );
    log_headers(&response.headers);
    if !response.body.is_empty() {
        log::debug!("{}", String::from_utf8_lossy(&response.body));
    }
    log::info!("<--- END HTTP ({}-byte body)", response.body.len());
}

fn log_headers(headers: &HeaderMap) {
    for (name, value) in headers {
        if *name == reqwest::header::AUTHORIZATION {
            log::debug!("{}: <redacted>", name);
        } else {
            log::debug!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }
}
