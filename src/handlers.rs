use std::{collections::BTreeMap, sync::Arc};

use lambda_http::{
    http::{Method, StatusCode},
    Body, Error as LambdaError, Request, RequestExt, Response,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, warn};

use crate::{
    certificate::InitPayload,
    context::AppContext,
    error::{AppError, ErrorBody},
    issuance::issue_certificate,
};

const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
/// API Gateway deployment stage that may prefix every route.
const API_STAGE: &str = "v1";

/// Top-level request dispatcher used by the Lambda runtime.
///
/// A leading `/v1` API Gateway stage segment is accepted as well as the bare route.
pub async fn handle_request(
    ctx: Arc<AppContext>,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    let path = event.uri().path().to_owned();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match (event.method().clone(), segments.as_slice()) {
        (Method::POST, ["init"] | [API_STAGE, "init"]) => {
            create_certificate(ctx.as_ref(), event).await
        }
        (Method::GET, ["hello"] | [API_STAGE, "hello"]) => echo_request(event).await,
        (Method::GET, [_, "test"] | [API_STAGE, _, "test"]) => echo_request(event).await,
        _ => Ok(json_response(
            StatusCode::NOT_FOUND,
            ErrorBody::new("not_found", "Unsupported route"),
        )),
    }
}

async fn create_certificate(
    ctx: &AppContext,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    let payload = match serde_json::from_slice::<InitPayload>(event.body().as_ref()) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("failed to parse init payload: {e:?}");
            return Ok(error_response(&AppError::InvalidRequest(
                "body must be a JSON object with a string `id`".into(),
            )));
        }
    };
    let device_id = match payload.device_id() {
        Ok(id) => id,
        Err(err) => return Ok(error_response(&err)),
    };

    match issue_certificate(ctx.registry(), ctx.config(), device_id).await {
        Ok(bundle) => Ok(json_response(StatusCode::OK, bundle)),
        Err(failure) => {
            let leftovers: Vec<String> =
                failure.leftovers.iter().map(ToString::to_string).collect();
            error!(
                thing_name = %failure.thing_name,
                reached = %failure.reached,
                error_code = failure.error.code(),
                error = %failure.error,
                leftovers = ?leftovers,
                "certificate issuance aborted; created resources were not rolled back"
            );
            Ok(error_response(&failure.error))
        }
    }
}

/// Respond with the received request. Used to probe connectivity and IAM authorization.
pub async fn echo_request(event: Request) -> Result<Response<Body>, LambdaError> {
    Ok(json_response(StatusCode::OK, echo_body(&event)))
}

fn echo_body(event: &Request) -> Value {
    let headers: BTreeMap<&str, &str> = event
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect();
    let query = event
        .query_string_parameters_ref()
        .map(|params| params.iter().collect::<BTreeMap<&str, &str>>());
    let path_params = event
        .path_parameters_ref()
        .map(|params| params.iter().collect::<BTreeMap<&str, &str>>());

    let raw: &[u8] = event.body().as_ref();
    let body = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(raw)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
    };

    let mut echoed = Map::new();
    echoed.insert("httpMethod".into(), json!(event.method().as_str()));
    echoed.insert("path".into(), json!(event.uri().path()));
    echoed.insert("headers".into(), json!(headers));
    echoed.insert("queryStringParameters".into(), json!(query));
    echoed.insert("pathParameters".into(), json!(path_params));
    echoed.insert("body".into(), body);
    Value::Object(echoed)
}

fn error_response(err: &AppError) -> Response<Body> {
    json_response(err.status(), err.body())
}

fn json_response<T: Serialize>(status: StatusCode, value: T) -> Response<Body> {
    let body = serde_json::to_string(&value).unwrap_or_else(|_| "{}".into());

    if status.is_server_error() {
        error!(
            http_status = status.as_u16(),
            body = %body,
            "returning server error response"
        );
    } else if status.is_client_error() {
        warn!(
            http_status = status.as_u16(),
            body = %body,
            "returning client error response"
        );
    }

    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .header("Content-Type", CONTENT_TYPE_JSON)
        .body(Body::Text(body))
        .expect("failed to build response")
}
