use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use http::{Request, StatusCode};
use http_body_util::Full;
use micro_json::{
    as_json, as_json_p, view_fn, Error, Fields, JsonConfig, JsonError, JsonExt, JsonRequest, Payload, RequestHandler,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Debug)]
pub struct User {
    name: String,
    zip: String,
}

async fn hello(req: JsonRequest) -> Result<Fields, Error> {
    let mut fields = Fields::new();
    fields.insert("hello".into(), req.query_param("name").unwrap_or_else(|| "world".into()).into());
    fields.insert("now".into(), Payload::from(Utc::now()));
    fields.insert("since".into(), Payload::from(NaiveDate::from_ymd_opt(2024, 1, 1)));
    Ok(fields)
}

// curl -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}'
async fn create_user(req: JsonRequest) -> Result<(serde_json::Value, StatusCode), Error> {
    let user: User = req.json().await?;
    if user.zip.is_empty() {
        return Err(JsonError::new().field("zip", "must not be empty").into());
    }
    Ok((json!({"created": user.name}), StatusCode::CREATED))
}

async fn greeting(_req: JsonRequest) -> Result<&'static str, Error> {
    Ok("hello \"jsonp\"")
}

async fn run<H: RequestHandler>(ext: &Arc<JsonExt>, handler: &H, request: Request<Full<Bytes>>) {
    let uri = request.uri().clone();
    match ext.handle(handler, request).await {
        Ok(response) => {
            let body = response.body().as_bytes().cloned().unwrap_or_default();
            info!(%uri, status = %response.status(), body = %String::from_utf8_lossy(&body), "handled");
        }
        Err(e) => error!(%uri, cause = %e, "request failed"),
    }
}

fn request(uri: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::builder().uri(uri).body(Full::new(Bytes::from_static(body.as_bytes()))).expect("valid request")
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = JsonConfig::builder().date_format("iso").jsonify_http_errors(true).build();
    let ext = JsonExt::builder().config(config).build();

    let hello = as_json(view_fn(hello));
    run(&ext, &hello, request("/hello?name=micro", "")).await;

    let create_user = as_json(view_fn(create_user));
    run(&ext, &create_user, request("/user", r#"{"name":"hello","zip":"world"}"#)).await;
    run(&ext, &create_user, request("/user", r#"{"name":"hello","zip":""}"#)).await;
    run(&ext, &create_user, request("/user", "{not json")).await;
    run(&ext, &create_user, request("/user", r#"{"name":"hello"}"#)).await;

    let greeting = as_json_p(view_fn(greeting));
    run(&ext, &greeting, request("/greeting?callback=show", "")).await;
    run(&ext, &greeting, request("/greeting", "")).await;
}
