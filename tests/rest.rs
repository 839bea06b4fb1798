use bytes::Bytes;
use http_body_util::Full;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use trellis::{App, AppError, ApplicationError, Json, Request, ResultExt, Router};

async fn create_user(req: Request) -> Result<Json<Value>, AppError> {
    let body: Value = req.json()?;
    match body.get("email").and_then(Value::as_str) {
        Some(email) if email.contains('@') => Ok(Json(body)),
        _ => Err(ApplicationError::new("invalid email").into()),
    }
}

async fn detailed(_req: Request) -> Result<Json<Value>, AppError> {
    Err(ApplicationError::new("out of stock")
        .with_code("stock")
        .with_details(json!({ "sku": "A-1" }))
        .into())
}

async fn io_failure(_req: Request) -> Result<Json<Value>, AppError> {
    let missing = std::fs::read("/definitely/not/here/secret.txt")?;
    Ok(Json(json!(missing.len())))
}

async fn tagged_failure(_req: Request) -> Result<Json<Value>, AppError> {
    let n = "forty-two".parse::<u32>().or_unexpected()?;
    Ok(Json(json!(n)))
}

async fn unwraps_none(_req: Request) -> Json<Value> {
    let password: Option<&str> = None;
    Json(json!(password.expect("hunter2 is the db password")))
}

fn app() -> App {
    App::new(
        Router::new()
            .post("/users", create_user)
            .get("/detailed", detailed)
            .get("/io", io_failure)
            .get("/tagged", tagged_failure)
            .get("/panic", unwraps_none),
    )
}

fn post_json(uri: &str, body: Value) -> http::Request<Full<Bytes>> {
    http::Request::post(uri)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn get(uri: &str) -> http::Request<Full<Bytes>> {
    http::Request::get(uri).body(Full::default()).unwrap()
}

fn body(res: &trellis::Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

#[tokio::test]
async fn application_error_is_400_with_its_structure() {
    let res = app().handle(post_json("/users", json!({ "email": "nope" }))).await;

    assert_eq!(res.status_code(), 400);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(body(&res), json!({ "error": { "message": "invalid email" } }));
}

#[tokio::test]
async fn code_and_details_are_serialised_when_present() {
    let res = app().handle(get("/detailed")).await;

    assert_eq!(res.status_code(), 400);
    assert_eq!(
        body(&res),
        json!({ "error": { "message": "out of stock", "code": "stock", "details": { "sku": "A-1" } } }),
    );
}

#[tokio::test]
async fn valid_request_passes_through() {
    let res = app().handle(post_json("/users", json!({ "email": "ada@example.com" }))).await;

    assert_eq!(res.status_code(), 200);
    assert_eq!(body(&res), json!({ "email": "ada@example.com" }));
}

#[tokio::test]
async fn non_client_errors_are_a_generic_500() {
    for path in ["/io", "/tagged", "/panic"] {
        let res = app().handle(get(path)).await;

        assert_eq!(res.status_code(), 500, "{path}");
        assert_eq!(res.body(), br#"{"error":"Internal Server Error"}"#, "{path}");
    }
}

#[tokio::test]
async fn panic_message_is_never_exposed() {
    let res = app().handle(get("/panic")).await;
    let text = String::from_utf8_lossy(res.body());

    assert!(!text.contains("hunter2"));
}

#[tokio::test]
async fn non_json_body_is_a_client_fault_for_json_handlers() {
    let req = http::Request::post("/users")
        .header("content-type", "text/plain")
        .body(Full::new(Bytes::from_static(b"email=ada")))
        .unwrap();
    let res = app().handle(req).await;

    assert_eq!(res.status_code(), 400);
    assert_eq!(body(&res)["error"]["code"], "invalid_body");
}
