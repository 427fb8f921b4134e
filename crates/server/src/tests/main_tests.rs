use super::*;
use crate::config::Settings;
use axum::{body, body::Body, http::Request};
use shared::protocol::{AlertLevel, ChartKind};
use tower::ServiceExt;

const FULL_CSV: &str = "sales_date,sales_amount,region,product\n\
2024-01-01,100,North,Widget\n\
2024-01-02,250,South,Gadget\n\
2024-01-03,75,North,Widget\n";

const BOUNDARY: &str = "dashboard-test-boundary";
const WARNING_CLASS: &str = "class=\"alert alert-warning\"";
const ANY_ALERT_CLASS: &str = "class=\"alert ";

fn test_app_with(settings: Settings) -> Router {
    build_router(Arc::new(AppState::from_settings(&settings)))
}

fn test_app() -> Router {
    test_app_with(Settings::default())
}

fn upload_request(csv: &str, cookie: Option<&str>) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
Content-Type: text/csv\r\n\r\n\
{csv}\r\n\
--{BOUNDARY}--\r\n"
    );
    let mut builder = Request::post("/upload").header(
        "content-type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

async fn body_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn cookie_from(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie")
        .to_str()
        .expect("ascii")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn first_visit_sets_cookie_and_renders_only_chrome() {
    let request = Request::get("/").body(Body::empty()).expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_from(&response).starts_with("dashboard_session="));

    let html = body_text(response).await;
    assert!(html.contains("Business Dashboard"));
    assert!(!html.contains("Plotly.newPlot"));
    assert!(!html.contains(WARNING_CLASS));
}

#[tokio::test]
async fn upload_renders_charts_and_session_keeps_dataset() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(upload_request(FULL_CSV, None))
        .await
        .expect("upload response");
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = cookie_from(&response);
    let html = body_text(response).await;
    assert_eq!(html.matches("Plotly.newPlot").count(), 3);
    assert!(!html.contains(WARNING_CLASS));

    let reload = Request::get("/")
        .header("cookie", &cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(reload).await.expect("reload response");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(response).await.matches("Plotly.newPlot").count(), 3);
}

#[tokio::test]
async fn feedback_is_acknowledged_against_session_dataset() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(upload_request("product,sales_amount\nA,1\n", None))
        .await
        .expect("upload response");
    let cookie = cookie_from(&response);

    let request = Request::post("/feedback")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("cookie", &cookie)
        .body(Body::from("feedback="))
        .expect("request");
    let response = app.oneshot(request).await.expect("feedback response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Thank you for your feedback."));
    assert_eq!(html.matches("Plotly.newPlot").count(), 1);
    assert_eq!(html.matches(WARNING_CLASS).count(), 2);
}

#[tokio::test]
async fn malformed_upload_shows_error_and_clears_session() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(upload_request(FULL_CSV, None))
        .await
        .expect("upload response");
    let cookie = cookie_from(&response);

    let response = app
        .clone()
        .oneshot(upload_request("a,b\n1,2,3\n", Some(&cookie)))
        .await
        .expect("bad upload response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Could not read the uploaded file"));
    assert!(html.contains("Business Dashboard"));

    let reload = Request::get("/")
        .header("cookie", &cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(reload).await.expect("reload response");
    assert!(!body_text(response).await.contains("Plotly.newPlot"));
}

#[tokio::test]
async fn upload_without_file_renders_empty_dashboard() {
    let response = test_app()
        .oneshot(upload_request("", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(!html.contains("Preview of the Uploaded Data"));
    assert!(!html.contains(ANY_ALERT_CLASS));
}

#[tokio::test]
async fn oversized_file_field_is_rejected() {
    let settings = Settings {
        max_upload_bytes: 16,
        ..Settings::default()
    };
    let response = test_app_with(settings)
        .oneshot(upload_request(FULL_CSV, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn api_render_returns_render_tree() {
    let request = Request::post("/api/render")
        .header("content-type", "text/csv")
        .body(Body::from("product,sales_amount\nA,1\nB,3\n"))
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let page: Page = serde_json::from_slice(&bytes).expect("json");
    let charts: Vec<ChartKind> = page.charts().map(|(_, chart)| chart.kind).collect();
    assert_eq!(charts, vec![ChartKind::Bar]);
    assert_eq!(page.alerts_with_level(AlertLevel::Warning).len(), 2);
    assert_eq!(page.preview().expect("preview").rows.len(), 2);
}

#[tokio::test]
async fn api_render_rejects_malformed_csv() {
    let request = Request::post("/api/render")
        .body(Body::from(vec![0xffu8, 0xfe, 0x00]))
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let error: ApiError = serde_json::from_slice(&bytes).expect("json");
    assert!(matches!(error.code, ErrorCode::Validation));
}

#[tokio::test]
async fn api_render_without_body_has_no_dataset_sections() {
    let request = Request::post("/api/render")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let page: Page = serde_json::from_slice(&bytes).expect("json");
    assert!(page.preview().is_none());
    assert_eq!(page.charts().count(), 0);
}
