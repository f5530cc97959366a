// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{
		Method, Request, StatusCode,
		header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
	},
	response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;
// self
use session_broker::{
	_preludet::*,
	authority::Validation,
	gateway::{
		AuthorityClient, AuthorityFuture, HttpAuthorityClient, SessionGateway,
		routes::{self, UserServiceState},
	},
	protocol::Envelope,
	users::UserDirectory,
};

/// Authority double that counts every call and confirms nothing.
#[derive(Default)]
struct CountingAuthority {
	calls: AtomicUsize,
}
impl AuthorityClient for CountingAuthority {
	fn issue<'a>(&'a self, _owner: &'a Owner) -> AuthorityFuture<'a, TokenSecret> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(TokenSecret::new("T")) })
	}

	fn validate<'a>(
		&'a self,
		_owner: &'a Owner,
		_token: &'a str,
	) -> AuthorityFuture<'a, Validation> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(Validation::Mismatch) })
	}

	fn revoke<'a>(&'a self, _owner: &'a Owner) -> AuthorityFuture<'a, ()> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(()) })
	}

	fn ping(&self) -> AuthorityFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}

fn app(authority: Arc<dyn AuthorityClient>) -> Router {
	let users: Arc<dyn UserDirectory> = memory_directory();

	routes::router(UserServiceState { gateway: Arc::new(SessionGateway::new(authority)), users })
}

async fn live_app() -> Router {
	let (authority, _store) = build_memory_authority();
	let (base, _handle) = spawn_authority(authority).await;
	let client = HttpAuthorityClient::new(base, StdDuration::from_secs(2))
		.expect("Authority client should build for the local authority.");

	app(Arc::new(client))
}

async fn send(
	app: &Router,
	method: Method,
	path: &str,
	cookie: Option<&str>,
	body: Value,
) -> Response {
	let mut request =
		Request::builder().method(method).uri(path).header(CONTENT_TYPE, "application/json");

	if let Some(cookie) = cookie {
		request = request.header(COOKIE, cookie);
	}

	app.clone()
		.oneshot(request.body(Body::from(body.to_string())).expect("Request fixture should build."))
		.await
		.expect("Router should answer.")
}

async fn envelope(response: Response) -> Envelope {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	serde_json::from_slice(&bytes).expect("Response should be an envelope.")
}

fn set_cookies(response: &Response) -> Vec<String> {
	response
		.headers()
		.get_all(SET_COOKIE)
		.iter()
		.map(|value| value.to_str().expect("Set-Cookie should be ASCII.").to_owned())
		.collect()
}

/// Turns `Set-Cookie` values into a single `Cookie` request header.
fn cookie_header(set_cookies: &[String]) -> String {
	set_cookies
		.iter()
		.filter_map(|value| value.split(';').next())
		.collect::<Vec<_>>()
		.join("; ")
}

fn signup_body(email: &str) -> Value {
	json!({
		"email": email,
		"first_name": "Ada",
		"last_name": "Lovelace",
		"password": "hunter2",
	})
}

#[tokio::test]
async fn signup_login_profile_logout_flow() {
	let app = live_app().await;
	let response = send(&app, Method::POST, "/user/signup", None, signup_body("a@x.com")).await;

	assert_eq!(response.status(), StatusCode::ACCEPTED);

	let response = send(
		&app,
		Method::POST,
		"/user/login",
		None,
		json!({ "email": "a@x.com", "password": "hunter2" }),
	)
	.await;

	assert_eq!(response.status(), StatusCode::ACCEPTED);

	let issued = set_cookies(&response);

	assert_eq!(issued.len(), 2);
	assert!(
		issued.iter().all(|value| value.contains("HttpOnly") && value.contains("Max-Age=86400"))
	);

	let login = envelope(response).await;
	let token = login.data.expect("Login should return the token.");
	let cookie = cookie_header(&issued);

	let token = token.as_str().expect("Token should be a string.");

	assert!(cookie.contains(&format!("Authorization={token}")));

	let response = send(&app, Method::GET, "/user/profile", Some(&cookie), Value::Null).await;

	assert_eq!(response.status(), StatusCode::ACCEPTED);

	let profile = envelope(response).await;

	assert_eq!(profile.data.expect("Profile should carry the record.")["email"], "a@x.com");

	let response = send(&app, Method::DELETE, "/user/logout", Some(&cookie), Value::Null).await;

	assert_eq!(response.status(), StatusCode::ACCEPTED);
	assert!(set_cookies(&response).iter().all(|value| value.contains("Max-Age=0")));

	let response = send(&app, Method::GET, "/user/profile", Some(&cookie), Value::Null).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(envelope(response).await.message, "invalid session");
}

#[tokio::test]
async fn repeated_logins_share_one_session() {
	let app = live_app().await;

	send(&app, Method::POST, "/user/signup", None, signup_body("a@x.com")).await;

	let credentials = json!({ "email": "a@x.com", "password": "hunter2" });
	let first = send(&app, Method::POST, "/user/login", None, credentials.clone()).await;
	let second = send(&app, Method::POST, "/user/login", None, credentials).await;
	let first = envelope(first).await;
	let second = envelope(second).await;

	assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn bad_credentials_never_create_a_session() {
	let authority = Arc::new(CountingAuthority::default());
	let app = app(authority.clone());

	send(&app, Method::POST, "/user/signup", None, signup_body("a@x.com")).await;

	for body in [
		json!({ "email": "a@x.com", "password": "wrong" }),
		json!({ "email": "ghost@x.com", "password": "hunter2" }),
	] {
		let response = send(&app, Method::POST, "/user/login", None, body).await;

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert!(set_cookies(&response).is_empty());
		assert_eq!(envelope(response).await.message, "invalid credentials");
	}

	assert_eq!(authority.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_cookies_are_denied_without_calling_the_authority() {
	let authority = Arc::new(CountingAuthority::default());
	let app = app(authority.clone());

	let partial =
		[None, Some("email=a@x.com"), Some("Authorization=T"), Some("email=; Authorization=")];

	for cookie in partial {
		let response = send(&app, Method::GET, "/user/profile", cookie, Value::Null).await;

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

		let response = send(&app, Method::DELETE, "/user/logout", cookie, Value::Null).await;

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}

	assert_eq!(authority.calls.load(Ordering::SeqCst), 0);

	let both = Some("email=a@x.com; Authorization=T");
	let response = send(&app, Method::GET, "/user/profile", both, Value::Null).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_signups_are_bad_requests() {
	let app = app(Arc::new(CountingAuthority::default()));
	let response = send(&app, Method::POST, "/user/signup", None, signup_body("not-an-email")).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(envelope(response).await.message.starts_with("email: "));

	send(&app, Method::POST, "/user/signup", None, signup_body("a@x.com")).await;

	let response = send(&app, Method::POST, "/user/signup", None, signup_body("a@x.com")).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(envelope(response).await.message, "email: already registered");
}

#[tokio::test]
async fn emails_that_would_break_cookies_never_reach_login() {
	let authority = Arc::new(CountingAuthority::default());
	let app = app(authority.clone());
	let smuggled = "a@x.com;Domain=evil.example";
	let response = send(&app, Method::POST, "/user/signup", None, signup_body(smuggled)).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(envelope(response).await.message.starts_with("email: "));

	let response = send(
		&app,
		Method::POST,
		"/user/login",
		None,
		json!({ "email": smuggled, "password": "hunter2" }),
	)
	.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(set_cookies(&response).is_empty());
	assert_eq!(authority.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cors_preflight_reflects_the_origin_with_credentials() {
	let app = app(Arc::new(CountingAuthority::default()));
	let request = Request::builder()
		.method(Method::OPTIONS)
		.uri("/user/login")
		.header("origin", "https://app.example.com")
		.header("access-control-request-method", "POST")
		.body(Body::empty())
		.expect("Preflight fixture should build.");
	let response = app.oneshot(request).await.expect("Router should answer.");
	let headers = response.headers();

	assert_eq!(
		headers.get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
		Some("https://app.example.com")
	);
	assert_eq!(
		headers.get("access-control-allow-credentials").and_then(|v| v.to_str().ok()),
		Some("true")
	);
}

#[tokio::test]
async fn heartbeat_answers() {
	let app = app(Arc::new(CountingAuthority::default()));
	let response = send(&app, Method::GET, "/plug", None, Value::Null).await;
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Heartbeat body should be readable.");

	assert_eq!(&bytes[..], b".");
}
