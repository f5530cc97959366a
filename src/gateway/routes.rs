//! User-service HTTP surface: signup, login, logout, and profile behind the session gateway.

// crates.io
use axum::{
	Extension, Json, Router,
	extract::State,
	http::{
		HeaderName, Method, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, SET_COOKIE},
	},
	middleware,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*,
	gateway::{AuthenticatedOwner, SessionCookies, SessionGateway, require_session},
	http::{self, JsonBody},
	protocol::{Envelope, HEARTBEAT_PATH},
	users::{NewUser, UserDirectory},
};

/// Path serving signup.
pub const SIGNUP_PATH: &str = "/user/signup";
/// Path serving login.
pub const LOGIN_PATH: &str = "/user/login";
/// Path serving logout.
pub const LOGOUT_PATH: &str = "/user/logout";
/// Path serving the caller's profile.
pub const PROFILE_PATH: &str = "/user/profile";

/// Shared state behind the user-service router.
#[derive(Clone)]
pub struct UserServiceState {
	/// Gateway fronting the token authority.
	pub gateway: Arc<SessionGateway>,
	/// User record storage.
	pub users: Arc<dyn UserDirectory>,
}
impl Debug for UserServiceState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserServiceState").field("gateway", &self.gateway).finish_non_exhaustive()
	}
}

/// Login payload.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
	/// Login email.
	pub email: Owner,
	/// Plain-text password.
	pub password: String,
}

/// Builds the user-service router. Logout and profile sit behind [`require_session`].
pub fn router(state: UserServiceState) -> Router {
	let protected = Router::new()
		.route(LOGOUT_PATH, delete(logout))
		.route(PROFILE_PATH, get(profile))
		.route_layer(middleware::from_fn_with_state(state.gateway.clone(), require_session));

	Router::new()
		.route(SIGNUP_PATH, post(signup))
		.route(LOGIN_PATH, post(login))
		.route(HEARTBEAT_PATH, get(http::heartbeat))
		.merge(protected)
		.layer(http::body_limit())
		.layer(cors_layer())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Credentialed CORS policy reflecting the caller's origin.
pub fn cors_layer() -> CorsLayer {
	CorsLayer::new()
		.allow_origin(AllowOrigin::mirror_request())
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
		.allow_headers([
			ACCEPT,
			AUTHORIZATION,
			CONTENT_TYPE,
			HeaderName::from_static("x-csrf-token"),
		])
		.expose_headers([HeaderName::from_static("link")])
		.allow_credentials(true)
		.max_age(StdDuration::from_secs(300))
}

async fn signup(
	State(state): State<UserServiceState>,
	JsonBody(user): JsonBody<NewUser>,
) -> Result<Response> {
	let record = state.users.insert(user).await?;

	Ok(http::accepted(Envelope::success("user created successfully", record)))
}

async fn login(
	State(state): State<UserServiceState>,
	JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Response> {
	if request.password.is_empty() {
		return Err(Error::bad_request("password: must not be empty"));
	}
	if !state.users.verify_credentials(&request.email, &request.password).await? {
		return Ok(reject(StatusCode::UNAUTHORIZED, "invalid credentials"));
	}

	let cookies = state.gateway.login(&request.email).await?;
	let mut response = http::accepted(Envelope::success(
		format!("Logged in user {}", request.email),
		cookies.token.expose(),
	));

	for value in cookies.set_cookie_headers(OffsetDateTime::now_utc())? {
		response.headers_mut().append(SET_COOKIE, value);
	}

	Ok(response)
}

async fn logout(
	State(state): State<UserServiceState>,
	Extension(AuthenticatedOwner(owner)): Extension<AuthenticatedOwner>,
) -> Result<Response> {
	state.gateway.logout(&owner).await?;

	let mut response = http::accepted(Envelope::<()>::ack("user logged out successfully"));

	for value in SessionCookies::clear_cookie_headers()? {
		response.headers_mut().append(SET_COOKIE, value);
	}

	Ok(response)
}

async fn profile(
	State(state): State<UserServiceState>,
	Extension(AuthenticatedOwner(owner)): Extension<AuthenticatedOwner>,
) -> Result<Response> {
	match state.users.find(&owner).await? {
		Some(record) =>
			Ok(http::accepted(Envelope::success("user profile fetched successfully", record))),
		None => Ok(reject(StatusCode::NOT_FOUND, "user not found")),
	}
}

fn reject(status: StatusCode, message: &str) -> Response {
	(status, Json(Envelope::<()>::failure(message))).into_response()
}
