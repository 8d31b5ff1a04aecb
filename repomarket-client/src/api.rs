use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::config::ClientConfig;
use shared::models::{
    AuthPayload, DecodeError, ErrorResponse, LoginRequest, LoginResponse, RegisterData,
    RegisterRequest, Timestamp, User, UserRole, UserUpdateData, decode,
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::guard::{FORBIDDEN_ROUTE, LOGIN_ROUTE};
use crate::store::{self, SessionStore};

/// Sink for client-visible navigation side effects. A browser shell maps
/// this onto its location API; the CLI and tests record or ignore it.
pub trait Navigator: Send + Sync {
    /// Navigate the shell to the given route.
    fn redirect(&self, route: &str);
}

/// Navigator that drops redirects, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect(&self, _route: &str) {}
}

/// Global authentication signals emitted from response handling,
/// independent of which call triggered the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A 401 invalidated the session; the persisted entries are already
    /// cleared when observers run.
    SessionRevoked,

    /// A 403 denied access to a resource; the session remains valid.
    AccessDenied,
}

type AuthObserver = Box<dyn Fn(AuthEvent) + Send + Sync>;

struct ClientInner {
    base_url: String,
    http: Client,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    observers: Mutex<Vec<AuthObserver>>,
}

/// HTTP client for the RepoMarket backend.
///
/// The single point of outbound communication: attaches the bearer token
/// read from the session store to every request, unwraps the response
/// envelope, and normalizes every failure into [`ApiError`]. A 401 from
/// any request clears the persisted session, notifies observers, and
/// redirects to the login page.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with no navigation sink.
    ///
    /// # Errors
    /// Returns [`ApiError::Init`] when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Self::with_navigator(config, store, Arc::new(NoopNavigator))
    }

    /// Create a client that drives the given navigator on 401/403.
    ///
    /// # Errors
    /// Returns [`ApiError::Init`] when the underlying HTTP client cannot
    /// be constructed.
    pub fn with_navigator(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .user_agent("repomarket-client")
            .build()
            .map_err(|err| ApiError::Init(err.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url: config.api_url.trim_end_matches('/').to_string(),
                http,
                store,
                navigator,
                observers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Register an observer for global authentication events.
    pub fn observe_auth_events(&self, observer: impl Fn(AuthEvent) + Send + Sync + 'static) {
        if let Ok(mut observers) = self.inner.observers.lock() {
            observers.push(Box::new(observer));
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    fn bearer_token(&self) -> Option<String> {
        self.inner.store.get(store::TOKEN_KEY)
    }

    fn notify(&self, event: AuthEvent) {
        if let Ok(observers) = self.inner.observers.lock() {
            for observer in observers.iter() {
                observer(event);
            }
        }
    }

    fn handle_unauthorized(&self) {
        debug!("received 401, clearing session and redirecting to login");
        store::clear_session(self.inner.store.as_ref());
        self.notify(AuthEvent::SessionRevoked);
        self.inner.navigator.redirect(LOGIN_ROUTE);
    }

    /// Send a request and return the raw response body on 2xx. All
    /// global response policy (401/403 handling, error normalization)
    /// lives here.
    async fn dispatch<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.api_url(path);
        let mut request = self.inner.http.request(method, &url);
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%url, error = %err, "request failed before a response arrived");
            ApiError::from_transport(&err)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        if status == StatusCode::FORBIDDEN {
            self.notify(AuthEvent::AccessDenied);
            self.inner.navigator.redirect(FORBIDDEN_ROUTE);
            return Err(ApiError::Forbidden);
        }

        let body_text = response
            .text()
            .await
            .map_err(|err| ApiError::from_transport(&err))?;
        if status.is_success() {
            return Ok(body_text);
        }

        let message = serde_json::from_str::<ErrorResponse>(&body_text)
            .ok()
            .map(|error| error.message);
        Err(ApiError::from_status(status, message))
    }

    fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        decode(body).map_err(|err| match err {
            DecodeError::Rejected(message) => ApiError::Api(message),
            DecodeError::Invalid(err) => {
                warn!(error = %err, "response body did not match any expected shape");
                ApiError::Malformed
            }
        })
    }

    fn persist_session(&self, token: &str, user: &User) -> Result<(), ApiError> {
        let user_json = serde_json::to_string(user).map_err(|err| {
            warn!(error = %err, "failed to serialize user record");
            ApiError::Malformed
        })?;
        store::write_session(self.inner.store.as_ref(), token, &user_json);
        Ok(())
    }

    /// Construct the user record for a fresh session, synthesizing the
    /// identity fields the backend omitted.
    fn user_from_payload(
        payload: &AuthPayload,
        email: &str,
        fallback_name: &str,
        organization: String,
        phone_number: Option<String>,
    ) -> User {
        User {
            id: payload
                .user_id
                .clone()
                .unwrap_or_else(|| email.to_string()),
            email: email.to_string(),
            name: payload
                .name
                .clone()
                .unwrap_or_else(|| fallback_name.to_string()),
            role: payload.role,
            active: true,
            organization,
            phone_number: phone_number.unwrap_or_default(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    /// Authenticate with email/password credentials.
    ///
    /// On success the token and user record are persisted together and
    /// returned; on failure the session is left untouched (a 401 aside,
    /// which tears the session down globally).
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<UserRole>,
    ) -> Result<LoginResponse, ApiError> {
        debug!(email, "sending login request");
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        let body = self.dispatch(Method::POST, "auth/login", Some(&request)).await?;
        let payload: AuthPayload = Self::decode_body(&body)?;
        let user = Self::user_from_payload(&payload, email, email, String::new(), None);
        self.persist_session(&payload.token, &user)?;
        debug!(user = %user.email, role = %user.role, "login succeeded");
        Ok(LoginResponse {
            token: payload.token,
            user,
        })
    }

    /// Create an account and establish a session.
    ///
    /// Buyers must supply an organization (or the `company_name` alias);
    /// this is checked locally before any request is sent.
    ///
    /// # Errors
    /// Returns [`ApiError::Validation`] for the missing-organization
    /// precondition, otherwise the normalized failure.
    pub async fn register(&self, data: &RegisterData) -> Result<LoginResponse, ApiError> {
        let organization = data.resolved_organization();
        if data.role == Some(UserRole::Buyer) && organization.is_empty() {
            return Err(ApiError::Validation(
                "Organization name is required for buyer registration".to_string(),
            ));
        }

        let request = RegisterRequest {
            email: data.email.clone(),
            password: data.password.clone(),
            name: data.name.clone(),
            role: data.role,
            organization: organization.clone(),
            phone_number: data.phone_number.clone(),
        };
        let body = self
            .dispatch(Method::POST, "auth/register", Some(&request))
            .await?;
        let payload: AuthPayload = Self::decode_body(&body)?;
        let user = Self::user_from_payload(
            &payload,
            &data.email,
            &data.name,
            organization,
            data.phone_number.clone(),
        );
        self.persist_session(&payload.token, &user)?;
        debug!(user = %user.email, role = %user.role, "registration succeeded");
        Ok(LoginResponse {
            token: payload.token,
            user,
        })
    }

    /// Notify the backend and clear the local session.
    ///
    /// Best-effort: the local entries are cleared even when the backend
    /// call fails, and calling this while already logged out is a no-op.
    pub async fn logout(&self) {
        match self.dispatch(Method::POST, "api/auth/logout", None::<&()>).await {
            Ok(_) => debug!("logout acknowledged by backend"),
            Err(err) => {
                warn!(error = %err, "logout request failed, clearing local session anyway");
            }
        }
        store::clear_session(self.inner.store.as_ref());
    }

    /// Fetch the user record behind the current token.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("api/auth/current-user").await
    }

    /// Update the authenticated user's profile.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn update_profile(&self, update: &UserUpdateData) -> Result<User, ApiError> {
        self.put("api/users/me", update).await
    }

    /// GET a resource.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.dispatch(Method::GET, path, None::<&()>).await?;
        Self::decode_body(&body)
    }

    /// POST a resource.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.dispatch(Method::POST, path, Some(body)).await?;
        Self::decode_body(&body)
    }

    /// PUT a resource.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.dispatch(Method::PUT, path, Some(body)).await?;
        Self::decode_body(&body)
    }

    /// PATCH a resource.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.dispatch(Method::PATCH, path, Some(body)).await?;
        Self::decode_body(&body)
    }

    /// DELETE a resource.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`] for the failure.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.dispatch(Method::DELETE, path, None::<&()>).await?;
        Self::decode_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::models::UserRole;

    fn test_client() -> ApiClient {
        let config = ClientConfig {
            api_url: "http://localhost:8081/".to_string(),
            timeout_secs: 5,
        };
        ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn api_url_joins_without_double_slash() {
        let client = test_client();
        assert_eq!(
            client.api_url("/auth/login"),
            "http://localhost:8081/auth/login"
        );
        assert_eq!(
            client.api_url("api/auth/logout"),
            "http://localhost:8081/api/auth/logout"
        );
    }

    #[test]
    fn user_from_payload_synthesizes_missing_identity() {
        let payload = AuthPayload {
            user_id: None,
            name: None,
            role: UserRole::Developer,
            token: "tok1".to_string(),
        };
        let user = ApiClient::user_from_payload(&payload, "a@b.com", "Ann", String::new(), None);

        assert_eq!(user.id, "a@b.com");
        assert_eq!(user.name, "Ann");
        assert!(user.active);
    }

    #[test]
    fn user_from_payload_prefers_backend_identity() {
        let payload = AuthPayload {
            user_id: Some("u1".to_string()),
            name: Some("Ann".to_string()),
            role: UserRole::Buyer,
            token: "tok1".to_string(),
        };
        let user = ApiClient::user_from_payload(
            &payload,
            "a@b.com",
            "fallback",
            "Acme".to_string(),
            Some("555-0100".to_string()),
        );

        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ann");
        assert_eq!(user.organization, "Acme");
        assert_eq!(user.phone_number, "555-0100");
    }

    #[tokio::test]
    async fn register_rejects_buyer_without_organization_before_any_request() {
        let client = test_client();
        let data = RegisterData {
            email: "b@example.com".to_string(),
            password: "pw".to_string(),
            name: "Buyer".to_string(),
            role: Some(UserRole::Buyer),
            ..RegisterData::default()
        };

        let err = client.register(&data).await.unwrap_err();
        match err {
            ApiError::Validation(message) => {
                assert_eq!(message, "Organization name is required for buyer registration");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
