//! HTTP request builder and response parser for the property API.
//!
//! # Design
//! `ApiClient` holds the `base_url` and the caller's `Session`. Each operation
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. The caller executes the
//! actual HTTP round-trip, keeping the core deterministic and free of I/O.
//! The bearer token is read from the session at build time, so `set_token`
//! and `clear_token` take effect on the next request.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{self, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
use crate::query::QueryState;
use crate::session::Session;
use crate::types::{AuthToken, Page, Property, PropertyDetail, PropertyId};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.session.set(token);
    }

    pub fn clear_token(&mut self) {
        self.session.clear();
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(token) = self.session.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers,
            body: None,
        }
    }

    fn json_request<T: Serialize>(&self, method: HttpMethod, path: &str, input: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path);
        req.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        req.body = Some(RequestBody::Json(body));
        Ok(req)
    }

    pub fn build_login<T: Serialize>(&self, credentials: &T) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/login", credentials)
    }

    pub fn build_register<T: Serialize>(&self, input: &T) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/register", input)
    }

    pub fn build_list_properties(&self, query: &QueryState) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, "/properties");
        req.query = query.to_params();
        req
    }

    pub fn build_get_property(&self, id: PropertyId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/properties/{id}"))
    }

    pub fn build_create_property(&self, form: MultipartForm) -> HttpRequest {
        let mut req = self.request(HttpMethod::Post, "/properties");
        req.body = Some(RequestBody::Multipart(form));
        req
    }

    /// Updates travel as POST with a `_method=PUT` override so multipart
    /// bodies reach the backend's update route.
    pub fn build_update_property(&self, id: PropertyId, form: MultipartForm) -> HttpRequest {
        let mut req = self.request(HttpMethod::Post, &format!("/properties/{id}"));
        req.query.push(("_method".to_string(), "PUT".to_string()));
        req.body = Some(RequestBody::Multipart(form));
        req
    }

    pub fn build_delete_property(&self, id: PropertyId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/properties/{id}"))
    }

    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthToken, ApiError> {
        check_success(&response)?;
        decode(&response)
    }

    pub fn parse_list_properties(&self, response: HttpResponse) -> Result<Page<Property>, ApiError> {
        check_success(&response)?;
        decode(&response)
    }

    pub fn parse_get_property(&self, response: HttpResponse) -> Result<PropertyDetail, ApiError> {
        check_success(&response)?;
        decode(&response)
    }

    /// Create answers 201 and update 200; both return the saved record.
    pub fn parse_save_property(&self, response: HttpResponse) -> Result<Property, ApiError> {
        check_success(&response)?;
        decode(&response)
    }

    pub fn parse_delete_property(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(error::from_status(response.status, &response.body))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FileUpload;
    use crate::query::QueryAction;
    use crate::types::SortBy;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000/api", Session::new())
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    const PROPERTY_JSON: &str = r#"{"id":7,"title":"Riverside flat","property_type":"apartment",
        "status":"available","price":2500000000,"area":80.5,"address":"12 Tran Phu",
        "city":"Hanoi","district":"Ba Dinh","contact_name":"Lan","contact_phone":"0912"}"#;

    #[test]
    fn build_list_properties_maps_query_state() {
        let state = QueryState::default().apply(QueryAction::SetSortBy(SortBy::Price), None);
        let req = client().build_list_properties(&state);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/api/properties");
        assert_eq!(req.query_value("sort_by"), Some("price"));
        assert!(!req.has_query_key("city"));
        assert!(req.body.is_none());
    }

    #[test]
    fn bearer_token_attached_only_when_present() {
        let mut c = client();
        let req = c.build_get_property(PropertyId(1));
        assert!(req.header("authorization").is_none());
        assert_eq!(req.header("accept"), Some("application/json"));

        c.set_token("secret");
        let req = c.build_get_property(PropertyId(1));
        assert_eq!(req.header("authorization"), Some("Bearer secret"));

        c.clear_token();
        assert!(c.build_delete_property(PropertyId(1)).header("authorization").is_none());
    }

    #[test]
    fn build_login_produces_json_post() {
        let creds = serde_json::json!({"email": "a@b.co", "password": "secret1"});
        let req = client().build_login(&creds).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/api/login");
        assert_eq!(req.header("content-type"), Some("application/json"));
        match req.body {
            Some(RequestBody::Json(body)) => {
                let v: serde_json::Value = serde_json::from_str(&body).unwrap();
                assert_eq!(v["email"], "a@b.co");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn build_update_uses_method_override() {
        let mut form = MultipartForm::new();
        form.text("title", "New")
            .file("images[]", FileUpload::new("x.jpg", "image/jpeg", vec![0]));
        let req = client().build_update_property(PropertyId(9), form);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url(), "http://localhost:8000/api/properties/9?_method=PUT");
        assert!(matches!(req.body, Some(RequestBody::Multipart(_))));
    }

    #[test]
    fn build_create_targets_collection() {
        let req = client().build_create_property(MultipartForm::new());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url(), "http://localhost:8000/api/properties");
    }

    #[test]
    fn build_delete_targets_record() {
        let req = client().build_delete_property(PropertyId(42));
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:8000/api/properties/42");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_list_properties_success() {
        let body = format!(
            r#"{{"data":[{PROPERTY_JSON}],"current_page":1,"last_page":3,"per_page":10,"total":21}}"#
        );
        let page = client().parse_list_properties(response(200, &body)).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].title, "Riverside flat");
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 21);
    }

    #[test]
    fn parse_list_properties_unauthorized() {
        let err = client()
            .parse_list_properties(response(401, r#"{"message":"Unauthenticated."}"#))
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn parse_get_property_not_found() {
        let err = client().parse_get_property(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_save_property_accepts_created() {
        let p = client().parse_save_property(response(201, PROPERTY_JSON)).unwrap();
        assert_eq!(p.id, PropertyId(7));
    }

    #[test]
    fn parse_delete_property_accepts_any_2xx() {
        assert!(client().parse_delete_property(response(204, "")).is_ok());
        assert!(client().parse_delete_property(response(200, "{}")).is_ok());
    }

    #[test]
    fn parse_auth_bad_json() {
        let err = client().parse_auth(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = ApiClient::new("http://localhost:8000/api/", Session::new());
        assert_eq!(c.build_get_property(PropertyId(1)).path, "http://localhost:8000/api/properties/1");
    }
}
