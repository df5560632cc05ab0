use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{
    Credentials, ListParams, MethodOverride, Page, Property, PropertyDetail, PropertySubmission,
    Registration, TokenResponse, Upload,
};
use crate::store::validate_submission;
use crate::Db;

/// Error responses in the shape the admin client expects: `{"message"}`,
/// plus `errors` for validation failures.
#[derive(Debug)]
pub enum ApiFailure {
    Unauthenticated,
    InvalidCredentials,
    NotFound,
    MethodNotAllowed,
    BadRequest(String),
    Validation(BTreeMap<String, Vec<String>>),
}

impl ApiFailure {
    fn field(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        ApiFailure::Validation(errors)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiFailure::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, json!({ "message": "Unauthenticated." }))
            }
            ApiFailure::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, json!({ "message": "Invalid credentials" }))
            }
            ApiFailure::NotFound => (StatusCode::NOT_FOUND, json!({ "message": "Not found." })),
            ApiFailure::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "message": "The POST method is not supported for this route." }),
            ),
            ApiFailure::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "message": message })),
            ApiFailure::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": "The given data was invalid.", "errors": errors }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn require_token(
    State(db): State<Db>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);
    match token {
        Some(token) if db.read().await.is_valid_token(&token) => Ok(next.run(request).await),
        _ => {
            tracing::debug!("rejected request without a valid token");
            Err(ApiFailure::Unauthenticated)
        }
    }
}

pub async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiFailure> {
    let mut store = db.write().await;
    let token = store
        .login(&input.email, &input.password)
        .ok_or(ApiFailure::InvalidCredentials)?;
    tracing::info!(email = %input.email, name = store.display_name(&input.email), "login");
    Ok(Json(TokenResponse { token }))
}

pub async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiFailure> {
    if input.name.trim().is_empty() {
        return Err(ApiFailure::field("name", "The name field is required."));
    }
    if !input.email.contains('@') {
        return Err(ApiFailure::field("email", "The email must be a valid email address."));
    }
    if input.password.len() < 6 {
        return Err(ApiFailure::field("password", "The password must be at least 6 characters."));
    }
    let mut store = db.write().await;
    if store.has_user(&input.email) {
        return Err(ApiFailure::field("email", "The email has already been taken."));
    }
    store.add_user(&input.name, &input.email, &input.password);
    let token = store.issue_token(input.email.to_lowercase());
    tracing::info!(email = %input.email, "registered");
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

pub async fn list_properties(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Property>>, ApiFailure> {
    let page = db
        .read()
        .await
        .list(&params)
        .map_err(|(field, message)| ApiFailure::field(&field, &message))?;
    Ok(Json(page))
}

pub async fn get_property(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<PropertyDetail>, ApiFailure> {
    db.read().await.detail(id).map(Json).ok_or(ApiFailure::NotFound)
}

pub async fn create_property(
    State(db): State<Db>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PropertyDetail>), ApiFailure> {
    let submission = read_submission(multipart).await?;
    let input = validate_submission(&submission).map_err(ApiFailure::Validation)?;
    let mut store = db.write().await;
    let property = store.insert_property(input);
    store.sync_images(property.id, None, submission.images);
    let detail = store.detail(property.id).ok_or(ApiFailure::NotFound)?;
    tracing::info!(id = property.id, "property created");
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `POST /properties/{id}` is only an update when it carries `_method=PUT`,
/// either in the query string or as a form field.
pub async fn update_property(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(method): Query<MethodOverride>,
    multipart: Multipart,
) -> Result<Json<PropertyDetail>, ApiFailure> {
    let submission = read_submission(multipart).await?;
    let override_put = method
        .method
        .as_deref()
        .or(submission.fields.get("_method").map(String::as_str))
        .is_some_and(|m| m.eq_ignore_ascii_case("PUT"));
    if !override_put {
        return Err(ApiFailure::MethodNotAllowed);
    }
    let input = validate_submission(&submission).map_err(ApiFailure::Validation)?;
    let mut store = db.write().await;
    store.update_property(id, input).ok_or(ApiFailure::NotFound)?;
    store.sync_images(id, Some(&submission.existing_images), submission.images);
    let detail = store.detail(id).ok_or(ApiFailure::NotFound)?;
    tracing::info!(id, "property updated");
    Ok(Json(detail))
}

pub async fn delete_property(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    if db.write().await.delete_property(id) {
        tracing::info!(id, "property deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiFailure::NotFound)
    }
}

pub async fn storage(State(db): State<Db>, Path(path): Path<String>) -> Response {
    let store = db.read().await;
    match store.file(&path) {
        Some(file) => (
            [(header::CONTENT_TYPE, file.content_type.clone())],
            Body::from(file.bytes.clone()),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<PropertySubmission, ApiFailure> {
    let mut submission = PropertySubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images[]" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiFailure::BadRequest(e.body_text()))?;
                submission.images.push(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "existing_images[]" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiFailure::BadRequest(e.body_text()))?;
                let id = text
                    .trim()
                    .parse()
                    .map_err(|_| ApiFailure::field("existing_images", "Image ids must be integers."))?;
                submission.existing_images.push(id);
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiFailure::BadRequest(e.body_text()))?;
                submission.fields.insert(name, text);
            }
        }
    }
    Ok(submission)
}
