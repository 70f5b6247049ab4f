use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::{
    auth::SessionToken,
    blobs::{is_allowed_image_type, ImageFolder},
    credentials,
    error::{ApiError, AuthError},
    store::{ConfigDocument, ConfigStore, Message, SCHEMA_VERSION},
    AppState,
};

// ── Health ───────────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": SCHEMA_VERSION,
    }))
}

// ── Config ───────────────────────────────────────────────────────────────────

pub async fn get_config(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load()?;
    Ok(Json(ConfigStore::public_projection(&doc)))
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(mut doc): Json<ConfigDocument>,
) -> Result<Json<Value>, ApiError> {
    // The admin block in the request body is ignored. The server-held
    // credential always wins, so a config PUT can never rotate it.
    let current = state.store.load()?;
    doc.admin = current.admin;

    state.store.save(&mut doc)?;
    info!("portfolio config updated");
    Ok(Json(json!({"success": true, "message": "Configuration updated"})))
}

// ── Authentication ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load()?;

    // One failure answer for both unknown user and wrong password.
    if body.username != doc.admin.username
        || !credentials::verify_password(&body.password, &doc.admin.password_hash)
    {
        info!(username = %body.username, "rejected login attempt");
        return Err(AuthError::InvalidCredential.into());
    }

    let token = state.sessions.issue().await;
    info!("admin logged in");
    Ok(Json(json!({
        "success": true,
        "token": token,
        "message": "Login successful",
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Json<Value> {
    state.sessions.revoke(&token).await;
    Json(json!({"success": true, "message": "Logged out"}))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load()?;
    let mut updated = credentials::change_password(&body.old_password, &body.new_password, doc)?;
    state.store.save(&mut updated)?;
    info!("admin password changed");
    Ok(Json(json!({"success": true, "message": "Password changed successfully"})))
}

pub async fn verify_auth() -> Json<Value> {
    // Reaching this handler means the session middleware already passed.
    Json(json!({"success": true, "message": "Token valid"}))
}

// ── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut doc = state.store.load()?;

    let message = Message::new(
        body.first_name,
        body.last_name,
        body.email,
        body.subject,
        body.message,
    );
    doc.messages.insert(0, message);
    doc.stats.total_messages = doc.messages.len() as u64;

    state.store.save(&mut doc)?;
    info!(total = doc.stats.total_messages, "contact message received");
    Ok(Json(json!({"success": true, "message": "Message sent successfully"})))
}

pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let doc = state.store.load()?;
    Ok(Json(doc.messages))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let mut doc = state.store.load()?;

    let Some(slot) = doc.messages.iter_mut().find(|m| m.id == message_id) else {
        return Err(ApiError::NotFound("message".into()));
    };
    *slot = slot
        .apply_patch(&patch)
        .map_err(|e| ApiError::Validation(format!("invalid message patch: {e}")))?;

    state.store.save(&mut doc)?;
    Ok(Json(json!({"success": true, "message": "Message updated"})))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut doc = state.store.load()?;

    // Deleting an unknown id is a silent no-op.
    doc.messages.retain(|m| m.id != message_id);
    doc.stats.total_messages = doc.messages.len() as u64;

    state.store.save(&mut doc)?;
    Ok(Json(json!({"success": true, "message": "Message deleted"})))
}

// ── Uploads ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// One of `profile`, `project`, `misc`. Anything else becomes `misc`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn upload_image(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut kind = params.kind;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("multipart error: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_owned();
                let content_type = field.content_type().unwrap_or("").to_owned();
                // Enforce the allow-list before touching the body.
                if !is_allowed_image_type(&content_type) {
                    return Err(ApiError::Validation(
                        "invalid file type, allowed: JPEG, PNG, GIF, WebP".into(),
                    ));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read file: {e}")))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            "type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("multipart error: {e}")))?;
                kind = Some(value);
            }
            _ => {}
        }
    }

    let Some((filename, _content_type, bytes)) = file else {
        return Err(ApiError::Validation("no file field in request".into()));
    };

    let ext = file_extension(&filename)
        .ok_or_else(|| ApiError::Validation("file must have an extension".into()))?;

    let folder = ImageFolder::from_kind(kind.as_deref().unwrap_or("misc"));
    let stored = state.blobs.save(folder, &ext, &bytes)?;
    info!(path = %stored.path, "image uploaded");

    Ok(Json(json!({
        "success": true,
        "path": stored.path,
        "filename": stored.filename,
    })))
}

/// Lower-cased extension of the client filename, if it has one.
fn file_extension(filename: &str) -> Option<String> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

#[derive(Debug, Deserialize)]
pub struct ImageDeleteRequest {
    pub path: String,
}

pub async fn delete_image(
    State(state): State<AppState>,
    Json(body): Json<ImageDeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.blobs.delete(&body.path)? {
        info!(path = %body.path, "image deleted");
        Ok(Json(json!({"success": true, "message": "Image deleted"})))
    } else {
        Ok(Json(json!({"success": false, "message": "File not found"})))
    }
}

// ── Backups ──────────────────────────────────────────────────────────────────

pub async fn create_backup(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load()?;
    let path = state.backups.create(&doc)?;
    Ok(Json(json!({
        "success": true,
        "file": path.to_string_lossy(),
    })))
}

pub async fn list_backups(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::backup::BackupEntry>>, ApiError> {
    Ok(Json(state.backups.list()?))
}

// ── Stats ────────────────────────────────────────────────────────────────────

pub async fn record_visit(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut doc = state.store.load()?;
    doc.stats.total_visitors += 1;
    state.store.save(&mut doc)?;
    Ok(Json(json!({"success": true})))
}
