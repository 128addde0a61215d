use crate::error::BriefError;
use crate::models::{AnswerRequest, Brief, BriefResponse, Source};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// `POST /meeting-prep`
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn meeting_prep(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<BriefResponse>, BriefError> {
    let result = match body {
        Ok(body) => prepare_brief(&state, &headers, &body).await,
        Err(rejection) => Err(BriefError::from(rejection)),
    };
    match result {
        Ok(response) => Ok(Json(response)),
        Err(err) if err.is_rejection() => {
            info!("Meeting prep rejected: {}", err);
            Err(err)
        }
        Err(err) => {
            error!("Meeting prep failed: {}", err);
            Err(err)
        }
    }
}

async fn prepare_brief(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<BriefResponse, BriefError> {
    let payload: Value = serde_json::from_slice(body)?;
    let topic = match payload.get("topic").and_then(Value::as_str) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        _ => return Err(BriefError::Validation),
    };

    let self_hosted = state.config.is_self_hosted_mode();
    info!("App mode: {}", state.config.mode().as_str());

    let access_token = bearer_token(headers);
    if !self_hosted && access_token.is_none() {
        info!("No Valyu token - authentication required");
        return Err(BriefError::AuthRequired);
    }

    // Self-hosted deployments always bill the server key, even if a token was sent.
    let token = if self_hosted { None } else { access_token };

    let request = AnswerRequest::meeting_brief(&topic);
    let transport = state.valyu.transport(token);
    info!("Requesting brief for {:?} via {}", topic, transport.name());
    let result = transport.answer(&request).await?;

    if !result.success {
        if let Some(reason) = &result.error {
            debug!("Upstream reported failure: {}", reason);
        }
        return Err(BriefError::UpstreamFailure);
    }

    let fields = result.brief_fields().ok_or(BriefError::MissingContents)??;

    let response = BriefResponse {
        topic,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        brief: Brief::from(fields),
        sources: result.sources()?.into_iter().map(Source::from).collect(),
    };

    debug!(?response, "Meeting brief result");
    Ok(response)
}

/// Token from `Authorization: Bearer <token>`; empty tokens count as absent.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}
