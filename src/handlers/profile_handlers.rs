use crate::{AppState, models::profile::ContactProfile};
use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub contact: ContactProfile,
    pub whatsapp_url: Option<String>,
}

/// `GET /api/profile`
pub async fn get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        whatsapp_url: state.profile.whatsapp_url(),
        contact: state.profile.as_ref().clone(),
    })
}
