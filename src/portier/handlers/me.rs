use axum::{Extension, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::authc::Subject;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Me {
    pub principal: Option<String>,
    pub session: String,
}

/// Principal and session of the authenticated caller.
pub async fn me(Extension(subject): Extension<Arc<dyn Subject>>) -> Json<Me> {
    Json(Me {
        principal: subject.principal(),
        session: subject.session().id().to_string(),
    })
}
