use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;

use crate::AppState;
use crate::error::ApiError;
use crate::models::{Limits, Workspace};

/// Header carrying the workspace api key.
pub const API_KEY_HEADER: &str = "x-vigil-key";

/// Workspace identity and plan limits resolved from the request's api key.
///
/// Extracting this is the whole authentication story: handlers that take a
/// `WorkspaceContext` cannot run without a valid key.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub workspace: Workspace,
    pub limits: Limits,
}

impl FromRequest for WorkspaceContext {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let api_key = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let database =
            req.app_data::<web::Data<AppState>>().map(|state| state.database.clone());

        Box::pin(async move {
            let database = database
                .ok_or_else(|| ApiError::Internal("application state is missing".to_string()))?;
            let api_key = api_key.ok_or(ApiError::Unauthorized)?;

            let workspace = database
                .workspace_by_api_key(&api_key)
                .await
                .map_err(|err| ApiError::Internal(format!("{err:#}")))?
                .ok_or(ApiError::Unauthorized)?;

            let limits = workspace.plan.limits();
            Ok(WorkspaceContext { workspace, limits })
        })
    }
}
