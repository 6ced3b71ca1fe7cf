/// Authentication middleware
///
/// Runs the request pipeline for every request. Admitted requests get a
/// `Caller` in their extensions, plus the `Identity` itself when the caller
/// authenticated, so handlers can extract either:
///
/// ```ignore
/// use axum::Extension;
/// use marquee_api::auth::Identity;
///
/// async fn handler(Extension(identity): Extension<Identity>) -> String {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
///
/// Rejected requests are answered directly from the `AuthError`.
use super::error::AuthError;
use super::identity::Caller;
use super::pipeline::Admission;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let admission = state
        .pipeline
        .admit(request.method(), request.uri().path(), request.headers())
        .await?;

    match admission {
        Admission::Bypass => {
            request.extensions_mut().insert(Caller::Anonymous);
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            );
            Ok(response)
        }
        Admission::Public => {
            request.extensions_mut().insert(Caller::Anonymous);
            Ok(next.run(request).await)
        }
        Admission::Admitted(identity) => {
            request.extensions_mut().insert(identity.clone());
            request
                .extensions_mut()
                .insert(Caller::Authenticated(identity));
            Ok(next.run(request).await)
        }
    }
}
