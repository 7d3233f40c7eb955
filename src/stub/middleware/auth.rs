use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::stub::handlers::Rejection;
use crate::stub::state::StubState;
use crate::utils::verify_token;

/// 校验 Bearer 令牌，并把声明放进请求扩展
pub async fn auth_middleware(
    State(state): State<StubState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return unauthorized("Authentication required");
    };

    match verify_token(bearer.token(), &state.secret) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::info!("Rejected token for {}: {}", request.uri().path(), e);
            unauthorized("Invalid or expired token")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    Rejection(
        axum::http::StatusCode::UNAUTHORIZED,
        crate::error::ErrorBody {
            error: Some(message.to_string()),
            ..Default::default()
        },
    )
    .into_response()
}
