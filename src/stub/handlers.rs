use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::models::{
    Doctor, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Role, Service, User,
    UserDraft,
};
use crate::error::ErrorBody;
use crate::stub::rules::{StubResource, Verb};
use crate::stub::state::StubState;
use crate::utils::{Claims, generate_token, hash_password, verify_password, verify_token};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// 以 JSON 错误体返回的失败
pub struct Rejection(pub StatusCode, pub ErrorBody);

impl Rejection {
    fn bad_request(message: impl Into<String>) -> Self {
        Rejection(StatusCode::BAD_REQUEST, ErrorBody::new(message))
    }

    fn unprocessable(body: ErrorBody) -> Self {
        Rejection(StatusCode::UNPROCESSABLE_ENTITY, body)
    }

    fn not_found(what: &str) -> Self {
        Rejection(StatusCode::NOT_FOUND, ErrorBody::new(format!("{what} not found")))
    }

    fn forbidden() -> Self {
        Rejection(
            StatusCode::FORBIDDEN,
            ErrorBody::new("You do not have permission to perform this action"),
        )
    }

    fn unauthorized(message: &str) -> Self {
        Rejection(
            StatusCode::UNAUTHORIZED,
            ErrorBody {
                error: Some(message.to_string()),
                ..ErrorBody::default()
            },
        )
    }

    fn internal(message: impl Into<String>) -> Self {
        Rejection(StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(message))
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, Rejection> {
    serde_json::from_value(body).map_err(|e| Rejection::bad_request(format!("Invalid request body: {e}")))
}

fn label<R: StubResource>() -> String {
    let mut chars = R::SINGULAR.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

pub async fn list<R: StubResource>(
    State(state): State<StubState>,
    Extension(claims): Extension<Claims>,
) -> Json<Vec<R::Model>> {
    let tables = state.tables();
    let visible = tables
        .list::<R>()
        .into_iter()
        .filter(|model| R::visible_to(&tables, model, &claims))
        .collect();
    Json(visible)
}

pub async fn get_one<R: StubResource>(
    State(state): State<StubState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<R::Model>, Rejection> {
    let tables = state.tables();
    match tables.get::<R>(id) {
        Some(model) if R::visible_to(&tables, &model, &claims) => Ok(Json(model)),
        _ => Err(Rejection::not_found(&label::<R>())),
    }
}

pub async fn create<R: StubResource>(
    State(state): State<StubState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<R::Model>), Rejection> {
    if !R::permits(claims.role, Verb::Create) {
        return Err(Rejection::forbidden());
    }
    let draft: R::Draft = parse_body(body)?;

    let mut tables = state.tables();
    R::check_draft(&tables, &draft).map_err(Rejection::unprocessable)?;
    let model = tables.insert::<R>(draft);
    R::after_create(&mut tables, &model);
    tracing::info!("Created {} {}", R::SINGULAR, R::id(&model));
    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn update<R: StubResource>(
    State(state): State<StubState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<R::Model>, Rejection> {
    if !R::permits(claims.role, Verb::Update) {
        return Err(Rejection::forbidden());
    }
    let patch: R::Patch = parse_body(body)?;
    R::check_patch(&patch).map_err(Rejection::unprocessable)?;

    let mut tables = state.tables();
    match tables.get::<R>(id) {
        Some(model) if R::visible_to(&tables, &model, &claims) => {}
        _ => return Err(Rejection::not_found(&label::<R>())),
    }
    let model = tables
        .update::<R>(id, patch)
        .ok_or_else(|| Rejection::not_found(&label::<R>()))?;
    tracing::info!("Updated {} {}", R::SINGULAR, id);
    Ok(Json(model))
}

pub async fn delete<R: StubResource>(
    State(state): State<StubState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Rejection> {
    if !R::permits(claims.role, Verb::Delete) {
        return Err(Rejection::forbidden());
    }

    let mut tables = state.tables();
    match tables.get::<R>(id) {
        Some(model) if R::visible_to(&tables, &model, &claims) => {}
        _ => return Err(Rejection::not_found(&label::<R>())),
    }
    tables.remove::<R>(id);
    R::after_delete(&mut tables, id);
    tracing::info!("Deleted {} {}", R::SINGULAR, id);
    Ok(Json(json!({ "message": format!("{} deleted", label::<R>()) })))
}

pub async fn login(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Result<Json<LoginResponse>, Rejection> {
    let req: LoginRequest = parse_body(body)?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        let mut body = ErrorBody::new("Email and password are required");
        if req.email.trim().is_empty() {
            body = body.with_field("email", "Email is required");
        }
        if req.password.is_empty() {
            body = body.with_field("password", "Password is required");
        }
        return Err(Rejection(StatusCode::BAD_REQUEST, body));
    }

    let (account, user) = {
        let tables = state.tables();
        let account = tables.account(&req.email).cloned();
        let user = account.as_ref().and_then(|a| tables.get::<User>(a.user_id));
        (account, user)
    };
    let (Some(account), Some(user)) = (account, user) else {
        tracing::info!("Login attempt for unknown account");
        return Err(Rejection::unauthorized("Invalid email or password"));
    };

    match verify_password(&req.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(Rejection::unauthorized("Invalid email or password")),
        Err(e) => return Err(Rejection::internal(format!("Password verification failed: {e}"))),
    }

    let (token, _) = generate_token(user.id, user.role, &state.secret, state.token_ttl_secs)
        .map_err(|e| Rejection::internal(format!("Failed to issue token: {e}")))?;
    tracing::info!("User {} signed in as {}", user.id, user.role);
    Ok(Json(LoginResponse {
        token,
        role: Some(user.role),
        user,
    }))
}

/// 公开注册创建患者；管理员调用时按请求中的角色创建，并返回用户本身
pub async fn register(
    State(state): State<StubState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<Value>,
) -> Result<Response, Rejection> {
    let caller = bearer.and_then(|TypedHeader(Authorization(bearer))| {
        verify_token(bearer.token(), &state.secret).ok()
    });
    let by_admin = caller.is_some_and(|claims| claims.role == Role::Admin);

    let draft = if by_admin {
        parse_body::<UserDraft>(body)?
    } else {
        let req: RegisterRequest = parse_body(body)?;
        UserDraft {
            full_name: req.full_name,
            email: req.email,
            password: req.password,
            role: Role::Patient,
            phone: req.phone,
        }
    };

    let mut invalid = ErrorBody::new("Registration failed");
    if draft.full_name.trim().is_empty() {
        invalid = invalid.with_field("fullName", "Full name is required");
    }
    if !draft.email.contains('@') {
        invalid = invalid.with_field("email", "Please enter a valid email");
    }
    if draft.password.chars().count() < MIN_PASSWORD_LENGTH {
        invalid = invalid.with_field(
            "password",
            &format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }
    if state.tables().email_taken(&draft.email) {
        invalid = invalid.with_field("email", "Email is already registered");
    }
    if !invalid.errors.is_empty() {
        return Err(Rejection::unprocessable(invalid));
    }

    let password_hash = hash_password(&draft.password)
        .map_err(|e| Rejection::internal(format!("Failed to hash password: {e}")))?;

    let mut tables = state.tables();
    let email = draft.email.clone();
    let user = tables.insert::<User>(draft);
    tables.add_account(&email, user.id, password_hash);
    if user.role == Role::Doctor {
        tables.put::<Doctor>(&Doctor {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            specialization: "General Practice".to_string(),
            experience_years: 0,
            fee: 0.0,
            available: true,
        });
    }
    tracing::info!("Registered user {} as {}", user.id, user.role);

    let response = if by_admin {
        (StatusCode::CREATED, Json(user)).into_response()
    } else {
        let body = RegisterResponse {
            user,
            message: Some("Registration successful".to_string()),
        };
        (StatusCode::CREATED, Json(body)).into_response()
    };
    Ok(response)
}

pub async fn me(
    State(state): State<StubState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, Rejection> {
    let user = claims.user_id().and_then(|id| state.tables().get::<User>(id));
    user.map(Json).ok_or_else(|| Rejection::not_found("User"))
}

pub async fn service_by_title(
    State(state): State<StubState>,
    Path(title): Path<String>,
) -> Result<Json<Service>, Rejection> {
    state
        .tables()
        .list::<Service>()
        .into_iter()
        .find(|service| service.title.eq_ignore_ascii_case(title.trim()))
        .map(Json)
        .ok_or_else(|| Rejection::not_found("Service"))
}
