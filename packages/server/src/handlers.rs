//! HTTP handler functions for the crime dashboard API.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use crime_dashboard_crime_models::FirStatus;
use crime_dashboard_database::accounts::UserRecord;
use crime_dashboard_fir_models::{FieldError, ValidationError, is_valid_email};
use crime_dashboard_patrol::progress::{AllocationEvent, COMPLETION_MESSAGE, narrate};
use crime_dashboard_patrol::{score, score_inputs};
use crime_dashboard_patrol_models::{HotspotInput, PatrolRecommendation};
use crime_dashboard_server_models::{
    AllocatePatrolRequest, AllocatePatrolResponse, ApiFir, ApiFirCreated, ApiHealth, ApiOfficer,
    ApiUser, FirListParams, LoginRequest, LoginResponse, OfficerQueryParams,
    StatusUpdateRequest,
};
use tokio::sync::mpsc;

use crate::AppState;
use crate::auth::{self, AuthError};
use crate::error::ApiError;
use crate::upload::read_submission;

fn api_user(user: UserRecord) -> ApiUser {
    ApiUser {
        id: user.id,
        name: user.name,
        role: user.role,
        email: user.email,
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Scores `hotspots` and caches the result as the latest plan.
fn allocate(
    state: &AppState,
    hotspots: Vec<HotspotInput>,
) -> Result<Vec<PatrolRecommendation>, ApiError> {
    let plan = score_inputs(hotspots)?;
    state.patrol_cache.replace(plan.clone());
    log::info!("Allocated patrols for {} hotspot(s)", plan.len());
    Ok(plan)
}

/// `POST /api/patrol-allocations`
pub async fn patrol_allocations(
    state: web::Data<AppState>,
    body: web::Json<Vec<HotspotInput>>,
) -> Result<HttpResponse, ApiError> {
    let plan = allocate(&state, body.into_inner())?;
    Ok(HttpResponse::Ok().json(plan))
}

/// `POST /api/allocate-patrol`
///
/// Older request/response shape used by the map page.
pub async fn allocate_patrol(
    state: web::Data<AppState>,
    body: web::Json<AllocatePatrolRequest>,
) -> Result<HttpResponse, ApiError> {
    let plan = allocate(&state, body.into_inner().hotspots)?;
    Ok(HttpResponse::Ok().json(AllocatePatrolResponse {
        patrol_plan: plan,
        message: COMPLETION_MESSAGE.to_string(),
    }))
}

/// `POST /api/patrol-allocations/default`
///
/// Scores the configured hotspot catalog.
pub async fn default_patrol_allocations(state: web::Data<AppState>) -> HttpResponse {
    let plan = score(state.hotspots.hotspots());
    state.patrol_cache.replace(plan.clone());
    HttpResponse::Ok().json(plan)
}

/// `POST /api/patrol-allocations/stream`
///
/// Server-sent events: four `progress` events, then `plan`, then `done`.
/// Invalid input produces a single `error` event.
pub async fn stream_patrol_allocations(
    state: web::Data<AppState>,
    body: web::Json<Vec<HotspotInput>>,
) -> HttpResponse {
    let (tx, mut rx) = mpsc::channel::<AllocationEvent>(8);

    match allocate(&state, body.into_inner()) {
        Ok(plan) => {
            tokio::spawn(narrate(plan, tx, state.progress_delay));
        }
        Err(e) => {
            let _ = tx.try_send(AllocationEvent::Error {
                message: e.to_string(),
            });
        }
    }

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let data = serde_json::to_string(&event).unwrap_or_default();
            yield Ok::<_, actix_web::Error>(web::Bytes::from(format!(
                "event: {}\ndata: {data}\n\n",
                event.name()
            )));
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// `GET /api/patrol-allocations/latest`
pub async fn latest_patrol_allocation(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    state.patrol_cache.latest().map_or_else(
        || Err(ApiError::NotFound("No patrol plan has been computed yet".to_string())),
        |cached| Ok(HttpResponse::Ok().json(cached)),
    )
}

/// `DELETE /api/patrol-allocations/latest`
pub async fn invalidate_patrol_allocation(state: web::Data<AppState>) -> HttpResponse {
    if state.patrol_cache.invalidate() {
        log::info!("Cleared cached patrol plan");
    }
    HttpResponse::NoContent().finish()
}

/// `POST /api/firs`
///
/// Multipart form: FIR text fields plus any number of evidence files.
pub async fn create_fir(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(payload, state.max_upload_bytes).await?;
    let record = state.firs.create(submission.draft, submission.files).await?;

    Ok(HttpResponse::Created().json(ApiFirCreated {
        fir_id: record.id,
        message: "FIR submitted successfully".to_string(),
    }))
}

/// `GET /api/firs`
///
/// All FIRs newest first, optionally filtered by `q`. With `page`, only that
/// page is returned and the totals are sent as `X-Total-Count` and
/// `X-Total-Pages`.
pub async fn list_firs(
    state: web::Data<AppState>,
    params: web::Query<FirListParams>,
) -> Result<HttpResponse, ApiError> {
    let term = params.q.as_deref();

    if let Some(page) = params.page {
        let page = state.firs.page(term, page).await?;
        let items: Vec<ApiFir> = page.items.into_iter().map(ApiFir::from).collect();
        return Ok(HttpResponse::Ok()
            .insert_header(("X-Total-Count", page.total_count.to_string()))
            .insert_header(("X-Total-Pages", page.total_pages.to_string()))
            .json(items));
    }

    let firs: Vec<ApiFir> = state
        .firs
        .list(term)
        .await?
        .into_iter()
        .map(ApiFir::from)
        .collect();
    Ok(HttpResponse::Ok().json(firs))
}

/// `GET /api/firs/{id}`
pub async fn get_fir(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let record = state.firs.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiFir::from(record)))
}

/// `PATCH /api/firs/{id}/status`
///
/// Requires an admin or investigator session.
pub async fn update_fir_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = auth::require_status_updater(&req, &state).await?;

    let target: FirStatus = body.status.parse().map_err(|_| {
        ValidationError::single(
            "status",
            format!(
                "\"{}\" is not one of pending, under investigation, resolved",
                body.status
            ),
        )
    })?;

    let id = path.into_inner();
    let record = state.firs.transition(id, target).await?;
    log::info!("{} set FIR {id} to {target}", user.email);

    Ok(HttpResponse::Ok().json(ApiFir::from(record)))
}

/// `GET /api/stats`
pub async fn stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.firs.stats().await?))
}

/// `GET /api/officers`
pub async fn officers(
    state: web::Data<AppState>,
    params: web::Query<OfficerQueryParams>,
) -> HttpResponse {
    let officers: Vec<ApiOfficer> = state
        .directory
        .search(params.division.as_deref(), params.q.as_deref())
        .into_iter()
        .map(ApiOfficer::from)
        .collect();
    HttpResponse::Ok().json(officers)
}

/// `GET /api/officers/divisions`
pub async fn divisions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.directory.divisions())
}

/// `GET /api/hotspots`
pub async fn hotspots(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.hotspots.hotspots())
}

/// `POST /api/auth/login`
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = body.into_inner();

    let mut fields = Vec::new();
    if !is_valid_email(email.trim()) {
        fields.push(FieldError {
            field: "email".to_string(),
            message: "is not an e-mail address".to_string(),
        });
    }
    if password.is_empty() {
        fields.push(FieldError {
            field: "password".to_string(),
            message: "is required".to_string(),
        });
    }
    if !fields.is_empty() {
        return Err(ValidationError { fields }.into());
    }

    let Some(user) = state.accounts.verify_credentials(&email, &password).await? else {
        log::warn!("Failed login for {email}");
        return Err(AuthError::BadCredentials.into());
    };

    let session = state
        .accounts
        .create_session(user.id, state.session_ttl)
        .await?;
    log::info!("{} logged in", user.email);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: api_user(user),
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let token = auth::bearer_token(&req).ok_or(AuthError::MissingToken)?;
    state.accounts.revoke_session(token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/auth/me`
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = auth::authenticate(&req, &state).await?;
    Ok(HttpResponse::Ok().json(api_user(user)))
}
