/// HTTP server with WebSocket support for the catalog dashboard
use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, Error, HttpRequest, HttpResponse, HttpServer, ResponseError};
use actix_web_actors::ws;

use crate::dashboard::DashboardContext;
use crate::error::DashboardError;
use crate::filter::FilterSet;
use crate::messages::{QueryRequest, ServerMessage};
use crate::websocket::{AppState, DashboardSocket};

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Query(_) | DashboardError::Schema(_) => StatusCode::BAD_REQUEST,
            DashboardError::Connection(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ServerMessage::from(self))
    }
}

/// WebSocket endpoint handler
async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    ws::start(DashboardSocket::new(state), &req, stream)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "records": state.summary().total_records,
        "sessions": state.session_count(),
    }))
}

async fn options(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.filter_options())
}

async fn dashboard(state: web::Data<AppState>, filters: web::Query<FilterSet>) -> HttpResponse {
    HttpResponse::Ok().json(state.snapshot(&filters))
}

async fn query(
    state: web::Data<AppState>,
    body: web::Json<QueryRequest>,
) -> Result<HttpResponse, Error> {
    let sql = body.into_inner().sql;
    let result = web::block(move || state.run_query(&sql)).await??;
    Ok(HttpResponse::Ok().json(result))
}

async fn reload(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let broadcast_state = state.clone();
    let summary = web::block(move || state.reload()).await??;
    broadcast_state.broadcast(ServerMessage::Reloaded {
        summary: summary.clone(),
    });
    Ok(HttpResponse::Ok().json(summary))
}

/// Register every dashboard route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_index))
        .route("/health", web::get().to(health_check))
        .route("/api/options", web::get().to(options))
        .route("/api/dashboard", web::get().to(dashboard))
        .route("/api/query", web::post().to(query))
        .route("/api/reload", web::post().to(reload));
}

/// Start the HTTP server with WebSocket support
pub async fn run_server(host: &str, port: u16, dashboard: DashboardContext) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(dashboard));

    log::info!("Catalog dashboard listening on http://{}:{}", host, port);
    log::info!("WebSocket endpoint: ws://{}:{}/ws", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
