/// WebSocket sessions for the interactive dashboard
use actix::prelude::*;
use actix_web_actors::ws;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::catalog::{CatalogSummary, FilterOptions};
use crate::dashboard::{
    build_snapshot, execute_query, load_catalog, DashboardContext, DashboardSnapshot, QueryResult,
};
use crate::error::Result;
use crate::filter::FilterSet;
use crate::messages::{ClientMessage, ServerMessage};

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for all HTTP handlers and WebSocket sessions
pub struct AppState {
    dashboard: Mutex<DashboardContext>,
    sessions: Mutex<Vec<Addr<DashboardSocket>>>,
}

impl AppState {
    pub fn new(dashboard: DashboardContext) -> Self {
        Self {
            dashboard: Mutex::new(dashboard),
            sessions: Mutex::new(Vec::new()),
        }
    }

    fn dashboard(&self) -> MutexGuard<'_, DashboardContext> {
        self.dashboard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compute a snapshot without holding the lock while aggregating.
    pub fn snapshot(&self, filters: &FilterSet) -> DashboardSnapshot {
        let (catalog, preview_rows) = {
            let dashboard = self.dashboard();
            (dashboard.catalog(), dashboard.preview_rows())
        };
        build_snapshot(filters, &filters.apply(&catalog), preview_rows)
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.dashboard().filter_options()
    }

    pub fn summary(&self) -> CatalogSummary {
        self.dashboard().summary()
    }

    /// The store is called with the lock released, so a slow statement
    /// never stalls other sessions.
    pub fn run_query(&self, sql: &str) -> Result<QueryResult> {
        let source = self.dashboard().source();
        execute_query(source.as_ref(), sql)
    }

    /// Fetch and normalize without the lock, then take it only to swap the
    /// catalog in.
    pub fn reload(&self) -> Result<CatalogSummary> {
        let source = self.dashboard().source();
        let catalog = load_catalog(source.as_ref())?;
        Ok(self.dashboard().replace_catalog(catalog))
    }

    pub fn register(&self, addr: Addr<DashboardSocket>) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|a| a.connected());
        sessions.push(addr);
    }

    /// Send a message to every connected session
    pub fn broadcast(&self, msg: ServerMessage) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|a| a.connected());
        log::debug!("Broadcasting to {} sessions", sessions.len());
        for addr in sessions.iter() {
            addr.do_send(BroadcastMessage(msg.clone()));
        }
    }

    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.iter().filter(|a| a.connected()).count()
    }
}

/// Where a response to a client message goes
#[derive(Debug, Clone)]
pub enum Reply {
    /// Back to the requesting session only
    Direct(ServerMessage),
    /// To every connected session
    Broadcast(ServerMessage),
}

/// Handle one client message against the shared state.
pub fn dispatch(state: &AppState, msg: ClientMessage) -> Reply {
    match msg {
        ClientMessage::GetOptions => Reply::Direct(ServerMessage::Options(state.filter_options())),

        ClientMessage::ApplyFilters { filters } => {
            Reply::Direct(ServerMessage::Dashboard(state.snapshot(&filters)))
        }

        ClientMessage::RunQuery { sql } => match state.run_query(&sql) {
            Ok(result) => Reply::Direct(ServerMessage::QueryResult(result)),
            Err(e) => Reply::Direct(ServerMessage::from(&e)),
        },

        ClientMessage::Reload => match state.reload() {
            Ok(summary) => Reply::Broadcast(ServerMessage::Reloaded { summary }),
            Err(e) => Reply::Direct(ServerMessage::from(&e)),
        },
    }
}

/// Message to broadcast to clients
#[derive(Message)]
#[rtype(result = "()")]
struct BroadcastMessage(ServerMessage);

/// WebSocket connection actor
pub struct DashboardSocket {
    hb: Instant,
    state: actix_web::web::Data<AppState>,
}

impl DashboardSocket {
    pub fn new(state: actix_web::web::Data<AppState>) -> Self {
        Self {
            hb: Instant::now(),
            state,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                log::info!("WebSocket client heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send_reply(&self, reply: Reply, ctx: &mut ws::WebsocketContext<Self>) {
        match reply {
            Reply::Direct(reply) => ctx.text(reply.to_json()),
            Reply::Broadcast(reply) => self.state.broadcast(reply),
        }
    }

    fn handle_client_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            // Store round-trips run on the blocking pool; the actor keeps
            // serving heartbeats and filter changes meanwhile.
            ClientMessage::RunQuery { .. } | ClientMessage::Reload => {
                let state = self.state.clone();
                let fut = actix_web::web::block(move || dispatch(&state, msg));
                ctx.spawn(fut.into_actor(self).map(|res, act, ctx| match res {
                    Ok(reply) => act.send_reply(reply, ctx),
                    Err(e) => {
                        log::error!("Blocking task failed: {}", e);
                        ctx.text(ServerMessage::error("internal", e.to_string()).to_json());
                    }
                }));
            }
            msg => {
                let reply = dispatch(&self.state, msg);
                self.send_reply(reply, ctx);
            }
        }
    }
}

impl Actor for DashboardSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);
        self.state.register(ctx.address());
    }
}

impl StreamHandler<std::result::Result<ws::Message, ws::ProtocolError>> for DashboardSocket {
    fn handle(
        &mut self,
        msg: std::result::Result<ws::Message, ws::ProtocolError>,
        ctx: &mut Self::Context,
    ) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => self.handle_client_message(client_msg, ctx),
                Err(e) => {
                    ctx.text(
                        ServerMessage::error("protocol", format!("Invalid message format: {}", e)).to_json(),
                    );
                }
            },
            Ok(ws::Message::Binary(_)) => {
                log::warn!("Unexpected binary message");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl Handler<BroadcastMessage> for DashboardSocket {
    type Result = ();

    fn handle(&mut self, msg: BroadcastMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0.to_json());
    }
}
