//! Tray API Handlers

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use shared::models::{TrayAssignment, TrayEdit, TrayView};

use crate::core::ServerState;
use crate::trays::TraySession;
use crate::utils::AppResult;

/// GET /api/trays
pub async fn get(State(state): State<ServerState>) -> Json<TrayAssignment> {
    Json(state.tree.read_tray_assignment())
}

/// PUT /api/trays - 手动编辑
///
/// 三个值全部校验通过才写入，trayCount 随之重算。
pub async fn edit(
    State(state): State<ServerState>,
    Json(payload): Json<TrayEdit>,
) -> AppResult<Json<TrayAssignment>> {
    let assignment = TrayAssignment::from(payload.parse()?);
    state.tree.write_tray_assignment(assignment);
    tracing::info!(
        tray1 = assignment.tray1,
        tray2 = assignment.tray2,
        tray3 = assignment.tray3,
        "Trays edited manually"
    );
    Ok(Json(assignment))
}

fn view_event(view: TrayView) -> Event {
    match Event::default().event("trays").json_data(view) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode tray view");
            Event::default().comment("encode error")
        }
    }
}

/// GET /api/trays/stream - 托盘视图推送
///
/// 连接持有一个 [`TraySession`]；客户端断开时流被 drop，会话随之关闭。
pub async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.synchronizer.observe("sse");
    let view = session.view();

    let events = futures::stream::unfold(
        (session, view, true),
        |(session, mut view, first): (TraySession, _, bool)| async move {
            if !first && view.changed().await.is_err() {
                return None;
            }
            let current = *view.borrow_and_update();
            Some((Ok(view_event(current)), (session, view, false)))
        },
    );

    Sse::new(events).keep_alive(KeepAlive::default())
}
