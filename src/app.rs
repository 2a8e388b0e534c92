use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::composer::Composer;
use crate::config::Config;
use crate::error::DataError;
use crate::html::result_message;
use crate::lists;
use crate::loader::open_source;
use crate::search;
use crate::store::DataStore;

pub struct AppState {
    pub store: DataStore,
}

/// Query string of `/exec`; which fields matter depends on `action`
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExecQuery {
    pub action: Option<String>,
    pub opera: Option<String>,
    pub scenes: Option<String>,
    pub page_input: Option<String>,
    pub query: Option<String>,
    pub input: Option<String>,
    pub composer: Option<String>,
}

/// Handlers reachable through the `action` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SearchByScene(Composer),
    SearchByPage(Composer),
    SearchTerms(Composer),
    TermsForClient(Composer),
    TermsPartially(Composer),
    SceneOptions,
    ListData,
    AbbrListData,
    DicData,
    NotesData,
    ListHtml,
    DicHtml,
    NotesHtml,
    AbbrListHtml,
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Composer::*;

        Ok(match s {
            "searchRichardStraussByScene" => Action::SearchByScene(Strauss),
            "searchRichardWagnerByScene" => Action::SearchByScene(Wagner),
            "searchRichardStraussByPage" => Action::SearchByPage(Strauss),
            "searchRichardWagnerByPage" => Action::SearchByPage(Wagner),
            "searchRSTerms" => Action::SearchTerms(Strauss),
            "searchRWTerms" => Action::SearchTerms(Wagner),
            "searchByTerm" => Action::SearchTerms(Mahler),
            "getRSTermsForClient" => Action::TermsForClient(Strauss),
            "getRWTermsForClient" => Action::TermsForClient(Wagner),
            "getGMTermsForClient" => Action::TermsForClient(Mahler),
            "searchRSTermsPartially" => Action::TermsPartially(Strauss),
            "searchRWTermsPartially" => Action::TermsPartially(Wagner),
            "searchGMTermsPartially" => Action::TermsPartially(Mahler),
            "getSceneOptionsForOpera" => Action::SceneOptions,
            "getListData" => Action::ListData,
            "getAbbrListData" => Action::AbbrListData,
            "getDicData" => Action::DicData,
            "getNotesData" => Action::NotesData,
            "getListHtml" => Action::ListHtml,
            "getDicHtml" => Action::DicHtml,
            "getNotesHtml" => Action::NotesHtml,
            "getAbbrListHtml" => Action::AbbrListHtml,
            other => return Err(AppError::UnknownAction(other.to_string())),
        })
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("不明なアクションです: {0}")]
    UnknownAction(String),

    #[error("パラメータ「{0}」が指定されていません。")]
    MissingParameter(&'static str),

    #[error("不明な作曲家です: {0}")]
    UnknownComposer(String),

    #[error("{0}")]
    Data(#[from] DataError),

    #[error("サーバー内部エラー: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UnknownAction { .. }
            | AppError::MissingParameter { .. }
            | AppError::UnknownComposer { .. } => StatusCode::BAD_REQUEST,
            AppError::Data { .. } | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(Value::String(result_message(&self.to_string())))).into_response()
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

fn param(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Run one request against the store
///
/// Search actions always answer with an HTML string (their failures are
/// already rendered as messages). Data actions answer with JSON data and
/// surface failures as `AppError`.
pub fn dispatch(store: &DataStore, params: &ExecQuery) -> Result<Value, AppError> {
    let action: Action = params
        .action
        .as_deref()
        .ok_or(AppError::MissingParameter("action"))?
        .parse()?;

    match action {
        Action::SearchByScene(composer) => {
            let scenes: Vec<String> = param(&params.scenes)
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            Ok(Value::String(search::search_by_scene(
                store,
                composer,
                param(&params.opera),
                &scenes,
            )))
        }
        Action::SearchByPage(composer) => Ok(Value::String(search::search_by_page(
            store,
            composer,
            param(&params.opera),
            param(&params.page_input),
        ))),
        Action::SearchTerms(composer) => Ok(Value::String(search::search_terms(
            store,
            composer,
            param(&params.query),
        ))),
        Action::TermsForClient(composer) => to_json(search::terms_for_client(store, composer)?),
        Action::TermsPartially(composer) => {
            let input = params.input.as_ref().or(params.query.as_ref());
            to_json(search::search_terms_partially(
                store,
                composer,
                input.map(String::as_str).unwrap_or(""),
            )?)
        }
        Action::SceneOptions => {
            let name = params
                .composer
                .as_deref()
                .ok_or(AppError::MissingParameter("composer"))?;
            let composer: Composer = name
                .parse()
                .map_err(|_| AppError::UnknownComposer(name.to_string()))?;
            to_json(search::scene_options_for_opera(store, composer)?)
        }
        Action::ListData => to_json(lists::list_data(store)?),
        Action::AbbrListData => to_json(lists::abbr_list_data(store)?),
        Action::DicData => to_json(lists::dic_data(store)?),
        Action::NotesData => to_json(lists::notes_data(store)?),
        Action::ListHtml => Ok(Value::String(lists::render_or_message(
            lists::list_data(store),
            lists::render_list,
        ))),
        Action::DicHtml => Ok(Value::String(lists::render_or_message(
            lists::dic_data(store),
            lists::render_list,
        ))),
        Action::NotesHtml => Ok(Value::String(lists::render_or_message(
            lists::notes_data(store),
            lists::render_notes,
        ))),
        Action::AbbrListHtml => Ok(Value::String(lists::render_or_message(
            lists::abbr_list_data(store),
            lists::render_abbr_list,
        ))),
    }
}

async fn exec(State(state): State<Arc<AppState>>, Query(params): Query<ExecQuery>) -> Response {
    let request_id = Uuid::new_v4();
    debug!("[{}] action={:?}", request_id, params.action);

    let action = params.action.clone();
    let result = tokio::task::spawn_blocking(move || dispatch(&state.store, &params))
        .await
        .unwrap_or_else(|e| Err(AppError::Internal(e.to_string())));

    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => {
            warn!("[{}] action={:?} failed: {}", request_id, action, e);
            e.into_response()
        }
    }
}

/// Routes of the service, without binding a socket
pub fn router(state: Arc<AppState>, static_dir: Option<&std::path::Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let mut app = Router::new()
        .route("/", get(exec))
        .route("/exec", get(exec));

    if let Some(dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(cors).with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = open_source(&config.data_path)?;
    info!("Serving workbook at {}", config.data_path.display());

    let state = Arc::new(AppState {
        store: DataStore::new(source, config.cache_ttl),
    });
    let app = router(state, config.static_dir.as_deref());

    let address = config.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
