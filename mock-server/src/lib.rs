use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

const LIMIT_PARAM: &str = "limit";
const PAGE_PARAM: &str = "page";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub data_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub inserted_at: Option<String>,
}

impl FeatureSet {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("FeatureSet Name is undefined".to_string());
        }
        if self.version.trim().is_empty() {
            return Err("FeatureSet Version is undefined".to_string());
        }
        for f in &self.features {
            if f.name.trim().is_empty() {
                return Err("Feature Name is undefined".to_string());
            }
            if f.value.is_null() {
                return Err(format!("Feature Value for Feature {} is undefined", f.name));
            }
            if f.data_type.trim().is_empty() {
                return Err(format!("Feature Data Type for Feature {} is undefined", f.name));
            }
        }
        Ok(())
    }

    fn description_words(&self) -> Vec<String> {
        self.description
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    #[serde(rename = "perPage")]
    pub per_page: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    #[serde(rename = "totalPage")]
    pub total_page: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedFeatureSets {
    pub pagination: Pagination,
    pub data: Vec<FeatureSet>,
}

#[derive(Deserialize)]
pub struct LabelsQuery {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_page")]
    pub page: usize,
}

#[derive(Deserialize)]
pub struct TextQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_limit() -> usize {
    10
}

fn default_page() -> usize {
    1
}

/// Error body returned for every non-2xx response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestError {
    pub message: String,
    pub status: u16,
    pub error: String,
}

impl RestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST.as_u16(),
            error: "bad_request".to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::NOT_FOUND.as_u16(),
            error: "not_found".to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

struct Entry {
    id: Uuid,
    featureset: FeatureSet,
}

/// In-memory feature set collection, oldest first.
#[derive(Clone, Default)]
pub struct Db {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl Db {
    /// Stores `featureset` stamped with the current time and returns its id
    /// along with the stored copy.
    pub async fn insert(&self, mut featureset: FeatureSet) -> (Uuid, FeatureSet) {
        featureset.inserted_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        let id = Uuid::new_v4();
        self.entries.write().await.push(Entry {
            id,
            featureset: featureset.clone(),
        });
        info!(%id, name = %featureset.name, version = %featureset.version, "feature set stored");
        (id, featureset)
    }

    pub async fn get(&self, id: Uuid) -> Option<FeatureSet> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.featureset.clone())
    }

    /// Matching feature sets, newest first.
    async fn select(&self, predicate: impl Fn(&FeatureSet) -> bool) -> Vec<FeatureSet> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .rev()
            .filter(|e| predicate(&e.featureset))
            .map(|e| e.featureset.clone())
            .collect()
    }
}

pub fn app() -> Router {
    app_with_db(Db::default())
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/healthcheck/featureset", get(ping))
        .route("/featureset/", put(create_featureset).get(list_all))
        .route("/featureset/id/{id}", get(get_by_id))
        .route("/featureset/name/{name}", get(get_by_name))
        .route("/labels", post(search_by_labels).get(search_by_query_labels))
        .route("/search", post(search))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Db::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

/// Slice `items` into the requested page. An empty result set is reported
/// as not found.
pub fn paginate(
    items: Vec<FeatureSet>,
    limit: usize,
    page: usize,
) -> Result<PaginatedFeatureSets, RestError> {
    if limit == 0 || page == 0 {
        return Err(RestError::bad_request("limit and page must be positive"));
    }
    if items.is_empty() {
        return Err(RestError::not_found(
            "Error while retrieving featuresets using filter :: empty result set",
        ));
    }
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| RestError::bad_request("page is out of range for the given limit"))?;
    let total = items.len();
    let total_page = total.div_ceil(limit);
    let pagination = Pagination {
        total,
        page,
        per_page: limit,
        prev: (page > 1).then(|| page - 1),
        next: (page < total_page).then(|| page + 1),
        total_page,
    };
    let data = items.into_iter().skip(offset).take(limit).collect();
    Ok(PaginatedFeatureSets { pagination, data })
}

fn limit_and_page(params: &HashMap<String, String>) -> Result<(usize, usize), RestError> {
    let parse = |key: &str| {
        params
            .get(key)
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| {
                RestError::bad_request(format!("{key} parameter is not a valid integer number"))
            })
    };
    Ok((parse(LIMIT_PARAM)?, parse(PAGE_PARAM)?))
}

async fn ping() -> &'static str {
    "pong"
}

async fn create_featureset(
    State(db): State<Db>,
    input: Result<Json<FeatureSet>, JsonRejection>,
) -> Result<(StatusCode, Json<FeatureSet>), RestError> {
    let Json(featureset) = input.map_err(|_| RestError::bad_request("Invalid JSON Body"))?;
    featureset.validate().map_err(RestError::bad_request)?;
    let (_, stored) = db.insert(featureset).await;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_by_id(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<FeatureSet>, RestError> {
    let not_found = || RestError::not_found(format!("no feature set with id {id}"));
    let uuid = Uuid::parse_str(&id).map_err(|_| not_found())?;
    db.get(uuid).await.map(Json).ok_or_else(not_found)
}

async fn get_by_name(
    State(db): State<Db>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedFeatureSets>, RestError> {
    let (limit, page) = limit_and_page(&params)?;
    debug!(%name, limit, page, "get by name");
    let items = db.select(|fs| fs.name == name).await;
    paginate(items, limit, page).map(Json)
}

async fn list_all(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedFeatureSets>, RestError> {
    let (limit, page) = limit_and_page(&params)?;
    let mut items = db.select(|_| true).await;
    items.reverse();
    paginate(items, limit, page).map(Json)
}

async fn search_by_labels(
    State(db): State<Db>,
    input: Result<Json<LabelsQuery>, JsonRejection>,
) -> Result<Json<PaginatedFeatureSets>, RestError> {
    let Json(query) = input.map_err(|_| {
        RestError::bad_request("Invalid query by labels :: invalid input json format")
    })?;
    labels_page(&db, query.labels, query.limit, query.page).await
}

async fn search_by_query_labels(
    State(db): State<Db>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedFeatureSets>, RestError> {
    let (limit, page) = limit_and_page(&params)?;
    params.remove(LIMIT_PARAM);
    params.remove(PAGE_PARAM);
    labels_page(&db, params.into_iter().collect(), limit, page).await
}

async fn labels_page(
    db: &Db,
    labels: BTreeMap<String, String>,
    limit: usize,
    page: usize,
) -> Result<Json<PaginatedFeatureSets>, RestError> {
    if labels.is_empty() {
        return Err(RestError::bad_request(
            "Invalid query by labels :: empty label dict",
        ));
    }
    debug!(?labels, limit, page, "search by labels");
    let items = db
        .select(|fs| labels.iter().all(|(k, v)| fs.labels.get(k) == Some(v)))
        .await;
    paginate(items, limit, page).map(Json)
}

async fn search(
    State(db): State<Db>,
    input: Result<Json<TextQuery>, JsonRejection>,
) -> Result<Json<PaginatedFeatureSets>, RestError> {
    let Json(query) = input
        .map_err(|_| RestError::bad_request("Invalid text query :: invalid input json format"))?;
    if query.query.trim().is_empty() {
        return Err(RestError::bad_request("Invalid text query :: empty text"));
    }
    debug!(query = %query.query, "text search");
    let terms: Vec<String> = query
        .query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut scored: Vec<(usize, FeatureSet)> = db
        .select(|_| true)
        .await
        .into_iter()
        .map(|fs| (text_score(&fs, &terms), fs))
        .filter(|(score, _)| *score > 0)
        .collect();
    // Stable: equal scores keep newest-first order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let items = scored.into_iter().map(|(_, fs)| fs).collect();
    paginate(items, query.limit, query.page).map(Json)
}

/// Number of query terms that occur as whole words in the description.
fn text_score(featureset: &FeatureSet, terms: &[String]) -> usize {
    let words = featureset.description_words();
    terms.iter().filter(|t| words.contains(t)).count()
}
