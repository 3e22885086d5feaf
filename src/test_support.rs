//! Fixtures shared by the in-module tests: a shapefile bundle writer and a
//! scripted local stand-in for the Hydrocron timeseries endpoint.

use crate::reaches::loader::UploadedFile;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const WGS84_PRJ: &str = concat!(
    r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],"#,
    r#"PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#,
);

pub struct FixtureReach {
    pub reach_id: i64,
    pub river_name: &'static str,
    pub width: f64,
}

impl FixtureReach {
    pub fn new(reach_id: i64, river_name: &'static str, width: f64) -> Self {
        Self {
            reach_id,
            river_name,
            width,
        }
    }
}

/// Writes a point shapefile with `reach_id`, `river_name` and `width`
/// attributes and returns its four files as uploads.
pub fn sword_bundle(reaches: &[FixtureReach]) -> Result<Vec<UploadedFile>, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let shp_path = dir.path().join("sword_reaches.shp");

    let table = TableWriterBuilder::new()
        .add_numeric_field(FieldName::try_from("reach_id")?, 14, 0)
        .add_character_field(FieldName::try_from("river_name")?, 50)
        .add_numeric_field(FieldName::try_from("width")?, 12, 3);
    {
        let mut writer = shapefile::Writer::from_path(&shp_path, table)?;
        for (i, reach) in reaches.iter().enumerate() {
            let mut record = Record::default();
            record.insert(
                "reach_id".to_string(),
                FieldValue::Numeric(Some(reach.reach_id as f64)),
            );
            record.insert(
                "river_name".to_string(),
                FieldValue::Character(Some(reach.river_name.to_string())),
            );
            record.insert("width".to_string(), FieldValue::Numeric(Some(reach.width)));
            let point = shapefile::Point::new(15.0 + i as f64 * 0.1, -4.0);
            writer.write_shape_and_record(&point, &record)?;
        }
    }
    std::fs::write(shp_path.with_extension("prj"), WGS84_PRJ)?;

    let mut files = Vec::new();
    for ext in ["shp", "shx", "dbf", "prj"] {
        let path = shp_path.with_extension(ext);
        files.push(UploadedFile::new(
            format!("sword_reaches.{}", ext),
            std::fs::read(&path)?,
        ));
    }
    Ok(files)
}

/// What the mock endpoint answers to the next request for a reach.
#[derive(Debug, Clone)]
pub enum Scripted {
    Csv(String),
    EmptyCsv,
    RateLimited(Option<&'static str>),
    Status(u16, &'static str),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub feature_id: String,
    pub params: HashMap<String, String>,
    pub at: Instant,
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A Hydrocron lookalike on `127.0.0.1`, answering from per-reach scripts.
/// Reaches without a remaining script get a 400.
pub struct MockHydrocron {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockHydrocron {
    pub async fn start(scripts: Vec<(&str, Vec<Scripted>)>) -> Result<Self, Box<dyn Error>> {
        let state = Arc::new(MockState::default());
        {
            let mut map = state.scripts.lock().map_err(|e| e.to_string())?;
            for (reach_id, script) in scripts {
                map.entry(reach_id.to_string())
                    .or_default()
                    .extend(script);
            }
        }

        let app = Router::new()
            .route("/timeseries", get(timeseries))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}/timeseries", addr),
            state,
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn requests_for(&self, reach_id: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.feature_id == reach_id)
            .count()
    }
}

async fn timeseries(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let feature_id = params.get("feature_id").cloned().unwrap_or_default();
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(RecordedRequest {
            feature_id: feature_id.clone(),
            params: params.clone(),
            at: Instant::now(),
        });
    }

    let next = state
        .scripts
        .lock()
        .ok()
        .and_then(|mut scripts| scripts.get_mut(&feature_id).and_then(|q| q.pop_front()))
        .unwrap_or(Scripted::Status(400, "Unable to find reach"));

    match next {
        Scripted::Csv(csv) => Json(json!({
            "status": "200 OK",
            "hits": 1,
            "results": { "csv": csv, "geojson": {} }
        }))
        .into_response(),
        Scripted::EmptyCsv => Json(json!({
            "status": "200 OK",
            "hits": 0,
            "results": { "csv": "", "geojson": {} }
        }))
        .into_response(),
        Scripted::RateLimited(retry_after) => {
            let mut response = (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
            if let Some(value) = retry_after {
                response
                    .headers_mut()
                    .insert("retry-after", HeaderValue::from_static(value));
            }
            response
        }
        Scripted::Status(code, body) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        }
    }
}

/// A small Hydrocron-shaped CSV payload for `reach_id` with `rows` passes.
pub fn reach_csv(reach_id: &str, rows: usize) -> String {
    let mut csv = String::from("reach_id,time_str,wse,width,wse_units,width_units\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "{},2024-0{}-1{}T08:3{}:12Z,{}.25,{}.5,m,m\n",
            reach_id,
            1 + i % 9,
            i % 10,
            i % 10,
            300 + i,
            100 + i
        ));
    }
    csv
}
