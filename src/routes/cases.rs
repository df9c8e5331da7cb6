//! Case browsing routes: filter options, filtered listing, and case detail.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ApiError, IMAGE_ROUTE, api_error};
use crate::cases::{CaseRecord, SelectError};
use crate::filter::{self, AGE_MAX, AGE_MIN, AgeRange, FilterCriteria, GENDER_OPTIONS};
use crate::images;
use crate::state::AppState;

pub const NO_CT_INFO: &str = "No matched CT case available.";

/// Filter widgets as query parameters. List values are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct CaseQuery {
    pub tags: Option<String>,
    pub q: Option<String>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub gender: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaseList {
    pub count: usize,
    pub diagnoses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImagePanel {
    pub images: Vec<String>,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CaseDetail {
    pub diagnosis: String,
    pub tags: Vec<String>,
    pub age: String,
    pub gender: String,
    pub image_base: &'static str,
    pub fluoro: ImagePanel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<ImagePanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct_info: Option<&'static str>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn criteria_from_query(query: &CaseQuery) -> FilterCriteria {
    let age = match (query.age_min, query.age_max) {
        (None, None) => None,
        (min, max) => Some(AgeRange::new(min.unwrap_or(AGE_MIN), max.unwrap_or(AGE_MAX))),
    };
    FilterCriteria {
        tags: split_list(query.tags.as_deref()),
        query: query.q.clone().unwrap_or_default(),
        age,
        genders: split_list(query.gender.as_deref()),
    }
}

pub(crate) fn select_error_to_status(err: &SelectError) -> StatusCode {
    match err {
        SelectError::NoMatches | SelectError::UnknownDiagnosis(_) => StatusCode::NOT_FOUND,
    }
}

fn case_detail(record: &CaseRecord, image_set: images::ImageSet) -> CaseDetail {
    let ct_info = image_set.ct.is_empty().then_some(NO_CT_INFO);
    let ct = (!image_set.ct.is_empty()).then(|| ImagePanel {
        images: image_set.ct,
        description: record.description_ct.clone(),
        url: record.url_ct.clone(),
    });
    CaseDetail {
        diagnosis: record.diagnosis.clone(),
        tags: record.tag_list().map(str::to_string).collect(),
        age: record.age.clone(),
        gender: record.gender.clone(),
        image_base: IMAGE_ROUTE,
        fluoro: ImagePanel {
            images: image_set.fluoro,
            description: record.description.clone(),
            url: record.url.clone(),
        },
        ct,
        ct_info,
    }
}

/// `GET /api/tags` — every tag in the table, sorted.
pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.tag_options())
}

/// `GET /api/genders` — gender filter options.
pub async fn list_genders() -> Json<[&'static str; 2]> {
    Json(GENDER_OPTIONS)
}

/// `GET /api/cases` — diagnoses matching the filters.
pub async fn list_cases(State(state): State<AppState>, Query(query): Query<CaseQuery>) -> Json<CaseList> {
    let criteria = criteria_from_query(&query);
    let view = filter::apply(&state.store, &criteria);
    let warning = view.is_empty().then(|| SelectError::NoMatches.to_string());
    Json(CaseList {
        count: view.len(),
        diagnoses: view.diagnoses().into_iter().map(str::to_string).collect(),
        warning,
    })
}

/// `GET /api/cases/select` — one case from the filtered view with its images.
pub async fn select_case(
    State(state): State<AppState>,
    Query(query): Query<CaseQuery>,
) -> Result<Json<CaseDetail>, ApiError> {
    let criteria = criteria_from_query(&query);
    let view = filter::apply(&state.store, &criteria);
    let record = view
        .select(query.diagnosis.as_deref())
        .map_err(|e| api_error(select_error_to_status(&e), e.to_string()))?;

    let image_set = images::resolve_case(&state.image_dir, record);
    Ok(Json(case_detail(record, image_set)))
}

#[cfg(test)]
#[path = "cases_test.rs"]
mod tests;
