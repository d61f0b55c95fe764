//! Drug terminology search.
//!
//! The RxTerms service answers with a fixed-position array rather than a
//! self-describing object:
//!
//! ```text
//! [total, rawNames, {"STRENGTHS_AND_FORMS": [[..]], "RXCUIS": [[..]]}, displayNames]
//! ```
//!
//! [`normalize_rxterms`] is the only place that knows this layout.

use crate::config::SearchConfig;
use crate::{
    ApproxCandidate, ConceptProperty, DrugSearchItem, Error, Result, SearchResult, UpstreamError,
};
use reqwest::blocking::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Extra fields requested from RxTerms alongside the display names
pub const EXTRA_FIELDS: &str = "STRENGTHS_AND_FORMS,RXCUIS,DISPLAY_NAME_SYNONYM";

const STRENGTHS_KEY: &str = "STRENGTHS_AND_FORMS";
const RXCUIS_KEY: &str = "RXCUIS";

/// Lookup capability used by hosts
pub trait DrugSearch {
    /// Term search, normalized. Empty terms never reach the network.
    fn search(&self, term: &str) -> Result<SearchResult>;

    /// Closest RxNorm concepts for a possibly misspelled term
    fn approximate_term(&self, term: &str) -> Result<Vec<ApproxCandidate>>;

    /// All properties of one RxNorm concept
    fn properties(&self, rxcui: &str) -> Result<Vec<ConceptProperty>>;
}

/// Blocking HTTP client for the NLM RxTerms and RxNav services
#[derive(Clone, Debug)]
pub struct RxTermsClient {
    client: Client,
    endpoint: String,
    rxnav_base: String,
    approx_max_entries: u32,
}

impl RxTermsClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(UpstreamError::from)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            rxnav_base: config.rxnav_base.trim_end_matches('/').to_string(),
            approx_max_entries: config.approx_max_entries,
        })
    }

    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(UpstreamError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()).into());
        }

        let body = response.text().map_err(UpstreamError::from)?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()).into())
    }
}

impl DrugSearch for RxTermsClient {
    fn search(&self, term: &str) -> Result<SearchResult> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(SearchResult::empty());
        }

        let data = self.get_json(&self.endpoint, &[("terms", term), ("ef", EXTRA_FIELDS)])?;
        let result = normalize_rxterms(&data);
        tracing::debug!(
            "Search {:?}: {} items of {} total",
            term,
            result.items.len(),
            result.total
        );
        Ok(result)
    }

    fn approximate_term(&self, term: &str) -> Result<Vec<ApproxCandidate>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/approximateTerm.json", self.rxnav_base);
        let max_entries = self.approx_max_entries.to_string();
        let data = self.get_json(&url, &[("term", term), ("maxEntries", &max_entries)])?;
        Ok(parse_approx_candidates(&data))
    }

    fn properties(&self, rxcui: &str) -> Result<Vec<ConceptProperty>> {
        let rxcui = rxcui.trim();
        if rxcui.is_empty() || !rxcui.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidSelection(format!(
                "not a valid RXCUI: {:?}",
                rxcui
            )));
        }

        let url = format!("{}/rxcui/{}/allProperties.json", self.rxnav_base, rxcui);
        let data = self.get_json(&url, &[("prop", "all")])?;
        Ok(parse_properties(&data))
    }
}

/// Reshape the positional RxTerms response into named records.
///
/// Never fails: anything malformed degrades to defaults. Row order follows
/// the chosen display source and is never changed.
pub fn normalize_rxterms(data: &Value) -> SearchResult {
    let total = data.get(0).map(coerce_total).unwrap_or(0);

    let rows = match data.get(3).and_then(Value::as_array) {
        Some(display_names) => display_names,
        None => match data.get(1).and_then(Value::as_array) {
            Some(raw_names) => raw_names,
            None => return SearchResult { total, items: Vec::new() },
        },
    };

    let extras = data.get(2);
    let strengths = extra_list(extras, STRENGTHS_KEY);
    let rxcuis = extra_list(extras, RXCUIS_KEY);

    let items = rows
        .iter()
        .enumerate()
        .map(|(i, row)| DrugSearchItem {
            display_name: display_name(row),
            strengths: nested_list(strengths, i)
                .iter()
                .map(|v| scalar_text(v).unwrap_or_default())
                .collect(),
            rxcuis_by_index: nested_list(rxcuis, i).iter().map(scalar_text).collect(),
        })
        .collect();

    SearchResult { total, items }
}

fn extra_list<'a>(extras: Option<&'a Value>, key: &str) -> &'a [Value] {
    extras
        .and_then(Value::as_object)
        .and_then(|map| map.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn coerce_total(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn display_name(row: &Value) -> String {
    match row {
        Value::Array(cells) => cells.first().and_then(scalar_text).unwrap_or_default(),
        other => scalar_text(other).unwrap_or_default(),
    }
}

fn nested_list(outer: &[Value], index: usize) -> &[Value] {
    outer
        .get(index)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_approx_candidates(data: &Value) -> Vec<ApproxCandidate> {
    data.pointer("/approximateGroup/candidate")
        .and_then(Value::as_array)
        .map(|candidates| {
            candidates
                .iter()
                .filter_map(|c| {
                    Some(ApproxCandidate {
                        rxcui: c.get("rxcui").and_then(scalar_text)?,
                        name: c.get("name").and_then(scalar_text),
                        score: c.get("score").and_then(scalar_text),
                        rank: c.get("rank").and_then(scalar_text),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_properties(data: &Value) -> Vec<ConceptProperty> {
    data.pointer("/propConceptGroup/propConcept")
        .and_then(Value::as_array)
        .map(|props| {
            props
                .iter()
                .map(|p| ConceptProperty {
                    category: p.get("propCategory").and_then(scalar_text).unwrap_or_default(),
                    name: p.get("propName").and_then(scalar_text).unwrap_or_default(),
                    value: p.get("propValue").and_then(scalar_text).unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Hands out tickets for overlapping searches so only the newest result is
/// applied.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search, superseding any in flight
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}
