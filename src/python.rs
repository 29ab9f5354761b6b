//! Python bindings

use crate::config::QueryConfig;
use crate::expression::{Param, Params};
use crate::query::{get_or_parse_with_config, parse_query_with_config};
use crate::tree::{AttributeAllowList, FilterTree};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

// ============================================================================
// Cached Configuration
// ============================================================================

/// Global configuration used by every binding call
static CACHED_CONFIG: OnceCell<Arc<RwLock<QueryConfig>>> = OnceCell::new();

fn current_config() -> QueryConfig {
    CACHED_CONFIG
        .get()
        .map(|config| config.read().clone())
        .unwrap_or_default()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a Python argument into a query parameter
fn extract_param<'py>(value: &Bound<'py, PyAny>) -> PyResult<Param> {
    if value.is_none() {
        return Ok(Param::Null);
    }
    if let Ok(flag) = value.extract::<bool>() {
        return Ok(Param::from(flag));
    }
    if let Ok(items) = value.extract::<Vec<Bound<'py, PyAny>>>() {
        let values = items
            .iter()
            .map(|item| item.str().map(|s| s.to_string()))
            .collect::<PyResult<Vec<String>>>()?;
        return Ok(Param::List(values));
    }
    Ok(Param::Scalar(value.str()?.to_string()))
}

// ============================================================================
// Python Functions
// ============================================================================

/// Set the parser configuration (call once at startup)
///
/// Options left out keep their default values. Calling again replaces the
/// configuration.
#[pyfunction]
#[pyo3(signature = (max_nesting_depth=None, max_terms=None, case_insensitive_like=None, strip_quotes=None, list_separator=None))]
fn init_config(
    max_nesting_depth: Option<usize>,
    max_terms: Option<usize>,
    case_insensitive_like: Option<bool>,
    strip_quotes: Option<bool>,
    list_separator: Option<char>,
) -> PyResult<()> {
    let defaults = QueryConfig::default();
    let config = QueryConfig {
        max_nesting_depth: max_nesting_depth.unwrap_or(defaults.max_nesting_depth),
        max_terms: max_terms.unwrap_or(defaults.max_terms),
        case_insensitive_like: case_insensitive_like.unwrap_or(defaults.case_insensitive_like),
        strip_quotes: strip_quotes.unwrap_or(defaults.strip_quotes),
        list_separator: list_separator.unwrap_or(defaults.list_separator),
    };
    config.validate()?;

    if let Some(existing) = CACHED_CONFIG.get() {
        *existing.write() = config;
    } else {
        let _ = CACHED_CONFIG.set(Arc::new(RwLock::new(config)));
    }
    Ok(())
}

/// Parse a query into a FilterTree
///
/// # Arguments
/// * `text` - Query such as `host_name = ? AND state >= :state`
/// * `params` - Positional arguments consumed by `?` placeholders
/// * `named` - Named arguments looked up by `:name` placeholders
///
/// # Raises
/// ValueError on malformed queries, KeyError on a missing named argument
#[pyfunction]
#[pyo3(signature = (text, params=None, named=None))]
fn parse_query<'py>(
    text: &str,
    params: Option<Vec<Bound<'py, PyAny>>>,
    named: Option<HashMap<String, Bound<'py, PyAny>>>,
) -> PyResult<PyFilterTree> {
    let config = current_config();
    let params = match (params, named) {
        (_, Some(named)) => Params::named(
            named
                .iter()
                .map(|(k, v)| extract_param(v).map(|p| (k.clone(), p)))
                .collect::<PyResult<Vec<_>>>()?,
        ),
        (Some(params), None) => Params::positional(
            params.iter().map(extract_param).collect::<PyResult<Vec<_>>>()?,
        ),
        (None, None) => {
            return Ok(PyFilterTree {
                inner: get_or_parse_with_config(text, &config)?,
            })
        }
    };

    let tree = parse_query_with_config(text, params, &config)?;
    Ok(PyFilterTree { inner: tree })
}

// ============================================================================
// FilterTree Class
// ============================================================================

#[pyclass(name = "FilterTree")]
pub struct PyFilterTree {
    inner: FilterTree,
}

#[pymethods]
impl PyFilterTree {
    /// Leaf attributes in depth-first order
    fn attributes(&self) -> Vec<String> {
        self.inner.attributes()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.inner.has_node_with_attribute(name)
    }

    /// Copy without any condition on `name`
    fn without_attribute(&self, name: &str) -> PyFilterTree {
        let allow = |attribute: &str| attribute != name;
        PyFilterTree {
            inner: self.inner.copy_for_filterable(&allow),
        }
    }

    /// Copy keeping only conditions on the given attributes
    fn copy_for_attributes(&self, attributes: Vec<String>) -> PyFilterTree {
        let allow: AttributeAllowList = attributes.into_iter().collect();
        PyFilterTree {
            inner: self.inner.copy_for_filterable(&allow),
        }
    }

    /// Indices of the matching records in a JSON array
    #[pyo3(signature = (records_json, pre_index=None))]
    fn filter(&self, records_json: &str, pre_index: Option<Vec<usize>>) -> PyResult<Vec<usize>> {
        let records: Vec<serde_json::Value> =
            serde_json::from_str(records_json).map_err(crate::error::QueryError::from)?;
        let pre_index: Option<BTreeSet<usize>> = pre_index.map(|ids| ids.into_iter().collect());
        let matched = self
            .inner
            .filter_with_config(&records, pre_index.as_ref(), &current_config())?;
        Ok(matched.into_iter().collect())
    }

    fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!("FilterTree({:?})", self.inner.to_string())
    }
}

// ============================================================================
// Python Module Definition
// ============================================================================

#[pymodule]
fn statusql(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_config, m)?)?;
    m.add_function(wrap_pyfunction!(parse_query, m)?)?;
    m.add_class::<PyFilterTree>()?;
    Ok(())
}
