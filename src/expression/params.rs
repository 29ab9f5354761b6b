//! Placeholder arguments for `?` and `:name` values

use std::collections::{HashMap, VecDeque};

/// A single bound argument
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Scalar(String),
    List(Vec<String>),
    Null,
}

impl Param {
    /// Right-hand values for an expression, each trimmed
    pub fn into_values(self) -> Vec<String> {
        match self {
            Param::Scalar(value) => vec![value.trim().to_string()],
            Param::List(values) => values.into_iter().map(|v| v.trim().to_string()).collect(),
            Param::Null => Vec::new(),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Scalar(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Scalar(value)
    }
}

impl From<Vec<String>> for Param {
    fn from(values: Vec<String>) -> Self {
        Param::List(values)
    }
}

impl From<Vec<&str>> for Param {
    fn from(values: Vec<&str>) -> Self {
        Param::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

macro_rules! scalar_param_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_param_from!(i32, i64, u32, u64, usize, f64, bool);

/// Arguments bound to a query: either consumed left to right or looked up by name
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(VecDeque<Param>),
    Named(HashMap<String, Param>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(VecDeque::new())
    }
}

impl Params {
    /// No arguments
    pub fn none() -> Self {
        Self::default()
    }

    pub fn positional<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Param>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        Params::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Pop the next positional argument
    pub fn next_positional(&mut self) -> Option<Param> {
        match self {
            Params::Positional(values) => values.pop_front(),
            Params::Named(_) => None,
        }
    }

    /// Look up a named argument; named arguments may be referenced more than once
    pub fn get_named(&self, name: &str) -> Option<&Param> {
        match self {
            Params::Named(values) => values.get(name),
            Params::Positional(_) => None,
        }
    }

    /// Positional arguments not yet consumed
    pub fn remaining(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(_) => 0,
        }
    }
}
