//! Capabilities used to prune a tree for a particular backend

use ahash::AHashSet;

/// Something that can tell which attributes it is able to filter on
pub trait Filterable {
    fn is_valid_filter_target(&self, attribute: &str) -> bool;
}

impl<F> Filterable for F
where
    F: Fn(&str) -> bool,
{
    fn is_valid_filter_target(&self, attribute: &str) -> bool {
        self(attribute)
    }
}

/// A fixed set of supported attributes
#[derive(Debug, Clone, Default)]
pub struct AttributeAllowList {
    attributes: AHashSet<String>,
}

impl AttributeAllowList {
    pub fn new<I, T>(attributes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow(&mut self, attribute: impl Into<String>) -> &mut Self {
        self.attributes.insert(attribute.into());
        self
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Filterable for AttributeAllowList {
    fn is_valid_filter_target(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }
}

impl<T: Into<String>> FromIterator<T> for AttributeAllowList {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}
