//! Scalar-or-list text inputs
//!
//! The public API accepts a single text or a list and returns the same
//! shape. `Texts` carries the shape through the pipeline so reassembly is
//! mechanical.

/// Input shape marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
}

/// A single text or a list of texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Texts {
    One(String),
    Many(Vec<String>),
}

impl Texts {
    pub fn shape(&self) -> Shape {
        match self {
            Self::One(_) => Shape::Scalar,
            Self::Many(_) => Shape::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(texts) => texts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a list plus the shape needed to reassemble.
    pub fn into_parts(self) -> (Vec<String>, Shape) {
        match self {
            Self::One(text) => (vec![text], Shape::Scalar),
            Self::Many(texts) => (texts, Shape::List),
        }
    }

    /// Reassemble results into the original input shape.
    pub fn from_parts(mut texts: Vec<String>, shape: Shape) -> Self {
        match shape {
            Shape::Scalar => Self::One(texts.pop().unwrap_or_default()),
            Shape::List => Self::Many(texts),
        }
    }

    /// The scalar text, if this is a scalar.
    pub fn as_one(&self) -> Option<&str> {
        match self {
            Self::One(text) => Some(text),
            Self::Many(_) => None,
        }
    }

    /// Consume into a plain list regardless of shape.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(text) => vec![text],
            Self::Many(texts) => texts,
        }
    }
}

impl From<&str> for Texts {
    fn from(text: &str) -> Self {
        Self::One(text.to_string())
    }
}

impl From<String> for Texts {
    fn from(text: String) -> Self {
        Self::One(text)
    }
}

impl From<Vec<String>> for Texts {
    fn from(texts: Vec<String>) -> Self {
        Self::Many(texts)
    }
}

impl From<Vec<&str>> for Texts {
    fn from(texts: Vec<&str>) -> Self {
        Self::Many(texts.into_iter().map(str::to_string).collect())
    }
}
