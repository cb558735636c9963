//! Token attributes and the bijection between attribute tuples and token ids

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A named token attribute with its ordered value domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }
}

/// The attribute definitions of a game.
///
/// The board is a square whose side equals the number of attributes. Token ids
/// enumerate the cartesian product of attribute values in mixed radix with the
/// first attribute most significant, so token `0` carries the first value of
/// every attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct Dimensions {
    attributes: Vec<Attribute>,
}

impl Dimensions {
    /// Create dimensions from attribute definitions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if there are no attributes, an
    /// attribute has an empty domain, or a domain repeats a value.
    pub fn new(attributes: Vec<Attribute>) -> Result<Self> {
        if attributes.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "at least one attribute is required".to_string(),
            });
        }
        for attribute in &attributes {
            if attribute.values.is_empty() {
                return Err(Error::InvalidConfiguration {
                    message: format!("attribute '{}' has no values", attribute.name),
                });
            }
            let mut seen = attribute.values.clone();
            seen.sort();
            seen.dedup();
            if seen.len() != attribute.values.len() {
                return Err(Error::InvalidConfiguration {
                    message: format!("attribute '{}' repeats a value", attribute.name),
                });
            }
        }
        Ok(Self { attributes })
    }

    /// The standard four binary attributes of Quarto.
    pub fn quarto() -> Self {
        Self {
            attributes: vec![
                Attribute::new("color", &["white", "black"]),
                Attribute::new("hollowness", &["hole", "solid"]),
                Attribute::new("height", &["tall", "short"]),
                Attribute::new("shape", &["round", "square"]),
            ],
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Board side length.
    pub fn side(&self) -> usize {
        self.attributes.len()
    }

    pub fn cell_count(&self) -> usize {
        self.side() * self.side()
    }

    pub fn token_count(&self) -> usize {
        self.attributes.iter().map(Attribute::size).product()
    }

    /// Domain size of every attribute, in attribute order.
    pub fn sizes(&self) -> Vec<usize> {
        self.attributes.iter().map(Attribute::size).collect()
    }

    /// Token id for a tuple of attribute value indices.
    pub fn token_id(&self, indices: &[usize]) -> Result<usize> {
        compose_token(indices, &self.sizes()).ok_or_else(|| Error::InvalidConfiguration {
            message: format!("attribute indices {indices:?} do not fit {:?}", self.sizes()),
        })
    }

    /// Attribute value indices of a token id.
    pub fn token_indices(&self, token: usize) -> Result<Vec<usize>> {
        self.check_token(token)?;
        Ok(decompose_token(token, &self.sizes()))
    }

    /// Token id for a tuple of attribute value names.
    pub fn token_by_values(&self, values: &[&str]) -> Result<usize> {
        if values.len() != self.attributes.len() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "expected {} attribute values, got {}",
                    self.attributes.len(),
                    values.len()
                ),
            });
        }
        let indices = self
            .attributes
            .iter()
            .zip(values)
            .map(|(attribute, value)| {
                attribute
                    .values
                    .iter()
                    .position(|candidate| candidate == value)
                    .ok_or_else(|| Error::InvalidConfiguration {
                        message: format!(
                            "'{value}' is not a value of attribute '{}'",
                            attribute.name
                        ),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        self.token_id(&indices)
    }

    /// Short token label made of the first letter of each attribute value.
    pub fn token_name(&self, token: usize) -> Result<String> {
        let indices = self.token_indices(token)?;
        Ok(self
            .attributes
            .iter()
            .zip(indices)
            .filter_map(|(attribute, idx)| attribute.values[idx].chars().next())
            .collect())
    }

    pub(crate) fn check_token(&self, token: usize) -> Result<()> {
        let count = self.token_count();
        if token < count {
            Ok(())
        } else {
            Err(Error::InvalidToken { token, count })
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::quarto()
    }
}

impl TryFrom<Vec<Attribute>> for Dimensions {
    type Error = Error;

    fn try_from(attributes: Vec<Attribute>) -> Result<Self> {
        Self::new(attributes)
    }
}

impl From<Dimensions> for Vec<Attribute> {
    fn from(dimensions: Dimensions) -> Self {
        dimensions.attributes
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes: Vec<String> = self.sizes().iter().map(usize::to_string).collect();
        write!(f, "{}", sizes.join("x"))
    }
}

/// Mixed-radix decomposition of a token id, first attribute most significant.
pub(crate) fn decompose_token(token: usize, sizes: &[usize]) -> Vec<usize> {
    let mut remainder = token;
    let mut indices = vec![0; sizes.len()];
    for (slot, &size) in indices.iter_mut().zip(sizes).rev() {
        *slot = remainder % size;
        remainder /= size;
    }
    indices
}

pub(crate) fn compose_token(indices: &[usize], sizes: &[usize]) -> Option<usize> {
    if indices.len() != sizes.len() {
        return None;
    }
    indices
        .iter()
        .zip(sizes)
        .try_fold(0usize, |acc, (&idx, &size)| {
            (idx < size).then_some(acc * size + idx)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarto_shape() {
        let dims = Dimensions::quarto();
        assert_eq!(dims.side(), 4);
        assert_eq!(dims.cell_count(), 16);
        assert_eq!(dims.token_count(), 16);
        assert_eq!(dims.sizes(), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_token_zero_has_first_values() {
        let dims = Dimensions::quarto();
        let id = dims
            .token_by_values(&["white", "hole", "tall", "round"])
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(dims.token_name(0).unwrap(), "whtr");
    }

    #[test]
    fn test_first_attribute_is_most_significant() {
        let dims = Dimensions::quarto();
        assert_eq!(dims.token_id(&[1, 0, 0, 0]).unwrap(), 8);
        assert_eq!(dims.token_id(&[0, 0, 0, 1]).unwrap(), 1);
        assert_eq!(dims.token_indices(11).unwrap(), vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_bijection_over_all_tokens() {
        let dims = Dimensions::new(vec![
            Attribute::new("a", &["x", "y", "z"]),
            Attribute::new("b", &["p", "q"]),
        ])
        .unwrap();
        for token in 0..dims.token_count() {
            let indices = dims.token_indices(token).unwrap();
            assert_eq!(dims.token_id(&indices).unwrap(), token);
        }
    }

    #[test]
    fn test_out_of_range_token() {
        let dims = Dimensions::quarto();
        assert!(matches!(
            dims.token_indices(16),
            Err(Error::InvalidToken { token: 16, count: 16 })
        ));
    }

    #[test]
    fn test_rejects_bad_definitions() {
        assert!(Dimensions::new(vec![]).is_err());
        assert!(Dimensions::new(vec![Attribute::new("a", &[])]).is_err());
        assert!(Dimensions::new(vec![Attribute::new("a", &["x", "x"])]).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&Dimensions::quarto()).unwrap();
        let parsed: Dimensions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Dimensions::quarto());
        assert!(serde_json::from_str::<Dimensions>("[]").is_err());
    }
}
