//! Client lookup by operator-typed identifier.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::{Dataset, Value};

/// Length of a client identifier as typed by the operator.
pub const CLIENT_ID_LEN: usize = 6;

static CLIENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("client id regex must compile"));

/// Why an identifier did not resolve to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Input is not exactly six characters long.
    InvalidLength(usize),
    /// Six characters, but not all digits.
    NotNumeric(String),
    /// Well-formed identifier with no matching row.
    NotFound(u32),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => write!(
                f,
                "Client ID must be exactly {CLIENT_ID_LEN} characters (got {len})"
            ),
            Self::NotNumeric(input) => write!(f, "Client ID must be numeric: {input}"),
            Self::NotFound(id) => write!(f, "Client {id} not found"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Parse a six-digit client identifier.
pub fn parse_client_id(input: &str) -> Result<u32, LookupError> {
    let len = input.chars().count();
    if len != CLIENT_ID_LEN {
        return Err(LookupError::InvalidLength(len));
    }
    if !CLIENT_ID_RE.is_match(input) {
        return Err(LookupError::NotNumeric(input.to_string()));
    }
    input
        .parse()
        .map_err(|_| LookupError::NotNumeric(input.to_string()))
}

/// One client resolved in both tables.
#[derive(Debug, Clone)]
pub struct ClientSelection<'a> {
    pub id: u32,
    /// Shared row index into the client table and the feature matrix.
    pub index: usize,
    /// Full raw row, identifier and label included.
    pub raw: &'a [Value],
    /// Raw row without identifier and label, in column order.
    pub display: Vec<(&'a str, &'a Value)>,
    /// Model features of the same client.
    pub features: &'a [f64],
}

impl ClientSelection<'_> {
    /// Display value of a named feature.
    pub fn value(&self, feature: &str) -> Option<&Value> {
        self.display
            .iter()
            .find(|(name, _)| *name == feature)
            .map(|(_, value)| *value)
    }
}

impl Dataset {
    /// Resolve an operator-typed identifier to the same row in both tables.
    pub fn lookup_client(&self, input: &str) -> Result<ClientSelection<'_>, LookupError> {
        let id = parse_client_id(input)?;
        let index = self
            .clients()
            .position(id)
            .ok_or(LookupError::NotFound(id))?;

        Ok(ClientSelection {
            id,
            index,
            raw: self.clients().row(index),
            display: self.clients().display_record(index),
            features: self.features().row(index),
        })
    }
}
