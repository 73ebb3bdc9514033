use super::ClassId;

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone)]
pub struct Relationship {
    pub strength: Strength,
    pub source: Constraint,
    pub target: Constraint,
}

/// One end of a relationship.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Classes declared at this end.
    pub classes: Vec<ClassId>,

    pub multiplicity: Multiplicity,

    /// When `true`, subclasses of the declared classes are eligible as well.
    pub polymorphic: bool,
}

/// `(lower..upper)`, where an upper bound of `None` means "many".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Multiplicity {
    pub lower: u32,
    pub upper: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum End {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From the source end to the target end.
    #[default]
    Forward,

    /// From the target end to the source end.
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    #[default]
    Referencing,
    Embedding,
}

impl Relationship {
    pub fn constraint(&self, end: End) -> &Constraint {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }
}

impl Multiplicity {
    pub const ZERO_ONE: Multiplicity = Multiplicity {
        lower: 0,
        upper: Some(1),
    };

    pub const ZERO_MANY: Multiplicity = Multiplicity {
        lower: 0,
        upper: None,
    };

    pub fn is_many(&self) -> bool {
        self.upper.map(|upper| upper > 1).unwrap_or(true)
    }
}

impl FromStr for Multiplicity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid multiplicity `{s}`, expected `(lower..upper)`");

        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let (lower, upper) = inner.split_once("..").ok_or_else(invalid)?;

        let lower = lower.trim().parse().map_err(|_| invalid())?;
        let upper = match upper.trim() {
            "*" | "N" | "n" => None,
            upper => Some(upper.parse().map_err(|_| invalid())?),
        };

        if matches!(upper, Some(upper) if upper == 0 || upper < lower) {
            return Err(invalid());
        }

        Ok(Multiplicity { lower, upper })
    }
}

impl TryFrom<String> for Multiplicity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Multiplicity> for String {
    fn from(value: Multiplicity) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "({}..{})", self.lower, upper),
            None => write!(f, "({}..*)", self.lower),
        }
    }
}

impl End {
    pub fn other(self) -> End {
        match self {
            End::Source => End::Target,
            End::Target => End::Source,
        }
    }

    /// `Source` or `Target`, the prefix of the end's system columns.
    pub fn prefix(self) -> &'static str {
        match self {
            End::Source => "Source",
            End::Target => "Target",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_multiplicity() {
        assert_eq!(
            "(0..1)".parse::<Multiplicity>().unwrap(),
            Multiplicity::ZERO_ONE
        );
        assert_eq!(
            "(0..*)".parse::<Multiplicity>().unwrap(),
            Multiplicity::ZERO_MANY
        );
        assert!("(1..3)".parse::<Multiplicity>().unwrap().is_many());
        assert!("(2..1)".parse::<Multiplicity>().is_err());
        assert!("0..1".parse::<Multiplicity>().is_err());
    }
}
