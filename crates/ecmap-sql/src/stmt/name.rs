/// An object name, rendered as bracket-quoted identifiers joined by `.`.
#[derive(Debug, Clone, PartialEq)]
pub struct Name(pub Vec<String>);

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(vec![value.into()])
    }
}

impl From<&String> for Name {
    fn from(value: &String) -> Self {
        Self::from(&value[..])
    }
}
