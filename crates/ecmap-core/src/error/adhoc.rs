/// A formatted message without a dedicated kind. Mostly used as context frames.
#[derive(Debug)]
pub(super) struct Adhoc {
    message: Box<str>,
}

impl Adhoc {
    pub(super) fn new(message: String) -> Adhoc {
        Adhoc {
            message: message.into(),
        }
    }
}

impl std::error::Error for Adhoc {}

impl core::fmt::Display for Adhoc {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}
