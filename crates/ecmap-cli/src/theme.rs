use console::{style, StyledObject};

/// Section heading printed at the top of each command's output
pub fn heading(title: &str) -> StyledObject<&str> {
    style(title).cyan().bold().underlined()
}

pub fn arrow() -> StyledObject<&'static str> {
    style("→").cyan()
}

pub fn check() -> StyledObject<&'static str> {
    style("✔").green().bold()
}

/// Dimmed note, e.g. when there is nothing to report
pub fn note(text: &str) -> StyledObject<&str> {
    style(text).magenta().dim()
}
