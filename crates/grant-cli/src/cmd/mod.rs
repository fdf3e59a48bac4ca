pub mod budget;
pub mod chat;
pub mod clear;
pub mod completions;
pub mod config;
pub mod export;
pub mod import;
pub mod meta;
pub mod notes;
pub mod print;
pub mod status;
pub mod task;

use grant_core::error::GrantError;
use grant_core::model::ParseEnumError;
use std::io::{IsTerminal, Write};
use std::str::FromStr;

/// Ask `[y/N]` on stderr. Non-interactive runs proceed without asking.
pub(crate) fn confirm(question: &str) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return Ok(true);
    }

    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Parse an optional enum flag, reporting bad values as E2005.
pub(crate) fn parse_flag<T>(raw: Option<&str>) -> Result<Option<T>, GrantError>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.map(|value| value.parse::<T>().map_err(GrantError::from))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grant_core::error::ErrorCode;
    use grant_core::model::Priority;

    #[test]
    fn parse_flag_maps_errors_to_invalid_enum() {
        assert_eq!(parse_flag::<Priority>(None).unwrap(), None);
        assert_eq!(parse_flag::<Priority>(Some("p1")).unwrap(), Some(Priority::P1));
        let err = parse_flag::<Priority>(Some("urgent")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidEnumValue);
    }
}
