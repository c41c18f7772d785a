//! Date range inputs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use super::CodegenError;
use crate::escape::{escape_python_string, sanitize_python_variable_name};
use crate::model::{DateRangeInputFields, DateRangeValue, ExecutableBlock};

static CUSTOM_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^customDays(\d+)$").expect("valid regex"));

const DATETIME_IMPORT: &str = "from datetime import datetime as _deepnote_datetime";
const TIMEDELTA_IMPORT: &str =
    "from datetime import datetime as _deepnote_datetime, timedelta as _deepnote_timedelta";
const RELATIVEDELTA_IMPORT: &str =
    "from dateutil.relativedelta import relativedelta as _deepnote_relativedelta";
const PARSE_IMPORT: &str = "from dateutil.parser import parse as _deepnote_parse";

/// Named ranges ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDateRange {
    Past7Days,
    Past14Days,
    PastMonth,
    Past3Months,
    Past6Months,
    PastYear,
}

impl RelativeDateRange {
    pub const ALL: [RelativeDateRange; 6] = [
        RelativeDateRange::Past7Days,
        RelativeDateRange::Past14Days,
        RelativeDateRange::PastMonth,
        RelativeDateRange::Past3Months,
        RelativeDateRange::Past6Months,
        RelativeDateRange::PastYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelativeDateRange::Past7Days => "past7days",
            RelativeDateRange::Past14Days => "past14days",
            RelativeDateRange::PastMonth => "pastMonth",
            RelativeDateRange::Past3Months => "past3months",
            RelativeDateRange::Past6Months => "past6months",
            RelativeDateRange::PastYear => "pastYear",
        }
    }

    /// Assignment of `[start, today]` to `name`, with its imports.
    pub fn python(&self, name: &str) -> String {
        match self {
            RelativeDateRange::Past7Days => days_back(name, 7),
            RelativeDateRange::Past14Days => days_back(name, 14),
            RelativeDateRange::PastMonth => calendar_back(name, "months=1"),
            RelativeDateRange::Past3Months => calendar_back(name, "months=3"),
            RelativeDateRange::Past6Months => calendar_back(name, "months=6"),
            RelativeDateRange::PastYear => calendar_back(name, "years=1"),
        }
    }
}

impl fmt::Display for RelativeDateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelativeDateRange {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelativeDateRange::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| CodegenError::UnknownRelativeRange(s.to_string()))
    }
}

fn days_back(name: &str, days: u64) -> String {
    format!(
        "{}\n{} = [_deepnote_datetime.now().date() - _deepnote_timedelta(days={}), _deepnote_datetime.now().date()]",
        TIMEDELTA_IMPORT, name, days
    )
}

fn calendar_back(name: &str, delta: &str) -> String {
    format!(
        "{}\n{}\n{} = [_deepnote_datetime.now().date() - _deepnote_relativedelta({}), _deepnote_datetime.now().date()]",
        DATETIME_IMPORT, RELATIVEDELTA_IMPORT, name, delta
    )
}

fn parsed_side(value: &str) -> String {
    if value.is_empty() {
        "None".to_string()
    } else {
        format!("_deepnote_parse({}).date()", escape_python_string(value))
    }
}

pub(crate) fn emit(block: &ExecutableBlock<DateRangeInputFields>) -> Result<String, CodegenError> {
    let fields = &block.metadata.fields;
    let name = sanitize_python_variable_name(&fields.deepnote_variable_name);

    match &fields.deepnote_variable_value {
        // The parser import is emitted even when both sides are empty.
        DateRangeValue::Absolute(start, end) => Ok(format!(
            "{}\n{} = [{}, {}]",
            PARSE_IMPORT,
            name,
            parsed_side(start),
            parsed_side(end)
        )),
        DateRangeValue::Named(token) => {
            if let Some(caps) = CUSTOM_DAYS.captures(token) {
                let days: u64 = caps[1]
                    .parse()
                    .map_err(|_| CodegenError::UnknownRelativeRange(token.clone()))?;
                return Ok(days_back(&name, days));
            }
            if token.starts_with("past") || token.starts_with("customDays") {
                let range: RelativeDateRange = token.parse()?;
                return Ok(range.python(&name));
            }
            Ok(format!("{} = [None, None]", name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_support::executable;

    fn range(value: DateRangeValue) -> ExecutableBlock<DateRangeInputFields> {
        executable(
            "r",
            None,
            DateRangeInputFields {
                deepnote_variable_name: "period".to_string(),
                deepnote_input_label: None,
                deepnote_variable_value: value,
            },
        )
    }

    fn named(token: &str) -> Result<String, CodegenError> {
        emit(&range(DateRangeValue::Named(token.to_string())))
    }

    #[test]
    fn test_past_seven_days() {
        assert_eq!(
            named("past7days").unwrap(),
            "from datetime import datetime as _deepnote_datetime, timedelta as _deepnote_timedelta\n\
             period = [_deepnote_datetime.now().date() - _deepnote_timedelta(days=7), _deepnote_datetime.now().date()]"
        );
    }

    #[test]
    fn test_calendar_ranges_use_relativedelta() {
        let out = named("pastYear").unwrap();
        assert!(out.contains(RELATIVEDELTA_IMPORT));
        assert!(out.contains("_deepnote_relativedelta(years=1)"));
        assert!(named("past3months").unwrap().contains("_deepnote_relativedelta(months=3)"));
    }

    #[test]
    fn test_custom_days() {
        let out = named("customDays30").unwrap();
        assert!(out.ends_with(
            "period = [_deepnote_datetime.now().date() - _deepnote_timedelta(days=30), _deepnote_datetime.now().date()]"
        ));
    }

    #[test]
    fn test_unknown_relative_token_is_an_error() {
        assert_eq!(
            named("past2decades").unwrap_err(),
            CodegenError::UnknownRelativeRange("past2decades".to_string())
        );
        assert!(named("customDaysX").is_err());
    }

    #[test]
    fn test_other_values_are_unset() {
        assert_eq!(named("").unwrap(), "period = [None, None]");
        assert_eq!(named("whenever").unwrap(), "period = [None, None]");
    }

    #[test]
    fn test_absolute_range() {
        let out = emit(&range(DateRangeValue::Absolute(
            "2024-01-01".to_string(),
            String::new(),
        )))
        .unwrap();
        assert_eq!(
            out,
            "from dateutil.parser import parse as _deepnote_parse\n\
             period = [_deepnote_parse('2024-01-01').date(), None]"
        );

        let empty = emit(&range(DateRangeValue::Absolute(String::new(), String::new()))).unwrap();
        assert_eq!(
            empty,
            "from dateutil.parser import parse as _deepnote_parse\nperiod = [None, None]"
        );
    }

    #[test]
    fn test_relative_range_names_round_trip() {
        for range in RelativeDateRange::ALL {
            assert_eq!(range.as_str().parse::<RelativeDateRange>(), Ok(range));
        }
    }
}
