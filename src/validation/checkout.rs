use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::checkout::{HistoryFilter, NewCheckout},
};

/// Accepted layouts for the checkout time, as produced by `datetime-local` inputs.
const CHECKOUT_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Column widths of the checkout table, in characters.
const MAX_PERSON_NAME_LEN: usize = 200;
const MAX_ATTENDANT_NAME_LEN: usize = 100;

/// The request payload for recording a checkout.
#[derive(Deserialize, Debug, Default)]
pub struct CheckoutRequest {
    pub student_name: Option<String>,
    pub guardian_name: Option<String>,
    pub checkout_at: Option<String>,
    pub attendant_name: Option<String>,
    pub notes: Option<String>,
}

/// The query parameters for the checkout history.
#[derive(Deserialize, Debug, Default)]
pub struct HistoryQuery {
    pub student_name: Option<String>,
    pub date: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a local-form checkout time such as `2024-05-01T14:30`.
pub fn parse_checkout_time(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    CHECKOUT_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| AppError::Parse(format!("Invalid checkout time: {:?}", raw)))
}

fn validate_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Validates a checkout submission.
///
/// Missing fields are reported together before lengths are checked and the
/// timestamp is parsed.
pub fn validate_checkout(request: CheckoutRequest) -> Result<NewCheckout> {
    let student_name = present(request.student_name);
    let guardian_name = present(request.guardian_name);
    let checkout_at = present(request.checkout_at);
    let attendant_name = present(request.attendant_name);

    let missing: Vec<&str> = [
        ("student_name", student_name.is_none()),
        ("guardian_name", guardian_name.is_none()),
        ("checkout_at", checkout_at.is_none()),
        ("attendant_name", attendant_name.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();

    match (student_name, guardian_name, checkout_at, attendant_name) {
        (Some(student_name), Some(guardian_name), Some(checkout_at), Some(attendant_name)) => {
            validate_length("student_name", &student_name, MAX_PERSON_NAME_LEN)?;
            validate_length("guardian_name", &guardian_name, MAX_PERSON_NAME_LEN)?;
            validate_length("attendant_name", &attendant_name, MAX_ATTENDANT_NAME_LEN)?;

            Ok(NewCheckout {
                student_name,
                guardian_name,
                checkout_at: parse_checkout_time(&checkout_at)?,
                attendant_name,
                notes: present(request.notes),
            })
        }
        _ => Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        ))),
    }
}

/// Turns raw history query parameters into a filter. Blank values mean "no filter".
pub fn validate_history_query(query: HistoryQuery) -> Result<HistoryFilter> {
    let date = present(query.date)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| AppError::Parse(format!("Invalid date filter: {:?}", raw)))
        })
        .transpose()?;

    Ok(HistoryFilter {
        student_name: present(query.student_name),
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CheckoutRequest {
        CheckoutRequest {
            student_name: Some("Ana Silva".to_string()),
            guardian_name: Some("Joana Silva".to_string()),
            checkout_at: Some("2024-05-01T14:30".to_string()),
            attendant_name: Some("Rosa".to_string()),
            notes: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_complete_request_is_accepted() {
        let checkout = validate_checkout(complete()).unwrap();
        assert_eq!(checkout.student_name, "Ana Silva");
        assert_eq!(
            checkout.checkout_at,
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap()
        );
        assert_eq!(checkout.notes, None);
    }

    #[test]
    fn test_missing_attendant_is_a_validation_error() {
        let request = CheckoutRequest {
            attendant_name: None,
            ..complete()
        };
        match validate_checkout(request) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("attendant_name")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let request = CheckoutRequest {
            student_name: Some("   ".to_string()),
            guardian_name: Some(String::new()),
            ..complete()
        };
        match validate_checkout(request) {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "Missing required fields: student_name, guardian_name");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_time_is_a_parse_error() {
        let request = CheckoutRequest {
            checkout_at: Some("yesterday at noon".to_string()),
            ..complete()
        };
        assert!(matches!(validate_checkout(request), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_oversized_names_are_validation_errors() {
        let request = CheckoutRequest {
            attendant_name: Some("R".repeat(101)),
            ..complete()
        };
        match validate_checkout(request) {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "attendant_name must be at most 100 characters");
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let request = CheckoutRequest {
            guardian_name: Some("J".repeat(201)),
            ..complete()
        };
        assert!(matches!(validate_checkout(request), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_names_at_the_column_width_are_accepted() {
        let request = CheckoutRequest {
            student_name: Some("é".repeat(200)),
            attendant_name: Some("R".repeat(100)),
            ..complete()
        };
        assert!(validate_checkout(request).is_ok());
    }

    #[test]
    fn test_time_with_seconds_is_accepted() {
        let parsed = parse_checkout_time("2024-05-01T14:30:15").unwrap();
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "14:30:15");
    }

    #[test]
    fn test_history_query_blank_values_are_no_filter() {
        let filter = validate_history_query(HistoryQuery {
            student_name: Some(" ".to_string()),
            date: Some(String::new()),
        })
        .unwrap();
        assert_eq!(filter, HistoryFilter::default());
    }

    #[test]
    fn test_history_query_parses_date() {
        let filter = validate_history_query(HistoryQuery {
            student_name: Some("ana".to_string()),
            date: Some("2024-05-01".to_string()),
        })
        .unwrap();
        assert_eq!(filter.student_name.as_deref(), Some("ana"));
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_history_query_rejects_bad_date() {
        let result = validate_history_query(HistoryQuery {
            student_name: None,
            date: Some("01/05/2024".to_string()),
        });
        assert!(matches!(result, Err(AppError::Parse(_))));
    }
}
