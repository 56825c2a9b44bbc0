pub mod leave_request;
pub mod leave_type;
pub mod member;
pub mod out_of_office;
pub mod public_holiday;
pub mod request_approver;
pub mod role;
pub mod schedule;
pub mod workspace;

/// Lets `#[sqlx(try_from = "String")]` decode VARCHAR columns into strum enums.
macro_rules! string_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = strum::ParseError;

                fn try_from(value: String) -> Result<Self, strum::ParseError> {
                    value.parse()
                }
            }
        )*
    };
}

string_column!(
    leave_request::StartAt,
    leave_request::EndAt,
    leave_request::RequestStatus,
    leave_request::OutOfOfficeStatus,
    request_approver::ApproverStatus,
    public_holiday::HolidayDuration,
    out_of_office::ExternalAudience,
);

#[cfg(test)]
mod tests {
    use super::leave_request::OutOfOfficeStatus;
    use super::out_of_office::ExternalAudience;

    #[test]
    fn string_columns_decode_snake_case() {
        assert_eq!(
            OutOfOfficeStatus::try_from("must_be_removed".to_string()),
            Ok(OutOfOfficeStatus::MustBeRemoved)
        );
        assert_eq!(
            OutOfOfficeStatus::try_from("error".to_string()),
            Ok(OutOfOfficeStatus::Error)
        );
        assert_eq!(
            ExternalAudience::try_from("contacts_only".to_string()),
            Ok(ExternalAudience::ContactsOnly)
        );
    }

    #[test]
    fn unknown_column_values_are_rejected() {
        assert_eq!(
            OutOfOfficeStatus::try_from("Error".to_string()),
            Err(strum::ParseError::VariantNotFound)
        );
    }
}
