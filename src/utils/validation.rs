use validator::Validate;
use crate::errors::AppError;

/// Runs the payload's validation rules, listing every failing field.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|err| {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);
        let details = fields
            .iter()
            .map(|(field, errs)| {
                let codes = errs
                    .iter()
                    .map(|e| e.message.as_deref().unwrap_or(&e.code).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: [{}]", field, codes)
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::BadRequest(format!("Validation failed: {}", details))
    })
}
