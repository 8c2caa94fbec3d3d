//! Customer block shared by quotations and invoices.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Customer the document is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Customer {
    #[serde(rename = "cliente", default)]
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,

    /// Mexican taxpayer id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_rfc"))]
    pub rfc: Option<String>,

    #[serde(rename = "direccion", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Ten digits, nothing else.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("phone", "Phone number must have 10 digits"))
    }
}

/// RFC shape: 3 (company) or 4 (person) letters, a YYMMDD date and a
/// 3-character homoclave whose last character is `A` or a digit.
pub fn validate_rfc(rfc: &str) -> Result<(), ValidationError> {
    if is_valid_rfc(rfc) {
        Ok(())
    } else {
        Err(invalid("rfc", "Invalid RFC"))
    }
}

fn is_valid_rfc(rfc: &str) -> bool {
    let chars: Vec<char> = rfc.chars().collect();
    let prefix_len = match chars.len() {
        12 => 3,
        13 => 4,
        _ => return false,
    };

    let (prefix, rest) = chars.split_at(prefix_len);
    if !prefix
        .iter()
        .all(|c| c.is_ascii_uppercase() || *c == 'Ñ' || *c == '&')
    {
        return false;
    }

    let (date, homoclave) = rest.split_at(6);
    if !date.iter().all(char::is_ascii_digit) {
        return false;
    }
    let two_digits = |i: usize| {
        date[i].to_digit(10).unwrap_or(0) * 10 + date[i + 1].to_digit(10).unwrap_or(0)
    };
    let (month, day) = (two_digits(2), two_digits(4));
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return false;
    }

    let (head, check) = homoclave.split_at(2);
    head.iter()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && (check[0] == 'A' || check[0].is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer {
            name: "Comercial del Norte".to_string(),
            rfc: Some("CNO010101AB1".to_string()),
            address: None,
            email: Some("compras@norte.mx".to_string()),
            phone: Some("5512345678".to_string()),
        }
    }

    #[test]
    fn valid_customer_passes() {
        assert!(customer().validate().is_ok());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let customer = Customer {
            name: "Mostrador".to_string(),
            ..Default::default()
        };
        assert!(customer.validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let customer = Customer {
            name: String::new(),
            ..customer()
        };
        let errors = customer.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn rfc_shapes() {
        assert!(is_valid_rfc("GODE561231GR8"));
        assert!(is_valid_rfc("ÑAB0102033A1"));
        assert!(!is_valid_rfc("GODE561331GR8"));
        assert!(!is_valid_rfc("GODE561200GR8"));
        assert!(!is_valid_rfc("GO1E561231GR8"));
        assert!(!is_valid_rfc("GODE561231GRB"));
        assert!(!is_valid_rfc("GODE5612"));
    }

    #[test]
    fn phone_must_be_ten_digits() {
        assert!(validate_phone("5512345678").is_ok());
        assert!(validate_phone("55-1234-5678").is_err());
        assert!(validate_phone("551234567").is_err());
    }

    #[test]
    fn bad_email_is_rejected() {
        let customer = Customer {
            email: Some("not-an-email".to_string()),
            ..customer()
        };
        assert!(customer.validate().is_err());
    }
}
