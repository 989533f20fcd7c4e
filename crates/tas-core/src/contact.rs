//! Click-to-contact link builders.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Country calling code prepended to bare local numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Characters left as-is in a message query value; everything else is escaped.
const MESSAGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build a `wa.me` chat link for `phone`.
///
/// Non-digits are stripped. The country code is prepended unless the number
/// already starts with it. A non-empty `message` becomes a percent-encoded
/// `text` query parameter.
#[must_use]
pub fn whatsapp_link(phone: &str, message: Option<&str>, country_code: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let number = if digits.starts_with(country_code) {
        digits
    } else {
        format!("{country_code}{digits}")
    };

    match message.filter(|m| !m.is_empty()) {
        Some(text) => format!(
            "https://wa.me/{number}?text={}",
            utf8_percent_encode(text, MESSAGE_ENCODE_SET)
        ),
        None => format!("https://wa.me/{number}"),
    }
}

#[must_use]
pub fn tel_link(phone: &str) -> String {
    format!("tel:{phone}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_link_prefixes_country_code() {
        assert_eq!(
            whatsapp_link("9052772942", None, DEFAULT_COUNTRY_CODE),
            "https://wa.me/919052772942"
        );
    }

    #[test]
    fn whatsapp_link_keeps_existing_country_code() {
        assert_eq!(
            whatsapp_link("+91 90527 72942", None, DEFAULT_COUNTRY_CODE),
            "https://wa.me/919052772942"
        );
    }

    #[test]
    fn whatsapp_link_encodes_message() {
        let link = whatsapp_link(
            "9052772942",
            Some("Hi, I'm visiting your website & need a quote"),
            DEFAULT_COUNTRY_CODE,
        );
        assert_eq!(
            link,
            "https://wa.me/919052772942?text=Hi%2C%20I'm%20visiting%20your%20website%20%26%20need%20a%20quote"
        );
    }

    #[test]
    fn whatsapp_link_ignores_empty_message() {
        assert_eq!(
            whatsapp_link("9052772942", Some(""), DEFAULT_COUNTRY_CODE),
            "https://wa.me/919052772942"
        );
    }

    #[test]
    fn whatsapp_link_uses_custom_country_code() {
        assert_eq!(
            whatsapp_link("(555) 010-2000", None, "1"),
            "https://wa.me/15550102000"
        );
    }

    #[test]
    fn tel_link_wraps_phone() {
        assert_eq!(tel_link("9391057437"), "tel:9391057437");
    }
}
