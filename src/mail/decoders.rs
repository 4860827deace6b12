use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

// Gmail emits base64url; some relays hand back the standard alphabet.
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decode a Gmail body `data` field into text.
///
/// Accepts either alphabet with or without padding. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn decode_body_data(data: &str) -> Result<String, base64::DecodeError> {
    let trimmed: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = match URL_SAFE.decode(&trimmed) {
        Ok(b) => b,
        Err(url_err) => STANDARD.decode(&trimmed).map_err(|_| url_err)?,
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
