//! Campaign tokens: a `CampaignState` sealed into one opaque, URL-safe string.
//!
//! Each field is percent-escaped on its own and the escaped fields are joined with a
//! delimiter that percent-escaping always rewrites, so a delimiter inside a field value can
//! never be mistaken for a field boundary. The joined plaintext is sealed with AES-256-GCM.
//!
//! Decoding never says why it failed. Bad base64, a short or forged ciphertext, the wrong
//! field count and an unknown provider all come back as `CampaignErrorKind::InvalidToken`.

use campaign_auth::crypto::Cipher;
use campaign_auth::oauth::ProviderName;
use log::*;

use crate::campaign::{join_output_ids, split_output_ids, CampaignState};
use crate::error::{campaign_error, config_error, CampaignErrorKind, Error};

/// Separates the escaped fields of a token.
pub const FIELD_DELIMITER: &str = "|";

const FIELD_COUNT: usize = 4;

/// Checks that percent-escaping changes every character of `delimiter`.
///
/// `%` is refused as well: it survives inside every escaped field.
pub fn validate_delimiter(delimiter: &str) -> Result<(), Error> {
    if delimiter.is_empty() {
        return Err(config_error("token delimiter must not be empty"));
    }

    for c in delimiter.chars() {
        let mut buf = [0u8; 4];
        let as_str: &str = c.encode_utf8(&mut buf);
        if c == '%' || urlencoding::encode(as_str) == as_str {
            return Err(config_error(&format!(
                "token delimiter character {c:?} survives percent-encoding"
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct Codec {
    cipher: Cipher,
    delimiter: String,
}

impl Codec {
    /// Builds a codec from the 32 byte token secret.
    pub fn new(secret: &[u8]) -> Result<Self, Error> {
        Self::with_delimiter(secret, FIELD_DELIMITER)
    }

    pub fn with_delimiter(secret: &[u8], delimiter: &str) -> Result<Self, Error> {
        validate_delimiter(delimiter)?;
        Ok(Self {
            cipher: Cipher::new(secret)?,
            delimiter: delimiter.to_string(),
        })
    }

    /// Seals `state` into a token. Encoding the same state twice gives two different tokens.
    pub fn encode(&self, state: &CampaignState) -> Result<String, Error> {
        let output_ids = join_output_ids(&state.output_ids)?;

        let fields = [
            state.list_id.as_str(),
            state.provider_name.as_str(),
            output_ids.as_str(),
            state.redirect_url.as_str(),
        ];

        let plaintext = fields
            .iter()
            .map(|field| urlencoding::encode(field).into_owned())
            .collect::<Vec<_>>()
            .join(&self.delimiter);

        Ok(self.cipher.seal(&plaintext)?)
    }

    /// Opens a token back into the exact state it was built from.
    pub fn decode(&self, token: &str) -> Result<CampaignState, Error> {
        self.try_decode(token).ok_or_else(|| {
            debug!("Rejected campaign token");
            campaign_error(CampaignErrorKind::InvalidToken)
        })
    }

    fn try_decode(&self, token: &str) -> Option<CampaignState> {
        let plaintext = self.cipher.open(token).ok()?;

        let fields = plaintext
            .split(self.delimiter.as_str())
            .map(|field| urlencoding::decode(field).ok().map(|f| f.into_owned()))
            .collect::<Option<Vec<String>>>()?;

        let [list_id, provider_name, output_ids, redirect_url]: [String; FIELD_COUNT] =
            fields.try_into().ok()?;

        Some(CampaignState {
            list_id,
            provider_name: provider_name.parse::<ProviderName>().ok()?,
            output_ids: split_output_ids(&output_ids),
            redirect_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"123456789_123456789_123456789_12";
    const OTHER_SECRET: &[u8] = b"abcdefghij_abcdefghij_abcdefghij";

    fn codec() -> Codec {
        Codec::new(SECRET).unwrap()
    }

    fn scenario_state() -> CampaignState {
        CampaignState::new(
            "list-1",
            ProviderName::Google,
            vec!["out-a".to_string(), "out-b".to_string()],
            "https://site.example/thanks",
        )
    }

    fn is_invalid_token(result: Result<CampaignState, Error>) -> bool {
        matches!(result, Err(e) if e.campaign_kind() == Some(CampaignErrorKind::InvalidToken))
    }

    #[test]
    fn decode_returns_the_encoded_state() {
        let token = codec().encode(&scenario_state()).unwrap();
        assert_eq!(codec().decode(&token).unwrap(), scenario_state());
    }

    #[test]
    fn empty_output_ids_round_trip_to_empty() {
        let state = CampaignState::new("list-1", ProviderName::Discord, vec![], "");
        let decoded = codec().decode(&codec().encode(&state).unwrap()).unwrap();
        assert!(decoded.output_ids.is_empty());
        assert_eq!(decoded, state);
    }

    #[test]
    fn delimiters_inside_fields_round_trip() {
        let state = CampaignState::new(
            "list|with|pipes---and-dashes",
            ProviderName::Google,
            vec!["a|b".to_string(), "100%".to_string()],
            "https://x.com?a=1&b=2|3#frag",
        );
        let decoded = codec().decode(&codec().encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn encoding_twice_gives_different_tokens() {
        let first = codec().encode(&scenario_state()).unwrap();
        let second = codec().encode(&scenario_state()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn tokens_are_url_safe() {
        let token = codec().encode(&scenario_state()).unwrap();
        assert_eq!(urlencoding::encode(&token), token);
    }

    #[test]
    fn flipped_bytes_never_decode() {
        let token = codec().encode(&scenario_state()).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x80;
            let result = codec().decode(&URL_SAFE_NO_PAD.encode(&tampered));
            assert!(is_invalid_token(result), "byte {i} tamper went unnoticed");
        }
    }

    #[test]
    fn wrong_secret_is_invalid_token() {
        let token = codec().encode(&scenario_state()).unwrap();
        let other = Codec::new(OTHER_SECRET).unwrap();
        assert!(is_invalid_token(other.decode(&token)));
    }

    #[test]
    fn garbage_is_invalid_token() {
        assert!(is_invalid_token(codec().decode("")));
        assert!(is_invalid_token(codec().decode("not a token!")));
        assert!(is_invalid_token(codec().decode("YWJj")));
    }

    #[test]
    fn wrong_field_count_is_invalid_token() {
        let cipher = Cipher::new(SECRET).unwrap();
        let token = cipher.seal("list-1|Google|out-a").unwrap();
        assert!(is_invalid_token(codec().decode(&token)));

        let token = cipher.seal("list-1|Google|out-a|https%3A%2F%2Fx.com|extra").unwrap();
        assert!(is_invalid_token(codec().decode(&token)));
    }

    #[test]
    fn unknown_provider_is_invalid_token() {
        let cipher = Cipher::new(SECRET).unwrap();
        let token = cipher.seal("list-1|Myspace||").unwrap();
        assert!(is_invalid_token(codec().decode(&token)));
    }

    #[test]
    fn delimiters_that_survive_escaping_are_rejected() {
        for delimiter in [".", "-", "~", "a", "%", ""] {
            assert!(
                validate_delimiter(delimiter).is_err(),
                "{delimiter:?} should be rejected"
            );
        }
        for delimiter in ["|", "/", "#", "&&", " "] {
            assert!(validate_delimiter(delimiter).is_ok(), "{delimiter:?}");
        }
        assert!(Codec::with_delimiter(SECRET, ".").is_err());
    }

    #[test]
    fn output_ids_that_cannot_round_trip_fail_to_encode() {
        let state = CampaignState::new(
            "list-1",
            ProviderName::Google,
            vec!["a---b".to_string()],
            "",
        );
        assert!(codec().encode(&state).is_err());

        let state = CampaignState::new(
            "list-1",
            ProviderName::Google,
            vec!["x-".to_string(), "y".to_string()],
            "",
        );
        assert!(codec().encode(&state).is_err());
    }
}
