/// Shareable links
///
/// A gallery is shared as JSON `{u: [urls], n?, w?, e?}`, base64-encoded and
/// then percent-encoded so it can ride in a URL query. Decoding also accepts
/// the older bare-array form `[urls]`, and never fails: anything malformed
/// decodes to an empty gallery.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::data::GalleryMeta;

/// Query parameter carrying the encoded gallery
pub const SHARE_PARAM: &str = "g";

/// Minimal state needed to rebuild a gallery from a link
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedGallery {
    #[serde(rename = "u", default)]
    pub urls: Vec<String>,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "w", default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SharedGallery {
    pub fn new(urls: Vec<String>, meta: &GalleryMeta) -> Self {
        Self {
            urls,
            display_name: non_blank(&meta.display_name),
            whatsapp: non_blank(&meta.whatsapp),
            email: non_blank(&meta.email),
        }
    }

    pub fn meta(&self) -> GalleryMeta {
        GalleryMeta {
            display_name: self.display_name.clone(),
            whatsapp: self.whatsapp.clone(),
            email: self.email.clone(),
        }
    }
}

/// Both historical payload shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Legacy(Vec<String>),
    Current(SharedGallery),
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Encode a gallery into a URL-safe parameter value
pub fn encode_share(urls: &[String], meta: &GalleryMeta) -> String {
    let shared = SharedGallery::new(urls.to_vec(), meta);
    // Serializing a struct of strings cannot fail
    let json = serde_json::to_string(&shared).unwrap_or_else(|_| String::from("{\"u\":[]}"));
    let b64 = STANDARD.encode(json.as_bytes());
    urlencoding::encode(&b64).into_owned()
}

/// Decode a parameter value; malformed input yields an empty gallery
pub fn decode_share(param: &str) -> SharedGallery {
    match try_decode(param.trim()) {
        Some(shared) => shared,
        None => {
            if !param.trim().is_empty() {
                log::warn!("⚠️  Ignoring malformed share parameter ({} chars)", param.len());
            }
            SharedGallery::default()
        }
    }
}

fn try_decode(param: &str) -> Option<SharedGallery> {
    if param.is_empty() {
        return None;
    }
    let b64 = urlencoding::decode(param).ok()?;
    let bytes = STANDARD.decode(b64.as_bytes()).ok()?;
    let payload: Payload = serde_json::from_slice(&bytes).ok()?;
    Some(match payload {
        Payload::Legacy(urls) => SharedGallery {
            urls,
            ..SharedGallery::default()
        },
        Payload::Current(shared) => shared,
    })
}

/// Full link for a parameter value
pub fn share_link(base_url: &str, param: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{SHARE_PARAM}={param}")
}

/// Extract the parameter from a pasted link, or accept a bare value
pub fn parse_share_link(link: &str) -> String {
    let link = link.trim();
    let query = match link.split_once('?') {
        Some((_, query)) => query,
        None => return link.to_string(),
    };
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

/// Normalize a WhatsApp number to international digits
///
/// Strips every non-digit; a leading national `0` becomes the Israeli
/// country code `972`. No other locales are handled.
pub fn normalize_whatsapp(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix('0') {
        Some(rest) => format!("972{rest}"),
        None => digits,
    }
}

/// `wa.me` chat link for a number, if it has any digits
pub fn whatsapp_link(number: &str) -> Option<String> {
    let digits = normalize_whatsapp(number);
    if digits.is_empty() {
        None
    } else {
        Some(format!("https://wa.me/{digits}"))
    }
}
