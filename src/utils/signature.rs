use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Deterministic signature of a report request. Two independent calls for
/// the same owner and window always derive the same id, which is what lets
/// published summaries be addressed without a server-issued key.
pub fn report_signature(owner_id: &str, start_date: NaiveDate, end_date: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner_id.as_bytes());
    hasher.update(start_date.to_string().as_bytes());
    hasher.update(end_date.to_string().as_bytes());

    let digest = hasher.finalize();
    URL_SAFE_NO_PAD.encode(digest)
}
