use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

const REFERENCE_PREFIX: &str = "FB";
const SUFFIX_LEN: usize = 4;

/// Short, customer-shareable booking reference: fixed prefix, the low
/// six digits of the unix timestamp for rough chronological ordering,
/// and a random alphanumeric suffix, e.g. `FB-483920K7QZ`.
///
/// Uniqueness is probabilistic. The unique index on the bookings
/// collection is the real backstop; the booking service regenerates and
/// retries the insert when that index rejects a duplicate.
pub fn generate_reference() -> String {
    let timestamp_slice = Utc::now().timestamp() % 1_000_000;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    format!("{}-{:06}{}", REFERENCE_PREFIX, timestamp_slice, suffix)
}
