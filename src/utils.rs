// Utility functions

/// Rounds a currency amount to whole cents.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Random 32-hex-char identifier for newly created rows.
pub fn generate_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}
