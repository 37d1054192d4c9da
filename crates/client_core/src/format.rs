use rand::Rng;

/// Renders elapsed call time as `m:ss`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Synthetic Peruvian mobile number, `+51 9XX XXX XXX`.
pub fn generate_origin_number<R: Rng>(rng: &mut R) -> String {
    let mut digit = || char::from(b'0' + rng.gen_range(0..=9u8));
    let prefix: String = (0..2).map(|_| digit()).collect();
    let middle: String = (0..3).map(|_| digit()).collect();
    let last: String = (0..3).map(|_| digit()).collect();
    format!("+51 9{prefix} {middle} {last}")
}
