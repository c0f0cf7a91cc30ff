// Pure text helpers for the status line: uptime and the request counter.
// No Discord or HTTP types in here so they can be unit tested directly.

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Render an elapsed number of seconds as
/// `"<days> days, <hours> hours, <minutes> minutes, <seconds> seconds"`.
pub fn format_elapsed(elapsed_secs: u64) -> String {
    let days = elapsed_secs / SECONDS_PER_DAY;
    let remainder = elapsed_secs % SECONDS_PER_DAY;
    let hours = remainder / SECONDS_PER_HOUR;
    let remainder = remainder % SECONDS_PER_HOUR;
    let minutes = remainder / SECONDS_PER_MINUTE;
    let seconds = remainder % SECONDS_PER_MINUTE;

    format!(
        "{} days, {} hours, {} minutes, {} seconds",
        days, hours, minutes, seconds
    )
}

/// Group digits in threes with commas, e.g. `1234567` -> `"1,234,567"`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}
