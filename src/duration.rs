/// Formats a number of seconds as `HH:MM:SS`.
///
/// Every part is padded to two digits, hours are never truncated.
pub fn duration_to_time_string(duration: u64) -> String {
    let hours = duration / 3600;
    let minutes = (duration / 60) % 60;
    let seconds = duration % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
