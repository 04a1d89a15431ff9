use crate::types::ScanRecord;

/// Parse one line of the scan engine's greppable (`-oL`) output.
///
/// Grammar, best effort:
/// - lines starting with `#` are comments/headers and are skipped
/// - only lines whose first field is `open` are kept
/// - an `open` line needs more than 3 single-space-separated fields,
///   shaped `open <protocol> <port> <host> ...`
///
/// Anything malformed (too few fields, port not a valid u16) is silently
/// dropped rather than reported; the raw output is not trusted to be clean.
pub fn parse_result_line(line: &str) -> Option<ScanRecord> {
    if line.starts_with('#') {
        return None;
    }
    if !line.starts_with("open") {
        return None;
    }
    // Single-space split, matching the engine's fixed field separator.
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() <= 3 {
        return None;
    }
    let port: u16 = fields[2].parse().ok()?;
    Some(ScanRecord {
        status: fields[0].to_string(),
        protocol: fields[1].to_string(),
        port,
        host: fields[3].to_string(),
    })
}
