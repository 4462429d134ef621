use crate::BenchError;
use std::io::Read;
use std::path::Path;

/// Prefixes bare domains with `https://`; blank input yields `None`
pub fn normalize_domain_arg(domain: &str) -> Option<String> {
    let domain = domain.trim();
    if domain.is_empty() {
        None
    } else if domain.starts_with("http") {
        Some(domain.to_string())
    } else {
        Some(format!("https://{}", domain))
    }
}

/// Reads domains from a CSV file
///
/// Uses the `domain` column, else `url`, else the first column. Blank rows
/// are skipped.
pub fn load_domains_csv(path: &Path) -> Result<Vec<String>, BenchError> {
    let file = std::fs::File::open(path)?;
    read_domains_csv(file)
}

/// Reads domains from CSV text with a header row
pub fn read_domains_csv<R: Read>(input: R) -> Result<Vec<String>, BenchError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h.trim() == "domain")
        .or_else(|| headers.iter().position(|h| h.trim() == "url"))
        .unwrap_or(0);

    let mut domains = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(domain) = record.get(column).and_then(normalize_domain_arg) {
            domains.push(domain);
        }
    }
    Ok(domains)
}
