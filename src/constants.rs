/// Source name constants to ensure consistency across the codebase.
/// These names key the skip report identifiers and the per-source log spans.

// Source names (used in CLI output, logs and skip-report identifiers)
pub const MESSAGE_EXPORT_SOURCE: &str = "message_export";
pub const SHEET_SOURCE: &str = "sheet";
pub const JSON_DUMP_SOURCE: &str = "json_dump";

// Conventional file names looked up under the input directory
pub const MESSAGE_EXPORT_FILE: &str = "messages.html";
pub const SHEET_FILE: &str = "listings.csv";
pub const JSON_DUMP_FILE: &str = "objects.json";

// Output artifacts
pub const CATALOG_FILE: &str = "catalog.json";
pub const SKIP_REPORT_FILE: &str = "skip_report.json";

/// City assumed when a record carries no recognizable city keyword.
/// The bulk of the source material advertises the Sochi resort market.
pub const DEFAULT_CITY: &str = "Сочи";

/// All catalog entries are domestic listings.
pub const DEFAULT_COUNTRY: &str = "Россия";

/// Format assumed at catalog-assembly time when no format keyword matched.
pub const DEFAULT_FORMAT: &str = "апартаменты";

/// Get all source names in processing order
pub fn all_sources() -> Vec<&'static str> {
    vec![MESSAGE_EXPORT_SOURCE, SHEET_SOURCE, JSON_DUMP_SOURCE]
}
