use std::path::Path;

/// Write a `{"data_columns": [...]}` schema file.
pub fn write_columns_file(path: &Path, columns: &[&str]) -> std::io::Result<()> {
    let json = serde_json::json!({ "data_columns": columns });
    std::fs::write(path, json.to_string())
}
