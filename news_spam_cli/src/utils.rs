use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    info!(path = %path.display(), "Wrote JSON output");
    Ok(())
}

pub fn save_text(content: &str, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    info!(path = %path.display(), "Wrote text output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_and_text_land_on_disk() {
        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("spam_out_{}.json", uuid::Uuid::new_v4()));
        let text_path = dir.join(format!("spam_out_{}.txt", uuid::Uuid::new_v4()));

        save_json(&serde_json::json!({ "count": 2 }), &json_path).unwrap();
        save_text("two articles", &text_path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed["count"], 2);
        assert_eq!(std::fs::read_to_string(&text_path).unwrap(), "two articles");

        std::fs::remove_file(json_path).ok();
        std::fs::remove_file(text_path).ok();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let path = std::env::temp_dir()
            .join(uuid::Uuid::new_v4().to_string())
            .join("out.json");
        assert!(save_json(&serde_json::json!([]), &path).is_err());
    }
}
