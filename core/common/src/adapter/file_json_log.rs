//! Log ポートの実装: ファイルへ JSONL 追記 / stderr へ 1 行表示 / 何もしない

use crate::error::Error;
use crate::ports::outbound::{Log, LogRecord};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// ファイルへ JSONL を追記する Log 実装
pub struct FileJsonLog {
    file: Mutex<File>,
}

impl FileJsonLog {
    /// ログファイルを追記モードで開く。親ディレクトリが無ければ作成する。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::io(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Log for FileJsonLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        let line = serde_json::to_string(record).map_err(|e| Error::io(e.to_string()))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| Error::io("log file lock poisoned"))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}

/// stderr に 1 行で表示する Log 実装（log_path 未設定時の既定）
#[derive(Debug, Clone, Default)]
pub struct StderrLog;

impl Log for StderrLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        let mut line = format!("{} [{}]", record.ts, record.level.as_str());
        if let Some(ref layer) = record.layer {
            line.push_str(&format!(" {}", layer));
        }
        line.push_str(&format!(" {}", record.message));
        if let Some(ref fields) = record.fields {
            for (k, v) in fields {
                line.push_str(&format!(" {}={}", k, v));
            }
        }
        eprintln!("{}", line);
        Ok(())
    }
}

/// 何も出力しない Log 実装（テスト用）
#[derive(Debug, Clone, Default)]
pub struct NoopLog;

impl Log for NoopLog {
    fn log(&self, _record: &LogRecord) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_log() {
        let log = NoopLog;
        assert!(log.log(&LogRecord::info("test")).is_ok());
    }

    #[test]
    fn test_file_json_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("searchmap.jsonl");
        let log = FileJsonLog::open(&path).unwrap();
        log.emit(LogRecord::info("first").layer("cli"));
        log.emit(LogRecord::warn("second").kind("validation"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["message"], "first");
        assert_eq!(first["layer"], "cli");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["level"], "warn");
    }
}
