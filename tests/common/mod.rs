use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

pub fn daytally_bin() -> Command {
    #[allow(deprecated)]
    {
        let mut cmd = Command::cargo_bin("daytally").expect("daytally test binary should build");
        cmd.env_remove("TELEGRAM_BOT_TOKEN").env("RUST_LOG", "off");
        cmd
    }
}

/// Write `content` to a temporary config file that lives as long as the handle.
pub fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write temp config");
    file
}
