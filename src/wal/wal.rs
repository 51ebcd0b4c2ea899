use anyhow::{anyhow, bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// WAL operation types
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    CreateUser {
        id: u64,
        username: String,
        email: String,
        password_hash: String,
    },
}

impl WalOperation {
    fn to_string(&self) -> String {
        match self {
            WalOperation::CreateUser {
                id,
                username,
                email,
                password_hash,
            } => {
                // User-supplied text is hex encoded so '|' and newlines can't split a record
                format!(
                    "CREATE_USER|{}|{}|{}|{}",
                    id,
                    hex::encode(username),
                    hex::encode(email),
                    hex::encode(password_hash)
                )
            }
        }
    }

    fn from_string(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"CREATE_USER") => {
                if parts.len() != 5 {
                    bail!("Invalid CREATE_USER format");
                }
                let id = parts[1].parse::<u64>().context("Invalid user ID")?;
                let username = decode_text(parts[2]).context("Invalid username")?;
                let email = decode_text(parts[3]).context("Invalid email")?;
                let password_hash = decode_text(parts[4]).context("Invalid password hash")?;

                Ok(WalOperation::CreateUser {
                    id,
                    username,
                    email,
                    password_hash,
                })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex")?;
    String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append an operation and sync it to disk before returning
    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.to_string();
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("WAL mutex poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        file.sync_data().context("Failed to sync WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::from_string(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }
}
