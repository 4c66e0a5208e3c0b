//! Store collaborator seams and the encrypted JSON vault behind them.
//!
//! Controllers only ever see [`VaultHandle`]; [`JsonVault`] is the default
//! adapter the binary opens through [`JsonVaultOpener`].

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams, SecretKey, KEY_LEN};
use crate::errors::{Result, ZvaultError};
use crate::models::{EncryptedBlob, Filter, Secret, Task, VaultData};

pub const VAULT_FILE: &str = "vault.json";
const VAULT_FORMAT_VERSION: u8 = 1;

pub trait SecretStore: Send + Sync {
    fn add(&self, secret: Secret) -> Result<()>;
    fn get(&self, id: &str) -> Result<Secret>;
    fn list(&self) -> Result<Vec<Secret>>;
    /// Replaces the stored record with the same id.
    fn update(&self, secret: Secret) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
    /// Case-insensitive name substring, or exact tag, or exact type tag.
    fn search(&self, query: &str) -> Result<Vec<Secret>>;
}

pub trait TaskStore: Send + Sync {
    fn add(&self, task: Task) -> Result<()>;
    fn get(&self, id: &str) -> Result<Task>;
    fn list(&self, filter: &Filter) -> Result<Vec<Task>>;
    fn update(&self, task: Task) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
    /// Removes every done task and returns how many went.
    fn clear_done(&self) -> Result<usize>;
}

pub trait Vault: Send + Sync {
    fn secrets(&self) -> &dyn SecretStore;
    fn tasks(&self) -> &dyn TaskStore;
    fn close(&self) -> Result<()>;
}

pub type VaultHandle = Arc<dyn Vault>;

impl fmt::Debug for dyn Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Vault")
    }
}

pub trait VaultOpener: Send + Sync {
    fn open(&self, dir: &Path, password: &str) -> Result<VaultHandle>;
}

/// True when nothing exists at `dir` yet, i.e. opening it creates a vault.
pub fn is_first_run(dir: &Path) -> bool {
    !dir.exists()
}

pub fn secret_matches(secret: &Secret, query: &str) -> bool {
    let q = query.to_lowercase();
    secret.name.to_lowercase().contains(&q)
        || secret.tags.iter().any(|t| *t == q)
        || secret.kind.as_str() == q
}

#[derive(Serialize, Deserialize)]
struct VaultFile {
    version: u8,
    kdf: KdfParams,
    kdf_salt: String,
    wrapped_key: EncryptedBlob,
    vault: EncryptedBlob,
}

/// Where and how a file-backed vault is written.
struct Sink {
    path: PathBuf,
    kdf: KdfParams,
    kdf_salt: String,
    wrapped_key: EncryptedBlob,
    dek: SecretKey,
}

impl Sink {
    fn write(&self, data: &VaultData) -> Result<()> {
        let plaintext = Zeroizing::new(serde_json::to_vec(data)?);
        let file = VaultFile {
            version: VAULT_FORMAT_VERSION,
            kdf: self.kdf,
            kdf_salt: self.kdf_salt.clone(),
            wrapped_key: self.wrapped_key.clone(),
            vault: crypto::encrypt_with_key(&self.dek, &plaintext)?,
        };
        let serialized = serde_json::to_string_pretty(&file)?;
        atomic_write(&self.path, serialized.as_bytes())?;
        restrict_file(&self.path)
    }
}

struct State {
    data: VaultData,
    sink: Option<Sink>,
}

/// Secrets and tasks held in memory, optionally mirrored to an encrypted
/// file after every mutation.
pub struct JsonVault {
    state: Mutex<State>,
}

impl JsonVault {
    pub fn in_memory() -> Self {
        Self::from_data(VaultData::default())
    }

    pub fn from_data(data: VaultData) -> Self {
        Self {
            state: Mutex::new(State { data, sink: None }),
        }
    }

    /// Opens `dir/vault.json`, creating the directory and an empty vault
    /// when neither exists yet.
    pub fn open_dir(dir: &Path, password: &str, kdf: KdfParams) -> Result<Self> {
        let path = dir.join(VAULT_FILE);
        let (data, sink) = if path.exists() {
            load(&path, password)?
        } else {
            create(dir, &path, password, kdf)?
        };
        Ok(Self {
            state: Mutex::new(State {
                data,
                sink: Some(sink),
            }),
        })
    }

    pub fn snapshot(&self) -> Result<VaultData> {
        Ok(self.lock()?.data.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ZvaultError::Storage("vault state poisoned".into()))
    }

    /// Applies `f` and persists the result. On a failed write the in-memory
    /// change is rolled back so memory never runs ahead of disk.
    fn mutate<T>(&self, f: impl FnOnce(&mut VaultData) -> Result<T>) -> Result<T> {
        let mut state = self.lock()?;
        let before = state.data.clone();
        let out = f(&mut state.data)?;
        state.data.revision += 1;
        let written = match &state.sink {
            Some(sink) => sink.write(&state.data),
            None => Ok(()),
        };
        if let Err(e) = written {
            tracing::error!(error = %e, "vault write failed");
            state.data = before;
            return Err(e);
        }
        Ok(out)
    }
}

fn load(path: &Path, password: &str) -> Result<(VaultData, Sink)> {
    let raw = fs::read_to_string(path)?;
    let file: VaultFile = serde_json::from_str(&raw)?;
    if file.version != VAULT_FORMAT_VERSION {
        return Err(ZvaultError::Storage(format!(
            "unsupported vault format version: {}",
            file.version
        )));
    }
    let salt = crypto::decode(&file.kdf_salt)?;
    let kek = crypto::derive_key(password, &salt, file.kdf)?;
    let unwrapped = crypto::decrypt_with_key(&kek, &file.wrapped_key)?;
    if unwrapped.len() != KEY_LEN {
        return Err(ZvaultError::Storage("invalid wrapped key length".into()));
    }
    let mut dek = Zeroizing::new([0u8; KEY_LEN]);
    dek.copy_from_slice(&unwrapped);

    let plaintext = crypto::decrypt_with_key(&dek, &file.vault)?;
    let data: VaultData = serde_json::from_slice(&plaintext)?;
    Ok((
        data,
        Sink {
            path: path.to_path_buf(),
            kdf: file.kdf,
            kdf_salt: file.kdf_salt,
            wrapped_key: file.wrapped_key,
            dek,
        },
    ))
}

fn create(dir: &Path, path: &Path, password: &str, kdf: KdfParams) -> Result<(VaultData, Sink)> {
    fs::create_dir_all(dir)?;
    restrict_dir(dir)?;

    let salt = crypto::random_salt();
    let kek = crypto::derive_key(password, &salt, kdf)?;
    let dek = crypto::random_key();
    let sink = Sink {
        path: path.to_path_buf(),
        kdf,
        kdf_salt: crypto::encode(&salt),
        wrapped_key: crypto::encrypt_with_key(&kek, dek.as_slice())?,
        dek,
    };
    let data = VaultData::default();
    sink.write(&data)?;
    tracing::info!(path = %path.display(), "created new vault");
    Ok((data, sink))
}

fn not_found(id: &str) -> ZvaultError {
    ZvaultError::NotFound(id.to_string())
}

impl SecretStore for JsonVault {
    fn add(&self, secret: Secret) -> Result<()> {
        self.mutate(|data| {
            if data.secrets.iter().any(|s| s.id == secret.id) {
                return Err(ZvaultError::InvalidRecord(format!(
                    "duplicate secret id '{}'",
                    secret.id
                )));
            }
            data.secrets.push(secret);
            Ok(())
        })
    }

    fn get(&self, id: &str) -> Result<Secret> {
        self.lock()?
            .data
            .secrets
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn list(&self) -> Result<Vec<Secret>> {
        Ok(self.lock()?.data.secrets.clone())
    }

    fn update(&self, secret: Secret) -> Result<()> {
        self.mutate(|data| {
            let slot = data
                .secrets
                .iter_mut()
                .find(|s| s.id == secret.id)
                .ok_or_else(|| not_found(&secret.id))?;
            *slot = secret;
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|data| {
            let pos = data
                .secrets
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| not_found(id))?;
            data.secrets.remove(pos);
            Ok(())
        })
    }

    fn search(&self, query: &str) -> Result<Vec<Secret>> {
        Ok(self
            .lock()?
            .data
            .secrets
            .iter()
            .filter(|s| secret_matches(s, query))
            .cloned()
            .collect())
    }
}

impl TaskStore for JsonVault {
    fn add(&self, task: Task) -> Result<()> {
        self.mutate(|data| {
            if data.tasks.iter().any(|t| t.id == task.id) {
                return Err(ZvaultError::InvalidRecord(format!(
                    "duplicate task id '{}'",
                    task.id
                )));
            }
            data.tasks.push(task);
            Ok(())
        })
    }

    fn get(&self, id: &str) -> Result<Task> {
        self.lock()?
            .data
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn list(&self, filter: &Filter) -> Result<Vec<Task>> {
        Ok(self
            .lock()?
            .data
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    fn update(&self, task: Task) -> Result<()> {
        self.mutate(|data| {
            let slot = data
                .tasks
                .iter_mut()
                .find(|t| t.id == task.id)
                .ok_or_else(|| not_found(&task.id))?;
            *slot = task;
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|data| {
            let pos = data
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| not_found(id))?;
            data.tasks.remove(pos);
            Ok(())
        })
    }

    fn clear_done(&self) -> Result<usize> {
        self.mutate(|data| {
            let before = data.tasks.len();
            data.tasks.retain(|t| !t.done);
            Ok(before - data.tasks.len())
        })
    }
}

impl Vault for JsonVault {
    fn secrets(&self) -> &dyn SecretStore {
        self
    }

    fn tasks(&self) -> &dyn TaskStore {
        self
    }

    fn close(&self) -> Result<()> {
        let state = self.lock()?;
        match &state.sink {
            Some(sink) => sink.write(&state.data),
            None => Ok(()),
        }
    }
}

/// Opens [`JsonVault`]s on disk with a fixed KDF cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonVaultOpener {
    pub kdf: KdfParams,
}

impl VaultOpener for JsonVaultOpener {
    fn open(&self, dir: &Path, password: &str) -> Result<VaultHandle> {
        let vault = JsonVault::open_dir(dir, password, self.kdf)?;
        Ok(Arc::new(vault))
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| ZvaultError::Storage(format!("invalid target path {}", path.display())))?;
    if !parent.exists() {
        fs::create_dir_all(parent)?;
        restrict_dir(parent)?;
    }

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| ZvaultError::Storage(format!("atomic write failed: {}", e.error)))?;
    Ok(())
}

fn restrict_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn restrict_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
