//! Versioned, checksummed persistence of [`TrainedModel`] artifacts.
//!
//! An artifact is one JSON header line followed by a JSON payload:
//!
//! ```text
//! {"format_version":1,"sha256":"<hex digest of the payload bytes>"}
//! {"vocabulary":[...],"idf_weights":[...],"classifier_weights":[...],"bias":0.0}
//! ```

use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{ClassifierError, TextFeatures, TrainedModel};

/// Environment variable overriding the default artifact directory
pub const HOME_ENV_VAR: &str = "HS_CLASSIFIER_HOME";
/// File name of an artifact inside its model directory
pub const ARTIFACT_FILE_NAME: &str = "model.hsc";

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactHeader {
    format_version: u32,
    sha256: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactPayload {
    vocabulary: Vec<String>,
    idf_weights: Vec<f64>,
    classifier_weights: Vec<f64>,
    bias: f64,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Splits raw artifact bytes into the parsed header and the payload bytes.
fn split_artifact(bytes: &[u8]) -> Result<(ArtifactHeader, &[u8]), ClassifierError> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| ClassifierError::persistence("Artifact has no header line"))?;
    let header: ArtifactHeader = serde_json::from_slice(&bytes[..newline])
        .map_err(|e| ClassifierError::persistence(format!("Malformed artifact header: {}", e)))?;
    Ok((header, &bytes[newline + 1..]))
}

/// Serializes `model` into `writer`.
///
/// # Errors
/// - `PersistenceError` if the model holds non-finite values or the sink fails
pub fn write_model<W: Write>(model: &TrainedModel, mut writer: W) -> Result<(), ClassifierError> {
    let payload = ArtifactPayload {
        vocabulary: model.vocabulary().tokens().to_vec(),
        idf_weights: model.idf_weights().to_vec(),
        classifier_weights: model.classifier_weights().to_vec(),
        bias: model.bias(),
    };
    if !payload.bias.is_finite()
        || payload.idf_weights.iter().chain(&payload.classifier_weights).any(|w| !w.is_finite())
    {
        return Err(ClassifierError::persistence("Refusing to persist non-finite weights"));
    }

    let payload_bytes = serde_json::to_vec(&payload)
        .map_err(|e| ClassifierError::persistence(format!("Failed to encode payload: {}", e)))?;
    let header = ArtifactHeader {
        format_version: model.format_version(),
        sha256: sha256_hex(&payload_bytes),
    };
    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| ClassifierError::persistence(format!("Failed to encode header: {}", e)))?;

    let io_err = |e: std::io::Error| ClassifierError::persistence(format!("Failed to write artifact: {}", e));
    writer.write_all(&header_bytes).map_err(io_err)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.write_all(&payload_bytes).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Deserializes a model from `reader`, verifying version and checksum.
///
/// # Errors
/// - `PersistenceError` if the header is missing or malformed, the version is
///   unknown, the checksum does not match, or the payload is inconsistent
pub fn read_model<R: Read>(mut reader: R) -> Result<TrainedModel, ClassifierError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ClassifierError::persistence(format!("Failed to read artifact: {}", e)))?;

    let (header, payload_bytes) = split_artifact(&bytes)?;
    if header.format_version != crate::classifier::FORMAT_VERSION {
        return Err(ClassifierError::persistence(format!(
            "Unsupported format version {} (expected {})",
            header.format_version,
            crate::classifier::FORMAT_VERSION
        )));
    }
    let actual = sha256_hex(payload_bytes);
    if actual != header.sha256 {
        return Err(ClassifierError::persistence(format!(
            "Checksum mismatch: header {}, payload {}",
            header.sha256, actual
        )));
    }

    let payload: ArtifactPayload = serde_json::from_slice(payload_bytes)
        .map_err(|e| ClassifierError::persistence(format!("Malformed artifact payload: {}", e)))?;
    TrainedModel::from_parts(
        payload.vocabulary,
        payload.idf_weights,
        payload.classifier_weights,
        payload.bias,
        header.format_version,
    )
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Writes `model` to `path` atomically.
///
/// The artifact is written to a `.partial` sibling and renamed into place, so
/// `path` either keeps its previous content or holds the complete new artifact.
pub fn save_model(model: &TrainedModel, path: impl AsRef<Path>) -> Result<(), ClassifierError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ClassifierError::persistence(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let tmp = partial_path(path);
    let result = File::create(&tmp)
        .map_err(|e| ClassifierError::persistence(format!("Failed to create {}: {}", tmp.display(), e)))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_model(model, &mut writer)?;
            let file = writer
                .into_inner()
                .map_err(|e| ClassifierError::persistence(format!("Failed to flush artifact: {}", e)))?;
            file.sync_all()
                .map_err(|e| ClassifierError::persistence(format!("Failed to sync artifact: {}", e)))
        })
        .and_then(|_| {
            fs::rename(&tmp, path).map_err(|e| {
                ClassifierError::persistence(format!("Failed to move artifact into {}: {}", path.display(), e))
            })
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    } else {
        log::info!("Saved model ({} tokens) to {:?}", model.vocabulary().len(), path);
    }
    result
}

/// Loads a model from `path`.
///
/// # Errors
/// - `ConfigurationError` if `path` does not exist
/// - `PersistenceError` if the artifact is unreadable or invalid
pub fn load_model(path: impl AsRef<Path>) -> Result<TrainedModel, ClassifierError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ClassifierError::configuration(format!(
            "Model artifact not found: {}",
            path.display()
        )));
    }
    log::info!("Loading model from {:?}", path);
    let file = File::open(path)
        .map_err(|e| ClassifierError::persistence(format!("Failed to open {}: {}", path.display(), e)))?;
    let model = read_model(BufReader::new(file))?;
    log::info!("Loaded model with {} tokens", model.vocabulary().len());
    Ok(model)
}

/// A directory of named model artifacts.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
}

impl ModelStore {
    /// Creates a new ModelStore with the default models directory
    pub fn new_default() -> Result<Self, ClassifierError> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(HOME_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("hs-classifier").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("hs-classifier").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("hs-classifier").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> Result<Self, ClassifierError> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir).map_err(|e| {
            ClassifierError::configuration(format!("Failed to create {}: {}", models_dir.display(), e))
        })?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(ARTIFACT_FILE_NAME)
    }

    pub fn is_model_saved(&self, name: &str) -> bool {
        let path = self.get_model_path(name);
        log::debug!("Checking for model {:?} at {:?} (exists: {})", name, path, path.exists());
        path.exists()
    }

    /// Persists `model` under `name` and returns the artifact path
    pub fn save(&self, model: &TrainedModel, name: &str) -> Result<PathBuf, ClassifierError> {
        let path = self.get_model_path(name);
        save_model(model, &path)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<TrainedModel, ClassifierError> {
        load_model(self.get_model_path(name))
    }

    /// Checks the stored checksum of `name` against its payload.
    ///
    /// Returns `Ok(false)` when the model is absent or its checksum does not match.
    pub fn verify_model(&self, name: &str) -> Result<bool, ClassifierError> {
        let path = self.get_model_path(name);
        log::info!("Verifying model file: {:?}", path);
        if !path.exists() {
            log::info!("Model file does not exist");
            return Ok(false);
        }

        let bytes = fs::read(&path)
            .map_err(|e| ClassifierError::persistence(format!("Failed to read {}: {}", path.display(), e)))?;
        let (header, payload) = split_artifact(&bytes)?;
        let hash = sha256_hex(payload);
        log::info!("Calculated hash: {}", hash);
        log::info!("Expected hash:   {}", header.sha256);
        Ok(hash == header.sha256)
    }

    /// Names of every directory holding an artifact, sorted
    pub fn list_models(&self) -> Result<Vec<String>, ClassifierError> {
        let entries = fs::read_dir(&self.models_dir).map_err(|e| {
            ClassifierError::configuration(format!("Failed to list {}: {}", self.models_dir.display(), e))
        })?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.is_model_saved(name))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn remove_model(&self, name: &str) -> Result<(), ClassifierError> {
        let path = self.get_model_path(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                ClassifierError::persistence(format!("Failed to remove {}: {}", path.display(), e))
            })?;
            log::info!("Removed model {:?}", name);
        }
        Ok(())
    }
}
