use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{CA_CERT_FILE, CLIENT_CERT_FILE, CLIENT_KEY_FILE};

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("keys directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TLS material in {dir}: {source}")]
    Tls {
        dir: PathBuf,
        #[source]
        source: reqwest::Error,
    },
}

/// PEM client certificate, key and optional CA read from a keys directory.
///
/// Expected layout: `client.crt`, `client.key` and optionally `ca.crt`.
#[derive(Clone)]
pub struct Credentials {
    dir: PathBuf,
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
    ca_pem: Option<Vec<u8>>,
}

impl Credentials {
    pub fn load(dir: &Path) -> Result<Self, CredentialsError> {
        if !dir.is_dir() {
            return Err(CredentialsError::MissingDir(dir.to_path_buf()));
        }
        let ca_path = dir.join(CA_CERT_FILE);
        let ca_pem = if ca_path.exists() {
            Some(read(&ca_path)?)
        } else {
            None
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            cert_pem: read(&dir.join(CLIENT_CERT_FILE))?,
            key_pem: read(&dir.join(CLIENT_KEY_FILE))?,
            ca_pem,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn has_ca(&self) -> bool {
        self.ca_pem.is_some()
    }

    /// Applies client identity and CA to a reqwest builder.
    pub fn apply(
        &self,
        builder: reqwest::blocking::ClientBuilder,
    ) -> Result<reqwest::blocking::ClientBuilder, CredentialsError> {
        let tls_err = |source| CredentialsError::Tls {
            dir: self.dir.clone(),
            source,
        };
        let identity =
            reqwest::Identity::from_pkcs8_pem(&self.cert_pem, &self.key_pem).map_err(tls_err)?;
        let mut builder = builder.identity(identity);
        if let Some(ca) = &self.ca_pem {
            let cert = reqwest::Certificate::from_pem(ca).map_err(tls_err)?;
            builder = builder.add_root_certificate(cert);
        }
        Ok(builder)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CredentialsError> {
    fs::read(path).map_err(|source| CredentialsError::Read {
        path: path.to_path_buf(),
        source,
    })
}
