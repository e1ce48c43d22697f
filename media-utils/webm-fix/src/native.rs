//! Repair through the native `FixWebmFile` routine of a dynamically loaded
//! library.

use std::{
    ffi::{CString, c_char, c_int},
    path::{Path, PathBuf},
};

use crate::{
    StatusCode, WebmRepairer,
    error::{Error, Result},
    metadata::Metadata,
};

/// `int FixWebmFile(const char* input, const char* output)`
pub type FixWebmFileFn = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;

/// `int FixWebmFile2(const char* input, const char* output, const char* metadata)`
pub type FixWebmFile2Fn =
    unsafe extern "C" fn(*const c_char, *const c_char, *const c_char) -> c_int;

const FIX_WEBM_FILE: &str = "FixWebmFile";
const FIX_WEBM_FILE2: &str = "FixWebmFile2";

/// Environment variable overriding [default_library_path].
pub const LIBRARY_ENV_VAR: &str = "FIXWEBM_LIB";

/// Platform file name of the `webm` library, e.g. `libwebm.so`.
pub fn default_library_path() -> PathBuf {
    PathBuf::from(libloading::library_filename("webm"))
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(CString::new(path.as_os_str().as_bytes())?)
    }
    #[cfg(not(unix))]
    {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::PathNotUtf8(path.to_path_buf()))?;
        Ok(CString::new(path_str)?)
    }
}

/// Call `f` once with `source` and `destination` as C strings.
///
/// The C strings live until `f` returns and are freed on every return
/// path, including a failed conversion of `destination`.
///
/// # Safety
///
/// `f` must be safe to call with two valid NUL-terminated strings.
pub unsafe fn call_fix_webm(
    f: FixWebmFileFn,
    source: &Path,
    destination: &Path,
) -> Result<StatusCode> {
    let source = path_to_cstring(source)?;
    let destination = path_to_cstring(destination)?;
    tracing::debug!("calling {FIX_WEBM_FILE}({source:?}, {destination:?})");
    let code = unsafe { f(source.as_ptr(), destination.as_ptr()) };
    tracing::debug!("  returned {code}");
    Ok(StatusCode::from(code))
}

/// Like [call_fix_webm], passing `metadata` encoded as a third string.
///
/// # Safety
///
/// `f` must be safe to call with three valid NUL-terminated strings.
pub unsafe fn call_fix_webm_with_metadata(
    f: FixWebmFile2Fn,
    source: &Path,
    destination: &Path,
    metadata: &Metadata,
) -> Result<StatusCode> {
    let source = path_to_cstring(source)?;
    let destination = path_to_cstring(destination)?;
    let metadata = CString::new(metadata.encode()?)?;
    tracing::debug!(
        "calling {FIX_WEBM_FILE2}({source:?}, {destination:?}, <{} bytes of metadata>)",
        metadata.as_bytes().len()
    );
    let code = unsafe { f(source.as_ptr(), destination.as_ptr(), metadata.as_ptr()) };
    tracing::debug!("  returned {code}");
    Ok(StatusCode::from(code))
}

/// A loaded library exporting `FixWebmFile`.
pub struct NativeRepairer {
    fix_webm_file: FixWebmFileFn,
    fix_webm_file2: Option<FixWebmFile2Fn>,
    path: PathBuf,
    // Keeps the function pointers above valid.
    _library: libloading::Library,
}

impl NativeRepairer {
    /// Load from `FIXWEBM_LIB` if set, else from [default_library_path].
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(LIBRARY_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_library_path);
        Self::from_path(path)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        tracing::debug!("loading {}", path.display());
        // SAFETY: loading runs the library's initializers. The library is
        // trusted to be the webm repair library.
        let library = unsafe { libloading::Library::new(&path) }.map_err(|source| {
            Error::LibLoading {
                path: path.clone(),
                source,
            }
        })?;

        // SAFETY: the symbol types match the exported C signatures.
        let fix_webm_file = unsafe { library.get::<FixWebmFileFn>(b"FixWebmFile\0") }
            .map(|sym| *sym)
            .map_err(|source| Error::MissingSymbol {
                symbol: FIX_WEBM_FILE,
                path: path.clone(),
                source,
            })?;
        let fix_webm_file2 = unsafe { library.get::<FixWebmFile2Fn>(b"FixWebmFile2\0") }
            .map(|sym| *sym)
            .ok();
        if fix_webm_file2.is_none() {
            tracing::debug!("{} does not export {FIX_WEBM_FILE2}", path.display());
        }

        Ok(Self {
            fix_webm_file,
            fix_webm_file2,
            path,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether metadata can be passed to the library.
    pub fn supports_metadata(&self) -> bool {
        self.fix_webm_file2.is_some()
    }
}

impl WebmRepairer for NativeRepairer {
    fn name(&self) -> &str {
        "native"
    }

    fn repair(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata,
    ) -> Result<StatusCode> {
        if metadata.is_empty() {
            // SAFETY: resolved from the library as `FixWebmFile`.
            unsafe { call_fix_webm(self.fix_webm_file, source, destination) }
        } else {
            let f = self.fix_webm_file2.ok_or_else(|| Error::MetadataUnsupported {
                path: self.path.clone(),
            })?;
            // SAFETY: resolved from the library as `FixWebmFile2`.
            unsafe { call_fix_webm_with_metadata(f, source, destination, metadata) }
        }
    }
}
