use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source file \"{}\" does not exist", .0.display())]
    SourceDoesNotExist(PathBuf),
    #[error("source \"{}\" is not a regular file", .0.display())]
    SourceNotAFile(PathBuf),
    #[error("cannot read source file \"{}\": {source}", path.display())]
    SourceNotReadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("destination \"{}\" is the source file", .0.display())]
    DestinationIsSource(PathBuf),
    #[error("destination directory \"{}\" does not exist", .0.display())]
    DestinationDirMissing(PathBuf),
    #[error("{source}")]
    Nul {
        #[from]
        source: std::ffi::NulError,
    },
    #[error("path \"{}\" is not valid UTF-8", .0.display())]
    PathNotUtf8(PathBuf),
    #[error("loading library at \"{}\"", path.display())]
    LibLoading {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("symbol {symbol} not found in \"{}\"", path.display())]
    MissingSymbol {
        symbol: &'static str,
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("\"{}\" does not export FixWebmFile2, cannot apply metadata", path.display())]
    MetadataUnsupported { path: PathBuf },
    #[error("ffmpeg program \"{}\" not found", program.display())]
    FfmpegNotFound { program: PathBuf },
    #[error("invalid metadata \"{0}\"")]
    InvalidMetadata(String),
}
